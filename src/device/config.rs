//! Configuration for the simulated device

use std::str::FromStr;

use crate::constants::*;

/// Parameters of the worker grid and its memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Workers per block; a block is the unit of scheduling on the pool
    pub block_size: usize,

    /// Number of OS threads executing blocks
    pub n_threads: usize,

    /// Total bytes that live device buffers may occupy
    pub memory_limit_bytes: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            n_threads: num_cpus::get(), // Use all available cores
            memory_limit_bytes: DEFAULT_MEMORY_LIMIT_BYTES,
        }
    }
}

impl DeviceConfig {
    /// Build a config from `STREAM_COMPACTION_*` environment variables
    ///
    /// Unset or unparsable variables fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            block_size: parse_or(std::env::var(ENV_BLOCK_SIZE).ok(), defaults.block_size),
            n_threads: parse_or(std::env::var(ENV_THREADS).ok(), defaults.n_threads),
            memory_limit_bytes: parse_or(
                std::env::var(ENV_MEMORY_LIMIT).ok(),
                defaults.memory_limit_bytes,
            ),
        }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = n_threads;
        self
    }

    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit_bytes = bytes;
        self
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    match raw {
        Some(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(%value, "ignoring unparsable device setting");
                default
            }
        },
        None => default,
    }
}

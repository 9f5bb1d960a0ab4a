//! # Simulated Parallel Device
//!
//! A GPU-style execution model on top of a Rayon thread pool. Work is
//! expressed as kernel launches over a grid of `grid_dim` blocks of
//! `block_dim` workers. A block is the scheduling granule handed to the pool,
//! and a launch returns only once every worker has finished, which makes
//! each launch a full barrier between algorithm phases.
//!
//! Device memory is modelled by [`DeviceBuffer`], allocated fallibly against
//! the configured memory limit.

pub mod buffer;
pub mod config;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use num_traits::{PrimInt, WrappingAdd};
use rayon::{ThreadPool, ThreadPoolBuilder};

pub use buffer::DeviceBuffer;
pub use config::DeviceConfig;

use crate::constants::{MAX_BLOCK_SIZE, MAX_GRID_DIM};
use crate::error::{CompactionError, Result};

/// Fixed-width integer types the kernels operate on
///
/// Sums wrap on overflow, as integer arithmetic does on a GPU.
pub trait Element: PrimInt + WrappingAdd + Send + Sync + fmt::Debug + 'static {}

impl<T> Element for T where T: PrimInt + WrappingAdd + Send + Sync + fmt::Debug + 'static {}

/// Grid and block dimensions of a single kernel launch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Number of blocks
    pub grid_dim: usize,
    /// Workers per block
    pub block_dim: usize,
}

impl LaunchConfig {
    /// Smallest grid of `block_dim`-sized blocks covering `workers` workers
    pub fn for_workers(workers: usize, block_dim: usize) -> Self {
        Self {
            grid_dim: workers.div_ceil(block_dim.max(1)),
            block_dim,
        }
    }

    fn validate(&self, kernel: &'static str) -> Result<()> {
        let reason = if self.block_dim == 0 || self.block_dim > MAX_BLOCK_SIZE {
            format!(
                "block dimension {} outside 1..={}",
                self.block_dim, MAX_BLOCK_SIZE
            )
        } else if self.grid_dim == 0 {
            "empty grid".to_string()
        } else if self.grid_dim > MAX_GRID_DIM {
            format!("grid dimension {} exceeds {}", self.grid_dim, MAX_GRID_DIM)
        } else {
            return Ok(());
        };

        tracing::warn!(kernel, %reason, "invalid launch configuration");
        Err(CompactionError::LaunchFailure { kernel, reason })
    }
}

/// A worker pool plus memory accounting, standing in for a GPU
#[derive(Debug)]
pub struct Device {
    config: DeviceConfig,
    pool: ThreadPool,
    allocated: AtomicUsize,
}

impl Device {
    /// Build a device with its own worker pool
    pub fn new(config: DeviceConfig) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.n_threads)
            .thread_name(|i| format!("device-worker-{i}"))
            .build()?;

        tracing::debug!(
            block_size = config.block_size,
            n_threads = pool.current_num_threads(),
            memory_limit_bytes = config.memory_limit_bytes,
            "device initialised"
        );

        Ok(Self {
            config,
            pool,
            allocated: AtomicUsize::new(0),
        })
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Bytes currently held by live buffers
    pub fn allocated_bytes(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }

    /// Allocate a zero-initialised buffer of `len` elements
    pub fn alloc<T: Element>(&self, len: usize) -> Result<DeviceBuffer<'_, T>> {
        let limit = self.config.memory_limit_bytes;
        let bytes = len.saturating_mul(std::mem::size_of::<T>());

        self.allocated
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                used.checked_add(bytes).filter(|&total| total <= limit)
            })
            .map_err(|used| {
                let available = limit.saturating_sub(used);
                tracing::warn!(requested = bytes, available, "device allocation rejected");
                CompactionError::AllocationFailure {
                    requested: bytes,
                    available,
                }
            })?;

        let mut data = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            self.release(bytes);
            tracing::warn!(requested = bytes, "host allocator refused device buffer");
            return Err(CompactionError::AllocationFailure {
                requested: bytes,
                available: limit.saturating_sub(self.allocated_bytes()),
            });
        }
        data.resize(len, T::zero());

        tracing::trace!(len, bytes, "device buffer allocated");
        Ok(DeviceBuffer::new(self, data, bytes))
    }

    pub(crate) fn release(&self, bytes: usize) {
        self.allocated.fetch_sub(bytes, Ordering::SeqCst);
    }

    /// Run host-side work on the device's worker pool
    pub(crate) fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Launch `kernel` over a grid covering `workers` workers
    ///
    /// The body receives the launch configuration and is expected to fan out
    /// over the pool with the block dimension as its minimum split length.
    /// The call returns after every worker has completed. A worker panic is
    /// reported as [`CompactionError::LaunchFailure`].
    pub(crate) fn launch<F>(&self, kernel: &'static str, workers: usize, body: F) -> Result<()>
    where
        F: FnOnce(LaunchConfig) + Send,
    {
        let launch = LaunchConfig::for_workers(workers, self.config.block_size);
        launch.validate(kernel)?;

        tracing::trace!(
            kernel,
            workers,
            grid_dim = launch.grid_dim,
            block_dim = launch.block_dim,
            "launch"
        );

        self.pool
            .install(|| panic::catch_unwind(AssertUnwindSafe(|| body(launch))))
            .map_err(|payload| {
                let reason = panic_reason(payload);
                tracing::warn!(kernel, %reason, "kernel aborted");
                CompactionError::LaunchFailure { kernel, reason }
            })
    }
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

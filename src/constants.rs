//! Centralized constants for the stream compaction library
//!
//! Launch limits mirror the usual limits of a CUDA-class device so that
//! configurations which would be rejected there are rejected here too.

// ============================================================================
// LAUNCH LIMITS
// ============================================================================

/// Default number of workers per block
pub const DEFAULT_BLOCK_SIZE: usize = 128;

/// Largest block a launch may request
pub const MAX_BLOCK_SIZE: usize = 1024;

/// Largest number of blocks in a single launch (x dimension of the grid)
pub const MAX_GRID_DIM: usize = (1 << 31) - 1;

// ============================================================================
// MEMORY
// ============================================================================

/// Default amount of device memory available to allocations (1 GiB)
pub const DEFAULT_MEMORY_LIMIT_BYTES: usize = 1 << 30;

// ============================================================================
// ENVIRONMENT
// ============================================================================

/// Overrides [`DEFAULT_BLOCK_SIZE`]
pub const ENV_BLOCK_SIZE: &str = "STREAM_COMPACTION_BLOCK_SIZE";

/// Overrides the number of worker threads
pub const ENV_THREADS: &str = "STREAM_COMPACTION_THREADS";

/// Overrides [`DEFAULT_MEMORY_LIMIT_BYTES`]
pub const ENV_MEMORY_LIMIT: &str = "STREAM_COMPACTION_MEMORY_LIMIT";

//! Error types for device operations

/// Errors that abort a scan or compaction
///
/// Every variant is fatal for the call that produced it. No partial result
/// is valid and the contents of the caller's output slice are unspecified.
#[derive(Debug, thiserror::Error)]
pub enum CompactionError {
    /// Device memory could not be obtained
    #[error("device allocation of {requested} bytes failed ({available} bytes available)")]
    AllocationFailure { requested: usize, available: usize },

    /// A kernel could not be launched or aborted while running
    #[error("kernel `{kernel}` failed: {reason}")]
    LaunchFailure {
        kernel: &'static str,
        reason: String,
    },

    /// The worker pool backing the device could not be built
    #[error("device initialisation failed: {0}")]
    DeviceInit(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for device operations
pub type Result<T> = std::result::Result<T, CompactionError>;

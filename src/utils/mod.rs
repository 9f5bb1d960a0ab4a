//! Bit-length helpers used to size the scan working buffer

pub mod timer;

pub use timer::PerformanceTimer;

/// Floor of log2(n)
///
/// `n` must be at least 1.
pub fn ilog2(n: usize) -> u32 {
    debug_assert!(n >= 1, "ilog2 is undefined for 0");
    usize::BITS - 1 - n.leading_zeros()
}

/// Ceiling of log2(n)
///
/// Equal to [`ilog2`] when `n` is a power of two, one more otherwise.
/// `n` must be at least 1.
pub fn ilog2ceil(n: usize) -> u32 {
    if n.is_power_of_two() {
        ilog2(n)
    } else {
        ilog2(n) + 1
    }
}

/// Length of the working buffer for a scan over `n` elements
///
/// `n` itself when it is a power of two, otherwise the next power of two.
pub fn padded_length(n: usize) -> usize {
    1 << ilog2ceil(n)
}

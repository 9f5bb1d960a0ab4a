//! # Stream Compaction
//!
//! Work-efficient parallel prefix sum and stream compaction for integer
//! arrays, executed on a GPU-style grid of lightweight workers.
//!
//! ## Overview
//!
//! - **Scan**: Blelloch's up-sweep / down-sweep over a buffer padded to a
//!   power of two. O(n) total additions in O(log n) parallel phases.
//! - **Compaction**: map each element to a keep flag, scan the flags to get
//!   destination offsets, scatter the kept elements. Zeros are dropped and
//!   the survivors keep their relative order.
//!
//! ## Execution Model
//!
//! A [`Device`] owns a Rayon worker pool and accounts for the memory held by
//! its [`DeviceBuffer`]s. Every algorithm phase is a kernel launch over a
//! grid of blocks, and a launch returns only when all of its workers are
//! done, so consecutive phases never race.
//!
//! ## Implementations
//!
//! - [`efficient`]: the work-efficient scan and compaction
//! - [`naive`]: the O(n log n) Hillis–Steele scan, for comparison
//! - [`cpu`]: sequential reference versions
//!
//! ## Usage
//!
//! ```
//! use stream_compaction::{efficient, Device, DeviceConfig, PerformanceTimer};
//!
//! let device = Device::new(DeviceConfig::default())?;
//! let input = [1, 2, 3, 0, 4];
//!
//! let mut scanned = [0; 5];
//! let mut timer = PerformanceTimer::new();
//! efficient::scan(&device, input.len(), &mut scanned, &input, Some(&mut timer))?;
//! assert_eq!(scanned, [0, 1, 3, 6, 6]);
//!
//! let mut compacted = [0; 5];
//! let count = efficient::compact(&device, input.len(), &mut compacted, &input, None)?;
//! assert_eq!(&compacted[..count], &[1, 2, 3, 4]);
//! # Ok::<(), stream_compaction::CompactionError>(())
//! ```

pub mod constants;
pub mod cpu;
pub mod device;
pub mod efficient;
pub mod error;
pub mod kernels;
pub mod naive;
pub mod utils;

// Re-export primary components
pub use device::{Device, DeviceBuffer, DeviceConfig, Element, LaunchConfig};
pub use error::{CompactionError, Result};
pub use utils::{ilog2, ilog2ceil, padded_length, PerformanceTimer};

/// Version information for the stream compaction library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

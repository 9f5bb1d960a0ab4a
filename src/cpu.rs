//! Sequential reference implementations
//!
//! Simple single-threaded loops providing a baseline for correctness testing
//! and performance comparison against the parallel versions.

use crate::device::Element;
use crate::utils::PerformanceTimer;

/// Exclusive prefix sum: `odata[0] = 0`, `odata[i] = odata[i-1] + idata[i-1]`
pub fn scan<T: Element>(
    n: usize,
    odata: &mut [T],
    idata: &[T],
    timer: Option<&mut PerformanceTimer>,
) {
    match timer {
        Some(timer) => timer.time(|| exclusive_scan(&mut odata[..n], &idata[..n])),
        None => exclusive_scan(&mut odata[..n], &idata[..n]),
    }
}

fn exclusive_scan<T: Element>(odata: &mut [T], idata: &[T]) {
    let mut sum = T::zero();
    for (out, &value) in odata.iter_mut().zip(idata) {
        *out = sum;
        sum = sum.wrapping_add(&value);
    }
}

/// Keep the nonzero elements of `idata[..n]` in a single pass
///
/// Returns the number of elements written to the front of `odata`.
pub fn compact_without_scan<T: Element>(n: usize, odata: &mut [T], idata: &[T]) -> usize {
    let mut count = 0;
    for &value in &idata[..n] {
        if !value.is_zero() {
            odata[count] = value;
            count += 1;
        }
    }
    count
}

/// Keep the nonzero elements of `idata[..n]` by map, scan and scatter
///
/// Mirrors the structure of the parallel compaction one step at a time.
pub fn compact_with_scan<T: Element>(n: usize, odata: &mut [T], idata: &[T]) -> usize {
    let bools: Vec<usize> = idata[..n]
        .iter()
        .map(|value| usize::from(!value.is_zero()))
        .collect();

    let mut indices = vec![0usize; n];
    exclusive_scan(&mut indices, &bools);

    for i in 0..n {
        if bools[i] == 1 {
            odata[indices[i]] = idata[i];
        }
    }

    match (indices.last(), bools.last()) {
        (Some(&last_index), Some(&last_bool)) => last_index + last_bool,
        _ => 0,
    }
}

//! Naive parallel scan (Hillis–Steele)
//!
//! Every pass adds the element `2^(d-1)` positions to the left into each
//! element, ping-ponging between two buffers. That is O(n log n) additions,
//! the baseline the work-efficient scan improves on.

use rayon::prelude::*;

use crate::device::{Device, DeviceBuffer, Element};
use crate::error::Result;
use crate::utils::{ilog2ceil, PerformanceTimer};

/// Exclusive prefix sum of `idata[..n]` into `odata[..n]`
///
/// When a timer is supplied it measures only the device passes.
#[tracing::instrument(level = "debug", skip_all, fields(n = n))]
pub fn scan<T: Element>(
    device: &Device,
    n: usize,
    odata: &mut [T],
    idata: &[T],
    timer: Option<&mut PerformanceTimer>,
) -> Result<()> {
    assert!(n >= 1, "scan requires at least one element");
    assert!(idata.len() >= n && odata.len() >= n, "slices shorter than n");

    let mut ping = device.alloc::<T>(n)?;
    let mut pong = device.alloc::<T>(n)?;
    ping.copy_from_host(&idata[..n]);

    let (src, dst) = (&mut ping, &mut pong);
    let result = match timer {
        Some(timer) => timer.time(move || run_passes(device, n, src, dst))?,
        None => run_passes(device, n, src, dst)?,
    };

    result.copy_to_host(&mut odata[..n]);
    Ok(())
}

/// Returns the buffer holding the exclusive scan
fn run_passes<'a, 'd, T: Element>(
    device: &Device,
    n: usize,
    mut src: &'a mut DeviceBuffer<'d, T>,
    mut dst: &'a mut DeviceBuffer<'d, T>,
) -> Result<&'a DeviceBuffer<'d, T>> {
    let passes = ilog2ceil(n);
    tracing::debug!(passes, "naive scan");

    for d in 1..=passes {
        let offset = 1usize << (d - 1);
        inclusive_pass(device, offset, src, dst)?;
        std::mem::swap(&mut src, &mut dst);
    }

    shift_right(device, src, dst)?;
    Ok(&*dst)
}

fn inclusive_pass<T: Element>(
    device: &Device,
    offset: usize,
    src: &DeviceBuffer<'_, T>,
    dst: &mut DeviceBuffer<'_, T>,
) -> Result<()> {
    let input = src.as_slice();
    let output = dst.as_mut_slice();
    let workers = output.len();

    device.launch("kern_naive_scan", workers, |launch| {
        output
            .par_iter_mut()
            .with_min_len(launch.block_dim)
            .enumerate()
            .for_each(|(k, x)| {
                *x = if k >= offset {
                    input[k - offset].wrapping_add(&input[k])
                } else {
                    input[k]
                };
            });
    })
}

/// Turn an inclusive scan into an exclusive one
fn shift_right<T: Element>(
    device: &Device,
    src: &DeviceBuffer<'_, T>,
    dst: &mut DeviceBuffer<'_, T>,
) -> Result<()> {
    let input = src.as_slice();
    let output = dst.as_mut_slice();
    let workers = output.len();

    device.launch("kern_shift_right", workers, |launch| {
        output
            .par_iter_mut()
            .with_min_len(launch.block_dim)
            .enumerate()
            .for_each(|(k, x)| *x = if k == 0 { T::zero() } else { input[k - 1] });
    })
}

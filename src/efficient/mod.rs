//! # Work-Efficient Scan and Stream Compaction
//!
//! Blelloch's scan runs an up-sweep that reduces the input into a tree of
//! partial sums, clears the root, then a down-sweep that pushes the sums
//! back down. Over a buffer padded to a power of two this is O(n) additions
//! in O(log n) launches.
//!
//! Compaction maps the input to 0/1 flags, scans the flags to obtain each
//! survivor's destination and scatters the survivors there.

mod sweep;

use crate::device::{Device, DeviceBuffer, Element};
use crate::error::Result;
use crate::kernels;
use crate::utils::{ilog2, padded_length, PerformanceTimer};

/// Exclusive prefix sum of `idata[..n]` into `odata[..n]`
///
/// When a timer is supplied it measures only the sweep phases.
///
/// # Examples
///
/// ```
/// use stream_compaction::{efficient, Device, DeviceConfig};
///
/// let device = Device::new(DeviceConfig::default())?;
/// let input = [1, 2, 3, 0, 4];
/// let mut output = [0; 5];
/// efficient::scan(&device, 5, &mut output, &input, None)?;
/// assert_eq!(output, [0, 1, 3, 6, 6]);
/// # Ok::<(), stream_compaction::CompactionError>(())
/// ```
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

    let mut buffer = padded_buffer(device, n)?;
    buffer.copy_from_host(&idata[..n]);

    match timer {
        Some(timer) => timer.time(|| scan_in_place(device, &mut buffer))?,
        None => scan_in_place(device, &mut buffer)?,
    }

    buffer.copy_to_host(&mut odata[..n]);
    Ok(())
}

/// Exclusive prefix sum between two device buffers, untimed
pub fn scan_device<T: Element>(
    device: &Device,
    n: usize,
    odata: &mut DeviceBuffer<'_, T>,
    idata: &DeviceBuffer<'_, T>,
) -> Result<()> {
    let mut buffer = padded_buffer(device, n)?;
    buffer.copy_from_device(idata, n);
    scan_in_place(device, &mut buffer)?;
    odata.copy_from_device(&buffer, n);
    Ok(())
}

/// Run the up-sweep, root clear and down-sweep over a power-of-two buffer
pub fn scan_in_place<T: Element>(device: &Device, buffer: &mut DeviceBuffer<'_, T>) -> Result<()> {
    let len = buffer.len();
    assert!(len.is_power_of_two(), "scan buffer length {len} is not a power of two");

    let levels = ilog2(len);
    tracing::debug!(len, levels, "sweeping");

    for depth in 0..levels {
        sweep::up_sweep(device, buffer, depth)?;
    }
    buffer.write(len - 1, T::zero());
    for depth in (0..levels).rev() {
        sweep::down_sweep(device, buffer, depth)?;
    }
    Ok(())
}

/// Allocate the working buffer for `n` elements with its padding zeroed
fn padded_buffer<T: Element>(device: &Device, n: usize) -> Result<DeviceBuffer<'_, T>> {
    let len = padded_length(n);
    let mut buffer = device.alloc::<T>(len)?;
    if len != n {
        sweep::pad(device, &mut buffer, n)?;
    }
    Ok(buffer)
}

/// Pack the nonzero elements of `idata[..n]` into the front of `odata`
///
/// Returns the number of elements kept. Only `odata[..count]` is meaningful.
///
/// Every device buffer, including the padded scan buffer for the flags, is
/// allocated before the timer starts. A supplied timer measures the map,
/// the flag scan and the scatter.
///
/// # Examples
///
/// ```
/// use stream_compaction::{efficient, Device, DeviceConfig};
///
/// let device = Device::new(DeviceConfig::default())?;
/// let input = [0, 1, 0, 2];
/// let mut output = [0; 4];
/// let count = efficient::compact(&device, 4, &mut output, &input, None)?;
/// assert_eq!(&output[..count], &[1, 2]);
/// # Ok::<(), stream_compaction::CompactionError>(())
/// ```
#[tracing::instrument(level = "debug", skip_all, fields(n = n))]
pub fn compact<T: Element>(
    device: &Device,
    n: usize,
    odata: &mut [T],
    idata: &[T],
    timer: Option<&mut PerformanceTimer>,
) -> Result<usize> {
    assert!(n >= 1, "compact requires at least one element");
    assert!(idata.len() >= n && odata.len() >= n, "slices shorter than n");

    let mut bools = device.alloc::<usize>(n)?;
    // Scanned in place, so it carries the padding of the flag scan
    let mut indices = device.alloc::<usize>(padded_length(n))?;
    let mut input = device.alloc::<T>(n)?;
    let mut output = device.alloc::<T>(n)?;
    input.copy_from_host(&idata[..n]);

    match timer {
        Some(timer) => timer.time(|| {
            compact_on_device(device, n, &input, &mut bools, &mut indices, &mut output)
        })?,
        None => compact_on_device(device, n, &input, &mut bools, &mut indices, &mut output)?,
    }

    output.copy_to_host(&mut odata[..n]);

    // The exclusive scan does not count the last element itself.
    let last_index = indices.read(n - 1);
    let count = if bools.read(n - 1) == 1 {
        last_index + 1
    } else {
        last_index
    };

    tracing::debug!(count, "compaction finished");
    Ok(count)
}

fn compact_on_device<T: Element>(
    device: &Device,
    n: usize,
    input: &DeviceBuffer<'_, T>,
    bools: &mut DeviceBuffer<'_, usize>,
    indices: &mut DeviceBuffer<'_, usize>,
    output: &mut DeviceBuffer<'_, T>,
) -> Result<()> {
    kernels::map_to_boolean(device, n, bools, input)?;
    indices.copy_from_device(bools, n);
    if indices.len() != n {
        sweep::pad(device, indices, n)?;
    }
    scan_in_place(device, indices)?;
    kernels::scatter(device, n, output, input, bools, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceConfig;

    fn device() -> Device {
        Device::new(DeviceConfig::default().with_threads(2).with_block_size(4)).unwrap()
    }

    #[test]
    fn test_scan_in_place_matches_classic_example() {
        let device = device();
        let mut buffer = device.alloc::<i32>(8).unwrap();
        buffer.copy_from_host(&[3, 1, 7, 0, 4, 1, 6, 3]);

        scan_in_place(&device, &mut buffer).unwrap();

        let mut out = [0; 8];
        buffer.copy_to_host(&mut out);
        assert_eq!(out, [0, 3, 4, 11, 11, 15, 16, 22]);
    }

    #[test]
    fn test_scan_device_non_power_of_two() {
        let device = device();
        let mut input = device.alloc::<usize>(5).unwrap();
        input.copy_from_host(&[1, 0, 1, 1, 0]);
        let mut output = device.alloc::<usize>(5).unwrap();

        scan_device(&device, 5, &mut output, &input).unwrap();

        let mut out = [0usize; 5];
        output.copy_to_host(&mut out);
        assert_eq!(out, [0, 1, 1, 2, 3]);
    }

    #[test]
    fn test_buffers_released_after_compact() {
        let device = device();
        let input = [4, 0, 0, 9, 1];
        let mut output = [0; 5];

        let count = compact(&device, 5, &mut output, &input, None).unwrap();
        assert_eq!(count, 3);
        assert_eq!(device.allocated_bytes(), 0);
    }

    #[test]
    fn test_compact_fits_in_its_own_buffers() {
        // Mask, padded indices and the two data buffers, nothing more
        let n = 60;
        let limit = (n + padded_length(n)) * std::mem::size_of::<usize>()
            + 2 * n * std::mem::size_of::<i32>();
        let device =
            Device::new(DeviceConfig::default().with_threads(2).with_memory_limit(limit)).unwrap();
        let input: Vec<i32> = (0..n as i32).map(|i| i % 3).collect();
        let mut output = vec![0; n];
        let mut timer = PerformanceTimer::new();

        let count = compact(&device, n, &mut output, &input, Some(&mut timer)).unwrap();
        assert_eq!(count, 40);
        assert!(timer.elapsed().is_some());
        assert_eq!(device.allocated_bytes(), 0);
    }

    #[test]
    fn test_scan_wraps_on_overflow() {
        let device = device();
        let input = [i8::MAX, 1, 1];
        let mut output = [0i8; 3];

        scan(&device, 3, &mut output, &input, None).unwrap();
        assert_eq!(output, [0, i8::MAX, i8::MIN]);
    }
}

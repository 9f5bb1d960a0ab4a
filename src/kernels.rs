//! Element-wise kernels shared by the compaction paths
//!
//! - [`map_to_boolean`] flags the elements that survive compaction
//! - [`scatter`] moves survivors to the offsets given by the scanned flags

use std::marker::PhantomData;

use rayon::prelude::*;

use crate::device::{Device, DeviceBuffer, Element};
use crate::error::{CompactionError, Result};

const SCATTER: &str = "kern_scatter";

/// `bools[i] = 1` if `idata[i]` is nonzero, `0` otherwise, for `i < n`
pub fn map_to_boolean<T: Element>(
    device: &Device,
    n: usize,
    bools: &mut DeviceBuffer<'_, usize>,
    idata: &DeviceBuffer<'_, T>,
) -> Result<()> {
    let flags = &mut bools.as_mut_slice()[..n];
    let values = &idata.as_slice()[..n];

    device.launch("kern_map_to_boolean", n, |launch| {
        flags
            .par_iter_mut()
            .zip(values.par_iter())
            .with_min_len(launch.block_dim)
            .for_each(|(flag, value)| *flag = usize::from(!value.is_zero()));
    })
}

/// `odata[indices[i]] = idata[i]` for every `i < n` with `bools[i] == 1`
///
/// `indices` must be the exclusive scan of `bools`. That makes the
/// destinations of kept elements strictly increasing, so no two workers
/// write the same slot and survivors keep their relative order.
///
/// # Errors
///
/// Returns [`CompactionError::LaunchFailure`] without writing anything when
/// `indices[..n]` does not chain as `indices[i + 1] == indices[i] + bools[i]`
/// or when the kept offsets run past the end of `odata`.
pub fn scatter<T: Element>(
    device: &Device,
    n: usize,
    odata: &mut DeviceBuffer<'_, T>,
    idata: &DeviceBuffer<'_, T>,
    bools: &DeviceBuffer<'_, usize>,
    indices: &DeviceBuffer<'_, usize>,
) -> Result<()> {
    let target = ScatterTarget::new(odata.as_mut_slice());
    let len = target.len;
    let values = &idata.as_slice()[..n];
    let flags = &bools.as_slice()[..n];
    let offsets = &indices.as_slice()[..n];

    if let Err(reason) = device.install(|| check_offsets(flags, offsets, len)) {
        tracing::warn!(kernel = SCATTER, %reason, "launch rejected");
        return Err(CompactionError::LaunchFailure {
            kernel: SCATTER,
            reason,
        });
    }

    device.launch(SCATTER, n, |launch| {
        values
            .par_iter()
            .zip(flags.par_iter())
            .zip(offsets.par_iter())
            .with_min_len(launch.block_dim)
            .for_each(|((&value, &flag), &offset)| {
                if flag == 1 {
                    target.write(offset, value);
                }
            });
    })
}

/// Every kept element must get its own in-bounds slot in an output of `len`
fn check_offsets(
    flags: &[usize],
    offsets: &[usize],
    len: usize,
) -> std::result::Result<(), String> {
    let (Some(&last_offset), Some(&last_flag)) = (offsets.last(), flags.last()) else {
        return Ok(());
    };

    let chained = offsets
        .par_windows(2)
        .zip(flags.par_iter())
        .all(|(pair, &flag)| pair[0].checked_add(flag) == Some(pair[1]));
    if !chained {
        return Err("indices are not the exclusive scan of the flags".to_string());
    }

    match last_offset.checked_add(last_flag) {
        Some(end) if end <= len => Ok(()),
        _ => Err(format!("scatter offsets exceed output length {len}")),
    }
}

/// Output slice shared by scatter workers, each writing its own slot
struct ScatterTarget<'a, T> {
    ptr: *mut T,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

// SAFETY: `scatter` checks before launching that kept offsets are distinct,
// so workers write through the pointer only at distinct offsets, and the
// borrow of the slice outlives the launch.
unsafe impl<T: Send> Send for ScatterTarget<'_, T> {}
unsafe impl<T: Send> Sync for ScatterTarget<'_, T> {}

impl<'a, T> ScatterTarget<'a, T> {
    fn new(slice: &'a mut [T]) -> Self {
        Self {
            ptr: slice.as_mut_ptr(),
            len: slice.len(),
            _marker: PhantomData,
        }
    }

    fn write(&self, offset: usize, value: T) {
        assert!(offset < self.len, "scatter offset {offset} out of bounds ({})", self.len);
        // SAFETY: in bounds by the assert above. `check_offsets` ran before
        // the launch, so distinct workers use distinct offsets.
        unsafe { self.ptr.add(offset).write(value) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceConfig;

    fn device() -> Device {
        Device::new(DeviceConfig::default().with_threads(2).with_block_size(2)).unwrap()
    }

    #[test]
    fn test_map_to_boolean() {
        let device = device();
        let mut input = device.alloc::<i32>(6).unwrap();
        input.copy_from_host(&[0, 3, -1, 0, 0, 7]);
        let mut bools = device.alloc::<usize>(6).unwrap();

        map_to_boolean(&device, 6, &mut bools, &input).unwrap();

        let mut flags = [0usize; 6];
        bools.copy_to_host(&mut flags);
        assert_eq!(flags, [0, 1, 1, 0, 0, 1]);
    }

    #[test]
    fn test_scatter_packs_kept_elements() {
        let device = device();
        let mut input = device.alloc::<i32>(6).unwrap();
        input.copy_from_host(&[0, 3, -1, 0, 0, 7]);
        let mut bools = device.alloc::<usize>(6).unwrap();
        bools.copy_from_host(&[0, 1, 1, 0, 0, 1]);
        let mut indices = device.alloc::<usize>(6).unwrap();
        indices.copy_from_host(&[0, 0, 1, 2, 2, 2]);
        let mut output = device.alloc::<i32>(6).unwrap();

        scatter(&device, 6, &mut output, &input, &bools, &indices).unwrap();

        let mut packed = [0i32; 3];
        output.copy_to_host(&mut packed);
        assert_eq!(packed, [3, -1, 7]);
    }

    #[test]
    fn test_scatter_rejects_colliding_offsets() {
        // Every element kept but every offset zero: all workers would hit slot 0
        let n = 1 << 16;
        let device =
            Device::new(DeviceConfig::default().with_threads(8).with_block_size(1)).unwrap();
        let mut input = device.alloc::<i32>(n).unwrap();
        input.copy_from_host(&vec![5; n]);
        let mut bools = device.alloc::<usize>(n).unwrap();
        bools.copy_from_host(&vec![1; n]);
        let indices = device.alloc::<usize>(n).unwrap();
        let mut output = device.alloc::<i32>(n).unwrap();

        let result = scatter(&device, n, &mut output, &input, &bools, &indices);
        match result {
            Err(CompactionError::LaunchFailure { kernel, .. }) => assert_eq!(kernel, SCATTER),
            other => panic!("expected launch failure, got {:?}", other),
        }

        let mut untouched = vec![1i32; n];
        output.copy_to_host(&mut untouched);
        assert!(untouched.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_scatter_rejects_offsets_past_output() {
        let device = device();
        let mut input = device.alloc::<i32>(4).unwrap();
        input.copy_from_host(&[1, 2, 3, 4]);
        let mut bools = device.alloc::<usize>(4).unwrap();
        bools.copy_from_host(&[1, 1, 1, 1]);
        let mut indices = device.alloc::<usize>(4).unwrap();
        indices.copy_from_host(&[0, 1, 2, 3]);
        let mut output = device.alloc::<i32>(3).unwrap();

        let result = scatter(&device, 4, &mut output, &input, &bools, &indices);
        assert!(matches!(result, Err(CompactionError::LaunchFailure { .. })));

        // The same offsets shifted by one overflow the output as well
        indices.copy_from_host(&[1, 2, 3, 4]);
        let mut wide = device.alloc::<i32>(4).unwrap();
        let result = scatter(&device, 4, &mut wide, &input, &bools, &indices);
        assert!(matches!(result, Err(CompactionError::LaunchFailure { .. })));
    }
}

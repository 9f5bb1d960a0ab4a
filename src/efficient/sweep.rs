//! Tree kernels of the work-efficient scan
//!
//! The working buffer is an implicit balanced binary tree over a
//! power-of-two length. At depth `d` the active nodes are the buffer chunks
//! of length `2^(d+1)`: worker `i` owns the chunk starting at `i * 2^(d+1)`,
//! its left child sum sits at the chunk's midpoint minus one and its own sum
//! at the chunk's last element. Chunks are disjoint, so workers of one launch
//! never touch each other's memory.

use rayon::prelude::*;

use crate::device::{Device, DeviceBuffer, Element};
use crate::error::Result;

/// Zero the padding region `[n, len)` of the working buffer
pub(crate) fn pad<T: Element>(
    device: &Device,
    buffer: &mut DeviceBuffer<'_, T>,
    n: usize,
) -> Result<()> {
    let tail = &mut buffer.as_mut_slice()[n..];
    if tail.is_empty() {
        return Ok(());
    }

    let workers = tail.len();
    device.launch("kern_zero_pad", workers, |launch| {
        tail.par_iter_mut()
            .with_min_len(launch.block_dim)
            .for_each(|x| *x = T::zero());
    })
}

/// One reduce phase at `depth`: `node[2^(d+1) - 1] += node[2^d - 1]`
pub(crate) fn up_sweep<T: Element>(
    device: &Device,
    buffer: &mut DeviceBuffer<'_, T>,
    depth: u32,
) -> Result<()> {
    let half = 1usize << depth;
    let stride = half << 1;
    let data = buffer.as_mut_slice();
    let active = data.len() / stride;

    device.launch("kern_up_sweep", active, |launch| {
        data.par_chunks_mut(stride)
            .with_min_len(launch.block_dim)
            .for_each(|node| {
                let left = node[half - 1];
                node[stride - 1] = node[stride - 1].wrapping_add(&left);
            });
    })
}

/// One distribute phase at `depth`
///
/// The left child takes the parent's value and the parent becomes the sum of
/// its old value and the left child's old value.
pub(crate) fn down_sweep<T: Element>(
    device: &Device,
    buffer: &mut DeviceBuffer<'_, T>,
    depth: u32,
) -> Result<()> {
    let half = 1usize << depth;
    let stride = half << 1;
    let data = buffer.as_mut_slice();
    let active = data.len() / stride;

    device.launch("kern_down_sweep", active, |launch| {
        data.par_chunks_mut(stride)
            .with_min_len(launch.block_dim)
            .for_each(|node| {
                let left = node[half - 1];
                node[half - 1] = node[stride - 1];
                node[stride - 1] = node[stride - 1].wrapping_add(&left);
            });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceConfig;

    fn device() -> Device {
        Device::new(DeviceConfig::default().with_threads(2).with_block_size(2)).unwrap()
    }

    fn contents(buffer: &DeviceBuffer<'_, i32>) -> Vec<i32> {
        let mut out = vec![0; buffer.len()];
        buffer.copy_to_host(&mut out);
        out
    }

    #[test]
    fn test_pad_zeroes_only_the_tail() {
        let device = device();
        let mut buffer = device.alloc::<i32>(8).unwrap();
        buffer.copy_from_host(&[9; 8]);

        pad(&device, &mut buffer, 5).unwrap();
        assert_eq!(contents(&buffer), vec![9, 9, 9, 9, 9, 0, 0, 0]);
    }

    #[test]
    fn test_pad_without_padding_region() {
        let device = device();
        let mut buffer = device.alloc::<i32>(4).unwrap();
        buffer.copy_from_host(&[1, 2, 3, 4]);

        pad(&device, &mut buffer, 4).unwrap();
        assert_eq!(contents(&buffer), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_up_sweep_builds_partial_sums() {
        let device = device();
        let mut buffer = device.alloc::<i32>(8).unwrap();
        buffer.copy_from_host(&[3, 1, 7, 0, 4, 1, 6, 3]);

        for depth in 0..3 {
            up_sweep(&device, &mut buffer, depth).unwrap();
        }
        assert_eq!(contents(&buffer), vec![3, 4, 7, 11, 4, 5, 6, 25]);
    }

    #[test]
    fn test_down_sweep_distributes_sums() {
        let device = device();
        let mut buffer = device.alloc::<i32>(8).unwrap();
        buffer.copy_from_host(&[3, 4, 7, 11, 4, 5, 6, 0]);

        for depth in (0..3).rev() {
            down_sweep(&device, &mut buffer, depth).unwrap();
        }
        assert_eq!(contents(&buffer), vec![0, 3, 4, 11, 11, 15, 16, 22]);
    }
}

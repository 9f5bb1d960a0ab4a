//! Device-resident buffers
//!
//! A [`DeviceBuffer`] is charged against its device's memory limit for as
//! long as it lives and released when dropped, so every intermediate buffer
//! of an operation is freed when the operation returns, on success or error.

use super::{Device, Element};

/// A fixed-length array owned by one operation on a [`Device`]
#[derive(Debug)]
pub struct DeviceBuffer<'d, T: Element> {
    data: Vec<T>,
    bytes: usize,
    device: &'d Device,
}

impl<'d, T: Element> DeviceBuffer<'d, T> {
    pub(super) fn new(device: &'d Device, data: Vec<T>, bytes: usize) -> Self {
        Self {
            data,
            bytes,
            device,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copy `src` from the host into the front of the buffer
    pub fn copy_from_host(&mut self, src: &[T]) {
        assert!(
            src.len() <= self.len(),
            "host copy of {} elements into a buffer of {}",
            src.len(),
            self.len()
        );
        self.data[..src.len()].copy_from_slice(src);
    }

    /// Copy the front of the buffer out to `dst` on the host
    pub fn copy_to_host(&self, dst: &mut [T]) {
        assert!(
            dst.len() <= self.len(),
            "host copy of {} elements out of a buffer of {}",
            dst.len(),
            self.len()
        );
        dst.copy_from_slice(&self.data[..dst.len()]);
    }

    /// Copy the first `len` elements of another device buffer into this one
    pub fn copy_from_device(&mut self, src: &DeviceBuffer<'_, T>, len: usize) {
        assert!(len <= src.len() && len <= self.len());
        self.data[..len].copy_from_slice(&src.data[..len]);
    }

    /// Read back a single element
    pub fn read(&self, index: usize) -> T {
        self.data[index]
    }

    /// Write a single element from the host
    pub fn write(&mut self, index: usize, value: T) {
        self.data[index] = value;
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Element> Drop for DeviceBuffer<'_, T> {
    fn drop(&mut self) {
        self.device.release(self.bytes);
    }
}

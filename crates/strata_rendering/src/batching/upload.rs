//! # Upload Targets
//!
//! The persistent instance buffer the batches are written into.
//!
//! Writers address disjoint byte ranges (one slice per batch), so the only
//! contract is the offset/size check done by every implementation.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{StrataError, StrataResult};

/// A persistent buffer accepting byte writes at fixed offsets.
pub trait UploadTarget {
    /// Total size in bytes.
    fn capacity_bytes(&self) -> u64;

    /// Writes `bytes` at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::UploadOutOfBounds`] if the write does not fit.
    fn write(&mut self, offset: u64, bytes: &[u8]) -> StrataResult<()>;
}

fn check_bounds(offset: u64, len: usize, capacity: u64) -> StrataResult<()> {
    let len = len as u64;
    match offset.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(StrataError::UploadOutOfBounds {
            offset,
            len,
            capacity,
        }),
    }
}

/// CPU-resident upload buffer.
///
/// Cloning shares the same memory, so a host render thread can hold a clone
/// and read while the frame thread writes.
#[derive(Debug, Clone)]
pub struct HostUploadBuffer {
    bytes: Arc<RwLock<Box<[u8]>>>,
}

impl HostUploadBuffer {
    /// Allocates a zeroed buffer of `len` bytes.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            bytes: Arc::new(RwLock::new(vec![0u8; len].into_boxed_slice())),
        }
    }

    /// Runs `f` with read access to the whole buffer.
    pub fn read<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.bytes.read()[..])
    }

    /// Copies `len` bytes starting at `offset`, or `None` if out of range.
    #[must_use]
    pub fn copy_range(&self, offset: usize, len: usize) -> Option<Vec<u8>> {
        let bytes = self.bytes.read();
        bytes.get(offset..offset.checked_add(len)?).map(<[u8]>::to_vec)
    }
}

impl UploadTarget for HostUploadBuffer {
    fn capacity_bytes(&self) -> u64 {
        self.bytes.read().len() as u64
    }

    fn write(&mut self, offset: u64, bytes: &[u8]) -> StrataResult<()> {
        let mut target = self.bytes.write();
        check_bounds(offset, bytes.len(), target.len() as u64)?;
        #[allow(clippy::cast_possible_truncation)]
        let start = offset as usize;
        target[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

/// Creates a storage buffer large enough for `size` bytes of instance data.
#[must_use]
pub fn create_instance_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("strata_instance_buffer"),
        size,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Upload target writing through a `wgpu` queue into one persistent buffer.
#[derive(Debug)]
pub struct WgpuUploadTarget<'a> {
    queue: &'a wgpu::Queue,
    buffer: &'a wgpu::Buffer,
}

impl<'a> WgpuUploadTarget<'a> {
    /// Wraps a queue and the buffer it writes into.
    #[must_use]
    pub const fn new(queue: &'a wgpu::Queue, buffer: &'a wgpu::Buffer) -> Self {
        Self { queue, buffer }
    }
}

impl UploadTarget for WgpuUploadTarget<'_> {
    fn capacity_bytes(&self) -> u64 {
        self.buffer.size()
    }

    fn write(&mut self, offset: u64, bytes: &[u8]) -> StrataResult<()> {
        check_bounds(offset, bytes.len(), self.buffer.size())?;
        if !bytes.is_empty() {
            self.queue.write_buffer(self.buffer, offset, bytes);
        }
        Ok(())
    }
}

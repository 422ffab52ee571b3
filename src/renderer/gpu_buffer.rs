//! Typed storage buffers that only reallocate when their shape changes.
//!
//! [`GpuBuffer::ensure`] keeps an allocation alive across rebuilds as long as
//! the element count and stride stay the same, re-uploading the contents every
//! time. Empty data releases the buffer: there are no zero-length allocations,
//! and an absent buffer reads as `None` from [`GpuBuffer::get`].
//!
//! Updates can be split into [`GpuBuffer::stage`] (fallible, allocates but
//! installs nothing) and [`GpuBuffer::commit`] (infallible) so a set of
//! buffers can be swapped all-or-nothing.

use std::marker::PhantomData;
use std::mem;

use bytemuck::Pod;

use crate::error::{Result, TracerError};

/// Allocation and upload primitives the buffer policy runs on.
pub trait BufferBackend {
    type Buffer;

    fn allocate(&self, label: &'static str, count: usize, stride: u64) -> Result<Self::Buffer>;

    fn upload(&self, buffer: &Self::Buffer, bytes: &[u8]);
}

/// [`BufferBackend`] over a wgpu device and queue.
pub struct WgpuBackend<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    usage: wgpu::BufferUsages,
}

impl<'a> WgpuBackend<'a> {
    pub fn storage(device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        }
    }
}

impl BufferBackend for WgpuBackend<'_> {
    type Buffer = wgpu::Buffer;

    fn allocate(&self, label: &'static str, count: usize, stride: u64) -> Result<wgpu::Buffer> {
        let bytes = count as u64 * stride;
        let limits = self.device.limits();
        let max = if self.usage.contains(wgpu::BufferUsages::STORAGE) {
            (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size)
        } else {
            limits.max_buffer_size
        };
        if bytes > max {
            return Err(TracerError::BufferAllocationFailure {
                label,
                bytes,
                reason: format!("exceeds device limit of {} bytes", max),
            });
        }

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: bytes,
            usage: self.usage,
            mapped_at_creation: false,
        });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(TracerError::BufferAllocationFailure {
                label,
                bytes,
                reason: err.to_string(),
            });
        }

        log::info!("Allocated {}: {} x {} bytes", label, count, stride);
        Ok(buffer)
    }

    fn upload(&self, buffer: &wgpu::Buffer, bytes: &[u8]) {
        self.queue.write_buffer(buffer, 0, bytes);
    }
}

struct Allocation<B> {
    buffer: B,
    count: usize,
    stride: u64,
}

enum Plan<B> {
    Release,
    Reuse,
    Replace(Allocation<B>),
}

/// A prepared update, produced by [`GpuBuffer::stage`].
pub struct Staged<'d, T, B> {
    plan: Plan<B>,
    data: &'d [T],
    stride: u64,
}

pub struct GpuBuffer<T, B = wgpu::Buffer> {
    label: &'static str,
    slot: Option<Allocation<B>>,
    allocations: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Pod, B> GpuBuffer<T, B> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            slot: None,
            allocations: 0,
            _marker: PhantomData,
        }
    }

    /// Uploads `data` with the natural stride of `T`.
    pub fn ensure<K>(&mut self, backend: &K, data: &[T]) -> Result<()>
    where
        K: BufferBackend<Buffer = B>,
    {
        self.ensure_with_stride(backend, data, mem::size_of::<T>() as u64)
    }

    /// Uploads `data` with each element padded out to `stride` bytes.
    pub fn ensure_with_stride<K>(&mut self, backend: &K, data: &[T], stride: u64) -> Result<()>
    where
        K: BufferBackend<Buffer = B>,
    {
        let staged = self.stage(backend, data, stride)?;
        self.commit(backend, staged);
        Ok(())
    }

    /// Decides how to satisfy the request and allocates if needed, without
    /// touching the current allocation.
    pub fn stage<'d, K>(&self, backend: &K, data: &'d [T], stride: u64) -> Result<Staged<'d, T, B>>
    where
        K: BufferBackend<Buffer = B>,
    {
        let element = mem::size_of::<T>() as u64;
        if stride < element {
            return Err(TracerError::BufferAllocationFailure {
                label: self.label,
                bytes: data.len() as u64 * stride,
                reason: format!("stride {} is smaller than element size {}", stride, element),
            });
        }

        let plan = if data.is_empty() {
            Plan::Release
        } else {
            match &self.slot {
                Some(current) if current.count == data.len() && current.stride == stride => {
                    Plan::Reuse
                }
                _ => Plan::Replace(Allocation {
                    buffer: backend.allocate(self.label, data.len(), stride)?,
                    count: data.len(),
                    stride,
                }),
            }
        };

        Ok(Staged { plan, data, stride })
    }

    /// Installs a staged update and uploads its contents.
    pub fn commit<K>(&mut self, backend: &K, staged: Staged<'_, T, B>)
    where
        K: BufferBackend<Buffer = B>,
    {
        match staged.plan {
            Plan::Release => {
                if self.slot.take().is_some() {
                    log::info!("Released {}", self.label);
                }
                return;
            }
            Plan::Reuse => {}
            Plan::Replace(allocation) => {
                self.slot = Some(allocation);
                self.allocations += 1;
            }
        }

        if let Some(current) = &self.slot {
            upload_strided(backend, &current.buffer, staged.data, staged.stride);
        }
    }

    /// The live buffer, or `None` when absent.
    pub fn get(&self) -> Option<&B> {
        self.slot.as_ref().map(|a| &a.buffer)
    }

    pub fn len(&self) -> usize {
        self.slot.as_ref().map_or(0, |a| a.count)
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    pub fn stride(&self) -> Option<u64> {
        self.slot.as_ref().map(|a| a.stride)
    }

    /// Number of allocations installed over the buffer's lifetime.
    pub fn allocations(&self) -> u64 {
        self.allocations
    }
}

fn upload_strided<T: Pod, K: BufferBackend>(backend: &K, buffer: &K::Buffer, data: &[T], stride: u64) {
    let element = mem::size_of::<T>();
    if stride as usize == element {
        backend.upload(buffer, bytemuck::cast_slice(data));
        return;
    }

    let mut bytes = vec![0u8; data.len() * stride as usize];
    for (chunk, item) in bytes.chunks_exact_mut(stride as usize).zip(data) {
        chunk[..element].copy_from_slice(bytemuck::bytes_of(item));
    }
    backend.upload(buffer, &bytes);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Backend that hands out ids and records every upload.
    #[derive(Default)]
    pub(crate) struct RecordingBackend {
        pub next_id: RefCell<u32>,
        pub uploads: RefCell<Vec<(u32, Vec<u8>)>>,
        pub fail: bool,
    }

    impl BufferBackend for RecordingBackend {
        type Buffer = u32;

        fn allocate(&self, label: &'static str, count: usize, stride: u64) -> Result<u32> {
            if self.fail {
                return Err(TracerError::BufferAllocationFailure {
                    label,
                    bytes: count as u64 * stride,
                    reason: "out of memory".into(),
                });
            }
            let mut next = self.next_id.borrow_mut();
            *next += 1;
            Ok(*next)
        }

        fn upload(&self, buffer: &u32, bytes: &[u8]) {
            self.uploads.borrow_mut().push((*buffer, bytes.to_vec()));
        }
    }

    #[test]
    fn same_shape_reuses_allocation_but_uploads_new_contents() {
        let backend = RecordingBackend::default();
        let mut buffer: GpuBuffer<u32, u32> = GpuBuffer::new("Test");

        buffer.ensure(&backend, &[1, 2, 3]).unwrap();
        buffer.ensure(&backend, &[7, 8, 9]).unwrap();

        assert_eq!(buffer.allocations(), 1);
        let uploads = backend.uploads.borrow();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].0, uploads[1].0);
        assert_eq!(uploads[1].1, bytemuck::cast_slice::<u32, u8>(&[7, 8, 9]));
    }

    #[test]
    fn count_or_stride_change_reallocates() {
        let backend = RecordingBackend::default();
        let mut buffer: GpuBuffer<u32, u32> = GpuBuffer::new("Test");

        buffer.ensure(&backend, &[1, 2]).unwrap();
        buffer.ensure(&backend, &[1, 2, 3]).unwrap();
        assert_eq!(buffer.allocations(), 2);

        buffer.ensure_with_stride(&backend, &[1, 2, 3], 16).unwrap();
        assert_eq!(buffer.allocations(), 3);
        assert_eq!(buffer.stride(), Some(16));
        assert_eq!(backend.uploads.borrow().last().unwrap().1.len(), 48);
    }

    #[test]
    fn empty_data_releases_instead_of_allocating() {
        let backend = RecordingBackend::default();
        let mut buffer: GpuBuffer<u32, u32> = GpuBuffer::new("Test");

        buffer.ensure(&backend, &[]).unwrap();
        assert!(buffer.get().is_none());
        assert_eq!(buffer.allocations(), 0);

        buffer.ensure(&backend, &[5]).unwrap();
        assert!(buffer.get().is_some());
        buffer.ensure(&backend, &[]).unwrap();
        assert!(buffer.get().is_none());
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn failed_stage_keeps_previous_allocation() {
        let mut backend = RecordingBackend::default();
        let mut buffer: GpuBuffer<u32, u32> = GpuBuffer::new("Test");
        buffer.ensure(&backend, &[1]).unwrap();

        backend.fail = true;
        let err = buffer.ensure(&backend, &[1, 2]).unwrap_err();

        assert!(matches!(err, TracerError::BufferAllocationFailure { .. }));
        assert_eq!(buffer.get(), Some(&1));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn stride_smaller_than_element_is_rejected() {
        let backend = RecordingBackend::default();
        let buffer: GpuBuffer<u32, u32> = GpuBuffer::new("Test");
        assert!(buffer.stage(&backend, &[1], 2).is_err());
    }
}

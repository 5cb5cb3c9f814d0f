//! Staging buffers for block, inode and directory reads.
//!
//! Every read operation borrows its buffers from a `BufferAllocator` and
//! hands them back when the `Buffer` guard is dropped, on success and on
//! every early error return alike.

use crate::prelude::*;
use core::ops::{Deref, DerefMut};

/// Source of raw staging memory. Running out is a recoverable condition.
pub trait BufferAllocator: Send + Sync + Debug {
    /// Obtain a zeroed buffer of exactly `size` bytes.
    fn allocate(&self, size: usize) -> Option<Vec<u8>>;
    /// Return a buffer obtained from `allocate`.
    fn release(&self, buf: Vec<u8>);
}

/// Allocates from the global heap, reporting failure instead of aborting.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAllocator;

impl BufferAllocator for HeapAllocator {
    fn allocate(&self, size: usize) -> Option<Vec<u8>> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(size).ok()?;
        buf.resize(size, 0);
        Some(buf)
    }

    fn release(&self, buf: Vec<u8>) {
        drop(buf);
    }
}

/// A staging buffer owned by one operation.
pub struct Buffer<'a> {
    data: Vec<u8>,
    allocator: &'a dyn BufferAllocator,
}

impl<'a> Buffer<'a> {
    /// Allocate `size` bytes from `allocator`, failing with `ENOMEM`.
    pub fn alloc(allocator: &'a dyn BufferAllocator, size: usize) -> Result<Self> {
        match allocator.allocate(size) {
            Some(data) => Ok(Self { data, allocator }),
            None => {
                error!("Cannot allocate a {} byte staging buffer", size);
                return_error!(ErrCode::ENOMEM, "Cannot allocate {} bytes", size)
            }
        }
    }
}

impl Deref for Buffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for Buffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for Buffer<'_> {
    fn drop(&mut self) {
        self.allocator.release(core::mem::take(&mut self.data));
    }
}

impl Debug for Buffer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Buffer {{ len: {} }}", self.len())
    }
}

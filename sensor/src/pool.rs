//! Fallible allocation of attribute value buffers.
//!
//! Cached values and deferred notification records are allocated through a [`ValuePool`],
//! so an exhausted heap degrades into skipped updates instead of an abort.
use alloc::boxed::Box;
use alloc::vec::Vec;

/// Allocator for attribute value buffers.
pub trait ValuePool {
    /// Allocate a zeroed buffer of exactly `len` bytes.
    ///
    /// Returns `None` when the memory is not available.
    fn alloc(&self, len: usize) -> Option<Box<[u8]>>;
}

/// Pool backed by the global allocator, reporting failure instead of aborting.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapPool;

impl ValuePool for HeapPool {
    fn alloc(&self, len: usize) -> Option<Box<[u8]>> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len).ok()?;
        buf.resize(len, 0);
        Some(buf.into_boxed_slice())
    }
}

impl<P: ValuePool + ?Sized> ValuePool for &P {
    fn alloc(&self, len: usize) -> Option<Box<[u8]>> {
        P::alloc(self, len)
    }
}

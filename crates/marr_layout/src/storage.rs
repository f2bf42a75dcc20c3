//! Owned single-allocation storage for a representation.
//!
//! [`RawStorage`] reserves the whole struct-of-arrays block once, at
//! construction, and never resizes it. Slots are filled front to back: the
//! storage tracks the length of its initialised prefix so that an abandoned,
//! half-built storage still drops exactly what was written.

#![allow(
    unsafe_code,
    reason = "owns a raw allocation and hands out pointers into it"
)]

use std::alloc::{self, Layout};
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ptr;

use crate::{ArrayData, BinaryArrayData};

/// Alignment of every storage allocation, raised further only if a leaf
/// demands more.
pub const MIN_ALIGN: usize = 16;

/// A raw block of memory, freed with a single `dealloc`.
///
/// Zero-sized blocks are never allocated; they use an aligned dangling
/// pointer instead.
struct Allocation {
    base: *mut u8,
    layout: Layout,
}

impl Allocation {
    fn zeroed(layout: Layout) -> Self {
        let base = if layout.size() == 0 {
            ptr::without_provenance_mut(layout.align())
        } else {
            // SAFETY: `layout` has non-zero size.
            let base = unsafe { alloc::alloc_zeroed(layout) };
            if base.is_null() {
                alloc::handle_alloc_error(layout);
            }
            base
        };
        Self { base, layout }
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            // SAFETY: allocated in `zeroed` with this exact layout.
            unsafe { alloc::dealloc(self.base, self.layout) }
        }
    }
}

/// Struct-of-arrays storage for `capacity` values of representation `A`.
///
/// # Lifecycle
///
/// A fresh storage is *constructing*: slots `0..len` are initialised and
/// [`push`](Self::push) fills the next one. Once `len == capacity` it is
/// *full*. Dropping the storage at any point drops the initialised slots
/// (for representations with owned [`Constant`](marr_generic::Constant)
/// leaves) and then frees the allocation.
///
/// # Threading
///
/// No interior mutability: mutation requires `&mut self`. The storage is
/// `Send`/`Sync` exactly when `A` is.
pub struct RawStorage<A: ArrayData> {
    buffer: A::Buffer,
    capacity: usize,
    len: usize,
    alloc: Allocation,
    _marker: PhantomData<A>,
}

// SAFETY: the storage uniquely owns its allocation and the `A` values in it.
unsafe impl<A: ArrayData + Send> Send for RawStorage<A> {}

// SAFETY: shared access only reads (clones) values of `A`.
unsafe impl<A: ArrayData + Sync> Sync for RawStorage<A> {}

impl<A: ArrayData> RawStorage<A> {
    /// Reserve storage for exactly `capacity` values.
    ///
    /// # Panics
    ///
    /// Panics if the byte size overflows. Aborts via
    /// [`handle_alloc_error`](alloc::handle_alloc_error) if the allocator
    /// fails.
    pub fn with_capacity(capacity: usize) -> Self {
        let size = A::raw_size(capacity, 0).unwrap_or_else(|| capacity_overflow());
        let align = MIN_ALIGN.max(A::ALIGN);
        let layout = Layout::from_size_align(size, align).unwrap_or_else(|_| capacity_overflow());
        let alloc = Allocation::zeroed(layout);

        let mut offset = 0;
        // SAFETY: the allocation spans `raw_size(capacity, 0)` bytes and is
        // aligned for every leaf.
        let buffer = unsafe { A::reserve(alloc.base, capacity, &mut offset) };
        debug_assert_eq!(offset, size, "reserve and raw_size disagree");

        tracing::trace!(capacity, bytes = size, align, "reserved columnar storage");

        Self {
            buffer,
            capacity,
            len: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Number of slots reserved.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of initialised slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no slot has been initialised.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` once every reserved slot is initialised.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Size of the allocation in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.alloc.layout.size()
    }

    /// Alignment of the allocation.
    #[inline]
    pub fn align(&self) -> usize {
        self.alloc.layout.align()
    }

    /// The buffer tree, for inspecting where each field region lives.
    #[inline]
    pub fn buffer(&self) -> A::Buffer {
        self.buffer
    }

    /// Base address of the allocation.
    #[inline]
    pub fn base_ptr(&self) -> *const u8 {
        self.alloc.base
    }

    /// Initialise the next slot.
    ///
    /// # Panics
    ///
    /// Panics if the storage is already full.
    #[inline]
    #[track_caller]
    pub fn push(&mut self, value: A) {
        assert!(
            self.len < self.capacity,
            "push past the end of a storage with capacity {}",
            self.capacity
        );
        // SAFETY: `len < capacity` and slot `len` is uninitialised.
        unsafe { A::init(self.buffer, self.len, value) };
        self.len += 1;
    }

    /// Read the value in slot `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not an initialised slot.
    #[inline]
    #[track_caller]
    pub fn read(&self, index: usize) -> A {
        self.check_index(index);
        // SAFETY: `index < len`, so the slot is initialised.
        unsafe { A::read(self.buffer, index) }
    }

    /// Overwrite slot `index`, dropping its previous value.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not an initialised slot.
    #[inline]
    #[track_caller]
    pub fn write(&mut self, index: usize, value: A) {
        self.check_index(index);
        // SAFETY: `index < len`, so the slot is initialised.
        unsafe { A::write(self.buffer, index, value) }
    }

    /// Turn the storage into an iterator that moves each initialised value
    /// out, front to back.
    pub fn into_slots(self) -> IntoSlots<A> {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the allocation moves to the
        // iterator exactly once.
        let alloc = unsafe { ptr::read(&this.alloc) };
        IntoSlots {
            buffer: this.buffer,
            front: 0,
            back: this.len,
            alloc,
            _marker: PhantomData,
        }
    }

    #[inline]
    #[track_caller]
    fn check_index(&self, index: usize) {
        if index >= self.len {
            index_out_of_range(index, self.len);
        }
    }
}

impl<A: BinaryArrayData> RawStorage<A> {
    /// The raw byte image of the whole allocation.
    ///
    /// Binary representations have no drop glue and no padding inside a
    /// value, and the allocation starts zeroed, so every byte is initialised
    /// and deterministic.
    pub fn as_bytes(&self) -> &[u8] {
        if self.byte_len() == 0 {
            return &[];
        }
        // SAFETY: the allocation is live, zero-initialised and `byte_len`
        // bytes long; binary leaves contain no uninitialised bytes.
        unsafe { std::slice::from_raw_parts(self.alloc.base, self.byte_len()) }
    }

    /// Build a full storage of `capacity` values from a byte image produced
    /// by [`as_bytes`](Self::as_bytes).
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is not exactly the storage size for `capacity`.
    pub fn from_bytes(capacity: usize, bytes: &[u8]) -> Self {
        let mut storage = Self::with_capacity(capacity);
        assert_eq!(
            bytes.len(),
            storage.byte_len(),
            "byte image does not match the layout for {capacity} values"
        );
        if !bytes.is_empty() {
            // SAFETY: both regions are `bytes.len()` long and distinct; every
            // bit pattern is a valid binary leaf value.
            unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), storage.alloc.base, bytes.len()) };
        }
        storage.len = capacity;
        storage
    }
}

/// Deep copy: a fresh allocation with every initialised slot cloned.
impl<A: ArrayData> Clone for RawStorage<A> {
    fn clone(&self) -> Self {
        let mut storage = Self::with_capacity(self.capacity);
        for index in 0..self.len {
            storage.push(self.read(index));
        }
        storage
    }
}

impl<A: ArrayData> Drop for RawStorage<A> {
    fn drop(&mut self) {
        if A::NEEDS_DROP {
            // SAFETY: slots `0..len` are initialised; the allocation is freed
            // afterwards by `Allocation::drop`.
            unsafe { A::drop_range(self.buffer, 0, self.len) }
        }
    }
}

/// Owning iterator over the values of a [`RawStorage`].
///
/// Slots `front..back` are still initialised; dropping the iterator drops
/// them and frees the allocation.
pub struct IntoSlots<A: ArrayData> {
    buffer: A::Buffer,
    front: usize,
    back: usize,
    // Held only so the buffer is freed on drop.
    #[allow(dead_code)]
    alloc: Allocation,
    _marker: PhantomData<A>,
}

// SAFETY: same ownership as `RawStorage`.
unsafe impl<A: ArrayData + Send> Send for IntoSlots<A> {}

// SAFETY: shared access reads nothing.
unsafe impl<A: ArrayData + Sync> Sync for IntoSlots<A> {}

impl<A: ArrayData> Iterator for IntoSlots<A> {
    type Item = A;

    #[inline]
    fn next(&mut self) -> Option<A> {
        if self.front == self.back {
            return None;
        }
        let index = self.front;
        self.front += 1;
        // SAFETY: `index` was in `front..back`, so it is initialised, and it
        // has just left that range.
        Some(unsafe { A::take(self.buffer, index) })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<A: ArrayData> DoubleEndedIterator for IntoSlots<A> {
    #[inline]
    fn next_back(&mut self) -> Option<A> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        // SAFETY: `back` was the last initialised slot and has just left the
        // live range.
        Some(unsafe { A::take(self.buffer, self.back) })
    }
}

impl<A: ArrayData> ExactSizeIterator for IntoSlots<A> {}

impl<A: ArrayData> FusedIterator for IntoSlots<A> {}

impl<A: ArrayData> Drop for IntoSlots<A> {
    fn drop(&mut self) {
        if A::NEEDS_DROP {
            // SAFETY: exactly slots `front..back` are still initialised.
            unsafe { A::drop_range(self.buffer, self.front, self.back) }
        }
    }
}

impl<A: ArrayData> fmt::Debug for IntoSlots<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntoSlots")
            .field("remaining", &(self.back - self.front))
            .finish()
    }
}

impl<A: ArrayData> fmt::Debug for RawStorage<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawStorage")
            .field("capacity", &self.capacity)
            .field("len", &self.len)
            .field("bytes", &self.byte_len())
            .field("align", &self.align())
            .finish()
    }
}

#[cold]
#[inline(never)]
fn capacity_overflow() -> ! {
    panic!("capacity overflow")
}

#[cold]
#[inline(never)]
#[track_caller]
fn index_out_of_range(index: usize, len: usize) -> ! {
    panic!("index out of range: the len is {len} but the index is {index}")
}

#[cfg(test)]
mod tests;

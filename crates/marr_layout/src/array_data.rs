//! The closed set of representations with columnar storage.
//!
//! Every implementation follows the same recipe: leaves own one contiguous
//! region of `capacity` elements, [`Unit`] owns nothing, and [`Product`]
//! concatenates the regions of its two halves. [`Sum`](marr_generic::Sum)
//! deliberately has no implementation.

#![allow(
    unsafe_code,
    reason = "buffers are raw pointers into a single shared allocation"
)]

use std::mem::{align_of, needs_drop, size_of};
use std::ptr;

use half::f16;
use marr_generic::{Constant, Product, Scalar, Unit};

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Number of padding bytes needed to align `offset` to `align`.
///
/// `align` must be a power of two. Computes `(-offset) mod align`.
#[inline]
pub const fn padding(offset: usize, align: usize) -> usize {
    offset.wrapping_neg() & (align - 1)
}

const fn max_align(a: usize, b: usize) -> usize {
    if a > b {
        a
    } else {
        b
    }
}

/// A representation that can be stored struct-of-arrays style.
///
/// This trait is sealed: the set of storable representations is fixed to
/// scalar leaves, fixed-width vectors, [`Unit`], [`Constant`] and
/// [`Product`]. User types take part through
/// [`Generic`](marr_generic::Generic) instead.
///
/// # Safety Contract
///
/// The slot operations are `unsafe` because buffers are plain pointers. The
/// caller ([`RawStorage`](crate::RawStorage)) guarantees that:
///
/// - the buffer came from [`reserve`](Self::reserve) on a live allocation of
///   at least [`raw_size`](Self::raw_size) bytes aligned to [`ALIGN`](Self::ALIGN);
/// - `index` is below the reserved capacity;
/// - `read` and `write` only touch initialised slots, `init` only
///   uninitialised ones, and each initialised slot is consumed at most once
///   by `take` or `drop_range`.
pub trait ArrayData: Sized + sealed::Sealed {
    /// Typed pointer tree, shaped like the representation.
    type Buffer: Copy;

    /// Largest alignment of any leaf.
    const ALIGN: usize;

    /// Whether any leaf owns data that must be dropped.
    const NEEDS_DROP: bool;

    /// End offset of this representation's regions when laid out for
    /// `capacity` elements starting at byte `offset`.
    ///
    /// Returns `None` if the size overflows `usize`.
    fn raw_size(capacity: usize, offset: usize) -> Option<usize>;

    /// Hand out buffers for `capacity` elements, advancing `offset` past
    /// the regions used.
    ///
    /// # Safety
    ///
    /// `base` must be valid for `raw_size(capacity, *offset)` bytes.
    unsafe fn reserve(base: *mut u8, capacity: usize, offset: &mut usize) -> Self::Buffer;

    /// Read the value at `index`.
    ///
    /// # Safety
    ///
    /// The slot must be initialised.
    unsafe fn read(buffer: Self::Buffer, index: usize) -> Self;

    /// Overwrite an initialised slot, dropping the previous value.
    ///
    /// # Safety
    ///
    /// The slot must be initialised.
    unsafe fn write(buffer: Self::Buffer, index: usize, value: Self);

    /// Initialise an empty slot without dropping anything.
    ///
    /// # Safety
    ///
    /// The slot must be uninitialised (or hold a value with no drop glue).
    unsafe fn init(buffer: Self::Buffer, index: usize, value: Self);

    /// Move the value out of slot `index`, leaving it uninitialised.
    ///
    /// # Safety
    ///
    /// The slot must be initialised.
    unsafe fn take(buffer: Self::Buffer, index: usize) -> Self;

    /// Drop the values in slots `start..end`.
    ///
    /// # Safety
    ///
    /// Those slots must be initialised and are uninitialised afterwards.
    unsafe fn drop_range(buffer: Self::Buffer, start: usize, end: usize);
}

/// End offset of a leaf region of `capacity` values of `T` at `offset`.
#[inline]
fn leaf_size<T>(capacity: usize, offset: usize) -> Option<usize> {
    let begin = offset.checked_add(padding(offset, align_of::<T>()))?;
    begin.checked_add(capacity.checked_mul(size_of::<T>())?)
}

/// Carve a leaf region out of the allocation at `base`.
///
/// # Safety
///
/// `base` must be valid for `leaf_size::<T>(capacity, *offset)` bytes.
#[inline]
unsafe fn leaf_reserve<T>(base: *mut u8, capacity: usize, offset: &mut usize) -> *mut T {
    let begin = *offset + padding(*offset, align_of::<T>());
    *offset = begin + capacity * size_of::<T>();
    // SAFETY: `begin` is within the allocation per the caller's contract.
    unsafe { base.add(begin).cast::<T>() }
}

/// Leaves holding plain `Copy` data.
macro_rules! impl_plain_leaf {
    ($([$($generics:tt)*] $ty:ty),* $(,)?) => {
        $(
            impl<$($generics)*> sealed::Sealed for $ty {}

            impl<$($generics)*> ArrayData for $ty {
                type Buffer = *mut $ty;

                const ALIGN: usize = align_of::<$ty>();
                const NEEDS_DROP: bool = false;

                #[inline]
                fn raw_size(capacity: usize, offset: usize) -> Option<usize> {
                    leaf_size::<$ty>(capacity, offset)
                }

                #[inline]
                unsafe fn reserve(base: *mut u8, capacity: usize, offset: &mut usize) -> Self::Buffer {
                    // SAFETY: forwarded caller contract.
                    unsafe { leaf_reserve::<$ty>(base, capacity, offset) }
                }

                #[inline(always)]
                unsafe fn read(buffer: Self::Buffer, index: usize) -> Self {
                    // SAFETY: slot is in bounds and initialised.
                    unsafe { buffer.add(index).read() }
                }

                #[inline(always)]
                unsafe fn write(buffer: Self::Buffer, index: usize, value: Self) {
                    // SAFETY: slot is in bounds; `Copy` values need no drop.
                    unsafe { buffer.add(index).write(value) }
                }

                #[inline(always)]
                unsafe fn init(buffer: Self::Buffer, index: usize, value: Self) {
                    // SAFETY: slot is in bounds.
                    unsafe { buffer.add(index).write(value) }
                }

                #[inline(always)]
                unsafe fn take(buffer: Self::Buffer, index: usize) -> Self {
                    // SAFETY: slot is in bounds and initialised.
                    unsafe { buffer.add(index).read() }
                }

                #[inline]
                unsafe fn drop_range(_: Self::Buffer, _: usize, _: usize) {}
            }
        )*
    };
}

impl_plain_leaf!(
    [] i8, [] i16, [] i32, [] i64, [] i128, [] isize,
    [] u8, [] u16, [] u32, [] u64, [] u128, [] usize,
    [] f16, [] f32, [] f64,
    [S: Scalar] [S; 2], [S: Scalar] [S; 3], [S: Scalar] [S; 4], [S: Scalar] [S; 8],
    [S: Scalar] [S; 16], [S: Scalar] [S; 32], [S: Scalar] [S; 64],
);

impl sealed::Sealed for Unit {}

impl ArrayData for Unit {
    type Buffer = ();

    const ALIGN: usize = 1;
    const NEEDS_DROP: bool = false;

    #[inline]
    fn raw_size(_: usize, offset: usize) -> Option<usize> {
        Some(offset)
    }

    #[inline]
    unsafe fn reserve(_: *mut u8, _: usize, _: &mut usize) -> Self::Buffer {}

    #[inline(always)]
    unsafe fn read((): Self::Buffer, _: usize) -> Self {
        Unit
    }

    #[inline(always)]
    unsafe fn write((): Self::Buffer, _: usize, _: Self) {}

    #[inline(always)]
    unsafe fn init((): Self::Buffer, _: usize, _: Self) {}

    #[inline(always)]
    unsafe fn take((): Self::Buffer, _: usize) -> Self {
        Unit
    }

    #[inline]
    unsafe fn drop_range((): Self::Buffer, _: usize, _: usize) {}
}

impl<T: Clone> sealed::Sealed for Constant<T> {}

/// Opaque leaves: each slot owns a `T`, cloned out on read.
impl<T: Clone> ArrayData for Constant<T> {
    type Buffer = *mut T;

    const ALIGN: usize = align_of::<T>();
    const NEEDS_DROP: bool = needs_drop::<T>();

    #[inline]
    fn raw_size(capacity: usize, offset: usize) -> Option<usize> {
        leaf_size::<T>(capacity, offset)
    }

    #[inline]
    unsafe fn reserve(base: *mut u8, capacity: usize, offset: &mut usize) -> Self::Buffer {
        // SAFETY: forwarded caller contract.
        unsafe { leaf_reserve::<T>(base, capacity, offset) }
    }

    #[inline]
    unsafe fn read(buffer: Self::Buffer, index: usize) -> Self {
        // SAFETY: slot is in bounds and initialised.
        Constant(unsafe { (*buffer.add(index)).clone() })
    }

    #[inline]
    unsafe fn write(buffer: Self::Buffer, index: usize, value: Self) {
        // SAFETY: slot is in bounds and initialised; assignment drops the
        // previous value.
        unsafe { *buffer.add(index) = value.0 }
    }

    #[inline]
    unsafe fn init(buffer: Self::Buffer, index: usize, value: Self) {
        // SAFETY: slot is in bounds and holds no live value.
        unsafe { buffer.add(index).write(value.0) }
    }

    #[inline]
    unsafe fn take(buffer: Self::Buffer, index: usize) -> Self {
        // SAFETY: slot is in bounds and initialised; the caller treats it as
        // uninitialised from now on.
        Constant(unsafe { buffer.add(index).read() })
    }

    #[inline]
    unsafe fn drop_range(buffer: Self::Buffer, start: usize, end: usize) {
        if needs_drop::<T>() && start < end {
            // SAFETY: slots `start..end` are initialised and dropped exactly once.
            unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(buffer.add(start), end - start)) }
        }
    }
}

impl<A: ArrayData, B: ArrayData> sealed::Sealed for Product<A, B> {}

/// Products concatenate the regions of both halves, left first.
impl<A: ArrayData, B: ArrayData> ArrayData for Product<A, B> {
    type Buffer = (A::Buffer, B::Buffer);

    const ALIGN: usize = max_align(A::ALIGN, B::ALIGN);
    const NEEDS_DROP: bool = A::NEEDS_DROP || B::NEEDS_DROP;

    #[inline]
    fn raw_size(capacity: usize, offset: usize) -> Option<usize> {
        B::raw_size(capacity, A::raw_size(capacity, offset)?)
    }

    #[inline]
    unsafe fn reserve(base: *mut u8, capacity: usize, offset: &mut usize) -> Self::Buffer {
        // SAFETY: `raw_size` of the product covers both halves in order.
        unsafe {
            let a = A::reserve(base, capacity, offset);
            let b = B::reserve(base, capacity, offset);
            (a, b)
        }
    }

    #[inline(always)]
    unsafe fn read(buffer: Self::Buffer, index: usize) -> Self {
        // SAFETY: forwarded caller contract.
        unsafe { Product(A::read(buffer.0, index), B::read(buffer.1, index)) }
    }

    #[inline(always)]
    unsafe fn write(buffer: Self::Buffer, index: usize, value: Self) {
        // SAFETY: forwarded caller contract.
        unsafe {
            A::write(buffer.0, index, value.0);
            B::write(buffer.1, index, value.1);
        }
    }

    #[inline(always)]
    unsafe fn init(buffer: Self::Buffer, index: usize, value: Self) {
        // SAFETY: forwarded caller contract.
        unsafe {
            A::init(buffer.0, index, value.0);
            B::init(buffer.1, index, value.1);
        }
    }

    #[inline(always)]
    unsafe fn take(buffer: Self::Buffer, index: usize) -> Self {
        // SAFETY: forwarded caller contract.
        unsafe { Product(A::take(buffer.0, index), B::take(buffer.1, index)) }
    }

    #[inline]
    unsafe fn drop_range(buffer: Self::Buffer, start: usize, end: usize) {
        // SAFETY: forwarded caller contract.
        unsafe {
            A::drop_range(buffer.0, start, end);
            B::drop_range(buffer.1, start, end);
        }
    }
}

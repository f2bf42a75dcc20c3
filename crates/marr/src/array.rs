//! The columnar container.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use marr_generic::Generic;
use marr_layout::{ArrayData, RawStorage};

use crate::{Iter, MultiArrayBuilder};

/// A fixed-length sequence of `E` stored struct-of-arrays style.
///
/// Each leaf of `E::Rep` occupies its own column in one shared allocation;
/// see [`marr_layout`] for the exact layout. The length is fixed at
/// construction. Elements are converted to and from their representation on
/// every access, so `get` returns an owned `E` rather than a reference.
///
/// # Threading
///
/// Mutation requires `&mut self` and there is no interior mutability, so a
/// `MultiArray` shared between threads is read-only. It is `Send` and `Sync`
/// exactly when the stored representation is (a `Constant<Rc<_>>` field
/// makes it neither).
pub struct MultiArray<E: Generic>
where
    E::Rep: ArrayData,
{
    storage: RawStorage<E::Rep>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Generic> MultiArray<E>
where
    E::Rep: ArrayData,
{
    /// An empty array.
    pub fn new() -> Self {
        Self::from_storage(RawStorage::with_capacity(0))
    }

    /// Start building an array of exactly `capacity` elements.
    pub fn builder(capacity: usize) -> MultiArrayBuilder<E> {
        MultiArrayBuilder::with_capacity(capacity)
    }

    /// Build an array of `count` elements, calling `f` with each index in
    /// ascending order.
    ///
    /// If `f` panics, the elements produced so far are dropped and the
    /// allocation is freed.
    pub fn from_fn<F>(count: usize, mut f: F) -> Self
    where
        F: FnMut(usize) -> E,
    {
        let mut builder = Self::builder(count);
        for index in 0..count {
            builder.push(f(index));
        }
        builder.finish()
    }

    /// Like [`from_fn`](Self::from_fn), stopping at the first error.
    pub fn try_from_fn<F, Error>(count: usize, mut f: F) -> Result<Self, Error>
    where
        F: FnMut(usize) -> Result<E, Error>,
    {
        let mut builder = Self::builder(count);
        for index in 0..count {
            builder.push(f(index)?);
        }
        Ok(builder.finish())
    }

    /// An array of `count` copies of `value`.
    pub fn repeat(value: E, count: usize) -> Self
    where
        E: Clone,
    {
        Self::from_fn(count, |_| value.clone())
    }

    pub(crate) fn from_storage(storage: RawStorage<E::Rep>) -> Self {
        debug_assert!(storage.is_full());
        Self {
            storage,
            _marker: PhantomData,
        }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns `true` if the array has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// The element at `index`, or `None` if out of range.
    #[inline]
    pub fn get(&self, index: usize) -> Option<E> {
        (index < self.len()).then(|| E::from_rep(self.storage.read(index)))
    }

    /// Replace the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[inline]
    #[track_caller]
    pub fn set(&mut self, index: usize, value: E) {
        self.storage.write(index, value.into_rep());
    }

    /// Replace the element at `index` with `f` applied to it.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[track_caller]
    pub fn update<F>(&mut self, index: usize, f: F)
    where
        F: FnOnce(E) -> E,
    {
        let value = E::from_rep(self.storage.read(index));
        self.storage.write(index, f(value).into_rep());
    }

    /// A new array with `f` applied to every element, in index order.
    ///
    /// The output is written straight into a freshly reserved array of the
    /// same length; no intermediate collection is built.
    pub fn map<B, F>(&self, mut f: F) -> MultiArray<B>
    where
        B: Generic,
        B::Rep: ArrayData,
        F: FnMut(E) -> B,
    {
        tracing::trace!(
            len = self.len(),
            from = type_name::<E>(),
            to = type_name::<B>(),
            "map"
        );
        MultiArray::from_fn(self.len(), |index| {
            f(E::from_rep(self.storage.read(index)))
        })
    }

    /// Like [`map`](Self::map), stopping at the first error.
    pub fn try_map<B, F, Error>(&self, mut f: F) -> Result<MultiArray<B>, Error>
    where
        B: Generic,
        B::Rep: ArrayData,
        F: FnMut(E) -> Result<B, Error>,
    {
        MultiArray::try_from_fn(self.len(), |index| {
            f(E::from_rep(self.storage.read(index)))
        })
    }

    /// Iterate over the elements in index order.
    pub fn iter(&self) -> Iter<'_, E> {
        Iter::new(self)
    }

    /// Copy the elements into a `Vec`, in index order.
    pub fn to_vec(&self) -> Vec<E> {
        self.iter().collect()
    }

    /// The underlying columnar storage.
    pub fn storage(&self) -> &RawStorage<E::Rep> {
        &self.storage
    }

    pub(crate) fn into_storage(self) -> RawStorage<E::Rep> {
        self.storage
    }

    /// The representation stored at `index`.
    #[inline]
    #[track_caller]
    pub(crate) fn read_rep(&self, index: usize) -> E::Rep {
        self.storage.read(index)
    }
}

impl<E: Generic> Default for MultiArray<E>
where
    E::Rep: ArrayData,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Deep copy into a fresh allocation.
impl<E: Generic> Clone for MultiArray<E>
where
    E::Rep: ArrayData,
{
    fn clone(&self) -> Self {
        Self::from_storage(self.storage.clone())
    }
}

impl<E> PartialEq for MultiArray<E>
where
    E: Generic + PartialEq,
    E::Rep: ArrayData,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<E> Eq for MultiArray<E>
where
    E: Generic + Eq,
    E::Rep: ArrayData,
{
}

impl<E> fmt::Debug for MultiArray<E>
where
    E: Generic + fmt::Debug,
    E::Rep: ArrayData,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Values<'a, E: Generic>(&'a MultiArray<E>)
        where
            E::Rep: ArrayData;

        impl<E> fmt::Debug for Values<'_, E>
        where
            E: Generic + fmt::Debug,
            E::Rep: ArrayData,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_list().entries(self.0.iter()).finish()
            }
        }

        f.debug_struct("MultiArray")
            .field("count", &self.len())
            .field("encoding", &type_name::<E::Rep>())
            .field("storage", &self.storage)
            .field("values", &Values(self))
            .finish()
    }
}

impl<E: Generic> FromIterator<E> for MultiArray<E>
where
    E::Rep: ArrayData,
{
    /// Builds in place when the iterator reports an exact length, and
    /// through a `Vec` otherwise.
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        let mut iter = iter.into_iter();
        match iter.size_hint() {
            (lower, Some(upper)) if lower == upper => {
                let mut builder = Self::builder(lower);
                while !builder.is_full() {
                    match iter.next() {
                        Some(value) => builder.push(value),
                        None => return Self::from(builder.into_vec()),
                    }
                }
                match iter.next() {
                    None => builder.finish(),
                    Some(extra) => {
                        let mut values = builder.into_vec();
                        values.push(extra);
                        values.extend(iter);
                        Self::from(values)
                    }
                }
            }
            _ => Self::from(iter.collect::<Vec<_>>()),
        }
    }
}

impl<E: Generic> From<Vec<E>> for MultiArray<E>
where
    E::Rep: ArrayData,
{
    fn from(values: Vec<E>) -> Self {
        let mut builder = Self::builder(values.len());
        for value in values {
            builder.push(value);
        }
        builder.finish()
    }
}

impl<E: Generic + Clone> From<&[E]> for MultiArray<E>
where
    E::Rep: ArrayData,
{
    fn from(values: &[E]) -> Self {
        Self::from_fn(values.len(), |index| values[index].clone())
    }
}

impl<E: Generic, const N: usize> From<[E; N]> for MultiArray<E>
where
    E::Rep: ArrayData,
{
    fn from(values: [E; N]) -> Self {
        Self::from(Vec::from(values))
    }
}

impl<E: Generic> From<MultiArray<E>> for Vec<E>
where
    E::Rep: ArrayData,
{
    fn from(array: MultiArray<E>) -> Self {
        array.into_iter().collect()
    }
}

#[cfg(test)]
mod tests;

//! Incremental construction of a [`MultiArray`].

use std::fmt;
use std::marker::PhantomData;

use marr_generic::Generic;
use marr_layout::{ArrayData, RawStorage};

use crate::MultiArray;

/// A [`MultiArray`] under construction.
///
/// The builder reserves the full allocation up front and is filled in index
/// order with [`push`](Self::push). [`finish`](Self::finish) hands over the
/// storage once every slot is written. Dropping an unfinished builder drops
/// the elements written so far and frees the allocation.
///
/// ```
/// use marr::MultiArray;
///
/// let mut builder = MultiArray::<u16>::builder(3);
/// for value in [4, 5, 6] {
///     builder.push(value);
/// }
/// let array = builder.finish();
/// assert_eq!(array.to_vec(), [4, 5, 6]);
/// ```
pub struct MultiArrayBuilder<E: Generic>
where
    E::Rep: ArrayData,
{
    storage: RawStorage<E::Rep>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Generic> MultiArrayBuilder<E>
where
    E::Rep: ArrayData,
{
    /// Reserve space for exactly `capacity` elements.
    ///
    /// # Panics
    ///
    /// Panics if the layout size overflows `usize`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: RawStorage::with_capacity(capacity),
            _marker: PhantomData,
        }
    }

    /// Number of elements the finished array will hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Number of elements written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns `true` if nothing has been written yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Number of slots still to be written.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.len()
    }

    /// Returns `true` once every slot is written.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.storage.is_full()
    }

    /// Write the next element.
    ///
    /// # Panics
    ///
    /// Panics if the builder is already full.
    #[inline]
    #[track_caller]
    pub fn push(&mut self, value: E) {
        self.storage.push(value.into_rep());
    }

    /// Finish construction.
    ///
    /// # Panics
    ///
    /// Panics unless every slot has been written.
    #[track_caller]
    pub fn finish(self) -> MultiArray<E> {
        assert!(
            self.is_full(),
            "builder finished with {} of {} elements written",
            self.len(),
            self.capacity()
        );
        MultiArray::from_storage(self.storage)
    }

    /// Abandon construction, returning the elements written so far.
    pub fn into_vec(self) -> Vec<E> {
        (0..self.len())
            .map(|index| E::from_rep(self.storage.read(index)))
            .collect()
    }
}

impl<E: Generic> fmt::Debug for MultiArrayBuilder<E>
where
    E::Rep: ArrayData,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiArrayBuilder")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests;

//! Iterators over [`MultiArray`] elements.

use std::iter::FusedIterator;

use marr_generic::Generic;
use marr_layout::{ArrayData, IntoSlots};

use crate::MultiArray;

/// Borrowing iterator returned by [`MultiArray::iter`].
pub struct Iter<'a, E: Generic>
where
    E::Rep: ArrayData,
{
    array: &'a MultiArray<E>,
    front: usize,
    back: usize,
}

impl<'a, E: Generic> Iter<'a, E>
where
    E::Rep: ArrayData,
{
    pub(crate) fn new(array: &'a MultiArray<E>) -> Self {
        Self {
            array,
            front: 0,
            back: array.len(),
        }
    }
}

impl<E: Generic> Clone for Iter<'_, E>
where
    E::Rep: ArrayData,
{
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<E: Generic> Iterator for Iter<'_, E>
where
    E::Rep: ArrayData,
{
    type Item = E;

    #[inline]
    fn next(&mut self) -> Option<E> {
        if self.front == self.back {
            return None;
        }
        let rep = self.array.read_rep(self.front);
        self.front += 1;
        Some(E::from_rep(rep))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<E: Generic> DoubleEndedIterator for Iter<'_, E>
where
    E::Rep: ArrayData,
{
    #[inline]
    fn next_back(&mut self) -> Option<E> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(E::from_rep(self.array.read_rep(self.back)))
    }
}

impl<E: Generic> ExactSizeIterator for Iter<'_, E> where E::Rep: ArrayData {}

impl<E: Generic> FusedIterator for Iter<'_, E> where E::Rep: ArrayData {}

impl<'a, E: Generic> IntoIterator for &'a MultiArray<E>
where
    E::Rep: ArrayData,
{
    type Item = E;
    type IntoIter = Iter<'a, E>;

    fn into_iter(self) -> Iter<'a, E> {
        self.iter()
    }
}

/// Owning iterator returned by `MultiArray::into_iter`.
///
/// Values are moved out of the columns, so owned
/// [`Constant`](marr_generic::Constant) leaves are never cloned.
pub struct IntoIter<E: Generic>
where
    E::Rep: ArrayData,
{
    slots: IntoSlots<E::Rep>,
}

impl<E: Generic> Iterator for IntoIter<E>
where
    E::Rep: ArrayData,
{
    type Item = E;

    #[inline]
    fn next(&mut self) -> Option<E> {
        self.slots.next().map(E::from_rep)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl<E: Generic> DoubleEndedIterator for IntoIter<E>
where
    E::Rep: ArrayData,
{
    #[inline]
    fn next_back(&mut self) -> Option<E> {
        self.slots.next_back().map(E::from_rep)
    }
}

impl<E: Generic> ExactSizeIterator for IntoIter<E> where E::Rep: ArrayData {}

impl<E: Generic> FusedIterator for IntoIter<E> where E::Rep: ArrayData {}

impl<E: Generic> IntoIterator for MultiArray<E>
where
    E::Rep: ArrayData,
{
    type Item = E;
    type IntoIter = IntoIter<E>;

    fn into_iter(self) -> IntoIter<E> {
        IntoIter {
            slots: self.into_storage().into_slots(),
        }
    }
}

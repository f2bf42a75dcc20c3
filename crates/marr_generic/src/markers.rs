//! The representation type constructors.

use crate::Generic;

/// Representation of a constructor without fields.
///
/// Occupies no storage at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Unit;

/// An opaque value stored as-is.
///
/// Used for types whose internals must not be split into a struct-of-arrays
/// form, typically because they own heap data (`String`, `Rc<T>`, `Vec<T>`).
/// Each stored slot owns its value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Constant<T>(pub T);

impl<T> Constant<T> {
    /// Unwrap the stored value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Two fields stored side by side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Product<A, B>(pub A, pub B);

/// A choice between two alternatives.
///
/// Sums take part in conversions only. There is no columnar storage for
/// them, so a representation containing a `Sum` cannot back a container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sum<A, B> {
    Left(A),
    Right(B),
}

impl Generic for Unit {
    type Rep = Unit;

    #[inline]
    fn into_rep(self) -> Self::Rep {
        self
    }

    #[inline]
    fn from_rep(rep: Self::Rep) -> Self {
        rep
    }
}

impl Generic for () {
    type Rep = Unit;

    #[inline]
    fn into_rep(self) -> Self::Rep {
        Unit
    }

    #[inline]
    fn from_rep(_: Self::Rep) -> Self {}
}

impl<T> Generic for Constant<T> {
    type Rep = Constant<T>;

    #[inline]
    fn into_rep(self) -> Self::Rep {
        self
    }

    #[inline]
    fn from_rep(rep: Self::Rep) -> Self {
        rep
    }
}

impl<A: Generic, B: Generic> Generic for Product<A, B> {
    type Rep = Product<A::Rep, B::Rep>;

    #[inline]
    fn into_rep(self) -> Self::Rep {
        Product(self.0.into_rep(), self.1.into_rep())
    }

    #[inline]
    fn from_rep(rep: Self::Rep) -> Self {
        Product(A::from_rep(rep.0), B::from_rep(rep.1))
    }
}

impl<A: Generic, B: Generic> Generic for Sum<A, B> {
    type Rep = Sum<A::Rep, B::Rep>;

    #[inline]
    fn into_rep(self) -> Self::Rep {
        match self {
            Sum::Left(a) => Sum::Left(a.into_rep()),
            Sum::Right(b) => Sum::Right(b.into_rep()),
        }
    }

    #[inline]
    fn from_rep(rep: Self::Rep) -> Self {
        match rep {
            Sum::Left(a) => Sum::Left(A::from_rep(a)),
            Sum::Right(b) => Sum::Right(B::from_rep(b)),
        }
    }
}

impl<T: Generic> Generic for Option<T> {
    type Rep = Sum<Unit, T::Rep>;

    #[inline]
    fn into_rep(self) -> Self::Rep {
        match self {
            None => Sum::Left(Unit),
            Some(value) => Sum::Right(value.into_rep()),
        }
    }

    #[inline]
    fn from_rep(rep: Self::Rep) -> Self {
        match rep {
            Sum::Left(Unit) => None,
            Sum::Right(value) => Some(T::from_rep(value)),
        }
    }
}

impl<T: Generic, E: Generic> Generic for Result<T, E> {
    type Rep = Sum<T::Rep, E::Rep>;

    #[inline]
    fn into_rep(self) -> Self::Rep {
        match self {
            Ok(value) => Sum::Left(value.into_rep()),
            Err(err) => Sum::Right(err.into_rep()),
        }
    }

    #[inline]
    fn from_rep(rep: Self::Rep) -> Self {
        match rep {
            Sum::Left(value) => Ok(T::from_rep(value)),
            Sum::Right(err) => Err(E::from_rep(err)),
        }
    }
}

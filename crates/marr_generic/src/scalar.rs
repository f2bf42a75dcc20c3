//! Leaf scalars, booleans and fixed-width vectors.

use half::f16;

use crate::Generic;

mod sealed {
    pub trait Sealed {}
}

/// A primitive numeric leaf: fixed-width integers and IEEE floats.
///
/// Scalars are their own representation and may be grouped into fixed-width
/// vectors `[S; N]` for `N` in 2, 3, 4, 8, 16, 32 or 64. This set is closed.
pub trait Scalar: Generic<Rep = Self> + Copy + Default + sealed::Sealed + 'static {
    /// Width of the scalar in bits.
    const BITS: u32;
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Scalar for $ty {
                #[allow(clippy::cast_possible_truncation, reason = "size_of a scalar fits in u32")]
                const BITS: u32 = (std::mem::size_of::<$ty>() * 8) as u32;
            }

            impl Generic for $ty {
                type Rep = $ty;

                #[inline(always)]
                fn into_rep(self) -> Self::Rep {
                    self
                }

                #[inline(always)]
                fn from_rep(rep: Self::Rep) -> Self {
                    rep
                }
            }
        )*
    };
}

impl_scalar!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f16, f32, f64,
);

/// Booleans are stored as bytes: `true` is `1`, `false` is `0`, and any
/// non-zero byte decodes as `true`.
impl Generic for bool {
    type Rep = u8;

    #[inline(always)]
    fn into_rep(self) -> Self::Rep {
        u8::from(self)
    }

    #[inline(always)]
    fn from_rep(rep: Self::Rep) -> Self {
        rep != 0
    }
}

macro_rules! impl_vector {
    ($($lanes:literal),* $(,)?) => {
        $(
            impl<S: Scalar> Generic for [S; $lanes] {
                type Rep = [S; $lanes];

                #[inline(always)]
                fn into_rep(self) -> Self::Rep {
                    self
                }

                #[inline(always)]
                fn from_rep(rep: Self::Rep) -> Self {
                    rep
                }
            }
        )*
    };
}

impl_vector!(2, 3, 4, 8, 16, 32, 64);

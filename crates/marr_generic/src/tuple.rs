//! Tuple representations.
//!
//! Tuples nest into balanced products; see the crate docs for the rule.

use crate::{Generic, Product};

impl<A: Generic, B: Generic> Generic for (A, B) {
    type Rep = Product<A::Rep, B::Rep>;

    #[inline(always)]
    fn into_rep(self) -> Self::Rep {
        Product(self.0.into_rep(), self.1.into_rep())
    }

    #[inline(always)]
    fn from_rep(rep: Self::Rep) -> Self {
        (A::from_rep(rep.0), B::from_rep(rep.1))
    }
}

/// Implement `Generic` for a tuple by delegating to an equivalent nesting of
/// smaller tuples.
macro_rules! nested_tuple {
    ($(($($ty:ident $val:ident),+) => $nest_ty:tt $nest_val:tt;)*) => {
        $(
            impl<$($ty: Generic),+> Generic for ($($ty,)+) {
                type Rep = <$nest_ty as Generic>::Rep;

                #[inline(always)]
                fn into_rep(self) -> Self::Rep {
                    let ($($val,)+) = self;
                    $nest_val.into_rep()
                }

                #[inline(always)]
                fn from_rep(rep: Self::Rep) -> Self {
                    let $nest_val = <$nest_ty as Generic>::from_rep(rep);
                    ($($val,)+)
                }
            }
        )*
    };
}

nested_tuple! {
    (A a, B b, C c) => ((A, B), C) ((a, b), c);
    (A a, B b, C c, D d) => ((A, B), (C, D)) ((a, b), (c, d));
    (A a, B b, C c, D d, E e) => ((A, B, C, D), E) ((a, b, c, d), e);
    (A a, B b, C c, D d, E e, F f) => ((A, B, C, D), (E, F)) ((a, b, c, d), (e, f));
    (A a, B b, C c, D d, E e, F f, G g) =>
        ((A, B, C, D), (E, F, G)) ((a, b, c, d), (e, f, g));
    (A a, B b, C c, D d, E e, F f, G g, H h) =>
        ((A, B, C, D), (E, F, G, H)) ((a, b, c, d), (e, f, g, h));
}

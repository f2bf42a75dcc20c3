//! Datatype-generic representations for columnar storage.
//!
//! A value of type `T` is stored by first converting it into a structurally
//! equivalent value of type `T::Rep`. Representations are built from a small,
//! closed vocabulary of type constructors:
//!
//! - [`Unit`]: constructors without fields
//! - [`Constant`]: opaque values that must not be split into columns
//! - [`Product`]: two fields side by side
//! - [`Sum`]: a choice between two alternatives
//!
//! plus the scalar leaves (integers, floats, fixed-width vectors). Storage
//! engines only need an instance per constructor to handle every
//! representable type; the [`Generic`] trait itself is open, so any user type
//! can join by mapping itself onto the vocabulary.
//!
//! # Product Nesting
//!
//! Aggregates with more than two fields nest products in a balanced way: a
//! group of `n` fields splits into a left group of the largest power of two
//! below `n` and the remainder.
//!
//! ```text
//! (A, B)          -> Product<A, B>
//! (A, B, C)       -> Product<Product<A, B>, C>
//! (A, B, C, D)    -> Product<Product<A, B>, Product<C, D>>
//! (A, B, C, D, E) -> Product<Product<Product<A, B>, Product<C, D>>, E>
//! ```
//!
//! The layout engine assigns buffers positionally, so this nesting must be
//! stable: the same type always yields the same field order.

mod markers;
mod scalar;
mod tuple;

pub use markers::{Constant, Product, Sum, Unit};
pub use scalar::Scalar;

/// A type with a structural representation.
///
/// Conversions must satisfy the round-trip law
/// `T::from_rep(x.into_rep()) == x` and be deterministic. Both directions
/// are expected to inline away entirely; columnar storage is only a win when
/// the optimizer can see straight through them.
///
/// # Example
///
/// ```
/// use marr_generic::{Generic, Product};
///
/// #[derive(Clone, Copy, Debug, PartialEq)]
/// struct Point {
///     x: f64,
///     y: f64,
/// }
///
/// impl Generic for Point {
///     type Rep = Product<f64, f64>;
///
///     fn into_rep(self) -> Self::Rep {
///         Product(self.x, self.y)
///     }
///
///     fn from_rep(rep: Self::Rep) -> Self {
///         Point { x: rep.0, y: rep.1 }
///     }
/// }
///
/// let p = Point { x: 1.0, y: 2.0 };
/// assert_eq!(Point::from_rep(p.into_rep()), p);
/// ```
pub trait Generic: Sized {
    /// The structural representation of `Self`.
    type Rep;

    /// Convert a value into its representation.
    fn into_rep(self) -> Self::Rep;

    /// Rebuild a value from its representation.
    fn from_rep(rep: Self::Rep) -> Self;
}

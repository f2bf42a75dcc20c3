//! Procedural macros for marr.
//!
//! # Derive Macros
//!
//! - `Generic`: maps a struct onto nested `Product`s of its fields' representations

mod generic;
mod utils;

use proc_macro::TokenStream;

/// Derive `marr::Generic` for a struct.
///
/// Fields are combined into balanced nested `Product`s in declaration order;
/// a struct without fields becomes `Unit` and a single-field struct is
/// represented by that field alone.
///
/// # Attributes
///
/// - `#[generic(constant)]` on a field: store the field opaquely as a
///   `Constant` instead of splitting it into columns. The field only needs
///   `Clone`.
/// - `#[generic(unreachable)]` on the type: represent it as `Unit` with
///   conversions that panic. Required for enums, which have no columnar
///   layout.
///
/// # Example
///
/// ```ignore
/// #[derive(Clone, Copy, marr::Generic)]
/// struct Particle {
///     position: [f32; 3],
///     mass: f32,
/// }
/// ```
#[proc_macro_derive(Generic, attributes(generic))]
pub fn derive_generic(input: TokenStream) -> TokenStream {
    generic::derive_generic(input)
}

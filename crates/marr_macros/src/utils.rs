//! Shared utilities for the derive macros.

use proc_macro2::TokenStream as TokenStream2;
use syn::{Attribute, DeriveInput};

/// Size of the left group when splitting `n >= 2` items: the largest power
/// of two strictly below `n`.
pub fn left_group_len(n: usize) -> usize {
    debug_assert!(n >= 2);
    1 << (usize::BITS - 1 - (n - 1).leading_zeros())
}

/// Fold `items` into a balanced binary tree, joining groups with `join`.
///
/// Returns `None` for an empty slice; a single item is returned unchanged.
pub fn balanced<F>(items: &[TokenStream2], join: &F) -> Option<TokenStream2>
where
    F: Fn(TokenStream2, TokenStream2) -> TokenStream2,
{
    match items {
        [] => None,
        [item] => Some(item.clone()),
        _ => {
            let (left, right) = items.split_at(left_group_len(items.len()));
            Some(join(balanced(left, join)?, balanced(right, join)?))
        }
    }
}

/// Flags parsed from `#[generic(...)]` attributes.
#[derive(Default)]
pub struct GenericFlags {
    pub constant: bool,
    pub unreachable: bool,
}

/// Parse every `#[generic(...)]` attribute in `attrs`.
///
/// `allowed` lists the flag names valid at this position.
pub fn parse_generic_flags(attrs: &[Attribute], allowed: &[&str]) -> syn::Result<GenericFlags> {
    let mut flags = GenericFlags::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("generic")) {
        attr.parse_nested_meta(|meta| {
            let Some(name) = ["constant", "unreachable"]
                .into_iter()
                .find(|name| meta.path.is_ident(name))
            else {
                return Err(meta.error("unknown generic attribute"));
            };
            if !allowed.contains(&name) {
                return Err(meta.error(format!("`{name}` is not allowed here")));
            }
            let flag = if name == "constant" {
                &mut flags.constant
            } else {
                &mut flags.unreachable
            };
            if *flag {
                return Err(meta.error(format!("duplicate `{name}` attribute")));
            }
            *flag = true;
            Ok(())
        })?;
    }
    Ok(flags)
}

/// Error for derive inputs with no structural representation.
pub fn unsupported(input: &DeriveInput, kind: &str) -> syn::Error {
    syn::Error::new_spanned(
        &input.ident,
        format!(
            "Generic derive does not support {kind}; \
             add #[generic(unreachable)] to represent it as Unit"
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::left_group_len;

    #[test]
    fn left_group_is_largest_power_of_two_below() {
        let cases = [(2, 1), (3, 2), (4, 2), (5, 4), (8, 4), (9, 8), (16, 8), (17, 16)];
        for (n, expected) in cases {
            assert_eq!(left_group_len(n), expected, "n = {n}");
        }
    }
}

//! `Generic` derive macro implementation.
//!
//! Generates `marr::Generic` implementations that map a struct onto balanced
//! nested `Product`s of its fields.
//!
//! # Note
//!
//! Generated code names items through the absolute path `::marr`, so the
//! deriving crate must depend on the `marr` facade crate.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote, ToTokens};
use syn::{parse_macro_input, parse_quote, Data, DeriveInput, Fields, Generics, Ident, Member, Type};

use crate::utils::{balanced, parse_generic_flags, unsupported};

/// Main entry point for the Generic derive macro.
pub fn derive_generic(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_generic_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_generic_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let flags = parse_generic_flags(&input.attrs, &["unreachable"])?;
    if flags.unreachable {
        return Ok(unreachable_impl(input));
    }

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        Data::Enum(_) => return Err(unsupported(input, "enums")),
        Data::Union(_) => return Err(unsupported(input, "unions")),
    };
    let fields = collect_fields(fields)?;

    let rep_types: Vec<_> = fields.iter().map(FieldInfo::rep_type).collect();
    let into_values: Vec<_> = fields.iter().map(FieldInfo::into_value).collect();
    let rep_patterns: Vec<_> = fields.iter().map(FieldInfo::rep_pattern).collect();

    let join_type = |lhs: TokenStream2, rhs: TokenStream2| quote! { ::marr::Product<#lhs, #rhs> };
    let join_value = |lhs: TokenStream2, rhs: TokenStream2| quote! { ::marr::Product(#lhs, #rhs) };

    let rep = balanced(&rep_types, &join_type).unwrap_or_else(|| quote! { ::marr::Unit });
    let into_body = balanced(&into_values, &join_value).unwrap_or_else(|| quote! { ::marr::Unit });
    let from_pattern =
        balanced(&rep_patterns, &join_value).unwrap_or_else(|| quote! { ::marr::Unit });

    let members: Vec<_> = fields.iter().map(|field| &field.member).collect();
    let bindings: Vec<_> = fields.iter().map(|field| &field.binding).collect();
    let restored: Vec<_> = fields.iter().map(FieldInfo::restored_value).collect();

    let generics = bounded_generics(&input.generics, &fields);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let name = &input.ident;

    Ok(quote! {
        impl #impl_generics ::marr::Generic for #name #ty_generics #where_clause {
            type Rep = #rep;

            #[inline]
            fn into_rep(self) -> Self::Rep {
                let Self { #(#members: #bindings),* } = self;
                #into_body
            }

            #[inline]
            fn from_rep(rep: Self::Rep) -> Self {
                let #from_pattern = rep;
                Self { #(#members: #restored),* }
            }
        }
    })
}

/// A struct field as seen by the derive.
struct FieldInfo {
    member: Member,
    binding: Ident,
    ty: Type,
    constant: bool,
}

impl FieldInfo {
    fn rep_type(&self) -> TokenStream2 {
        let ty = &self.ty;
        if self.constant {
            quote! { ::marr::Constant<#ty> }
        } else {
            quote! { <#ty as ::marr::Generic>::Rep }
        }
    }

    fn into_value(&self) -> TokenStream2 {
        let binding = &self.binding;
        if self.constant {
            quote! { ::marr::Constant(#binding) }
        } else {
            quote! { ::marr::Generic::into_rep(#binding) }
        }
    }

    fn rep_pattern(&self) -> TokenStream2 {
        let binding = &self.binding;
        if self.constant {
            quote! { ::marr::Constant(#binding) }
        } else {
            binding.to_token_stream()
        }
    }

    fn restored_value(&self) -> TokenStream2 {
        let binding = &self.binding;
        let ty = &self.ty;
        if self.constant {
            binding.to_token_stream()
        } else {
            quote! { <#ty as ::marr::Generic>::from_rep(#binding) }
        }
    }
}

fn collect_fields(fields: &Fields) -> syn::Result<Vec<FieldInfo>> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let flags = parse_generic_flags(&field.attrs, &["constant"])?;
            let member = match &field.ident {
                Some(ident) => Member::Named(ident.clone()),
                None => Member::Unnamed(index.into()),
            };
            Ok(FieldInfo {
                member,
                binding: format_ident!("__field{}", index),
                ty: field.ty.clone(),
                constant: flags.constant,
            })
        })
        .collect()
}

/// Add `Field: Generic` bounds for every decomposed field whose type
/// mentions one of the item's type parameters.
fn bounded_generics(generics: &Generics, fields: &[FieldInfo]) -> Generics {
    let params: Vec<_> = generics
        .type_params()
        .map(|param| param.ident.clone())
        .collect();
    let mut generics = generics.clone();
    if params.is_empty() {
        return generics;
    }
    let where_clause = generics.make_where_clause();
    for field in fields.iter().filter(|field| !field.constant) {
        if mentions_any(field.ty.to_token_stream(), &params) {
            let ty = &field.ty;
            where_clause
                .predicates
                .push(parse_quote! { #ty: ::marr::Generic });
        }
    }
    generics
}

fn mentions_any(tokens: TokenStream2, params: &[Ident]) -> bool {
    tokens.into_iter().any(|tree| match tree {
        proc_macro2::TokenTree::Ident(ident) => params.contains(&ident),
        proc_macro2::TokenTree::Group(group) => mentions_any(group.stream(), params),
        _ => false,
    })
}

/// `Unit` representation with panicking conversions.
fn unreachable_impl(input: &DeriveInput) -> TokenStream2 {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let message = format!("`{name}` has no structural representation");

    quote! {
        impl #impl_generics ::marr::Generic for #name #ty_generics #where_clause {
            type Rep = ::marr::Unit;

            fn into_rep(self) -> Self::Rep {
                ::core::unreachable!("{}", #message)
            }

            fn from_rep(_: Self::Rep) -> Self {
                ::core::unreachable!("{}", #message)
            }
        }
    }
}

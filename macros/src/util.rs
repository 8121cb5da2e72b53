use proc_macro2::TokenStream;
use quote::ToTokens;
use syn::punctuated::Punctuated;
use syn::{Attribute, GenericParam, Token};

/// To be inserted in the generic parameter list for `impl<>` or a function.
///
/// Similar to [`syn::ImplGenerics`] but appends a comma unconditionally.
#[derive(Debug, Clone, Copy)]
pub struct ImplGenerics<'a>(pub &'a Punctuated<GenericParam, Token![,]>);

/// To be inserted in the generic argument list for the type of an `impl` block
/// of a matching [`ImplGenerics`].
///
/// Similar to [`syn::TypeGenerics`] but appends a comma unconditionally.
#[derive(Debug, Clone, Copy)]
pub struct TypeGenerics<'a>(pub &'a Punctuated<GenericParam, Token![,]>);

impl ToTokens for ImplGenerics<'_> {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        for generic in self.0.pairs() {
            match generic.into_value() {
                GenericParam::Lifetime(param) => param.to_tokens(tokens),
                GenericParam::Type(param) => {
                    param.ident.to_tokens(tokens);
                    param.colon_token.to_tokens(tokens);
                    param.bounds.to_tokens(tokens);
                },
                GenericParam::Const(param) => {
                    param.const_token.to_tokens(tokens);
                    param.ident.to_tokens(tokens);
                    param.colon_token.to_tokens(tokens);
                    param.ty.to_tokens(tokens);
                },
            }

            <Token![,]>::default().to_tokens(tokens);
        }
    }
}

impl ToTokens for TypeGenerics<'_> {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        for generic in self.0.pairs() {
            match generic.into_value() {
                GenericParam::Lifetime(param) => param.lifetime.to_tokens(tokens),
                GenericParam::Type(param) => param.ident.to_tokens(tokens),
                GenericParam::Const(param) => param.ident.to_tokens(tokens),
            }

            <Token![,]>::default().to_tokens(tokens);
        }
    }
}

/// Combines `new` into the accumulated errors.
pub fn push_error(res: &mut syn::Result<()>, new: syn::Error) {
    match res {
        Ok(()) => *res = Err(new),
        Err(err) => err.combine(new),
    }
}

/// Returns the value, or records the error and returns `None`.
pub fn push_result<T>(res: &mut syn::Result<()>, value: syn::Result<T>) -> Option<T> {
    match value {
        Ok(value) => Some(value),
        Err(err) => {
            push_error(res, err);
            None
        },
    }
}

/// Whether the attribute is the `#[piecemeal]` marker, either as
/// `piecemeal`, `piecemeal::piecemeal` or `::piecemeal::piecemeal`.
pub fn is_marker(attr: &Attribute) -> bool {
    let segments = &attr.path().segments;
    match segments.len() {
        1 => segments[0].ident == "piecemeal",
        2 => segments[0].ident == "piecemeal" && segments[1].ident == "piecemeal",
        _ => false,
    }
}

/// Removes and returns the first `#[piecemeal]` marker.
pub fn take_marker(attrs: &mut Vec<Attribute>) -> Option<Attribute> {
    let index = attrs.iter().position(is_marker)?;
    Some(attrs.remove(index))
}

/// Removes every `#[piecemeal(...)]` helper attribute.
pub fn strip_helper_attrs(attrs: &mut Vec<Attribute>) {
    attrs.retain(|attr| !attr.path().is_ident("piecemeal"));
}

/// The `#[cfg(..)]` attributes among `attrs`.
pub fn cfg_attrs(attrs: &[Attribute]) -> Vec<Attribute> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("cfg"))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use syn::{Generics, parse_quote};

    use super::*;

    #[test]
    fn generics_append_commas() {
        let generics: Generics = parse_quote!(<'a, T: Clone + 'a = u8, const N: usize>);

        let impl_generics = ImplGenerics(&generics.params).to_token_stream().to_string();
        let ty_generics = TypeGenerics(&generics.params).to_token_stream().to_string();

        assert_eq!(impl_generics, "'a , T : Clone + 'a , const N : usize ,");
        assert_eq!(ty_generics, "'a , T , N ,");
    }

    #[test]
    fn marker_paths() {
        let attrs: [Attribute; 4] = [
            parse_quote!(#[piecemeal]),
            parse_quote!(#[piecemeal::piecemeal(java_setters)]),
            parse_quote!(#[::piecemeal::piecemeal]),
            parse_quote!(#[other::piecemeal]),
        ];

        assert!(is_marker(&attrs[0]));
        assert!(is_marker(&attrs[1]));
        assert!(is_marker(&attrs[2]));
        assert!(!is_marker(&attrs[3]));
    }

    #[test]
    fn take_marker_leaves_other_attributes() {
        let mut attrs: Vec<Attribute> = vec![
            parse_quote!(#[derive(Debug)]),
            parse_quote!(#[piecemeal(style = "builder")]),
            parse_quote!(#[doc = "x"]),
        ];

        let marker = take_marker(&mut attrs).unwrap();
        assert!(marker.path().is_ident("piecemeal"));
        assert_eq!(attrs.len(), 2);
        assert!(take_marker(&mut attrs).is_none());
    }
}

//! Backing storage of the mutable type.
//!
//! Each property is held in a single `::piecemeal::Tracked<T>`, which pairs
//! the initialization flag with the value holder. This module emits the
//! field declarations, their initializers and the accessor bodies that go
//! through them.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Block, Expr, GenericParam, Generics, Type, parse_quote};

use crate::names::{Names, display_name};
use crate::parameters::Parameter;
use crate::session::HostDeclaration;
use crate::signature::{Accessor, Substitution};

/// One `Tracked` field per parameter, followed by the variance marker.
pub fn field_declarations(host: &HostDeclaration, substitution: &mut Substitution) -> TokenStream {
    let fields = host.params.iter().map(|param| {
        let field = host.names.backing_field(&param.ident);
        let ty = substitution.ty(&param.ty);
        let cfg = &param.cfg;
        quote! { #(#cfg)* #field: ::piecemeal::Tracked<#ty>, }
    });

    // collected so the closure's borrow of `substitution` ends here
    let fields: Vec<_> = fields.collect();
    let marker = host.names.variance_marker();
    let variance = variance_marker(&host.item.generics);

    quote! {
        #(#fields)*
        #marker: #variance,
    }
}

/// `PhantomData` over a function that both takes and returns every type and
/// lifetime parameter, which makes the mutable invariant in all of them.
pub fn variance_marker(generics: &Generics) -> Type {
    let parts = generics.params.iter().filter_map(|param| match param {
        GenericParam::Lifetime(param) => {
            let lifetime = &param.lifetime;
            Some(quote!(fn(&#lifetime ()) -> &#lifetime ()))
        },
        GenericParam::Type(param) => {
            let ident = &param.ident;
            Some(quote!(fn(#ident) -> #ident))
        },
        GenericParam::Const(_) => None,
    });

    parse_quote!(::core::marker::PhantomData<( #(#parts,)* )>)
}

/// Body of the mutable constructor: every property unset.
pub fn constructor(host: &HostDeclaration) -> Block {
    let fields = host.params.iter().map(|param| {
        let field = host.names.backing_field(&param.ident);
        let cfg = &param.cfg;
        quote!(#(#cfg)* #field: ::piecemeal::Tracked::new(),)
    });
    let marker = host.names.variance_marker();

    parse_quote!({
        Self {
            #(#fields)*
            #marker: ::core::marker::PhantomData,
        }
    })
}

/// Body of one property accessor.
pub fn accessor(names: &Names, param: &Parameter, accessor: Accessor) -> Block {
    let field = names.backing_field(&param.ident);
    let name = display_name(&param.ident);

    match accessor {
        Accessor::Get => parse_quote!({ self.#field.get(#name) }),
        Accessor::GetMut => parse_quote!({ self.#field.get_mut(#name) }),
        Accessor::Set => parse_quote!({
            self.#field.set(value);
            self
        }),
    }
}

/// Moves the value of `param` out of `self`, if it was set.
pub fn take(names: &Names, param: &Parameter) -> Expr {
    let field = names.backing_field(&param.ident);
    parse_quote!(self.#field.take())
}

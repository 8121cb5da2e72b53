//! The body pass.
//!
//! Runs after the complete member table of a host exists. Members refer to
//! each other only through that table, so a missing entry is an internal
//! inconsistency and not something the user can cause.

use quote::quote;
use syn::{Block, Ident, Token, parse_quote};

use crate::backing;
use crate::names::display_name;
use crate::session::HostDeclaration;
use crate::signature::{
    Accessor, MemberKind, SyntheticMember, Substitution, applied_type, find,
};

/// Generates the body of a function member.
pub fn generate(
    member: &SyntheticMember,
    host: &HostDeclaration,
    members: &[SyntheticMember],
) -> syn::Result<Block> {
    match member.kind {
        MemberKind::MutableType => Err(internal_error(host, "the mutable type has no body")),
        MemberKind::MutableConstructor => Ok(backing::constructor(host)),
        MemberKind::MutableProperty { index, accessor } => {
            let param = host
                .params
                .get(index)
                .ok_or_else(|| internal_error(host, "property without a parameter"))?;
            Ok(backing::accessor(&host.names, param, accessor))
        },
        MemberKind::BuildFunction => Ok(build(host)),
        MemberKind::ToMutableFunction => to_mutable(host, members),
        MemberKind::CopyFunction => copy(host, members),
        MemberKind::DslFactoryFunction => dsl_factory(host, members),
    }
}

pub fn internal_error(host: &HostDeclaration, message: &str) -> syn::Error {
    syn::Error::new_spanned(
        host.names.host(),
        format!("internal error in `#[piecemeal]`: {message}"),
    )
}

fn member<'a>(
    host: &HostDeclaration,
    members: &'a [SyntheticMember],
    kind: MemberKind,
) -> syn::Result<&'a SyntheticMember> {
    find(members, kind)
        .ok_or_else(|| internal_error(host, &format!("missing member {kind:?}")))
}

/// `<HostMutable<..>>` and its constructor, as seen from either impl.
fn mutable_constructor_call(
    host: &HostDeclaration,
    members: &[SyntheticMember],
) -> syn::Result<proc_macro2::TokenStream> {
    let mutable = member(host, members, MemberKind::MutableType)?
        .mutable_type()
        .ok_or_else(|| internal_error(host, "the mutable type is not a type"))?;
    let constructor = member(host, members, MemberKind::MutableConstructor)?.ident();

    let mutable_ty = applied_type(mutable);
    Ok(quote!(<#mutable_ty>::#constructor()))
}

/// Resolves every parameter in declaration order, then creates the host.
///
/// Each parameter is bound to a local of its own name, so defaults see the
/// resolved values of the parameters before them. The first parameter with
/// neither a value nor a default returns early, before the host exists.
fn build(host: &HostDeclaration) -> Block {
    let mut substitution = Substitution::new(&host.item);

    let mut resolve = Vec::with_capacity(host.params.len());
    for param in &host.params {
        let ident = &param.ident;
        let cfg = &param.cfg;
        let ty = substitution.ty(&param.ty);
        let take = backing::take(&host.names, param);

        let fallback = match &param.default {
            Some(default) => {
                let default = substitution.expr(default);
                quote!(#default)
            },
            None => {
                let name = display_name(ident);
                quote! {
                    return ::core::result::Result::Err(::piecemeal::UninitializedProperty::new(#name))
                }
            },
        };

        resolve.push(quote! {
            #(#cfg)*
            let #ident: #ty = match #take {
                ::core::option::Option::Some(value) => value,
                ::core::option::Option::None => #fallback,
            };
        });
    }

    let host_ident = host.names.host();
    let fields = host.params.iter().map(|param| {
        let ident = &param.ident;
        let cfg = &param.cfg;
        quote!(#(#cfg)* #ident)
    });

    parse_quote!({
        #(#resolve)*
        ::core::result::Result::Ok(#host_ident { #(#fields),* })
    })
}

fn to_mutable(host: &HostDeclaration, members: &[SyntheticMember]) -> syn::Result<Block> {
    let new = mutable_constructor_call(host, members)?;
    let local = host.names.mutable_local();

    let mut setters = Vec::with_capacity(host.params.len());
    for param in &host.params {
        let kind = MemberKind::MutableProperty {
            index: param.index,
            accessor: Accessor::Set,
        };
        let setter: &Ident = member(host, members, kind)?.ident();
        let field = &param.ident;
        let cfg = &param.cfg;
        setters.push(quote!(#(#cfg)* #local.#setter(self.#field);));
    }

    let mutability = (!setters.is_empty()).then(<Token![mut]>::default);

    Ok(parse_quote!({
        let #mutability #local = #new;
        #(#setters)*
        #local
    }))
}

fn copy(host: &HostDeclaration, members: &[SyntheticMember]) -> syn::Result<Block> {
    let into_mutable = member(host, members, MemberKind::ToMutableFunction)?.ident();
    let build = member(host, members, MemberKind::BuildFunction)?.ident();
    let transform = host.names.copy_param();
    let local = host.names.mutable_local();

    Ok(parse_quote!({
        let mut #local = self.#into_mutable();
        #transform(&mut #local);
        #local.#build()
    }))
}

fn dsl_factory(host: &HostDeclaration, members: &[SyntheticMember]) -> syn::Result<Block> {
    let new = mutable_constructor_call(host, members)?;
    let build = member(host, members, MemberKind::BuildFunction)?.ident();
    let builder_action = host.names.dsl_param();
    let local = host.names.mutable_local();

    Ok(parse_quote!({
        let mut #local = #new;
        #builder_action(&mut #local);
        #local.#build()
    }))
}

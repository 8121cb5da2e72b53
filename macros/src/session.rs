//! State of one macro expansion.
//!
//! A [`Session`] is created per invocation of `#[piecemeal]` and dropped
//! when the expansion is done. It owns every discovered host and the member
//! table of each one. Tables are computed at most once, on first use, and are
//! complete before any body is generated from them.

use std::cell::OnceCell;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Ident, ItemStruct};

use crate::body::{self, internal_error};
use crate::model::{PiecemealArgs, Style};
use crate::names::Names;
use crate::parameters::{
    Parameter, check_default_references, load_parameters, primary_constructor,
    strip_field_attrs,
};
use crate::signature::{self, MemberKind, MemberSignature, Owner, SyntheticMember};
use crate::status::{self, ConstructorVisibility};
use crate::util::{ImplGenerics, TypeGenerics, push_error, push_result};

/// Index of a host in the session's host table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostId(pub usize);

/// Options that shape the generated members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub java_setters: bool,
    pub style: Style,
}

impl Config {
    /// The crate-wide defaults, as selected by cargo features.
    pub fn from_features() -> Self {
        Self {
            java_setters: cfg!(feature = "java-setters"),
            style: Style::default(),
        }
    }

    /// Overrides every option that `args` specifies.
    pub fn with_args(self, args: &PiecemealArgs) -> Self {
        Self {
            java_setters: args.java_setters.unwrap_or(self.java_setters),
            style: args.style.unwrap_or(self.style),
        }
    }
}

/// A struct carrying the marker, after it passed the checks.
#[derive(Debug, Clone)]
pub struct HostDeclaration {
    /// The struct as it is emitted: helper attributes stripped and
    /// constrained to crate-local struct expressions.
    pub item: ItemStruct,
    pub names: Names,
    pub params: Vec<Parameter>,
    /// Visibility of struct expressions before the constraint was added.
    pub original_visibility: ConstructorVisibility,
}

#[derive(Debug)]
pub struct Session {
    config: Config,
    hosts: Vec<HostDeclaration>,
    members: Vec<OnceCell<Vec<SyntheticMember>>>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            hosts: Vec::new(),
            members: Vec::new(),
        }
    }

    /// The configuration the session was started with.
    pub fn config(&self) -> Config {
        self.config
    }

    /// Checks `item` and adds it to the host table.
    ///
    /// Nothing is registered if any check fails.
    pub fn register(
        &mut self,
        item: &ItemStruct,
        config: Config,
        rename: Option<Ident>,
    ) -> syn::Result<HostId> {
        status::check_struct(item)?;
        let Some(fields) = primary_constructor(item) else {
            return Err(syn::Error::new_spanned(
                &item.ident,
                "internal error in `#[piecemeal]`: checked struct without named fields",
            ));
        };

        let (params, mut errors) = load_parameters(fields);
        if let Err(err) = check_default_references(&params) {
            push_error(&mut errors, err);
        }
        errors?;

        let original_visibility = status::original_visibility(fields);
        let mut item = item.clone();
        strip_field_attrs(&mut item);
        status::constrain(&mut item);

        let names = Names::new(&item.ident, config, rename);
        let id = HostId(self.hosts.len());

        self.hosts.push(HostDeclaration {
            item,
            names,
            params,
            original_visibility,
        });
        self.members.push(OnceCell::new());
        Ok(id)
    }

    pub fn host(&self, id: HostId) -> &HostDeclaration {
        &self.hosts[id.0]
    }

    /// The synthetic members of a host, generated on first use.
    pub fn children(&self, id: HostId) -> &[SyntheticMember] {
        self.members[id.0].get_or_init(|| signature::generate(self.host(id)))
    }

    /// Names of the synthetic members of a host emitted into `owner`, in
    /// table order.
    pub fn member_names(&self, id: HostId, owner: Owner) -> Vec<&Ident> {
        self.children(id)
            .iter()
            .filter(|member| member.owner() == owner)
            .map(SyntheticMember::ident)
            .collect()
    }

    /// Rejects fields whose accessors would share a name with another member
    /// of the mutable, such as a field `new` without Java-style setters.
    fn check_collisions(&self, id: HostId) -> syn::Result<()> {
        let host = self.host(id);
        let names = self.member_names(id, Owner::Mutable);

        let mut errors = Ok(());
        for (index, name) in names.iter().enumerate() {
            if names[..index].contains(name) {
                push_error(
                    &mut errors,
                    syn::Error::new_spanned(
                        host.names.host(),
                        format!(
                            "`#[piecemeal]` would generate `{name}` twice on `{}`",
                            host.names.mutable_type()
                        ),
                    ),
                );
            }
        }

        errors
    }

    /// Emits the host and everything generated for it.
    pub fn emit(&self, id: HostId) -> syn::Result<TokenStream> {
        let host = self.host(id);
        let members = self.children(id);
        self.check_collisions(id)?;

        let mut errors = Ok(());
        let mut mutable_struct = None;
        let mut mutable_fns = TokenStream::new();
        let mut host_fns = TokenStream::new();

        for member in members {
            let sig = match &member.signature {
                MemberSignature::Type(item) => {
                    mutable_struct = Some((&member.attrs, item));
                    continue;
                },
                MemberSignature::Fn(sig) => sig,
            };

            let Some(block) = push_result(&mut errors, body::generate(member, host, members))
            else {
                continue;
            };

            let attrs = &member.attrs;
            let function = quote! {
                #(#attrs)*
                pub #sig #block
            };

            match member.owner() {
                Owner::Mutable => mutable_fns.extend(function),
                Owner::Host => host_fns.extend(function),
                Owner::Module => push_error(
                    &mut errors,
                    internal_error(host, "function member emitted as an item"),
                ),
            }
        }

        errors?;

        let Some((mutable_attrs, mutable)) = mutable_struct else {
            return Err(internal_error(host, "missing the mutable type"));
        };
        let Some(constructor) = signature::find(members, MemberKind::MutableConstructor) else {
            return Err(internal_error(host, "missing the mutable constructor"));
        };

        let host_item = &host.item;
        let host_ident = &host_item.ident;
        let host_impl_generics = ImplGenerics(&host_item.generics.params);
        let host_ty_generics = TypeGenerics(&host_item.generics.params);
        let host_where_clause = &host_item.generics.where_clause;

        let mutable_ident = &mutable.ident;
        let impl_generics = ImplGenerics(&mutable.generics.params);
        let ty_generics = TypeGenerics(&mutable.generics.params);
        let where_clause = &mutable.generics.where_clause;
        let constructor = constructor.ident();

        Ok(quote! {
            #host_item

            #(#mutable_attrs)*
            #mutable

            impl < #impl_generics > #mutable_ident < #ty_generics > #where_clause {
                #mutable_fns
            }

            #[automatically_derived]
            impl < #impl_generics > ::core::default::Default for #mutable_ident < #ty_generics > #where_clause {
                #[inline]
                fn default() -> Self {
                    Self::#constructor()
                }
            }

            impl < #host_impl_generics > #host_ident < #host_ty_generics > #host_where_clause {
                #host_fns
            }
        })
    }
}

//! The signature pass.
//!
//! Every synthetic member of a host is declared here from the parameter
//! model alone. Bodies are filled in later by [`crate::body`], which only
//! ever looks members up in the table produced by [`generate`].

use proc_macro2::{Group, TokenStream, TokenTree};
use quote::{ToTokens as _, quote};
use syn::punctuated::Punctuated;
use syn::visit_mut::{self, VisitMut};
use syn::{
    Attribute, Expr, ExprPath, ExprStruct, Generics, Ident, Item, ItemStruct, Macro, Path,
    PatStruct, PathSegment, Signature, Token, Type, TypePath, parse_quote,
};

use crate::backing;
use crate::names::display_name;
use crate::parameters::Parameter;
use crate::session::HostDeclaration;
use crate::util::TypeGenerics;

const MUTABLE_MUST_USE: &str = "a mutable does nothing on its own until it is built";

/// Where a member is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// Next to the host, as its own item.
    Module,
    /// In an inherent `impl` of the host.
    Host,
    /// In an inherent `impl` of the mutable type.
    Mutable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    Get,
    GetMut,
    Set,
}

impl Accessor {
    pub const ALL: [Self; 3] = [Self::Get, Self::GetMut, Self::Set];
}

/// The closed set of members synthesized for a host.
///
/// The body pass dispatches on this tag only, never on member names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    MutableType,
    MutableConstructor,
    MutableProperty { index: usize, accessor: Accessor },
    BuildFunction,
    ToMutableFunction,
    CopyFunction,
    DslFactoryFunction,
}

#[derive(Debug, Clone)]
pub enum MemberSignature {
    Type(ItemStruct),
    Fn(Signature),
}

#[derive(Debug, Clone)]
pub struct SyntheticMember {
    pub kind: MemberKind,
    pub attrs: Vec<Attribute>,
    pub signature: MemberSignature,
}

impl SyntheticMember {
    pub fn owner(&self) -> Owner {
        match self.kind {
            MemberKind::MutableType => Owner::Module,
            MemberKind::MutableConstructor
            | MemberKind::MutableProperty { .. }
            | MemberKind::BuildFunction => Owner::Mutable,
            MemberKind::ToMutableFunction
            | MemberKind::CopyFunction
            | MemberKind::DslFactoryFunction => Owner::Host,
        }
    }

    pub fn ident(&self) -> &Ident {
        match &self.signature {
            MemberSignature::Type(item) => &item.ident,
            MemberSignature::Fn(sig) => &sig.ident,
        }
    }

    pub fn mutable_type(&self) -> Option<&ItemStruct> {
        match &self.signature {
            MemberSignature::Type(item) => Some(item),
            MemberSignature::Fn(_) => None,
        }
    }
}

/// Looks up the member of the given kind.
pub fn find(members: &[SyntheticMember], kind: MemberKind) -> Option<&SyntheticMember> {
    members.iter().find(|member| member.kind == kind)
}

/// The fully applied type of a struct declared with `item`'s generics.
pub fn applied_type(item: &ItemStruct) -> Type {
    let ident = &item.ident;
    let ty_generics = TypeGenerics(&item.generics.params);
    parse_quote!(#ident < #ty_generics >)
}

/// Produces the complete member table of a host.
///
/// The mutable type comes first. Every other member depends on it and is
/// left out if it is missing from the table built so far.
pub fn generate(host: &HostDeclaration) -> Vec<SyntheticMember> {
    let mut members = vec![mutable_type(host)];

    members.extend(mutable_constructor(host, &members));
    for param in &host.params {
        for accessor in Accessor::ALL {
            members.extend(property(host, &members, param, accessor));
        }
    }

    members.extend(build_function(host, &members));
    members.extend(to_mutable_function(host, &members));
    members.extend(copy_function(host, &members));
    members.extend(dsl_factory_function(host, &members));
    members
}

fn doc(text: &str) -> Attribute {
    parse_quote!(#[doc = #text])
}

fn mutable_type(host: &HostDeclaration) -> SyntheticMember {
    let names = &host.names;
    let mut substitution = Substitution::new(&host.item);

    let mut generics = host.item.generics.clone();
    substitution.visit_generics_mut(&mut generics);

    let vis = &host.item.vis;
    let ident = names.mutable_type();
    let fields = backing::field_declarations(host, &mut substitution);
    let Generics {
        params,
        where_clause,
        ..
    } = &generics;

    let item: ItemStruct = parse_quote! {
        #vis struct #ident < #params > #where_clause {
            #fields
        }
    };

    let host_ident = names.host();
    let into_mutable = names.into_mutable();
    let attrs = vec![
        doc(&format!("A mutable counterpart of [`{host_ident}`].")),
        doc(""),
        doc(&format!(
            "Created by [`{ident}::new`] or [`{host_ident}::{into_mutable}`], and turned back \
             into a [`{host_ident}`] by [`{ident}::build`]."
        )),
        parse_quote!(#[must_use = #MUTABLE_MUST_USE]),
    ];

    SyntheticMember {
        kind: MemberKind::MutableType,
        attrs,
        signature: MemberSignature::Type(item),
    }
}

fn mutable_constructor(
    host: &HostDeclaration,
    members: &[SyntheticMember],
) -> Option<SyntheticMember> {
    find(members, MemberKind::MutableType)?;

    let ident = host.names.mutable_constructor();
    Some(SyntheticMember {
        kind: MemberKind::MutableConstructor,
        attrs: vec![
            doc("Creates a mutable without any property set."),
            parse_quote!(#[inline]),
        ],
        signature: MemberSignature::Fn(parse_quote!(const fn #ident() -> Self)),
    })
}

fn property(
    host: &HostDeclaration,
    members: &[SyntheticMember],
    param: &Parameter,
    accessor: Accessor,
) -> Option<SyntheticMember> {
    find(members, MemberKind::MutableType)?;

    let names = &host.names;
    let ty = Substitution::new(&host.item).ty(&param.ty);
    let name = display_name(&param.ident);

    let (attrs, signature): (Vec<Attribute>, Signature) = match accessor {
        Accessor::Get => {
            let getter = names.getter(&param.ident);
            (
                vec![
                    doc(&format!("Returns the value of `{name}`.")),
                    doc(""),
                    doc("Fails if it was never set, even if it has a default value."),
                    parse_quote!(#[inline]),
                ],
                parse_quote! {
                    fn #getter(&self) -> ::core::result::Result<&#ty, ::piecemeal::UninitializedProperty>
                },
            )
        },
        Accessor::GetMut => {
            let getter = names.getter_mut(&param.ident);
            (
                vec![
                    doc(&format!("Returns a mutable reference to the value of `{name}`.")),
                    parse_quote!(#[inline]),
                ],
                parse_quote! {
                    fn #getter(&mut self) -> ::core::result::Result<&mut #ty, ::piecemeal::UninitializedProperty>
                },
            )
        },
        Accessor::Set => {
            let setter = names.setter(&param.ident);
            let header = match &param.default {
                None => format!("Sets `{name}`."),
                Some(_) => format!("Sets `{name}`, replacing its default value."),
            };
            (
                vec![doc(&header), parse_quote!(#[inline])],
                parse_quote!(fn #setter(&mut self, value: #ty) -> &mut Self),
            )
        },
    };

    let attrs = param.cfg.iter().cloned().chain(attrs).collect();
    Some(SyntheticMember {
        kind: MemberKind::MutableProperty {
            index: param.index,
            accessor,
        },
        attrs,
        signature: MemberSignature::Fn(signature),
    })
}

fn build_function(
    host: &HostDeclaration,
    members: &[SyntheticMember],
) -> Option<SyntheticMember> {
    find(members, MemberKind::MutableType)?;

    let ident = host.names.build();
    let host_ident = host.names.host();
    let host_ty = Substitution::new(&host.item).host_ty().clone();
    // nothing to take out of `self` without any property
    let mutability = (!host.params.is_empty()).then(<Token![mut]>::default);

    Some(SyntheticMember {
        kind: MemberKind::BuildFunction,
        attrs: vec![
            doc(&format!("Creates a [`{host_ident}`] from the properties set so far.")),
            doc(""),
            doc("Properties are resolved in declaration order. A property that was never set"),
            doc("takes its default value, which may use the properties resolved before it."),
            doc(""),
            doc("# Errors"),
            doc(""),
            doc("Fails with the first property that was neither set nor has a default value."),
        ],
        signature: MemberSignature::Fn(parse_quote! {
            fn #ident(#mutability self) -> ::core::result::Result<#host_ty, ::piecemeal::UninitializedProperty>
        }),
    })
}

fn to_mutable_function(
    host: &HostDeclaration,
    members: &[SyntheticMember],
) -> Option<SyntheticMember> {
    let mutable = find(members, MemberKind::MutableType)?.mutable_type()?;
    let mutable_ty = applied_type(mutable);

    let ident = host.names.into_mutable();
    let mutable_ident = &mutable.ident;

    Some(SyntheticMember {
        kind: MemberKind::ToMutableFunction,
        attrs: vec![
            doc(&format!("Moves every field into a new [`{mutable_ident}`].")),
            parse_quote!(#[inline]),
        ],
        signature: MemberSignature::Fn(parse_quote!(fn #ident(self) -> #mutable_ty)),
    })
}

fn copy_function(
    host: &HostDeclaration,
    members: &[SyntheticMember],
) -> Option<SyntheticMember> {
    let mutable = find(members, MemberKind::MutableType)?.mutable_type()?;
    let mutable_ty = applied_type(mutable);

    let ident = host.names.copy();
    let param = host.names.copy_param();

    Some(SyntheticMember {
        kind: MemberKind::CopyFunction,
        attrs: vec![
            doc(&format!("Returns this value with the changes made by `{param}`.")),
            doc(""),
            doc(&format!("`{param}` is called exactly once.")),
            doc(""),
            doc("# Errors"),
            doc(""),
            doc("Fails if `transform` left a property without a default value unset."),
            parse_quote!(#[inline]),
        ],
        signature: MemberSignature::Fn(parse_quote! {
            fn #ident(
                self,
                #param: impl ::core::ops::FnOnce(&mut #mutable_ty),
            ) -> ::core::result::Result<Self, ::piecemeal::UninitializedProperty>
        }),
    })
}

fn dsl_factory_function(
    host: &HostDeclaration,
    members: &[SyntheticMember],
) -> Option<SyntheticMember> {
    let mutable = find(members, MemberKind::MutableType)?.mutable_type()?;
    let mutable_ty = applied_type(mutable);

    let ident = host.names.dsl_factory();
    let param = host.names.dsl_param();
    let host_ident = host.names.host();

    let mut attrs = vec![doc(&format!(
        "Creates a [`{host_ident}`] from the properties set by `{param}`."
    ))];
    if let Some(scope) = host.original_visibility.unreachable_from() {
        attrs.push(doc(""));
        attrs.push(doc(&format!(
            "Unlike a struct expression, this also works {scope}."
        )));
    }
    attrs.extend([
        doc(""),
        doc("# Errors"),
        doc(""),
        doc("Fails if a property without a default value was not set."),
        parse_quote!(#[inline]),
    ]);

    Some(SyntheticMember {
        kind: MemberKind::DslFactoryFunction,
        attrs,
        signature: MemberSignature::Fn(parse_quote! {
            fn #ident(
                #param: impl ::core::ops::FnOnce(&mut #mutable_ty),
            ) -> ::core::result::Result<Self, ::piecemeal::UninitializedProperty>
        }),
    })
}

/// Replaces `Self` with the host type in code that is moved out of the
/// host's own scope.
///
/// Generic parameters keep their names in the mutable type, so `Self` is the
/// only identifier that needs replacing.
#[derive(Debug, Clone)]
pub struct Substitution {
    host_ident: Ident,
    host_ty: Type,
}

impl Substitution {
    pub fn new(host: &ItemStruct) -> Self {
        Self {
            host_ident: host.ident.clone(),
            host_ty: applied_type(host),
        }
    }

    pub fn host_ty(&self) -> &Type {
        &self.host_ty
    }

    pub fn ty(&mut self, ty: &Type) -> Type {
        let mut ty = ty.clone();
        self.visit_type_mut(&mut ty);
        ty
    }

    pub fn expr(&mut self, expr: &Expr) -> Expr {
        let mut expr = expr.clone();
        self.visit_expr_mut(&mut expr);
        expr
    }

    /// `<Host<..>>::rest` for a path `Self::rest`.
    fn qualified<T: syn::parse::Parse>(&self, path: &Path) -> T {
        let host_ty = &self.host_ty;
        let rest: Punctuated<PathSegment, Token![::]> =
            path.segments.iter().skip(1).cloned().collect();
        parse_quote!(<#host_ty>::#rest)
    }

    fn tokens(&self, tokens: TokenStream) -> TokenStream {
        let mut output = TokenStream::new();
        let mut tokens = tokens.into_iter().peekable();

        while let Some(token) = tokens.next() {
            match token {
                TokenTree::Ident(ident) if ident == "Self" => {
                    let qualified =
                        matches!(tokens.peek(), Some(TokenTree::Punct(punct)) if punct.as_char() == ':');
                    if qualified {
                        let host_ty = &self.host_ty;
                        output.extend(quote!(<#host_ty>));
                    } else {
                        self.host_ident.to_tokens(&mut output);
                    }
                },
                TokenTree::Group(group) => {
                    let mut replaced = Group::new(group.delimiter(), self.tokens(group.stream()));
                    replaced.set_span(group.span());
                    output.extend([TokenTree::Group(replaced)]);
                },
                token => output.extend([token]),
            }
        }

        output
    }
}

fn starts_with_self(path: &Path) -> bool {
    path.leading_colon.is_none() && path.segments.first().is_some_and(|s| s.ident == "Self")
}

impl VisitMut for Substitution {
    fn visit_type_mut(&mut self, ty: &mut Type) {
        let replacement = match &*ty {
            Type::Path(TypePath { qself: None, path }) if starts_with_self(path) => {
                if path.segments.len() == 1 {
                    Some(self.host_ty.clone())
                } else {
                    Some(self.qualified(path))
                }
            },
            _ => None,
        };

        match replacement {
            // the host type has no `Self` in it, so only the rest is visited
            Some(replacement) => {
                *ty = replacement;
                visit_mut::visit_type_mut(self, ty);
            },
            None => visit_mut::visit_type_mut(self, ty),
        }
    }

    fn visit_expr_path_mut(&mut self, expr: &mut ExprPath) {
        if expr.qself.is_none() && starts_with_self(&expr.path) {
            if expr.path.segments.len() == 1 {
                expr.path = self.host_ident.clone().into();
            } else {
                *expr = self.qualified(&expr.path);
            }
        }

        visit_mut::visit_expr_path_mut(self, expr);
    }

    fn visit_expr_struct_mut(&mut self, expr: &mut ExprStruct) {
        if expr.qself.is_none() && expr.path.is_ident("Self") {
            expr.path = self.host_ident.clone().into();
        }

        visit_mut::visit_expr_struct_mut(self, expr);
    }

    fn visit_pat_struct_mut(&mut self, pat: &mut PatStruct) {
        if pat.qself.is_none() && pat.path.is_ident("Self") {
            pat.path = self.host_ident.clone().into();
        }

        visit_mut::visit_pat_struct_mut(self, pat);
    }

    fn visit_macro_mut(&mut self, mac: &mut Macro) {
        mac.tokens = self.tokens(std::mem::take(&mut mac.tokens));
    }

    // nested items have their own `Self`
    fn visit_item_mut(&mut self, _item: &mut Item) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Config, Session};

    fn host(item: ItemStruct) -> HostDeclaration {
        let mut session = Session::new(Config::from_features());
        let id = session.register(&item, session.config(), None).unwrap();
        session.host(id).clone()
    }

    fn text(tokens: impl quote::ToTokens) -> String {
        tokens.to_token_stream().to_string()
    }

    #[test]
    fn one_property_per_accessor_and_parameter() {
        let host = host(parse_quote! {
            pub struct Person {
                pub name: String,
                #[piecemeal(default = 0)]
                pub age: u32,
            }
        });

        let members = generate(&host);
        let kinds: Vec<_> = members.iter().map(|m| m.kind).collect();

        assert_eq!(kinds.len(), 1 + 1 + 2 * 3 + 4);
        assert_eq!(kinds[0], MemberKind::MutableType);
        assert_eq!(kinds[1], MemberKind::MutableConstructor);
        assert_eq!(
            kinds[2..8],
            [
                MemberKind::MutableProperty { index: 0, accessor: Accessor::Get },
                MemberKind::MutableProperty { index: 0, accessor: Accessor::GetMut },
                MemberKind::MutableProperty { index: 0, accessor: Accessor::Set },
                MemberKind::MutableProperty { index: 1, accessor: Accessor::Get },
                MemberKind::MutableProperty { index: 1, accessor: Accessor::GetMut },
                MemberKind::MutableProperty { index: 1, accessor: Accessor::Set },
            ]
        );
        assert_eq!(
            kinds[8..],
            [
                MemberKind::BuildFunction,
                MemberKind::ToMutableFunction,
                MemberKind::CopyFunction,
                MemberKind::DslFactoryFunction,
            ]
        );

        let names: Vec<_> = members.iter().map(|m| m.ident().to_string()).collect();
        assert_eq!(
            names,
            [
                "PersonMutable",
                "new",
                "get_name",
                "get_name_mut",
                "name",
                "get_age",
                "get_age_mut",
                "age",
                "build",
                "into_mutable",
                "copy",
                "build",
            ]
        );
    }

    #[test]
    fn owners() {
        let host = host(parse_quote!(struct A { a: u8 }));
        let members = generate(&host);

        let owner = |kind| find(&members, kind).unwrap().owner();
        assert_eq!(owner(MemberKind::MutableType), Owner::Module);
        assert_eq!(owner(MemberKind::BuildFunction), Owner::Mutable);
        assert_eq!(owner(MemberKind::DslFactoryFunction), Owner::Host);
    }

    #[test]
    fn dependents_need_the_mutable_type() {
        let host = host(parse_quote!(struct A { a: u8 }));
        let empty = [];

        assert!(mutable_constructor(&host, &empty).is_none());
        assert!(build_function(&host, &empty).is_none());
        assert!(to_mutable_function(&host, &empty).is_none());
        assert!(copy_function(&host, &empty).is_none());
        assert!(dsl_factory_function(&host, &empty).is_none());
        assert!(property(&host, &empty, &host.params[0], Accessor::Set).is_none());
    }

    #[test]
    fn mutable_type_keeps_generics_and_forces_invariance() {
        let host = host(parse_quote! {
            pub(crate) struct Thing<'a, T: Clone + 'a, const N: usize>
            where
                T: Default,
            {
                pub value: &'a T,
                pub next: Option<Box<Self>>,
            }
        });

        let members = generate(&host);
        let mutable = members[0].mutable_type().unwrap();

        assert_eq!(mutable.ident, "ThingMutable");
        assert_eq!(text(&mutable.vis), "pub (crate)");
        assert_eq!(mutable.generics.params.len(), 3);
        assert!(mutable.generics.where_clause.is_some());

        let fields: Vec<_> = mutable.fields.iter().map(|f| text(&f.ty)).collect();
        assert_eq!(
            fields,
            [
                ":: piecemeal :: Tracked < & 'a T >",
                ":: piecemeal :: Tracked < Option < Box < Thing < 'a , T , N , > > > >",
                ":: core :: marker :: PhantomData < (fn (& 'a ()) -> & 'a () , fn (T) -> T ,) >",
            ]
        );
    }

    #[test]
    fn signatures() {
        let host = host(parse_quote!(struct Thing<T> { value: T }));
        let members = generate(&host);

        let sig = |kind| match &find(&members, kind).unwrap().signature {
            MemberSignature::Fn(sig) => text(sig),
            MemberSignature::Type(_) => unreachable!(),
        };

        assert_eq!(sig(MemberKind::MutableConstructor), "const fn new () -> Self");
        assert_eq!(
            sig(MemberKind::MutableProperty { index: 0, accessor: Accessor::Set }),
            "fn value (& mut self , value : T) -> & mut Self"
        );
        assert_eq!(
            sig(MemberKind::BuildFunction),
            "fn build (mut self) -> :: core :: result :: Result < Thing < T , > , :: piecemeal :: UninitializedProperty >"
        );
        assert_eq!(
            sig(MemberKind::ToMutableFunction),
            "fn into_mutable (self) -> ThingMutable < T , >"
        );
        assert_eq!(
            sig(MemberKind::DslFactoryFunction),
            "fn build (builder_action : impl :: core :: ops :: FnOnce (& mut ThingMutable < T , >) ,) -> :: core :: result :: Result < Self , :: piecemeal :: UninitializedProperty >"
        );
    }

    #[test]
    fn dsl_factory_mentions_private_fields() {
        let docs = |item| {
            let host = host(item);
            let members = generate(&host);
            let factory = find(&members, MemberKind::DslFactoryFunction).unwrap();
            factory.attrs.iter().map(|attr| text(attr)).collect::<Vec<_>>().join("\n")
        };

        assert!(!docs(parse_quote!(pub struct A { pub a: u8 })).contains("struct expression"));
        assert!(docs(parse_quote!(pub struct A { a: u8 })).contains("outside of its module"));
    }

    #[test]
    fn accessors_of_gated_fields_are_gated() {
        let host = host(parse_quote! {
            struct Gated {
                a: u8,
                #[cfg(any())]
                b: u8,
            }
        });
        let members = generate(&host);

        let gated = |index| {
            Accessor::ALL.map(|accessor| {
                let kind = MemberKind::MutableProperty { index, accessor };
                let attrs = &find(&members, kind).unwrap().attrs;
                attrs.iter().any(|attr| attr.path().is_ident("cfg"))
            })
        };
        assert_eq!(gated(0), [false; 3]);
        assert_eq!(gated(1), [true; 3]);
    }

    #[test]
    fn build_without_properties_does_not_take_self_mutably() {
        let host = host(parse_quote!(struct Empty {}));
        let members = generate(&host);

        let MemberSignature::Fn(sig) = &find(&members, MemberKind::BuildFunction).unwrap().signature
        else {
            panic!("build is a function");
        };
        assert!(text(sig).starts_with("fn build (self)"));
    }

    #[test]
    fn substitution_replaces_self() {
        let item: ItemStruct = parse_quote!(struct Node<T> { value: T });
        let mut substitution = Substitution::new(&item);

        let ty = substitution.ty(&parse_quote!(Vec<Self>));
        assert_eq!(text(ty), "Vec < Node < T , > >");

        let ty = substitution.ty(&parse_quote!(Self::Item));
        assert_eq!(text(ty), "< Node < T , > > :: Item");

        let expr = substitution.expr(&parse_quote!(Self::new(Self::LIMIT)));
        assert_eq!(text(expr), "< Node < T , > > :: new (< Node < T , > > :: LIMIT)");

        let expr = substitution.expr(&parse_quote!(Self { value: 1 }));
        assert_eq!(text(expr), "Node { value : 1 }");

        let expr = substitution.expr(&parse_quote!(vec![Self::EMPTY, Self]));
        assert_eq!(text(expr), "vec ! [< Node < T , > > :: EMPTY , Node]");
    }

    #[test]
    fn substitution_skips_nested_items() {
        let item: ItemStruct = parse_quote!(struct Node { value: u8 });
        let mut substitution = Substitution::new(&item);

        let expr = substitution.expr(&parse_quote!({
            impl Other {
                fn f() -> Self { Self }
            }
            Self::ZERO
        }));
        let expected: Expr = parse_quote!({
            impl Other {
                fn f() -> Self { Self }
            }
            <Node<>>::ZERO
        });
        assert_eq!(text(expr), text(expected));
    }
}

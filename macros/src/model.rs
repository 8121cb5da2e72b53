use darling::ast::NestedMeta;
use darling::{FromAttributes, FromMeta};
use syn::{Attribute, Expr, Ident, Meta};

/// Arguments of the `#[piecemeal(...)]` marker, either on the struct itself
/// or on an enclosing module.
#[derive(Default, Debug, FromMeta)]
pub struct PiecemealArgs {
    pub rename: Option<Ident>,
    pub java_setters: Option<bool>,
    pub style: Option<Style>,
}

/// Member-generation policy.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, FromMeta)]
pub enum Style {
    /// `{Host}Mutable` with `into_mutable`.
    #[default]
    #[darling(rename = "mutable")]
    Mutable,
    /// `{Host}Builder` with `into_builder`.
    #[darling(rename = "builder")]
    Builder,
}

#[derive(Default, Debug, FromAttributes)]
#[darling(attributes(piecemeal))]
pub struct FieldAttrs {
    pub default: Option<Box<Expr>>,
}

impl PiecemealArgs {
    /// Parses the token stream handed to the attribute macro.
    pub fn from_tokens(args: proc_macro2::TokenStream) -> darling::Result<Self> {
        if args.is_empty() {
            return Ok(Self::default());
        }

        let list = NestedMeta::parse_meta_list(args)?;
        Self::from_list(&list)
    }

    /// Parses a marker attribute found on an item inside an annotated module.
    pub fn from_marker(attr: &Attribute) -> darling::Result<Self> {
        match &attr.meta {
            // a bare `#[piecemeal]` uses the enclosing defaults
            Meta::Path(_) => Ok(Self::default()),
            Meta::List(list) => Self::from_tokens(list.tokens.clone()),
            meta @ Meta::NameValue(_) => Err(darling::Error::unsupported_format("name-value").with_span(meta)),
        }
    }
}

//! Identifiers of every synthesized declaration.
//!
//! All names are pure functions of the host identifier, the field
//! identifiers and the session configuration, so the signature pass and the
//! body pass always agree on them.

use proc_macro2::Span;
use quote::format_ident;
use syn::Ident;
use syn::ext::IdentExt as _;

use crate::model::Style;
use crate::session::Config;

#[derive(Debug, Clone)]
pub struct Names {
    host: Ident,
    mutable: Ident,
    style: Style,
    java_setters: bool,
}

impl Names {
    pub fn new(host: &Ident, config: Config, rename: Option<Ident>) -> Self {
        let mutable = rename.unwrap_or_else(|| {
            let suffix = match config.style {
                Style::Mutable => "Mutable",
                Style::Builder => "Builder",
            };
            format_ident!("{}{}", host.unraw(), suffix, span = host.span())
        });

        Self {
            host: host.clone(),
            mutable,
            style: config.style,
            java_setters: config.java_setters,
        }
    }

    pub fn host(&self) -> &Ident {
        &self.host
    }

    /// The synthesized mutable/builder type.
    pub fn mutable_type(&self) -> &Ident {
        &self.mutable
    }

    pub fn mutable_constructor(&self) -> Ident {
        simple("new")
    }

    pub fn into_mutable(&self) -> Ident {
        match self.style {
            Style::Mutable => simple("into_mutable"),
            Style::Builder => simple("into_builder"),
        }
    }

    pub fn build(&self) -> Ident {
        simple("build")
    }

    pub fn copy(&self) -> Ident {
        simple("copy")
    }

    pub fn dsl_factory(&self) -> Ident {
        simple("build")
    }

    /// `{field}`, or `set_{field}` with Java-style setter names.
    pub fn setter(&self, field: &Ident) -> Ident {
        if self.java_setters {
            format_ident!("set_{}", field.unraw(), span = field.span())
        } else {
            field.clone()
        }
    }

    pub fn getter(&self, field: &Ident) -> Ident {
        format_ident!("get_{}", field.unraw(), span = field.span())
    }

    pub fn getter_mut(&self, field: &Ident) -> Ident {
        format_ident!("get_{}_mut", field.unraw(), span = field.span())
    }

    /// The field of the mutable type holding the backing pair of `field`.
    pub fn backing_field(&self, field: &Ident) -> Ident {
        field.clone()
    }

    pub fn variance_marker(&self) -> Ident {
        simple("__piecemeal_variance")
    }

    pub fn copy_param(&self) -> Ident {
        simple("transform")
    }

    pub fn dsl_param(&self) -> Ident {
        simple("builder_action")
    }

    pub fn mutable_local(&self) -> Ident {
        simple("mutable")
    }
}

/// The name of a property as shown in error messages.
pub fn display_name(field: &Ident) -> String {
    field.unraw().to_string()
}

fn simple(ident: &str) -> Ident {
    Ident::new(ident, Span::call_site())
}

use darling::FromAttributes as _;
use proc_macro2::{Literal, Spacing, TokenStream, TokenTree};
use syn::visit::{self, Visit};
use syn::{
    Attribute, Block, Expr, ExprClosure, ExprPath, Fields, FieldsNamed, Ident, ItemStruct, LitStr,
    Local, Macro, Pat, Stmt, Type,
};

use crate::model::FieldAttrs;
use crate::util::{cfg_attrs, push_error, strip_helper_attrs};

/// One parameter of the primary constructor, i.e. one named field.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub index: usize,
    pub ident: Ident,
    pub ty: Type,
    pub default: Option<Expr>,
    /// `#[cfg]` attributes of the field, repeated on everything generated
    /// for it.
    pub cfg: Vec<Attribute>,
}

/// The field list of `item`, if it is a struct with named fields.
pub fn primary_constructor(item: &ItemStruct) -> Option<&FieldsNamed> {
    match &item.fields {
        Fields::Named(fields) => Some(fields),
        Fields::Unnamed(_) | Fields::Unit => None,
    }
}

/// Loads the parameters in declaration order.
///
/// Attribute errors are collected and returned alongside the parameters
/// instead of stopping at the first one.
pub fn load_parameters(fields: &FieldsNamed) -> (Vec<Parameter>, syn::Result<()>) {
    let mut errors = Ok(());
    let mut parameters = Vec::with_capacity(fields.named.len());

    for (index, field) in fields.named.iter().enumerate() {
        let attrs = match FieldAttrs::from_attributes(&field.attrs) {
            Ok(attrs) => attrs,
            Err(err) => {
                push_error(&mut errors, err.into());
                FieldAttrs::default()
            },
        };

        let Some(ident) = field.ident.clone() else {
            push_error(
                &mut errors,
                syn::Error::new_spanned(field, "expected a named field"),
            );
            continue;
        };

        parameters.push(Parameter {
            index,
            ident,
            ty: field.ty.clone(),
            default: attrs.default.map(|default| *default),
            cfg: cfg_attrs(&field.attrs),
        });
    }

    (parameters, errors)
}

/// Removes the `#[piecemeal(...)]` helper attributes from every field.
pub fn strip_field_attrs(item: &mut ItemStruct) {
    for field in item.fields.iter_mut() {
        strip_helper_attrs(&mut field.attrs);
    }
}

/// Checks that every default expression only refers to parameters declared
/// before its own.
pub fn check_default_references(parameters: &[Parameter]) -> syn::Result<()> {
    let mut errors = Ok(());

    for parameter in parameters {
        let Some(default) = &parameter.default else {
            continue;
        };

        let mut references = References {
            parameters,
            current: parameter,
            shadowed: Vec::new(),
            errors: Ok(()),
        };

        references.visit_expr(default);
        if let Err(err) = references.errors {
            push_error(&mut errors, err);
        }
    }

    errors
}

struct References<'a> {
    parameters: &'a [Parameter],
    current: &'a Parameter,
    shadowed: Vec<Ident>,
    errors: syn::Result<()>,
}

impl References<'_> {
    fn check(&mut self, ident: &Ident) {
        if ident == "self" {
            push_error(
                &mut self.errors,
                syn::Error::new(ident.span(), "default values cannot refer to `self`"),
            );
            return;
        }

        if self.shadowed.iter().any(|s| s == ident) {
            return;
        }

        let Some(referenced) = self.parameters.iter().find(|p| p.ident == *ident) else {
            return;
        };

        let current = &self.current.ident;
        if referenced.index == self.current.index {
            push_error(
                &mut self.errors,
                syn::Error::new(
                    ident.span(),
                    format!("the default value of `{current}` cannot refer to itself"),
                ),
            );
        } else if referenced.index > self.current.index {
            push_error(
                &mut self.errors,
                syn::Error::new(
                    ident.span(),
                    format!(
                        "the default value of `{current}` cannot refer to `{ident}`, which is declared after it"
                    ),
                ),
            );
        }
    }

    fn check_tokens(&mut self, tokens: TokenStream) {
        let tokens: Vec<TokenTree> = tokens.into_iter().collect();
        let named = named_arguments(&tokens);

        // identifiers directly after `.` or `::` are fields and path segments
        let mut after_path_punct = false;
        for (index, token) in tokens.iter().enumerate() {
            match token {
                TokenTree::Ident(ident) => {
                    if !after_path_punct && !is_label(tokens.get(index + 1)) {
                        self.check(ident);
                    }
                    after_path_punct = false;
                },
                TokenTree::Punct(punct) => {
                    let previous = index.checked_sub(1).and_then(|i| tokens.get(i));
                    after_path_punct = match punct.as_char() {
                        '.' => !is_joint(previous, '.'),
                        ':' => is_joint(previous, ':'),
                        _ => false,
                    };
                },
                TokenTree::Group(group) => {
                    self.check_tokens(group.stream());
                    after_path_punct = false;
                },
                TokenTree::Literal(literal) => {
                    for capture in format_captures(literal) {
                        if !named.iter().any(|name| **name == capture) {
                            self.check(&capture);
                        }
                    }
                    after_path_punct = false;
                },
            }
        }
    }

    fn shadow(&mut self, pat: &Pat) {
        match pat {
            Pat::Ident(pat) => self.shadowed.push(pat.ident.clone()),
            Pat::Type(pat) => self.shadow(&pat.pat),
            Pat::Reference(pat) => self.shadow(&pat.pat),
            Pat::Tuple(pat) => pat.elems.iter().for_each(|p| self.shadow(p)),
            _ => {},
        }
    }
}

fn is_joint(token: Option<&TokenTree>, ch: char) -> bool {
    matches!(token, Some(TokenTree::Punct(punct)) if punct.as_char() == ch && punct.spacing() == Spacing::Joint)
}

/// Whether the next token makes an identifier a field name or argument name,
/// as in `Item { count: 1 }` or `format!("{n}", n = 1)`.
fn is_label(next: Option<&TokenTree>) -> bool {
    matches!(next, Some(TokenTree::Punct(punct)) if matches!(punct.as_char(), ':' | '=') && punct.spacing() == Spacing::Alone)
}

/// Names of the `name = value` arguments in a macro invocation.
fn named_arguments(tokens: &[TokenTree]) -> Vec<&Ident> {
    tokens
        .windows(2)
        .filter_map(|pair| match &pair[0] {
            TokenTree::Ident(ident) if is_label(Some(&pair[1])) => Some(ident),
            _ => None,
        })
        .collect()
}

/// Identifiers captured by a string literal used as a format string, as in
/// `"{name}"` or `"{name:>8}"`.
fn format_captures(literal: &Literal) -> Vec<Ident> {
    let Ok(lit) = syn::parse2::<LitStr>(TokenTree::Literal(literal.clone()).into()) else {
        return Vec::new();
    };

    let value = lit.value();
    let mut captures = Vec::new();
    let mut rest = value.as_str();
    while let Some(start) = rest.find('{') {
        rest = &rest[start + 1..];
        if let Some(escaped) = rest.strip_prefix('{') {
            rest = escaped;
            continue;
        }

        let end = rest.find(['}', ':']).unwrap_or(rest.len());
        let name = rest[..end].trim();
        if is_identifier(name) {
            captures.push(Ident::new(name, lit.span()));
        }
        rest = &rest[end..];
    }

    captures
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            name != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        },
        _ => false,
    }
}

impl<'ast> Visit<'ast> for References<'_> {
    fn visit_expr_path(&mut self, expr: &'ast ExprPath) {
        if expr.qself.is_none() {
            if let Some(ident) = expr.path.get_ident() {
                self.check(ident);
            }
        }

        visit::visit_expr_path(self, expr);
    }

    fn visit_expr_closure(&mut self, closure: &'ast ExprClosure) {
        let depth = self.shadowed.len();
        for input in &closure.inputs {
            self.shadow(input);
        }

        visit::visit_expr_closure(self, closure);
        self.shadowed.truncate(depth);
    }

    fn visit_block(&mut self, block: &'ast Block) {
        let depth = self.shadowed.len();
        for stmt in &block.stmts {
            match stmt {
                Stmt::Local(Local { pat, init, .. }) => {
                    // the initializer can't see its own binding
                    if let Some(init) = init {
                        self.visit_local_init(init);
                    }
                    self.shadow(pat);
                },
                stmt => self.visit_stmt(stmt),
            }
        }
        self.shadowed.truncate(depth);
    }

    fn visit_macro(&mut self, mac: &'ast Macro) {
        self.check_tokens(mac.tokens.clone());
    }
}

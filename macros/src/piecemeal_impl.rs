use proc_macro2::TokenStream;
use quote::ToTokens as _;
use syn::{Attribute, Item, ItemMod};

use crate::model::PiecemealArgs;
use crate::parameters::strip_field_attrs;
use crate::session::{Config, Session};
use crate::status;
use crate::util::{push_result, strip_helper_attrs, take_marker};

pub fn entry_point(args: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let mut item: Item = syn::parse2(item)?;

    let expanded = PiecemealArgs::from_tokens(args)
        .map_err(syn::Error::from)
        .and_then(|args| expand(&args, &item));

    match expanded {
        Ok(output) => Ok(output),
        Err(err) => {
            // nothing is synthesized for a failed item, but it is kept so that
            // the errors don't cascade into every place that uses it
            strip_item(&mut item);
            let mut output = item.into_token_stream();
            output.extend(err.into_compile_error());
            Ok(output)
        },
    }
}

fn expand(args: &PiecemealArgs, item: &Item) -> syn::Result<TokenStream> {
    let mut session = Session::new(Config::from_features());

    match item {
        Item::Mod(module) => {
            let config = module_config(session.config(), args)?;
            let module = expand_module(&mut session, config, module.clone())?;
            Ok(module.into_token_stream())
        },
        item => {
            let item = status::check_declaration(item)?;
            let config = session.config().with_args(args);
            let id = session.register(item, config, args.rename.clone())?;
            session.emit(id)
        },
    }
}

fn module_config(base: Config, args: &PiecemealArgs) -> syn::Result<Config> {
    match &args.rename {
        Some(rename) => Err(syn::Error::new_spanned(
            rename,
            "`rename` cannot be used on a module",
        )),
        None => Ok(base.with_args(args)),
    }
}

/// Replaces every marked item of an inline module with its expansion.
fn expand_module(
    session: &mut Session,
    config: Config,
    mut module: ItemMod,
) -> syn::Result<ItemMod> {
    let Some((brace, items)) = module.content.take() else {
        return Err(syn::Error::new_spanned(
            &module,
            "`#[piecemeal]` can only be applied to inline modules",
        ));
    };

    let mut errors = Ok(());
    let mut expanded = Vec::with_capacity(items.len());

    for mut item in items {
        let marker = item_attrs(&mut item).and_then(take_marker);

        if let Item::Mod(inner) = item {
            if inner.content.is_none() {
                expanded.push(Item::Mod(inner));
                continue;
            }

            let config = match marker {
                Some(marker) => {
                    let config = PiecemealArgs::from_marker(&marker)
                        .map_err(syn::Error::from)
                        .and_then(|args| module_config(config, &args));
                    let Some(config) = push_result(&mut errors, config) else {
                        continue;
                    };
                    config
                },
                None => config,
            };

            if let Some(inner) = push_result(&mut errors, expand_module(session, config, inner)) {
                expanded.push(Item::Mod(inner));
            }
            continue;
        }

        let Some(marker) = marker else {
            expanded.push(item);
            continue;
        };

        let output = PiecemealArgs::from_marker(&marker)
            .map_err(syn::Error::from)
            .and_then(|args| {
                let host = status::check_declaration(&item)?;
                let id = session.register(host, config.with_args(&args), args.rename.clone())?;
                session.emit(id)
            });

        if let Some(output) = push_result(&mut errors, output) {
            expanded.push(Item::Verbatim(output));
        }
    }

    errors?;
    module.content = Some((brace, expanded));
    Ok(module)
}

fn item_attrs(item: &mut Item) -> Option<&mut Vec<Attribute>> {
    match item {
        Item::Const(item) => Some(&mut item.attrs),
        Item::Enum(item) => Some(&mut item.attrs),
        Item::ExternCrate(item) => Some(&mut item.attrs),
        Item::Fn(item) => Some(&mut item.attrs),
        Item::ForeignMod(item) => Some(&mut item.attrs),
        Item::Impl(item) => Some(&mut item.attrs),
        Item::Macro(item) => Some(&mut item.attrs),
        Item::Mod(item) => Some(&mut item.attrs),
        Item::Static(item) => Some(&mut item.attrs),
        Item::Struct(item) => Some(&mut item.attrs),
        Item::Trait(item) => Some(&mut item.attrs),
        Item::TraitAlias(item) => Some(&mut item.attrs),
        Item::Type(item) => Some(&mut item.attrs),
        Item::Union(item) => Some(&mut item.attrs),
        Item::Use(item) => Some(&mut item.attrs),
        _ => None,
    }
}

/// Removes every attribute only `#[piecemeal]` understands, including the
/// markers inside a module.
fn strip_item(item: &mut Item) {
    match item {
        Item::Struct(item) => strip_field_attrs(item),
        Item::Enum(item) => {
            for variant in &mut item.variants {
                for field in variant.fields.iter_mut() {
                    strip_helper_attrs(&mut field.attrs);
                }
            }
        },
        Item::Union(item) => {
            for field in &mut item.fields.named {
                strip_helper_attrs(&mut field.attrs);
            }
        },
        Item::Mod(ItemMod {
            content: Some((_, items)),
            ..
        }) => {
            for item in items {
                if let Some(attrs) = item_attrs(item) {
                    while take_marker(attrs).is_some() {}
                }
                strip_item(item);
            }
        },
        _ => {},
    }
}

#[cfg(test)]
mod tests {
    use quote::quote;

    use super::*;

    fn expand_ok(args: TokenStream, item: TokenStream) -> syn::File {
        let output = entry_point(args, item).unwrap();
        assert!(
            !output.to_string().contains("compile_error"),
            "unexpected error: {output}"
        );
        syn::parse2(output).unwrap()
    }

    fn struct_names(items: &[Item]) -> Vec<String> {
        items
            .iter()
            .filter_map(|item| match item {
                Item::Struct(item) => Some(item.ident.to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn struct_mode() {
        let file = expand_ok(
            quote!(style = "builder"),
            quote! {
                pub struct Person {
                    pub name: String,
                }
            },
        );

        assert_eq!(struct_names(&file.items), ["Person", "PersonBuilder"]);
        assert_eq!(file.items.len(), 5);
    }

    #[test]
    fn module_mode() {
        let file = expand_ok(
            quote!(java_setters),
            quote! {
                mod model {
                    #![allow(dead_code)]

                    use super::*;

                    #[piecemeal]
                    pub struct Person {
                        pub name: String,
                    }

                    pub struct Untouched {
                        #[doc = "kept"]
                        pub value: u8,
                    }

                    mod nested {
                        #[piecemeal::piecemeal(style = "builder", java_setters = false)]
                        pub struct Order {
                            #[piecemeal(default = 1)]
                            pub count: u32,
                        }
                    }
                }
            },
        );

        let [Item::Mod(module)] = &file.items[..] else {
            panic!("expected a single module");
        };
        assert_eq!(module.attrs.len(), 1);

        let (_, items) = module.content.as_ref().unwrap();
        assert_eq!(struct_names(items), ["Person", "PersonMutable", "Untouched"]);

        let output = quote!(#module).to_string();
        assert!(output.contains("fn set_name"));
        assert!(!output.contains("# [piecemeal"));

        let Some(Item::Mod(nested)) = items.last() else {
            panic!("expected the nested module last");
        };
        let (_, nested) = nested.content.as_ref().unwrap();
        assert_eq!(struct_names(nested), ["Order", "OrderBuilder"]);
        assert!(quote!(#(#nested)*).to_string().contains("fn count"));
    }

    #[test]
    fn rename_on_module_fails() {
        let output = entry_point(quote!(rename = Draft), quote!(mod model {}))
            .unwrap()
            .to_string();
        assert!(output.contains("compile_error"));
        assert!(output.contains("mod model"));
    }

    #[test]
    fn failed_struct_is_kept_without_synthesis() {
        let output = entry_point(
            TokenStream::new(),
            quote! {
                pub struct Secret {
                    #[piecemeal(default = 0)]
                    pub(self) key: u64,
                }
            },
        )
        .unwrap()
        .to_string();

        assert!(output.contains("compile_error"));
        assert!(output.contains("struct Secret"));
        assert!(!output.contains("SecretMutable"));
        assert!(!output.contains("# [piecemeal"));
    }

    #[test]
    fn failed_module_strips_inner_markers() {
        let output = entry_point(
            TokenStream::new(),
            quote! {
                mod model {
                    #[piecemeal]
                    pub struct Good {
                        pub value: u8,
                    }

                    #[piecemeal]
                    pub enum Bad {
                        A,
                    }
                }
            },
        )
        .unwrap()
        .to_string();

        assert!(output.contains("compile_error"));
        assert!(!output.contains("GoodMutable"));
        assert!(!output.contains("# [piecemeal"));
    }

    #[test]
    fn bad_arguments_keep_the_item() {
        let output = entry_point(quote!(unknown = 1), quote!(struct A { a: u8 }))
            .unwrap()
            .to_string();

        assert!(output.contains("compile_error"));
        assert!(output.contains("struct A"));
    }
}

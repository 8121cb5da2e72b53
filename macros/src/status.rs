//! Constructor visibility of annotated structs.
//!
//! The annotated struct keeps its fields readable but loses the ability to
//! be constructed with a struct expression outside the defining crate, so
//! the generated functions become the public construction path.

use proc_macro2::Span;
use syn::spanned::Spanned as _;
use syn::{FieldsNamed, Item, ItemStruct, Visibility, parse_quote};

use crate::parameters::primary_constructor;

const NO_PRIMARY_CONSTRUCTOR: &str =
    "`#[piecemeal]` requires a primary constructor: a struct with named fields";
const PRIVATE_CONSTRUCTOR: &str =
    "`#[piecemeal]` cannot be used with an explicitly private constructor";

/// The visibility of a struct expression for the struct as written by its
/// author: the narrowest visibility among its fields.
#[derive(Debug, Clone, Copy)]
pub enum ConstructorVisibility {
    Public,
    Restricted,
    Inherited,
    ExplicitPrivate(Span),
}

impl ConstructorVisibility {
    fn rank(self) -> u8 {
        match self {
            Self::Public => 0,
            Self::Restricted => 1,
            Self::Inherited => 2,
            Self::ExplicitPrivate(_) => 3,
        }
    }

    /// Where struct expressions of the host did not work even before it was
    /// constrained, if anywhere.
    pub fn unreachable_from(self) -> Option<&'static str> {
        match self {
            Self::Public => None,
            Self::Restricted => Some("outside the visibility of its restricted fields"),
            Self::Inherited | Self::ExplicitPrivate(_) => Some("outside of its module"),
        }
    }

    fn of(vis: &Visibility) -> Self {
        match vis {
            Visibility::Public(_) => Self::Public,
            Visibility::Inherited => Self::Inherited,
            Visibility::Restricted(restricted) if restricted.path.is_ident("self") => {
                Self::ExplicitPrivate(vis.span())
            },
            Visibility::Restricted(_) => Self::Restricted,
        }
    }
}

pub fn original_visibility(fields: &FieldsNamed) -> ConstructorVisibility {
    fields
        .named
        .iter()
        .map(|field| ConstructorVisibility::of(&field.vis))
        .fold(ConstructorVisibility::Public, |narrowest, vis| {
            if vis.rank() > narrowest.rank() { vis } else { narrowest }
        })
}

/// Restricts struct expressions of `item` to the defining crate.
pub fn constrain(item: &mut ItemStruct) {
    let already = item
        .attrs
        .iter()
        .any(|attr| attr.path().is_ident("non_exhaustive"));

    if !already {
        item.attrs.push(parse_quote!(#[non_exhaustive]));
    }
}

/// Checks an item carrying the marker, returning the struct if synthesis
/// can go ahead.
pub fn check_declaration(item: &Item) -> syn::Result<&ItemStruct> {
    match item {
        Item::Struct(item) => {
            check_struct(item)?;
            Ok(item)
        },
        Item::Enum(item) => Err(syn::Error::new_spanned(&item.ident, NO_PRIMARY_CONSTRUCTOR)),
        Item::Union(item) => Err(syn::Error::new_spanned(&item.ident, NO_PRIMARY_CONSTRUCTOR)),
        item => Err(syn::Error::new(
            item.span(),
            "`#[piecemeal]` can only be applied to structs and inline modules",
        )),
    }
}

pub fn check_struct(item: &ItemStruct) -> syn::Result<()> {
    let Some(fields) = primary_constructor(item) else {
        return Err(syn::Error::new_spanned(&item.ident, NO_PRIMARY_CONSTRUCTOR));
    };

    if let ConstructorVisibility::ExplicitPrivate(span) = original_visibility(fields) {
        return Err(syn::Error::new(span, PRIVATE_CONSTRUCTOR));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visibility(item: ItemStruct) -> ConstructorVisibility {
        original_visibility(primary_constructor(&item).unwrap())
    }

    #[test]
    fn narrowest_field_wins() {
        use ConstructorVisibility::*;

        assert!(matches!(
            visibility(parse_quote!(struct A { pub a: u8, pub b: u8 })),
            Public
        ));
        assert!(matches!(
            visibility(parse_quote!(struct A { pub a: u8, pub(crate) b: u8 })),
            Restricted
        ));
        assert!(matches!(
            visibility(parse_quote!(struct A { a: u8, pub(super) b: u8 })),
            Inherited
        ));
        assert!(matches!(
            visibility(parse_quote!(struct A { pub(self) a: u8, b: u8 })),
            ExplicitPrivate(_)
        ));
        assert!(matches!(
            visibility(parse_quote!(struct A { pub(in self) a: u8 })),
            ExplicitPrivate(_)
        ));
        assert!(matches!(visibility(parse_quote!(struct A {})), Public));
    }

    #[test]
    fn implicit_and_restricted_constructors_pass() {
        let items: [Item; 4] = [
            parse_quote!(struct Implicit { s: String }),
            parse_quote!(pub struct Public { pub s: String }),
            parse_quote!(struct Crate { pub(crate) s: String }),
            parse_quote!(struct Super { pub(super) s: String }),
        ];

        for item in &items {
            check_declaration(item).unwrap();
        }
    }

    #[test]
    fn explicit_private_constructor_fails() {
        let item: Item = parse_quote!(struct Private { pub(self) s: String });
        let err = check_declaration(&item).unwrap_err();
        assert_eq!(err.to_string(), PRIVATE_CONSTRUCTOR);
    }

    #[test]
    fn missing_primary_constructor_fails() {
        let items: [Item; 4] = [
            parse_quote!(struct Unit;),
            parse_quote!(struct Tuple(u8);),
            parse_quote!(enum Choice { A, B }),
            parse_quote!(union Bits { a: u32, b: f32 }),
        ];

        for item in &items {
            let err = check_declaration(item).unwrap_err();
            assert_eq!(err.to_string(), NO_PRIMARY_CONSTRUCTOR);
        }
    }

    #[test]
    fn other_items_fail() {
        let item: Item = parse_quote!(fn person() {});
        assert!(check_declaration(&item).is_err());
    }

    #[test]
    fn constrain_is_idempotent() {
        let mut item: ItemStruct = parse_quote!(pub struct A { pub a: u8 });
        constrain(&mut item);
        constrain(&mut item);

        let count = item
            .attrs
            .iter()
            .filter(|attr| attr.path().is_ident("non_exhaustive"))
            .count();
        assert_eq!(count, 1);
    }
}

use proc_macro::TokenStream;

mod backing;
mod body;
mod model;
mod names;
mod parameters;
mod piecemeal_impl;
mod session;
mod signature;
mod status;
mod util;

/// Attribute macro that generates a mutable counterpart for a struct with
/// named fields, together with functions to convert between the two.
///
/// For a struct `Person`, this generates:
///
/// - `PersonMutable`, holding every field in a `piecemeal::Tracked`, with
///   `new`, a getter, a mutable getter and a chaining setter per field, and
///   `build` to turn it back into a `Person`,
/// - `Person::into_mutable`, `Person::copy` and the associated function
///   `Person::build`.
///
/// `Person` itself is marked `#[non_exhaustive]`.
///
/// Fields may specify a default value with `#[piecemeal(default = expr)]`.
/// The expression may use the values of the fields declared before it.
///
/// The macro accepts these arguments:
///
/// - `java_setters` or `java_setters = bool`: name setters `set_{field}`.
/// - `style = "mutable"` or `style = "builder"`: name the type
///   `PersonMutable` with `into_mutable`, or `PersonBuilder` with
///   `into_builder`.
/// - `rename = Ident`: name the type `Ident`.
///
/// On an inline module, every item inside it marked with `#[piecemeal]` is
/// expanded, and the arguments on the module act as defaults.
///
/// # Examples
///
/// ```
/// use piecemeal::piecemeal;
///
/// #[piecemeal]
/// # #[derive(Debug, PartialEq)]
/// pub struct Person {
///     pub first_name: String,
///     pub last_name: String,
///     #[piecemeal(default = 0)]
///     pub age: u32,
/// }
///
/// let mut steve = PersonMutable::new();
/// steve.first_name("steve".to_owned()).last_name("smith".to_owned());
/// assert_eq!(steve.get_age(), Err(piecemeal::UninitializedProperty::new("age")));
///
/// let steve = steve.build().unwrap();
/// # assert_eq!(steve.age, 0);
/// let older = steve.copy(|person| {
///     person.age(32);
/// });
/// # assert_eq!(
/// #     older,
/// #     Ok(Person {
/// #         first_name: "steve".to_owned(),
/// #         last_name: "smith".to_owned(),
/// #         age: 32,
/// #     })
/// # );
/// ```
#[proc_macro_attribute]
pub fn piecemeal(args: TokenStream, item: TokenStream) -> TokenStream {
    piecemeal_impl::entry_point(args.into(), item.into())
        .unwrap_or_else(|e| e.into_compile_error())
        .into()
}

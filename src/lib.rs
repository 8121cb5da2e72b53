//! Mutable copies, builders and DSL-style constructors for plain structs.
//!
//! Annotating a struct with [`#[piecemeal]`](piecemeal) generates a
//! companion `*Mutable` type that holds every field in a [`Tracked`] cell.
//! Fields can be set in any order, and [`build`](#generated-api) assembles the
//! original struct once every field without a default has been set.
//!
//! # Examples
//!
//! ```
//! use piecemeal::piecemeal;
//!
//! #[piecemeal]
//! #[derive(Clone, Debug, PartialEq)]
//! pub struct Person {
//!     pub name: String,
//!     #[piecemeal(default = Some(name.clone()))]
//!     pub nickname: Option<String>,
//!     #[piecemeal(default = 0)]
//!     pub age: u32,
//! }
//!
//! # fn main() -> Result<(), piecemeal::UninitializedProperty> {
//! let sam = Person::build(|person| {
//!     person.name("Sam".to_owned());
//! })?;
//! assert_eq!(sam.nickname.as_deref(), Some("Sam"));
//!
//! let older = sam.clone().copy(|person| {
//!     person.age(36);
//! })?;
//! assert_eq!(older.age, 36);
//! assert_eq!(older.name, sam.name);
//!
//! let mut mutable = PersonMutable::new();
//! mutable.name("Al".to_owned()).nickname(None);
//! assert_eq!(mutable.build()?.nickname, None);
//! # Ok(())
//! # }
//! ```
//!
//! # Generated API
//!
//! For `#[piecemeal] struct Person { .. }`:
//!
//! - `Person` itself gains `#[non_exhaustive]`, so other crates can only
//!   create it through the generated functions.
//! - `Person::build(|m: &mut PersonMutable| ..)` creates a mutable, lets the
//!   closure fill it in and builds it.
//! - `person.copy(|m: &mut PersonMutable| ..)` does the same starting from
//!   the values of `person`.
//! - `person.into_mutable()` moves the values into a new `PersonMutable`.
//! - `PersonMutable::new()` creates an empty mutable.
//! - `mutable.name(value)` sets a field, returning the mutable for chaining.
//!   With Java-style setter names enabled, this is `mutable.set_name(value)`.
//! - `mutable.get_name()` and `mutable.get_name_mut()` read a field, failing
//!   if it was never set.
//! - `mutable.build()` resolves every field in declaration order: the set
//!   value, otherwise the default, otherwise [`UninitializedProperty`].
//!
//! Default values may refer to fields declared before them and observe their
//! resolved values.
//!
//! # Options
//!
//! - `#[piecemeal(java_setters)]` uses `set_{field}` setter names. The
//!   `java-setters` crate feature makes this the default.
//! - `#[piecemeal(style = "builder")]` names the type `*Builder` and the
//!   conversion `into_builder`.
//! - `#[piecemeal(rename = Name)]` names the generated type `Name`.
//!
//! Applied to an inline module, `#[piecemeal]` processes every item inside
//! it that carries its own `#[piecemeal]` marker, using the module's
//! options as defaults.
//!
//! # Type parameters
//!
//! The mutable type has the same generic parameters as the struct, but is
//! invariant in all of them, since its fields are both read and written.
//!
//! ```
//! # use piecemeal::piecemeal;
//! #[piecemeal]
//! pub struct Thing<T> {
//!     pub value: T,
//! }
//!
//! fn widen<'a>(thing: Thing<&'static str>) -> Thing<&'a str> {
//!     thing
//! }
//! ```
//!
//! ```compile_fail
//! # use piecemeal::piecemeal;
//! #[piecemeal]
//! pub struct Thing<T> {
//!     pub value: T,
//! }
//!
//! fn widen<'a>(thing: ThingMutable<&'static str>) -> ThingMutable<&'a str> {
//!     thing
//! }
//! ```
//!
//! # Rejected declarations
//!
//! Structs without named fields have no primary constructor to derive from:
//!
//! ```compile_fail
//! # use piecemeal::piecemeal;
//! #[piecemeal]
//! pub struct Unit;
//! ```
//!
//! An explicitly private field makes the constructor explicitly private,
//! which defeats the generated construction paths:
//!
//! ```compile_fail
//! # use piecemeal::piecemeal;
//! #[piecemeal]
//! pub struct Secret {
//!     pub(self) key: u64,
//! }
//! ```
//!
//! Defaults can only see earlier fields:
//!
//! ```compile_fail
//! # use piecemeal::piecemeal;
//! #[piecemeal]
//! pub struct Range {
//!     #[piecemeal(default = end)]
//!     pub start: u32,
//!     pub end: u32,
//! }
//! ```
#![no_std]

mod error;
mod tracked;

#[doc(inline)]
pub use piecemeal_macros::piecemeal;

pub use crate::error::UninitializedProperty;
pub use crate::tracked::Tracked;

use thiserror::Error as ThisError;

///
/// UninitializedProperty
///
/// Returned by generated code when a property without a default value is
/// read or built before it was ever set.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
#[error("Uninitialized property '{name}'.")]
pub struct UninitializedProperty {
    name: &'static str,
}

impl UninitializedProperty {
    /// Creates the error for the property `name`.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// The name of the property that was never set.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

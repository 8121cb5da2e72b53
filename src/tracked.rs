use core::fmt;
use core::mem::MaybeUninit;

use crate::UninitializedProperty;

/// Storage for a single property of a mutable type.
///
/// A `Tracked<T>` is a pair of an initialization flag and a value holder.
/// Unlike `Option<T>` used as "unset" marker, it keeps "never set" apart from
/// every value of `T`, including `None` when `T` is itself an `Option`.
///
/// The holder is only ever read while the flag is set. Setting writes the
/// holder before raising the flag; taking the value lowers the flag before
/// the value is handed out.
///
/// `Tracked` implements `Drop`, so a `Tracked<&'a T>` keeps its borrow alive
/// until it is dropped, unlike `Option<&'a T>`. Values borrowed by a mutable
/// type must be declared before the mutable.
///
/// ```
/// # use piecemeal::Tracked;
/// let value = 1;
/// let mut tracked = Tracked::new();
/// tracked.set(&value);
/// ```
///
/// ```compile_fail
/// # use piecemeal::Tracked;
/// let mut tracked = Tracked::new();
/// let value = 1;
/// tracked.set(&value);
/// ```
pub struct Tracked<T> {
    flag: bool,
    holder: MaybeUninit<T>,
}

impl<T> Tracked<T> {
    /// Creates an unset property.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            flag: false,
            holder: MaybeUninit::uninit(),
        }
    }

    /// Creates a property that is already set to `value`.
    #[inline]
    #[must_use]
    pub const fn with_value(value: T) -> Self {
        Self {
            flag: true,
            holder: MaybeUninit::new(value),
        }
    }

    /// Returns whether a value was set.
    #[inline]
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.flag
    }

    /// Stores `value`, dropping the previous value if there was one.
    #[inline]
    pub fn set(&mut self, value: T) {
        self.clear();
        self.holder.write(value);
        self.flag = true;
    }

    /// Returns a reference to the value.
    ///
    /// `name` is the property name reported if the value was never set.
    #[inline]
    pub fn get(&self, name: &'static str) -> Result<&T, UninitializedProperty> {
        if self.flag {
            // SAFETY: the flag is only raised after the holder was written
            Ok(unsafe { self.holder.assume_init_ref() })
        } else {
            Err(UninitializedProperty::new(name))
        }
    }

    /// Returns a mutable reference to the value.
    ///
    /// `name` is the property name reported if the value was never set.
    #[inline]
    pub fn get_mut(&mut self, name: &'static str) -> Result<&mut T, UninitializedProperty> {
        if self.flag {
            // SAFETY: the flag is only raised after the holder was written
            Ok(unsafe { self.holder.assume_init_mut() })
        } else {
            Err(UninitializedProperty::new(name))
        }
    }

    /// Moves the value out, leaving the property unset.
    #[inline]
    pub fn take(&mut self) -> Option<T> {
        if core::mem::replace(&mut self.flag, false) {
            // SAFETY: the flag was set, so the holder is initialized. lowering
            // the flag first means it is never read or dropped again
            Some(unsafe { self.holder.assume_init_read() })
        } else {
            None
        }
    }

    /// Consumes the property, returning the value if it was set.
    #[inline]
    pub fn into_inner(mut self) -> Option<T> {
        self.take()
    }

    /// Drops the value if there is one, leaving the property unset.
    #[inline]
    pub fn clear(&mut self) {
        if core::mem::replace(&mut self.flag, false) {
            // SAFETY: the flag was set, so the holder is initialized.
            // the flag is already lowered in case the destructor panics
            unsafe { self.holder.assume_init_drop() }
        }
    }
}

impl<T> Drop for Tracked<T> {
    #[inline]
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T> Default for Tracked<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for Tracked<T> {
    fn clone(&self) -> Self {
        match self.get("") {
            Ok(value) => Self::with_value(value.clone()),
            Err(_) => Self::new(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get("") {
            Ok(value) => f.debug_tuple("Tracked").field(value).finish(),
            Err(_) => f.write_str("Tracked(<uninitialized>)"),
        }
    }
}

impl<T> From<T> for Tracked<T> {
    #[inline]
    fn from(value: T) -> Self {
        Self::with_value(value)
    }
}

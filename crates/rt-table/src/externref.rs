use crate::{NullableTableElement, TableElement};

/// An opaque [**externref**] value.
///
/// The runtime never inspects what an extern reference points to; it only moves the value
/// between tables, globals, and host calls. **null** is the all-zero bit pattern.
///
/// [**externref**]: https://webassembly.github.io/spec/core/syntax/types.html#reference-types
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(transparent)]
pub struct ExternRef(*const ());

impl ExternRef {
    /// The **null** extern reference.
    pub const NULL: Self = Self(core::ptr::null());

    /// Creates an extern reference from an opaque host pointer.
    pub const fn from_ptr(pointer: *const ()) -> Self {
        Self(pointer)
    }

    /// Returns the host pointer this reference carries.
    pub const fn as_ptr(self) -> *const () {
        self.0
    }

    /// Returns `true` for the [`NULL`] reference.
    ///
    /// [`NULL`]: ExternRef::NULL
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl Default for ExternRef {
    fn default() -> Self {
        Self::NULL
    }
}

impl TableElement for ExternRef {}

impl NullableTableElement for ExternRef {
    const NULL: Self = Self::NULL;
}

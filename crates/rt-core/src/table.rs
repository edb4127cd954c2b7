//! Provides traits used for types representing [WebAssembly table] elements.
//!
//! [WebAssembly table]: https://webassembly.github.io/spec/core/syntax/modules.html#tables

/// Trait for values that can be stored in tables.
///
/// Table entries in this runtime are plain data (function references and extern references carry
/// pointers, not owned resources), so elements are `Copy`.
pub trait TableElement: Copy + PartialEq + core::fmt::Debug {}

/// Trait for values that can be stored in tables with a well defined [`NULL`] value.
///
/// [`NULL`]: NullableTableElement::NULL
pub trait NullableTableElement: TableElement {
    /// The constant [**null**] value, used for freshly grown entries and `ref.null`
    /// initialisation.
    ///
    /// [**null**]: https://webassembly.github.io/spec/core/exec/runtime.html#values
    const NULL: Self;
}

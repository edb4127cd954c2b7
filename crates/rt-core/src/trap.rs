//! The trap model shared by all `wasmbake-rt-*` crates.
//!
//! A [WebAssembly trap] is an immediate, non-recoverable exit from the running module. The
//! ahead-of-time compiler emits every trapping operation as a call returning
//! `Result<T, E> where E: Trap<C>`, and generated functions forward the `Err` with `?` all the
//! way to the embedder, which is the only place a trap may be caught.
//!
//! [WebAssembly trap]: https://webassembly.github.io/spec/core/intro/overview.html#trap

/// Identifies why a trap occurred.
///
/// This enumeration is closed: every trap a generated module can produce maps to exactly one of
/// these kinds, and embedders may rely on the set being stable.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[allow(clippy::exhaustive_enums)]
pub enum TrapKind {
    /// A memory or table access was out of bounds.
    MemoryOutOfBounds,
    /// An integer operation overflowed, or a float-to-integer conversion was out of range.
    IntegerOverflow,
    /// An integer division or remainder had a zero denominator.
    IntegerDivisionByZero,
    /// An attempt was made to convert a *NaN* value to an integer.
    InvalidConversionToInteger,
    /// An [**`unreachable`**] instruction was executed.
    ///
    /// [**`unreachable`**]: https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-control
    Unreachable,
    /// An indirect call failed its index, null, or signature check.
    IndirectCallMismatch,
    /// The call-stack depth ceiling was exceeded.
    CallStackExhausted,
}

impl TrapKind {
    /// A stable identifier for the trap kind.
    ///
    /// Embedders choose the user-facing text for a trap; the identifier returned here is the part
    /// they can match on.
    pub const fn identifier(self) -> &'static str {
        match self {
            Self::MemoryOutOfBounds => "out-of-bounds",
            Self::IntegerOverflow => "integer-overflow",
            Self::IntegerDivisionByZero => "division-by-zero",
            Self::InvalidConversionToInteger => "invalid-conversion",
            Self::Unreachable => "unreachable",
            Self::IndirectCallMismatch => "indirect-call-mismatch",
            Self::CallStackExhausted => "call-stack-exhausted",
        }
    }
}

impl core::fmt::Display for TrapKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Trait implemented by every error type a runtime primitive can fail with.
pub trait TrapInfo: core::fmt::Debug + core::fmt::Display {
    /// The [`TrapKind`] this cause maps to.
    fn kind(&self) -> TrapKind;
}

/// Trait for implementing WebAssembly traps.
///
/// Embedders implement this for their error type, once per [`TrapInfo`] they care to
/// distinguish; [`wasmbake-rt`]'s `TrapError` provides a ready-made implementation.
///
/// [`wasmbake-rt`]: https://docs.rs/wasmbake-rt
pub trait Trap<C: TrapInfo>: Sized {
    /// Generates a trap value with the given cause.
    ///
    /// The `wasmbake` compiler generates calls to this function for instructions that trap.
    fn trap(cause: C) -> Self;
}

/// Error type produced when an [**`unreachable`**] instruction is executed.
///
/// [**`unreachable`**]: https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-control
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct UnreachableError;

impl core::fmt::Display for UnreachableError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("executed unreachable instruction")
    }
}

impl TrapInfo for UnreachableError {
    fn kind(&self) -> TrapKind {
        TrapKind::Unreachable
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UnreachableError {}

/// Implementation for the [**`unreachable`**] instruction.
///
/// Always produces a trap; the `Ok` arm of the result exists only so generated code can write
/// `return unreachable()`.
///
/// [**`unreachable`**]: https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-control
#[cold]
#[inline(never)]
pub fn unreachable<T, E: Trap<UnreachableError>>() -> Result<T, E> {
    Err(E::trap(UnreachableError))
}

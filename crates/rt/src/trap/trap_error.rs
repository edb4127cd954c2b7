use rt_core::stack::CallStackExhaustedError;
use rt_core::trap::{Trap, TrapInfo, TrapKind, UnreachableError};
use rt_func_ref::CallIndirectError;
use rt_math::{
    DivisionByZeroError, FloatToIntegerError, IntegerDivisionError, IntegerOverflowError,
    NanToIntegerError,
};

/// Indicates why a trap occurred.
///
/// Used with the [`TrapError`] struct. Every variant wraps the originating error of one of the
/// runtime crates; linear memory accesses are stored with their addresses widened to [`u64`] so
/// that one variant covers 32-bit and 64-bit memories.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum TrapCause {
    /// An [**`unreachable`**] instruction was executed.
    ///
    /// [**`unreachable`**]: https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-control
    Unreachable(UnreachableError),
    /// An integer division or remainder had a zero denominator.
    IntegerDivisionByZero(DivisionByZeroError),
    /// An integer division overflowed, or a float-to-integer conversion was out of range.
    IntegerOverflow(IntegerOverflowError),
    /// An attempt was made to convert a *NaN* value to an integer.
    ConversionToInteger(NanToIntegerError),
    /// A linear memory access was out of bounds.
    MemoryOutOfBounds {
        /// The index of the accessed linear memory.
        memory: u32,
        /// The dynamic address operand of the access.
        address: u64,
        /// The static offset of the access.
        offset: u64,
    },
    /// A table access was out of bounds.
    TableOutOfBounds(rt_table::AccessError),
    /// An indirect call failed its index, null, or signature check.
    IndirectCall(CallIndirectError),
    /// The call-stack depth ceiling was exceeded.
    CallStackExhausted(CallStackExhaustedError),
}

impl core::fmt::Display for TrapCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unreachable(error) => core::fmt::Display::fmt(error, f),
            Self::IntegerDivisionByZero(error) => core::fmt::Display::fmt(error, f),
            Self::IntegerOverflow(error) => core::fmt::Display::fmt(error, f),
            Self::ConversionToInteger(error) => core::fmt::Display::fmt(error, f),
            Self::MemoryOutOfBounds {
                memory,
                address,
                offset,
            } => {
                write!(
                    f,
                    "invalid access of linear memory #{memory} at address {address:#X}"
                )?;

                if *offset > 0 {
                    write!(f, " + {offset:#X}")?;
                }

                Ok(())
            }
            Self::TableOutOfBounds(error) => core::fmt::Display::fmt(error, f),
            Self::IndirectCall(error) => core::fmt::Display::fmt(error, f),
            Self::CallStackExhausted(error) => core::fmt::Display::fmt(error, f),
        }
    }
}

impl TrapInfo for TrapCause {
    fn kind(&self) -> TrapKind {
        match self {
            Self::Unreachable(error) => error.kind(),
            Self::IntegerDivisionByZero(error) => error.kind(),
            Self::IntegerOverflow(error) => error.kind(),
            Self::ConversionToInteger(error) => error.kind(),
            Self::MemoryOutOfBounds { .. } => TrapKind::MemoryOutOfBounds,
            Self::TableOutOfBounds(error) => error.kind(),
            Self::IndirectCall(error) => error.kind(),
            Self::CallStackExhausted(error) => error.kind(),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TrapCause {}

/// Describes a WebAssembly trap.
///
/// If the `alloc` feature is enabled the cause is boxed, keeping the `Err` arm of every
/// generated function's result pointer-sized.
#[repr(transparent)]
pub struct TrapError {
    #[cfg(not(feature = "alloc"))]
    cause: TrapCause,
    #[cfg(feature = "alloc")]
    cause: alloc::boxed::Box<TrapCause>,
}

impl TrapError {
    #[cfg(feature = "alloc")]
    const _SIZE_CHECK: () = assert!(
        core::mem::size_of::<Option<Self>>() <= core::mem::size_of::<usize>(),
        "TrapError is too big"
    );

    fn new(cause: TrapCause) -> Self {
        #[cfg(not(feature = "alloc"))]
        return Self { cause };

        #[cfg(feature = "alloc")]
        Self {
            cause: alloc::boxed::Box::new(cause),
        }
    }

    /// Gets the reason why the trap occurred.
    pub fn cause(&self) -> &TrapCause {
        &self.cause
    }

    /// The stable [`TrapKind`] of the cause.
    pub fn kind(&self) -> TrapKind {
        self.cause().kind()
    }
}

impl core::cmp::PartialEq for TrapError {
    fn eq(&self, other: &Self) -> bool {
        self.cause() == other.cause()
    }
}

impl core::cmp::Eq for TrapError {}

impl core::fmt::Debug for TrapError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TrapError")
            .field("cause", self.cause())
            .finish()
    }
}

impl core::fmt::Display for TrapError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(self.cause(), f)
    }
}

impl TrapInfo for TrapError {
    fn kind(&self) -> TrapKind {
        TrapError::kind(self)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TrapError {}

impl Trap<UnreachableError> for TrapError {
    fn trap(cause: UnreachableError) -> Self {
        Self::new(TrapCause::Unreachable(cause))
    }
}

impl Trap<DivisionByZeroError> for TrapError {
    fn trap(cause: DivisionByZeroError) -> Self {
        Self::new(TrapCause::IntegerDivisionByZero(cause))
    }
}

impl Trap<IntegerOverflowError> for TrapError {
    fn trap(cause: IntegerOverflowError) -> Self {
        Self::new(TrapCause::IntegerOverflow(cause))
    }
}

impl Trap<NanToIntegerError> for TrapError {
    fn trap(cause: NanToIntegerError) -> Self {
        Self::new(TrapCause::ConversionToInteger(cause))
    }
}

impl Trap<IntegerDivisionError> for TrapError {
    fn trap(cause: IntegerDivisionError) -> Self {
        match cause {
            IntegerDivisionError::DivisionByZero => Self::trap(DivisionByZeroError),
            IntegerDivisionError::Overflow => Self::trap(IntegerOverflowError),
        }
    }
}

impl Trap<FloatToIntegerError> for TrapError {
    fn trap(cause: FloatToIntegerError) -> Self {
        match cause {
            FloatToIntegerError::InvalidConversion => Self::trap(NanToIntegerError),
            FloatToIntegerError::Overflow => Self::trap(IntegerOverflowError),
        }
    }
}

impl<I: rt_memory::Address> Trap<rt_memory::AccessError<I>> for TrapError {
    fn trap(cause: rt_memory::AccessError<I>) -> Self {
        Self::new(TrapCause::MemoryOutOfBounds {
            memory: cause.memory(),
            address: cause.address().to_u64().unwrap_or(u64::MAX),
            offset: cause.offset().to_u64().unwrap_or(u64::MAX),
        })
    }
}

impl Trap<rt_table::AccessError> for TrapError {
    fn trap(cause: rt_table::AccessError) -> Self {
        Self::new(TrapCause::TableOutOfBounds(cause))
    }
}

impl Trap<CallIndirectError> for TrapError {
    fn trap(cause: CallIndirectError) -> Self {
        Self::new(TrapCause::IndirectCall(cause))
    }
}

impl Trap<CallStackExhaustedError> for TrapError {
    fn trap(cause: CallStackExhaustedError) -> Self {
        Self::new(TrapCause::CallStackExhausted(cause))
    }
}

// The numeric operators return their concrete error types directly, so generated code forwards
// them with `?`; these give that operator its `From` conversions.

macro_rules! trap_from_cause {
    ($($cause:ty),* $(,)?) => {$(
        impl From<$cause> for TrapError {
            fn from(cause: $cause) -> Self {
                Self::trap(cause)
            }
        }
    )*};
}

trap_from_cause! {
    DivisionByZeroError,
    IntegerOverflowError,
    NanToIntegerError,
    IntegerDivisionError,
    FloatToIntegerError,
}

//! Runtime support functions for numeric operations in `wasmbake`.
//!
//! The functions here are the targets of the calls the ahead-of-time compiler emits for
//! WebAssembly numeric instructions: integer division and remainder with their trap conditions,
//! bit counting and rotation, reinterpret casts, and the trapping and saturating float-to-integer
//! truncations. Operations on floating-point values that must canonicalise *NaN*s live in
//! [`float`]; portable replacements for the bit-counting operations live in [`portable`].

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![deny(unreachable_pub)]
#![forbid(unsafe_code)]
#![deny(clippy::std_instead_of_core)]

#[cfg(feature = "std")]
extern crate std;

mod float;

pub mod nan;
pub mod portable;

pub use float::{
    f32_abs, f32_ceil, f32_floor, f32_max, f32_min, f32_nearest, f32_sqrt, f32_trunc, f64_abs,
    f64_ceil, f64_floor, f64_max, f64_min, f64_nearest, f64_sqrt, f64_trunc,
};

use core::fmt::Display;
use wasmbake_rt_core::trap::{TrapInfo, TrapKind};

/// Error type used if an integer denominator is zero.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct DivisionByZeroError;

/// Error type used if an integer division overflows, or if a float-to-integer conversion is out
/// of range for the destination type.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct IntegerOverflowError;

/// Error type used if an attempt was made to convert a *NaN* floating-point value to an integer.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct NanToIntegerError;

// These error messages match the ones used in the WASM spec tests.
impl Display for DivisionByZeroError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("integer division by zero")
    }
}

impl Display for IntegerOverflowError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("integer overflow")
    }
}

impl Display for NanToIntegerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("invalid conversion to integer")
    }
}

impl TrapInfo for DivisionByZeroError {
    fn kind(&self) -> TrapKind {
        TrapKind::IntegerDivisionByZero
    }
}

impl TrapInfo for IntegerOverflowError {
    fn kind(&self) -> TrapKind {
        TrapKind::IntegerOverflow
    }
}

impl TrapInfo for NanToIntegerError {
    fn kind(&self) -> TrapKind {
        TrapKind::InvalidConversionToInteger
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DivisionByZeroError {}

#[cfg(feature = "std")]
impl std::error::Error for IntegerOverflowError {}

#[cfg(feature = "std")]
impl std::error::Error for NanToIntegerError {}

/// Error type used when an integer division operation fails.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[allow(clippy::exhaustive_enums)]
pub enum IntegerDivisionError {
    /// See [`DivisionByZeroError`].
    DivisionByZero,
    /// See [`IntegerOverflowError`].
    Overflow,
}

impl Display for IntegerDivisionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DivisionByZero => Display::fmt(&DivisionByZeroError, f),
            Self::Overflow => Display::fmt(&IntegerOverflowError, f),
        }
    }
}

impl TrapInfo for IntegerDivisionError {
    fn kind(&self) -> TrapKind {
        match self {
            Self::DivisionByZero => TrapKind::IntegerDivisionByZero,
            Self::Overflow => TrapKind::IntegerOverflow,
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for IntegerDivisionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(match self {
            Self::DivisionByZero => &DivisionByZeroError,
            Self::Overflow => &IntegerOverflowError,
        })
    }
}

/// Error type used when converting a floating-point value to an integer fails, either because the
/// value was out of range or because it was *NaN*.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[allow(clippy::exhaustive_enums)]
pub enum FloatToIntegerError {
    /// See [`NanToIntegerError`].
    InvalidConversion,
    /// See [`IntegerOverflowError`].
    Overflow,
}

impl Display for FloatToIntegerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidConversion => Display::fmt(&NanToIntegerError, f),
            Self::Overflow => Display::fmt(&IntegerOverflowError, f),
        }
    }
}

impl TrapInfo for FloatToIntegerError {
    fn kind(&self) -> TrapKind {
        match self {
            Self::InvalidConversion => TrapKind::InvalidConversionToInteger,
            Self::Overflow => TrapKind::IntegerOverflow,
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FloatToIntegerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(match self {
            Self::InvalidConversion => &NanToIntegerError,
            Self::Overflow => &IntegerOverflowError,
        })
    }
}

macro_rules! int_div {
    {$(
        $signed:ty => $div:ident = $div_name:literal $(as $unsigned:ty)?;
    )*} => {$(
        #[doc = concat!(
            "Implementation for the [`", $div_name, "`] instruction.\n\nCalculates `num / denom`,",
            " trapping on division by zero or overflow.\n\n",
            $(
                "The `num` and `denom` are interpreted as [`", stringify!($unsigned), "`] ",
                "values, and the resulting [`", stringify!($unsigned), "`] quotient is ",
                "reinterpreted as an [`", stringify!($signed), "`] value.\n\n",
            )?
            "[`", $div_name, "`]: ",
            "https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-numeric"
        )]
        #[inline]
        pub fn $div(num: $signed, denom: $signed) -> Result<$signed, IntegerDivisionError> {
            match (num $(as $unsigned)?).checked_div(denom $(as $unsigned)?) {
                Some(quot) => Ok(quot as $signed),
                _ if denom == 0 => Err(IntegerDivisionError::DivisionByZero),
                _ => Err(IntegerDivisionError::Overflow),
            }
        }
    )*};
}

int_div! {
    i32 => i32_div_s = "i32.div_s";
    i32 => i32_div_u = "i32.div_u" as u32;
    i64 => i64_div_s = "i64.div_s";
    i64 => i64_div_u = "i64.div_u" as u64;
}

macro_rules! int_rem {
    {$(
        $signed:ty => $rem:ident = $rem_name:literal $(as $unsigned:ty)?;
    )*} => {$(
        #[doc = concat!(
            "Implementation for the [`", $rem_name, "`] instruction.\n\nCalculates `num % denom`,",
            " trapping on [division by zero].\n\n",
            "Note that `MIN % -1` is `0`, not an overflow.\n\n",
            "[division by zero]: DivisionByZeroError\n",
            "[`", $rem_name, "`]: ",
            "https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-numeric"
        )]
        #[inline]
        pub fn $rem(num: $signed, denom: $signed) -> Result<$signed, DivisionByZeroError> {
            if denom == 0 {
                Err(DivisionByZeroError)
            } else {
                Ok((num $(as $unsigned)?).wrapping_rem(denom $(as $unsigned)?) as $signed)
            }
        }
    )*};
}

int_rem! {
    i32 => i32_rem_s = "i32.rem_s";
    i32 => i32_rem_u = "i32.rem_u" as u32;
    i64 => i64_rem_s = "i64.rem_s";
    i64 => i64_rem_u = "i64.rem_u" as u64;
}

macro_rules! int_bits {
    {$(
        $signed:ty as $unsigned:ty : $mask:literal {
            $clz:ident = $clz_name:literal;
            $ctz:ident = $ctz_name:literal;
            $popcnt:ident = $popcnt_name:literal;
            $rotl:ident = $rotl_name:literal;
            $rotr:ident = $rotr_name:literal;
        }
    )*} => {$(
        #[doc = concat!(
            "Implementation for the [`", $clz_name, "`] instruction.\n\nCounts leading zero ",
            "bits; an all-zero input yields the full bit width.\n\n[`", $clz_name, "`]: ",
            "https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-numeric"
        )]
        #[inline]
        pub const fn $clz(value: $signed) -> $signed {
            value.leading_zeros() as $signed
        }

        #[doc = concat!(
            "Implementation for the [`", $ctz_name, "`] instruction.\n\nCounts trailing zero ",
            "bits; an all-zero input yields the full bit width.\n\n[`", $ctz_name, "`]: ",
            "https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-numeric"
        )]
        #[inline]
        pub const fn $ctz(value: $signed) -> $signed {
            value.trailing_zeros() as $signed
        }

        #[doc = concat!(
            "Implementation for the [`", $popcnt_name, "`] instruction.\n\n[`", $popcnt_name,
            "`]: ",
            "https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-numeric"
        )]
        #[inline]
        pub const fn $popcnt(value: $signed) -> $signed {
            value.count_ones() as $signed
        }

        #[doc = concat!(
            "Implementation for the [`", $rotl_name, "`] instruction.\n\nRotates left by ",
            "`amount` modulo the bit width.\n\n[`", $rotl_name, "`]: ",
            "https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-numeric"
        )]
        #[inline]
        pub const fn $rotl(value: $signed, amount: $signed) -> $signed {
            ((value as $unsigned).rotate_left((amount & $mask) as u32)) as $signed
        }

        #[doc = concat!(
            "Implementation for the [`", $rotr_name, "`] instruction.\n\nRotates right by ",
            "`amount` modulo the bit width.\n\n[`", $rotr_name, "`]: ",
            "https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-numeric"
        )]
        #[inline]
        pub const fn $rotr(value: $signed, amount: $signed) -> $signed {
            ((value as $unsigned).rotate_right((amount & $mask) as u32)) as $signed
        }
    )*};
}

int_bits! {
    i32 as u32 : 31 {
        i32_clz = "i32.clz";
        i32_ctz = "i32.ctz";
        i32_popcnt = "i32.popcnt";
        i32_rotl = "i32.rotl";
        i32_rotr = "i32.rotr";
    }

    i64 as u64 : 63 {
        i64_clz = "i64.clz";
        i64_ctz = "i64.ctz";
        i64_popcnt = "i64.popcnt";
        i64_rotl = "i64.rotl";
        i64_rotr = "i64.rotr";
    }
}

macro_rules! reinterpret {
    {$(
        $name:ident = $instr:literal : $from:ty => $to:ty = $convert:expr;
    )*} => {$(
        #[doc = concat!(
            "Implementation for the [`", $instr, "`] instruction, a bitwise copy between ",
            "equal-width types.\n\n[`", $instr, "`]: ",
            "https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-numeric"
        )]
        #[inline]
        pub fn $name(value: $from) -> $to {
            let convert: fn($from) -> $to = $convert;
            convert(value)
        }
    )*};
}

reinterpret! {
    i32_reinterpret_f32 = "i32.reinterpret_f32" : f32 => i32 = |z| z.to_bits() as i32;
    i64_reinterpret_f64 = "i64.reinterpret_f64" : f64 => i64 = |z| z.to_bits() as i64;
    f32_reinterpret_i32 = "f32.reinterpret_i32" : i32 => f32 = |n| f32::from_bits(n as u32);
    f64_reinterpret_i64 = "f64.reinterpret_i64" : i64 => f64 = |n| f64::from_bits(n as u64);
}

macro_rules! float_to_int {
    {$(
        $float:ty => $trunc:ident / $trunc_sat:ident = $name:literal
            -> $int:ty $(as $uint:ty)? : $minop:tt $min:literal .. $max:literal;
    )*} => {$(
        #[doc = concat!(
            "Implementation for the [`", $name, "`] instruction.\n\nTruncates toward zero, ",
            "trapping on *NaN* and on values outside `", stringify!($minop), " ",
            stringify!($min), " .. < ", stringify!($max), "`, the exact representable [`",
            stringify!($float), "`] endpoints straddling the target range.\n\n",
            $(
                "The result is the [`", stringify!($uint), "`] value reinterpreted as an [`",
                stringify!($int), "`].\n\n",
            )?
            "[`", $name, "`]: ",
            "https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-numeric"
        )]
        #[inline]
        pub fn $trunc(value: $float) -> Result<$int, FloatToIntegerError> {
            if value.is_nan() {
                Err(FloatToIntegerError::InvalidConversion)
            } else if value $minop $min && value < $max {
                Ok(float_to_int!(@cast value $(as $uint)? as $int))
            } else {
                Err(FloatToIntegerError::Overflow)
            }
        }

        #[doc = concat!(
            "Saturating version of [`", stringify!($trunc), "()`], implementing the [`", $name,
            "`]-family `trunc_sat` instruction.\n\n*NaN* yields `0`; out-of-range values clamp ",
            "to the integer bounds."
        )]
        #[inline]
        pub fn $trunc_sat(value: $float) -> $int {
            // Rust float-to-int `as` casts saturate and send NaN to zero.
            float_to_int!(@cast value $(as $uint)? as $int)
        }
    )*};
    (@cast $value:ident as $uint:ty as $int:ty) => { $value as $uint as $int };
    (@cast $value:ident as $int:ty) => { $value as $int };
}

float_to_int! {
    f32 => i32_trunc_f32_s / i32_trunc_sat_f32_s = "i32.trunc_f32_s"
        -> i32 : >= -2147483648.0 .. 2147483648.0;
    f64 => i32_trunc_f64_s / i32_trunc_sat_f64_s = "i32.trunc_f64_s"
        -> i32 : > -2147483649.0 .. 2147483648.0;
    f32 => i64_trunc_f32_s / i64_trunc_sat_f32_s = "i64.trunc_f32_s"
        -> i64 : >= -9223372036854775808.0 .. 9223372036854775808.0;
    f64 => i64_trunc_f64_s / i64_trunc_sat_f64_s = "i64.trunc_f64_s"
        -> i64 : >= -9223372036854775808.0 .. 9223372036854775808.0;
    f32 => i32_trunc_f32_u / i32_trunc_sat_f32_u = "i32.trunc_f32_u"
        -> i32 as u32 : > -1.0 .. 4294967296.0;
    f64 => i32_trunc_f64_u / i32_trunc_sat_f64_u = "i32.trunc_f64_u"
        -> i32 as u32 : > -1.0 .. 4294967296.0;
    f32 => i64_trunc_f32_u / i64_trunc_sat_f32_u = "i64.trunc_f32_u"
        -> i64 as u64 : > -1.0 .. 18446744073709551616.0;
    f64 => i64_trunc_f64_u / i64_trunc_sat_f64_u = "i64.trunc_f64_u"
        -> i64 as u64 : > -1.0 .. 18446744073709551616.0;
}

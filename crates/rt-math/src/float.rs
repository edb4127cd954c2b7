//! Provides operations on floating-point values.
//!
//! All unary operations here quiet a *NaN* input (see [`nan`]) before returning it, except for
//! the absolute-value operations, which WebAssembly defines as pure sign-bit manipulation.

use crate::nan;

macro_rules! float_unary {
    {$(
        $float:ty => $name:ident = $instr:literal ($quiet:path) { $kernel:expr };
    )*} => {$(
        #[doc = concat!(
            "Implementation for the [`", $instr, "`] instruction.\n\nA *NaN* operand is returned ",
            "quieted; any other operand gets the IEEE operation.\n\n[`", $instr, "`]: ",
            "https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-numeric"
        )]
        pub fn $name(z: $float) -> $float {
            if z.is_nan() {
                $quiet(z)
            } else {
                let kernel: fn($float) -> $float = $kernel;
                kernel(z)
            }
        }
    )*};
}

float_unary! {
    f32 => f32_floor = "f32.floor" (nan::f32_quiet) { libm::floorf };
    f32 => f32_ceil = "f32.ceil" (nan::f32_quiet) { libm::ceilf };
    f32 => f32_trunc = "f32.trunc" (nan::f32_quiet) { libm::truncf };
    // `rintf` rounds to nearest, ties to even, in the default rounding mode.
    f32 => f32_nearest = "f32.nearest" (nan::f32_quiet) { libm::rintf };
    f32 => f32_sqrt = "f32.sqrt" (nan::f32_quiet) { libm::sqrtf };
    f64 => f64_floor = "f64.floor" (nan::f64_quiet) { libm::floor };
    f64 => f64_ceil = "f64.ceil" (nan::f64_quiet) { libm::ceil };
    f64 => f64_trunc = "f64.trunc" (nan::f64_quiet) { libm::trunc };
    f64 => f64_nearest = "f64.nearest" (nan::f64_quiet) { libm::rint };
    f64 => f64_sqrt = "f64.sqrt" (nan::f64_quiet) { libm::sqrt };
}

/// Implementation for the [`f32.abs`] instruction.
///
/// Clears the sign bit of the raw bit pattern and nothing else. Unlike the other unary
/// operations, a *NaN* operand is **not** quieted; a signalling *NaN* payload passes through with
/// only its sign changed, as the [*fabs* operator] requires.
///
/// [`f32.abs`]: https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-numeric
/// [*fabs* operator]: https://webassembly.github.io/spec/core/exec/numerics.html#op-fabs
pub fn f32_abs(z: f32) -> f32 {
    f32::from_bits(z.to_bits() & !(1u32 << 31))
}

/// Implementation for the [`f64.abs`] instruction.
///
/// Clears the sign bit of the raw bit pattern and nothing else; see [`f32_abs()`].
///
/// [`f64.abs`]: https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-numeric
pub fn f64_abs(z: f64) -> f64 {
    f64::from_bits(z.to_bits() & !(1u64 << 63))
}

macro_rules! float_min_max {
    {$(
        $float:ty => $min:ident / $max:ident = $min_instr:literal / $max_instr:literal
            ($canonical:expr);
    )*} => {$(
        #[doc = concat!(
            "Implementation for the [`", $min_instr, "`] instruction.\n\nReturns the canonical ",
            "*NaN* if either operand is *NaN*; if both operands are zero, the negatively-signed ",
            "zero wins.\n\n[`", $min_instr, "`]: ",
            "https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-numeric"
        )]
        pub fn $min(x: $float, y: $float) -> $float {
            if x.is_nan() || y.is_nan() {
                <$float>::from_bits($canonical)
            } else if x == 0.0 && y == 0.0 {
                if x.is_sign_negative() {
                    x
                } else {
                    y
                }
            } else if x < y {
                x
            } else {
                y
            }
        }

        #[doc = concat!(
            "Implementation for the [`", $max_instr, "`] instruction.\n\nReturns the canonical ",
            "*NaN* if either operand is *NaN*; if both operands are zero, the positively-signed ",
            "zero wins.\n\n[`", $max_instr, "`]: ",
            "https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-numeric"
        )]
        pub fn $max(x: $float, y: $float) -> $float {
            if x.is_nan() || y.is_nan() {
                <$float>::from_bits($canonical)
            } else if x == 0.0 && y == 0.0 {
                if x.is_sign_negative() {
                    y
                } else {
                    x
                }
            } else if x > y {
                x
            } else {
                y
            }
        }
    )*};
}

float_min_max! {
    f32 => f32_min / f32_max = "f32.min" / "f32.max" (nan::F32_CANONICAL);
    f64 => f64_min / f64_max = "f64.min" / "f64.max" (nan::F64_CANONICAL);
}

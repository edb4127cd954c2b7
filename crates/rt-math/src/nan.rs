//! Constants and functions for producing and testing *NaN* values.
//!
//! WebAssembly requires most floating-point operations to return a *quiet NaN* when given a *NaN*
//! operand; the quieting helpers here disambiguate a signalling *NaN* by setting the high bit of
//! the payload (bit 22 for [`f32`], bit 51 for [`f64`]).
//!
//! Refer to the [WebAssembly specification] for the exact definitions of *arithmetic* and
//! *canonical NaN*s.
//!
//! [WebAssembly specification]: https://webassembly.github.io/spec/core/syntax/values.html#floating-point

/// The high bit of an [`f32`] *NaN* payload.
pub const F32_PAYLOAD_HIGH_BIT: u32 = 1u32 << 22;

/// The [*canonical NaN*] value for [`f32`]s.
///
/// [*canonical NaN*]: https://webassembly.github.io/spec/core/syntax/values.html#floating-point
pub const F32_CANONICAL: u32 = (0xFFu32 << 23) | F32_PAYLOAD_HIGH_BIT;

/// The negative [*canonical NaN*] value for [`f32`]s.
///
/// [*canonical NaN*]: https://webassembly.github.io/spec/core/syntax/values.html#floating-point
pub const F32_NEG_CANONICAL: u32 = F32_CANONICAL | (1u32 << 31);

/// The high bit of an [`f64`] *NaN* payload.
pub const F64_PAYLOAD_HIGH_BIT: u64 = 1u64 << 51;

/// The [*canonical NaN*] value for [`f64`]s.
///
/// [*canonical NaN*]: https://webassembly.github.io/spec/core/syntax/values.html#floating-point
pub const F64_CANONICAL: u64 = (0x07FFu64 << 52) | F64_PAYLOAD_HIGH_BIT;

/// The negative [*canonical NaN*] value for [`f64`]s.
///
/// [*canonical NaN*]: https://webassembly.github.io/spec/core/syntax/values.html#floating-point
pub const F64_NEG_CANONICAL: u64 = F64_CANONICAL | (1u64 << 63);

/// Quiets an [`f32`] *NaN* by setting the [high bit] of its payload.
///
/// The caller is expected to have already checked that `value` is *NaN*; on other inputs this
/// returns an unrelated value.
///
/// [high bit]: F32_PAYLOAD_HIGH_BIT
pub fn f32_quiet(value: f32) -> f32 {
    f32::from_bits(value.to_bits() | F32_CANONICAL)
}

/// Quiets an [`f64`] *NaN* by setting the [high bit] of its payload.
///
/// The caller is expected to have already checked that `value` is *NaN*; on other inputs this
/// returns an unrelated value.
///
/// [high bit]: F64_PAYLOAD_HIGH_BIT
pub fn f64_quiet(value: f64) -> f64 {
    f64::from_bits(value.to_bits() | F64_CANONICAL)
}

/// Checks if the given [`f32`] is a [positive] or [negative] [*canonical NaN*].
///
/// [positive]: F32_CANONICAL
/// [negative]: F32_NEG_CANONICAL
/// [*canonical NaN*]: https://webassembly.github.io/spec/core/syntax/values.html#floating-point
pub fn is_canonical_f32(value: f32) -> bool {
    matches!(value.to_bits(), F32_CANONICAL | F32_NEG_CANONICAL)
}

/// Checks if the given [`f32`] is an [*arithmetic NaN*].
///
/// [*arithmetic NaN*]: https://webassembly.github.io/spec/core/syntax/values.html#floating-point
pub fn is_arithmetic_f32(value: f32) -> bool {
    value.is_nan()
}

/// Checks if the given [`f64`] is a [positive] or [negative] [*canonical NaN*].
///
/// [positive]: F64_CANONICAL
/// [negative]: F64_NEG_CANONICAL
/// [*canonical NaN*]: https://webassembly.github.io/spec/core/syntax/values.html#floating-point
pub fn is_canonical_f64(value: f64) -> bool {
    matches!(value.to_bits(), F64_CANONICAL | F64_NEG_CANONICAL)
}

/// Checks if the given [`f64`] is an [*arithmetic NaN*].
///
/// [*arithmetic NaN*]: https://webassembly.github.io/spec/core/syntax/values.html#floating-point
pub fn is_arithmetic_f64(value: f64) -> bool {
    value.is_nan()
}

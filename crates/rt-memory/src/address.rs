#![allow(clippy::cast_possible_truncation)]

mod private {
    pub trait Integer:
        num_traits::PrimInt
        + num_traits::ConstZero
        + num_traits::ConstOne
        + core::ops::AddAssign
        + core::fmt::Debug
        + core::fmt::Display
        + core::fmt::UpperHex
        + core::fmt::LowerHex
        + 'static
    {
    }

    impl Integer for u32 {}
    impl Integer for i32 {}

    #[cfg(feature = "memory64")]
    impl Integer for u64 {}
    #[cfg(feature = "memory64")]
    impl Integer for i64 {}
}

/// Trait for integer types that can be used as addresses into linear memory.
///
/// This allows generic linear memory operations over both 32-bit and [64-bit] linear memories;
/// the latter are available with the `memory64` feature.
///
/// [64-bit]: https://github.com/WebAssembly/memory64
pub trait Address:
    private::Integer
    + num_traits::Unsigned
    + num_traits::AsPrimitive<usize>
    + num_traits::AsPrimitive<Self::Signed>
{
    /// Signed version of the address type, matching the WebAssembly value type generated code
    /// passes as a memory operand.
    type Signed: private::Integer + num_traits::Signed + num_traits::AsPrimitive<Self>;

    /// The maximum number of pages that the linear memory can have.
    const MAX_PAGE_COUNT: Self;

    /// Sentinel returned by a failed `memory.grow`, the all-ones pattern of `-1`.
    const GROW_FAILED: Self;

    /// Equivalent to `value as Self`.
    fn cast_from_usize(value: usize) -> Self;

    /// Equivalent to `value as Self`.
    fn cast_from_signed(value: Self::Signed) -> Self;
}

impl Address for u32 {
    type Signed = i32;

    const MAX_PAGE_COUNT: u32 = 65536; // PAGE_SIZE * MAX_PAGE_COUNT = u32::MAX + 1

    const GROW_FAILED: u32 = u32::MAX;

    fn cast_from_usize(value: usize) -> u32 {
        value as u32
    }

    fn cast_from_signed(value: i32) -> u32 {
        value as u32
    }
}

#[cfg(feature = "memory64")]
impl Address for u64 {
    type Signed = i64;

    const MAX_PAGE_COUNT: u64 = 1 << 48; // PAGE_SIZE * MAX_PAGE_COUNT = u64::MAX + 1

    const GROW_FAILED: u64 = u64::MAX;

    fn cast_from_usize(value: usize) -> u64 {
        value as u64
    }

    fn cast_from_signed(value: i64) -> u64 {
        value as u64
    }
}

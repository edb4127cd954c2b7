//! Portable replacements for the bit-counting operations.
//!
//! Toolchains for every Rust target lower [`u32::leading_zeros`] and friends to something
//! sensible, so unlike a C runtime these are never selected automatically; they are kept as the
//! reference implementations for hosts whose intrinsics lower to libcalls, and the test suite
//! cross-checks them against the primary operations over the full edge-case set.

macro_rules! portable_bits {
    {$(
        $int:ty : $bits:literal {
            $ctz:ident, $reverse:ident, $clz:ident, $popcnt:ident
        }
    )*} => {$(
        #[doc = concat!(
            "Counts trailing zero bits of a [`", stringify!($int), "`] with a bit-test loop; an ",
            "all-zero input yields ", stringify!($bits), "."
        )]
        pub const fn $ctz(value: $int) -> u32 {
            let mut x = value;
            let mut i = 0u32;
            while i < $bits {
                if x & 1 != 0 {
                    break;
                }
                x >>= 1;
                i += 1;
            }
            i
        }

        #[doc = concat!(
            "Reverses the bits of a [`", stringify!($int), "`] by shift-and-accumulate."
        )]
        pub const fn $reverse(value: $int) -> $int {
            let mut x = value;
            let mut r: $int = 0;
            let mut i = 0u32;
            while i < $bits {
                r <<= 1;
                r |= x & 1;
                x >>= 1;
                i += 1;
            }
            r
        }

        #[doc = concat!(
            "Counts leading zero bits of a [`", stringify!($int), "`] as the trailing zero count ",
            "of its [bit reversal](", stringify!($reverse), ")."
        )]
        pub const fn $clz(value: $int) -> u32 {
            $ctz($reverse(value))
        }

        #[doc = concat!(
            "Counts set bits of a [`", stringify!($int), "`] with the parallel (SWAR) technique."
        )]
        pub const fn $popcnt(value: $int) -> u32 {
            const ONES: $int = <$int>::MAX;
            let mut x = value;
            x -= (x >> 1) & (ONES / 3);
            x = (x & (ONES / 15 * 3)) + ((x >> 2) & (ONES / 15 * 3));
            x = (x + (x >> 4)) & (ONES / 255 * 15);
            (x.wrapping_mul(ONES / 255) >> (($bits - 1) & !7)) as u32
        }
    )*};
}

portable_bits! {
    u32 : 32 { u32_ctz, u32_reverse, u32_clz, u32_popcnt }
    u64 : 64 { u64_ctz, u64_reverse, u64_clz, u64_popcnt }
}

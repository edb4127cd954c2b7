use wasmbake_rt_math as math;

use math::{DivisionByZeroError, IntegerDivisionError};

#[test]
fn division_edge_cases() {
    assert_eq!(math::i32_div_s(7, 2), Ok(3));
    assert_eq!(math::i32_div_s(-7, 2), Ok(-3));
    assert_eq!(
        math::i32_div_s(i32::MIN, -1),
        Err(IntegerDivisionError::Overflow)
    );
    assert_eq!(
        math::i32_div_s(1, 0),
        Err(IntegerDivisionError::DivisionByZero)
    );
    assert_eq!(
        math::i64_div_s(i64::MIN, -1),
        Err(IntegerDivisionError::Overflow)
    );

    // Unsigned interpretation: -1 / 2 is a huge quotient, not an overflow.
    assert_eq!(math::i32_div_u(-1, 2), Ok(i32::MAX));
    assert_eq!(
        math::i32_div_u(1, 0),
        Err(IntegerDivisionError::DivisionByZero)
    );
    assert_eq!(math::i64_div_u(-1, 2), Ok(i64::MAX));
}

#[test]
fn remainder_edge_cases() {
    assert_eq!(math::i32_rem_s(7, 2), Ok(1));
    assert_eq!(math::i32_rem_s(-7, 2), Ok(-1));
    // MIN % -1 is 0, not an overflow.
    assert_eq!(math::i32_rem_s(i32::MIN, -1), Ok(0));
    assert_eq!(math::i64_rem_s(i64::MIN, -1), Ok(0));
    assert_eq!(math::i32_rem_s(1, 0), Err(DivisionByZeroError));
    assert_eq!(math::i32_rem_u(-1, 10), Ok((u32::MAX % 10) as i32));
    assert_eq!(math::i64_rem_u(1, 0), Err(DivisionByZeroError));
}

#[test]
fn bit_counting_zero_conventions() {
    assert_eq!(math::i32_clz(0), 32);
    assert_eq!(math::i32_ctz(0), 32);
    assert_eq!(math::i64_clz(0), 64);
    assert_eq!(math::i64_ctz(0), 64);

    assert_eq!(math::i32_clz(1), 31);
    assert_eq!(math::i32_clz(-1), 0);
    assert_eq!(math::i32_ctz(-2147483648), 31);
    assert_eq!(math::i64_ctz(1 << 40), 40);

    assert_eq!(math::i32_popcnt(0), 0);
    assert_eq!(math::i32_popcnt(-1), 32);
    assert_eq!(math::i32_popcnt(0x0F0F_0F0F), 16);
    assert_eq!(math::i64_popcnt(-1), 64);
}

#[test]
fn rotates() {
    assert_eq!(math::i32_rotl(0x0000_0001, 1), 0x0000_0002);
    assert_eq!(math::i32_rotl(u32::MAX as i32 - 1, 1), -3);
    assert_eq!(math::i32_rotr(0x0000_0001, 1), i32::MIN);
    assert_eq!(math::i64_rotl(1, 65), 2); // modulo the bit width
    assert_eq!(math::i32_rotl(0x89AB_CDEFu32 as i32, 8), 0xABCD_EF89u32 as i32);
}

#[test]
fn rotl_is_rotr_of_negated_amount() {
    let values = [0i32, 1, -1, 0x1234_5678, i32::MIN, i32::MAX, -12345];
    for x in values {
        for y in -70i32..=70 {
            assert_eq!(
                math::i32_rotl(x, y),
                math::i32_rotr(x, y.wrapping_neg()),
                "x = {x:#X}, y = {y}"
            );
        }
    }
}

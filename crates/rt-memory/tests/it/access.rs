use crate::Trapped;
use wasmbake_rt_core::trap::TrapKind;
use wasmbake_rt_memory::{self as memory, EmptyMemory, HeapMemory, PAGE_SIZE};

type Result<T> = core::result::Result<T, Trapped>;

const OOB: Trapped = Trapped(TrapKind::MemoryOutOfBounds);

fn one_page() -> HeapMemory {
    HeapMemory::with_limits(1, 2).unwrap()
}

#[test]
fn loads_extend_and_stores_wrap() {
    let mem = one_page();

    assert_eq!(memory::i32_store8::<0, u32, _, Trapped>(&mem, 0, 16, 0x1FF), Ok(()));
    assert_eq!(memory::i32_load8_u::<0, u32, _, Trapped>(&mem, 0, 16), Ok(0xFF));
    assert_eq!(memory::i32_load8_s::<0, u32, _, Trapped>(&mem, 0, 16), Ok(-1));

    assert_eq!(
        memory::i32_store16::<0, u32, _, Trapped>(&mem, 0, 32, -2),
        Ok(())
    );
    assert_eq!(
        memory::i32_load16_u::<0, u32, _, Trapped>(&mem, 0, 32),
        Ok(0xFFFE)
    );
    assert_eq!(memory::i32_load16_s::<0, u32, _, Trapped>(&mem, 0, 32), Ok(-2));

    assert_eq!(
        memory::i64_store32::<0, u32, _, Trapped>(&mem, 0, 40, 0x1_2345_6789),
        Ok(())
    );
    assert_eq!(
        memory::i64_load32_u::<0, u32, _, Trapped>(&mem, 0, 40),
        Ok(0x2345_6789)
    );
    assert_eq!(
        memory::i64_load32_s::<0, u32, _, Trapped>(&mem, 0, 40),
        Ok(0x2345_6789)
    );

    assert_eq!(
        memory::i64_store::<0, u32, _, Trapped>(&mem, 0, 48, i64::MIN),
        Ok(())
    );
    assert_eq!(
        memory::i64_load::<0, u32, _, Trapped>(&mem, 0, 48),
        Ok(i64::MIN)
    );
}

#[test]
fn static_offset_is_added() {
    let mem = one_page();

    assert_eq!(memory::i32_store::<0, u32, _, Trapped>(&mem, 100, 4, 77), Ok(()));
    assert_eq!(memory::i32_load::<0, u32, _, Trapped>(&mem, 0, 104), Ok(77));
}

#[test]
fn little_endian_byte_order() {
    let mem = one_page();

    let result: Result<()> =
        memory::init::<0, u32, _, Trapped>(&mem, 0, 0, 4, &[0x01, 0x02, 0x03, 0x04]);
    assert_eq!(result, Ok(()));

    // B[0] | B[1] << 8 | B[2] << 16 | B[3] << 24, regardless of host byte order.
    assert_eq!(
        memory::i32_load::<0, u32, _, Trapped>(&mem, 0, 0),
        Ok(0x0403_0201)
    );
    assert_eq!(
        memory::i32_load16_u::<0, u32, _, Trapped>(&mem, 0, 1),
        Ok(0x0302)
    );
}

#[test]
fn float_accesses_are_bit_exact() {
    let mem = one_page();

    // A signalling NaN payload must survive a store/load round trip untouched.
    let signalling = f32::from_bits(0x7F80_0001);
    assert_eq!(
        memory::f32_store::<0, u32, _, Trapped>(&mem, 0, 0, signalling),
        Ok(())
    );
    let loaded = memory::f32_load::<0, u32, _, Trapped>(&mem, 0, 0).unwrap();
    assert_eq!(loaded.to_bits(), 0x7F80_0001);

    let signalling = f64::from_bits(0x7FF0_0000_0000_0001);
    assert_eq!(
        memory::f64_store::<0, u32, _, Trapped>(&mem, 0, 8, signalling),
        Ok(())
    );
    let loaded = memory::f64_load::<0, u32, _, Trapped>(&mem, 0, 8).unwrap();
    assert_eq!(loaded.to_bits(), 0x7FF0_0000_0000_0001);

    assert_eq!(
        memory::f64_store::<0, u32, _, Trapped>(&mem, 0, 16, -0.0),
        Ok(())
    );
    assert_eq!(
        memory::i64_load::<0, u32, _, Trapped>(&mem, 0, 16),
        Ok(i64::MIN)
    );
}

#[test]
fn out_of_bounds_accesses_trap() {
    let mem = one_page();
    let size = PAGE_SIZE as i32;

    // A two-byte access at the last byte crosses the boundary.
    assert_eq!(
        memory::i32_load16_u::<0, u32, _, Trapped>(&mem, 0, size - 1),
        Err(OOB)
    );
    assert_eq!(
        memory::i32_load8_u::<0, u32, _, Trapped>(&mem, 0, size - 1),
        Ok(0)
    );
    assert_eq!(
        memory::i32_store::<0, u32, _, Trapped>(&mem, 0, size - 3, 1),
        Err(OOB)
    );
    assert_eq!(memory::i32_load::<0, u32, _, Trapped>(&mem, 0, size), Err(OOB));

    // Effective address calculation must not wrap around.
    assert_eq!(memory::i32_load::<0, u32, _, Trapped>(&mem, 2, -1), Err(OOB));
}

#[test]
fn grow_and_size() {
    let mem = HeapMemory::<u32>::with_limits(1, 3).unwrap();

    assert_eq!(memory::size(&mem), 1);
    assert_eq!(memory::grow(&mem, 1), 1);
    assert_eq!(memory::size(&mem), 2);

    // Newly grown pages read as zero.
    assert_eq!(
        memory::i64_load::<0, u32, _, Trapped>(&mem, 0, PAGE_SIZE as i32),
        Ok(0)
    );

    assert_eq!(memory::grow(&mem, 5), -1);
    assert_eq!(memory::size(&mem), 2);
    assert_eq!(memory::grow(&mem, 0), 2);
}

#[test]
fn empty_memory_traps() {
    assert_eq!(
        memory::i32_load::<0, u32, _, Trapped>(&EmptyMemory, 0, 0),
        Err(OOB)
    );
    assert_eq!(
        memory::i32_store8::<0, u32, _, Trapped>(&EmptyMemory, 0, 0, 1),
        Err(OOB)
    );
    assert_eq!(memory::size::<u32, _>(&EmptyMemory), 0);
}

#[cfg(feature = "memory64")]
#[test]
fn memory64_round_trip() {
    let mem = HeapMemory::<u64>::with_limits(1, 2).unwrap();

    assert_eq!(
        memory::i64_store::<0, u64, _, Trapped>(&mem, 0, 40_000, -5),
        Ok(())
    );
    assert_eq!(
        memory::i64_load::<0, u64, _, Trapped>(&mem, 0, 40_000),
        Ok(-5)
    );
    assert_eq!(
        memory::i32_load::<0, u64, _, Trapped>(&mem, 0, i64::from(PAGE_SIZE)),
        Err(OOB)
    );
}

use crate::Trapped;
use wasmbake_rt_core::trap::TrapKind;
use wasmbake_rt_memory::{self as memory, GuardPagedMemory, Memory, PAGE_SIZE};

const OOB: Trapped = Trapped(TrapKind::MemoryOutOfBounds);

#[test]
fn sized_accesses_round_trip() {
    let mem = GuardPagedMemory::with_limits(1, 4).unwrap();

    assert_eq!(
        memory::i32_store::<0, u32, _, Trapped>(&mem, 0, 12, -123456),
        Ok(())
    );
    assert_eq!(
        memory::i32_load::<0, u32, _, Trapped>(&mem, 0, 12),
        Ok(-123456)
    );
    assert_eq!(memory::i32_load8_u::<0, u32, _, Trapped>(&mem, 0, 12), Ok(0xC0));

    let signalling = f64::from_bits(0x7FF0_0000_0000_0001);
    assert_eq!(
        memory::f64_store::<0, u32, _, Trapped>(&mem, 0, 64, signalling),
        Ok(())
    );
    let loaded = memory::f64_load::<0, u32, _, Trapped>(&mem, 0, 64).unwrap();
    assert_eq!(loaded.to_bits(), 0x7FF0_0000_0000_0001);
}

#[test]
fn fresh_pages_are_zeroed_and_base_is_stable() {
    let mem = GuardPagedMemory::with_limits(1, 4).unwrap();

    assert_eq!(
        memory::i64_store::<0, u32, _, Trapped>(&mem, 0, 8, 42),
        Ok(())
    );

    assert_eq!(mem.copy_to_slice(8, &mut [0u8; 8]), Ok(()));

    assert_eq!(mem.grow(2), 1);
    assert_eq!(Memory::<u32>::size(&mem), 3);

    // Old contents survive a grow; fresh pages read zero.
    assert_eq!(memory::i64_load::<0, u32, _, Trapped>(&mem, 0, 8), Ok(42));
    assert_eq!(
        memory::i64_load::<0, u32, _, Trapped>(&mem, 0, PAGE_SIZE as i32 * 2),
        Ok(0)
    );
}

#[test]
fn bulk_operations_keep_explicit_checks() {
    let mem = GuardPagedMemory::with_limits(1, 4).unwrap();
    let size = PAGE_SIZE as i32;

    assert_eq!(memory::fill::<0, u32, _, Trapped>(&mem, 0, 0xEE, size), Ok(()));
    assert_eq!(
        memory::fill::<0, u32, _, Trapped>(&mem, size - 1, 0xEE, 2),
        Err(OOB)
    );
    assert_eq!(
        memory::copy_within::<0, u32, _, Trapped>(&mem, size - 4, 0, 8),
        Err(OOB)
    );
    assert_eq!(
        memory::init::<0, u32, _, Trapped>(&mem, size - 2, 0, 4, &[1, 2, 3, 4]),
        Err(OOB)
    );

    assert_eq!(memory::copy_within::<0, u32, _, Trapped>(&mem, 8, 0, 8), Ok(()));
    assert_eq!(memory::i32_load8_u::<0, u32, _, Trapped>(&mem, 0, 8), Ok(0xEE));
}

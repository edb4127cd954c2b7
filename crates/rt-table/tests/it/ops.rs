use crate::Trapped;
use wasmbake_rt_core::trap::TrapKind;
use wasmbake_rt_table::{self as table, HeapTable, Table};

const OOB: Trapped = Trapped(TrapKind::MemoryOutOfBounds);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct TestRef(Option<u32>);

impl table::TableElement for TestRef {}

impl table::NullableTableElement for TestRef {
    const NULL: Self = Self(None);
}

fn filled(values: &[u32]) -> HeapTable<TestRef> {
    let table = HeapTable::with_limits(values.len() as u32, values.len() as u32).unwrap();
    for (i, v) in values.iter().enumerate() {
        table.set(i as u32, TestRef(Some(*v))).unwrap();
    }
    table
}

#[test]
fn get_and_set() {
    let t = filled(&[10, 20, 30]);

    assert_eq!(table::get::<0, _, _, Trapped>(&t, 1), Ok(TestRef(Some(20))));
    assert_eq!(table::get::<0, TestRef, _, Trapped>(&t, 3), Err(OOB));
    assert_eq!(table::set::<0, _, _, Trapped>(&t, 2, TestRef(None)), Ok(()));
    assert_eq!(table::get::<0, _, _, Trapped>(&t, 2), Ok(TestRef(None)));
    assert_eq!(table::set::<0, _, _, Trapped>(&t, -1, TestRef(None)), Err(OOB));
    assert_eq!(table::size(&t), 3);
}

#[test]
fn fill_range() {
    let t = filled(&[1, 1, 1, 1]);

    assert_eq!(
        table::fill::<0, _, _, Trapped>(&t, 1, TestRef(Some(7)), 2),
        Ok(())
    );
    assert_eq!(table::get::<0, _, _, Trapped>(&t, 0), Ok(TestRef(Some(1))));
    assert_eq!(table::get::<0, _, _, Trapped>(&t, 2), Ok(TestRef(Some(7))));
    assert_eq!(
        table::fill::<0, _, _, Trapped>(&t, 3, TestRef(Some(7)), 2),
        Err(OOB)
    );
}

#[test]
fn init_from_segment() {
    let t = filled(&[0, 0, 0, 0]);
    let segment = [TestRef(Some(5)), TestRef(Some(6)), TestRef(Some(7))];

    assert_eq!(
        table::init::<0, _, _, Trapped>(&t, 1, 1, 2, &segment),
        Ok(())
    );
    assert_eq!(table::get::<0, _, _, Trapped>(&t, 1), Ok(TestRef(Some(6))));
    assert_eq!(table::get::<0, _, _, Trapped>(&t, 2), Ok(TestRef(Some(7))));

    // Segment range out of bounds.
    assert_eq!(
        table::init::<0, _, _, Trapped>(&t, 0, 2, 2, &segment),
        Err(OOB)
    );
    // Destination range out of bounds.
    assert_eq!(
        table::init::<0, _, _, Trapped>(&t, 3, 0, 2, &segment),
        Err(OOB)
    );
}

#[test]
fn init_null_range() {
    let t = filled(&[9, 9, 9, 9]);

    assert_eq!(
        table::init_null::<0, TestRef, _, Trapped>(&t, 1, 0, 2, 8),
        Ok(())
    );
    assert_eq!(table::get::<0, _, _, Trapped>(&t, 1), Ok(TestRef(None)));
    assert_eq!(table::get::<0, _, _, Trapped>(&t, 3), Ok(TestRef(Some(9))));

    // Segment range check still applies even though only nulls are written.
    assert_eq!(
        table::init_null::<0, TestRef, _, Trapped>(&t, 0, 7, 2, 8),
        Err(OOB)
    );
    assert_eq!(
        table::init_null::<0, TestRef, _, Trapped>(&t, 3, 0, 2, 8),
        Err(OOB)
    );
}

#[test]
fn copy_between_tables() {
    let src = filled(&[1, 2, 3, 4]);
    let dst = filled(&[0, 0, 0, 0]);

    assert_eq!(
        table::copy::<0, 1, _, _, _, Trapped>(&dst, &src, 0, 2, 2),
        Ok(())
    );
    assert_eq!(table::get::<0, _, _, Trapped>(&dst, 0), Ok(TestRef(Some(3))));
    assert_eq!(table::get::<0, _, _, Trapped>(&dst, 1), Ok(TestRef(Some(4))));

    assert_eq!(
        table::copy::<0, 1, _, _, _, Trapped>(&dst, &src, 0, 3, 2),
        Err(OOB)
    );
    assert_eq!(
        table::copy_within::<0, _, _, Trapped>(&dst, 2, 0, 2),
        Ok(())
    );
    assert_eq!(table::get::<0, _, _, Trapped>(&dst, 3), Ok(TestRef(Some(4))));
}

#[test]
fn grow_helper() {
    let t = HeapTable::<TestRef>::with_limits(1, 3).unwrap();

    assert_eq!(table::grow(&t, 1), 1);
    assert_eq!(table::size(&t), 2);
    assert_eq!(table::grow(&t, 5), -1);
}

use wasmbake_rt_table::{self as table, AnyTable, BoundsCheckError, ExternRef, Table};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct TestRef(Option<u32>);

impl table::TableElement for TestRef {}

impl table::NullableTableElement for TestRef {
    const NULL: Self = Self(None);
}

#[test]
fn heap_table() {
    let table = table::HeapTable::<TestRef>::with_maximum(7);

    assert_eq!(table.grow(1), 0);
    assert_eq!(table.set(0, TestRef(Some(111))), Ok(()));
    assert_eq!(table.set(1, TestRef(Some(222))), Err(BoundsCheckError));

    assert_eq!(table.grow(2), 1);
    assert_eq!(table.get(0), Ok(TestRef(Some(111))));
    assert_eq!(table.get(1), Ok(TestRef(None)));
    assert_eq!(table.get(2), Ok(TestRef(None)));
    assert_eq!(table.set(2, TestRef(Some(222))), Ok(()));
    assert_eq!(table.get(1), Ok(TestRef(None)));
    assert_eq!(table.get(0), Ok(TestRef(Some(111))));

    assert_eq!(table.size(), 3);
    assert_eq!(table.replace(2, TestRef(Some(333))), Ok(TestRef(Some(222))));
    assert_eq!(table.get(2), Ok(TestRef(Some(333))));

    assert_eq!(table.grow(2), 3);

    let mut buffer = [TestRef(None); 4];
    assert_eq!(table.copy_into_slice(1, buffer.as_mut_slice()), Ok(()), "{table:?}");
    assert_eq!(
        buffer,
        [
            TestRef(None),
            TestRef(Some(333)),
            TestRef(None),
            TestRef(None),
        ]
    );

    assert_eq!(
        table.copy_into_slice(42, &mut [TestRef(None); 12]),
        Err(BoundsCheckError)
    );

    assert_eq!(table.grow(2), 5);
    let items = [
        TestRef(Some(0x11)),
        TestRef(Some(0x22)),
        TestRef(Some(0x33)),
        TestRef(Some(0x44)),
    ];
    assert_eq!(table.copy_from_slice(2, items.as_slice()), Ok(()));
    assert_eq!(table.copy_into_slice(2, buffer.as_mut_slice()), Ok(()));
    assert_eq!(buffer, items);
    assert_eq!(table.get(3), Ok(TestRef(Some(0x22))));

    assert_eq!(table.grow(2), table::GROW_FAILED);
    assert_eq!(table.grow(0), 7);
}

#[test]
fn fill_and_bounds() {
    let table = table::HeapTable::<TestRef>::with_limits(4, 4).unwrap();

    assert_eq!(table.fill(1, 3, TestRef(Some(9))), Ok(()));
    assert_eq!(table.get(0), Ok(TestRef(None)));
    assert_eq!(table.get(3), Ok(TestRef(Some(9))));

    // Filling to exactly the end is allowed; one past is not.
    assert_eq!(table.fill(4, 0, TestRef(Some(1))), Ok(()));
    assert_eq!(table.fill(2, 3, TestRef(Some(1))), Err(BoundsCheckError));
    assert_eq!(table.fill(u32::MAX, 2, TestRef(Some(1))), Err(BoundsCheckError));
}

#[test]
fn copy_within_overlap() {
    let table = table::HeapTable::<TestRef>::with_limits(8, 8).unwrap();
    for i in 0..8 {
        table.set(i, TestRef(Some(i))).unwrap();
    }

    // Destination above the source: the overlapping entries must come from the originals.
    assert_eq!(table.copy_within(2, 0, 6), Ok(()));
    let mut snapshot = [TestRef(None); 8];
    table.copy_into_slice(0, &mut snapshot).unwrap();
    assert_eq!(
        snapshot.map(|e| e.0),
        [Some(0), Some(1), Some(0), Some(1), Some(2), Some(3), Some(4), Some(5)]
    );

    let table = table::HeapTable::<TestRef>::with_limits(8, 8).unwrap();
    for i in 0..8 {
        table.set(i, TestRef(Some(i))).unwrap();
    }

    assert_eq!(table.copy_within(0, 2, 6), Ok(()));
    table.copy_into_slice(0, &mut snapshot).unwrap();
    assert_eq!(
        snapshot.map(|e| e.0),
        [Some(2), Some(3), Some(4), Some(5), Some(6), Some(7), Some(6), Some(7)]
    );
}

#[test]
fn extern_refs_are_nullable() {
    let value = 42u32;
    let reference = ExternRef::from_ptr(core::ptr::from_ref(&value).cast());

    assert!(!reference.is_null());
    assert!(ExternRef::NULL.is_null());
    assert_eq!(ExternRef::default(), ExternRef::NULL);

    let table = table::HeapTable::<ExternRef>::with_limits(2, 2).unwrap();
    assert_eq!(table.get(0), Ok(ExternRef::NULL));
    assert_eq!(table.set(1, reference), Ok(()));
    assert_eq!(table.get(1), Ok(reference));
}

#[test]
fn empty_table() {
    let empty = table::EmptyTable;

    assert_eq!(AnyTable::size(&empty), 0);
    assert_eq!(Table::<TestRef>::get(&empty, 0), Err(BoundsCheckError));
    assert_eq!(empty.grow(1), table::GROW_FAILED);
}

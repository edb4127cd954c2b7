use crate::Trapped;
use wasmbake_rt_core::trap::TrapKind;
use wasmbake_rt_func_ref::{funcref_table_init, ElemExpr, FuncRef, FuncType, RawFuncPtr};
use wasmbake_rt_table::{HeapTable, Table};

const OOB: Trapped = Trapped(TrapKind::MemoryOutOfBounds);

static TYPE_A: FuncType = FuncType::from_bytes([1; 32]);
static TYPE_B: FuncType = FuncType::from_bytes([2; 32]);

unsafe extern "C" fn noop() {}

/// The shape of a translator-emitted module instance record.
#[repr(C)]
struct Instance {
    imported_instance: *const (),
    imported_func: *const FuncRef,
}

#[test]
fn element_expressions_evaluate_against_the_instance() {
    // The funcref an imported-table global resolves to.
    let imported = FuncRef::new(&TYPE_B, noop as RawFuncPtr, core::ptr::null());

    let instance = Instance {
        imported_instance: core::ptr::null(),
        imported_func: &imported,
    };
    let instance_ptr = core::ptr::from_ref(&instance).cast::<()>();

    let segment = [
        ElemExpr::ref_func(
            &TYPE_A,
            noop as RawFuncPtr,
            core::mem::offset_of!(Instance, imported_instance),
        ),
        ElemExpr::ref_null(),
        ElemExpr::global_get(core::mem::offset_of!(Instance, imported_func)),
    ];

    let table = HeapTable::<FuncRef>::with_limits(4, 4).unwrap();

    // SAFETY: the offsets in `segment` were taken from `Instance`'s own layout.
    let result = unsafe {
        funcref_table_init::<0, _, Trapped>(&table, 1, 0, 3, &segment, instance_ptr)
    };
    assert_eq!(result, Ok(()));

    let ref_func = table.get(1).unwrap();
    assert!(!ref_func.is_null());
    assert_eq!(ref_func.ty(), Some(&TYPE_A));
    // The owning-instance pointer is the instance record plus the expression's offset.
    assert_eq!(
        ref_func.instance(),
        core::ptr::from_ref(&instance.imported_instance).cast()
    );

    assert!(table.get(2).unwrap().is_null());

    let from_global = table.get(3).unwrap();
    assert_eq!(from_global, imported);
    assert_eq!(from_global.ty(), Some(&TYPE_B));

    // Untouched entries stay null.
    assert!(table.get(0).unwrap().is_null());
}

#[test]
fn ranges_are_checked_before_evaluation() {
    let table = HeapTable::<FuncRef>::with_limits(2, 2).unwrap();
    let segment = [ElemExpr::ref_null(); 3];
    let instance = ();
    let instance_ptr = core::ptr::from_ref(&instance).cast::<()>();

    // Segment range out of bounds.
    // SAFETY: only `ref.null` entries, which never touch the instance.
    let result = unsafe {
        funcref_table_init::<0, _, Trapped>(&table, 0, 2, 2, &segment, instance_ptr)
    };
    assert_eq!(result, Err(OOB));

    // Destination range out of bounds.
    // SAFETY: as above.
    let result = unsafe {
        funcref_table_init::<0, _, Trapped>(&table, 1, 0, 2, &segment, instance_ptr)
    };
    assert_eq!(result, Err(OOB));

    // SAFETY: as above.
    let result = unsafe {
        funcref_table_init::<0, _, Trapped>(&table, 0, 0, 2, &segment, instance_ptr)
    };
    assert_eq!(result, Ok(()));
}

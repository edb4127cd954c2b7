//! Drives the runtime exactly the way `wasmbake`-generated code does: a module instance record,
//! generated-function bodies that are straight-line sequences of runtime calls threading
//! `Result<_, TrapError>`, element segments, and indirect calls.

use wasmbake_rt::func_ref::{self, ElemExpr, FuncRef, FuncType, RawFuncPtr};
use wasmbake_rt::memory::{self, HeapMemory};
use wasmbake_rt::stack::CallStack;
use wasmbake_rt::table::{self, HeapTable};
use wasmbake_rt::trap::{unreachable, TrapError, TrapKind};
use wasmbake_rt::{math, element};

static TYPE_BINOP: FuncType = FuncType::from_bytes([0x11; 32]);

/// The digest of `TYPE_BINOP` as another module's pool would intern it.
static TYPE_BINOP_FOREIGN: FuncType = FuncType::from_bytes([0x11; 32]);

type BinOp = unsafe extern "C" fn(*const (), i32, i32) -> i32;

/// What the translator emits for a two-function module with one memory and one table.
#[repr(C)]
struct Instance {
    memory0: HeapMemory,
    table0: HeapTable<FuncRef>,
    stack: CallStack,
}

const DATA_SEGMENT_0: &[u8] = b"\x2A\x00\x00\x00wasm";

fn erase(func: BinOp) -> RawFuncPtr {
    // SAFETY: only the pointer value is kept; callers transmute back to `BinOp` after the
    // signature check.
    unsafe { core::mem::transmute::<BinOp, RawFuncPtr>(func) }
}

impl Instance {
    /// Allocation first, then active segments: the record's address must be final before
    /// `ref.func` expressions capture it.
    fn instantiate() -> Result<Box<Self>, TrapError> {
        let instance = Box::new(Self {
            memory0: HeapMemory::with_limits(1, 2).expect("memory allocation"),
            table0: HeapTable::with_limits(4, 4).expect("table allocation"),
            stack: CallStack::with_limit(16),
        });

        memory::init::<0, u32, _, TrapError>(
            &instance.memory0,
            0,
            0,
            DATA_SEGMENT_0.len() as i32,
            DATA_SEGMENT_0,
        )?;

        let elem_segment_0 = [
            ElemExpr::ref_func(
                &TYPE_BINOP,
                erase(wasm_add),
                core::mem::offset_of!(Instance, memory0),
            ),
            ElemExpr::ref_null(),
            ElemExpr::ref_func(
                &TYPE_BINOP,
                erase(wasm_sub),
                core::mem::offset_of!(Instance, memory0),
            ),
        ];

        // SAFETY: the offsets above are within this instance's own record.
        unsafe {
            func_ref::funcref_table_init::<0, _, TrapError>(
                &instance.table0,
                0,
                0,
                3,
                &elem_segment_0,
                core::ptr::from_ref(&*instance).cast(),
            )?;
        }

        Ok(instance)
    }
}

// The bodies below mirror generated code: a prologue frame, then runtime calls joined by `?`.

unsafe extern "C" fn wasm_add(_instance: *const (), x: i32, y: i32) -> i32 {
    x.wrapping_add(y)
}

unsafe extern "C" fn wasm_sub(_instance: *const (), x: i32, y: i32) -> i32 {
    x.wrapping_sub(y)
}

/// `(func (param $n i32) (result i32) ...)`: loads the segment word, divides it by `n`.
fn wasm_div_segment_word(instance: &Instance, n: i32) -> Result<i32, TrapError> {
    let _frame = instance.stack.enter::<TrapError>()?;
    let word = memory::i32_load::<0, u32, _, TrapError>(&instance.memory0, 0, 0)?;
    Ok(math::i32_div_s(word, n)?)
}

/// Calls through the table with the caller-expected signature.
fn wasm_call_table(
    instance: &Instance,
    expected: &'static FuncType,
    idx: i32,
    x: i32,
    y: i32,
) -> Result<i32, TrapError> {
    let _frame = instance.stack.enter::<TrapError>()?;
    let entry = func_ref::call_indirect::<0, _, TrapError>(&instance.table0, expected, idx)?;

    // SAFETY: the signature check above proves the entry is a `BinOp`.
    let func = unsafe { entry.typed::<BinOp>() }.expect("checked entry is never null");

    // SAFETY: `func` is a generated function of this module; its instance pointer was bound at
    // element segment initialisation.
    Ok(unsafe { func(entry.instance(), x, y) })
}

fn wasm_recurse_forever(instance: &Instance) -> Result<(), TrapError> {
    let _frame = instance.stack.enter::<TrapError>()?;
    wasm_recurse_forever(instance)
}

fn wasm_unreachable(instance: &Instance) -> Result<i32, TrapError> {
    let _frame = instance.stack.enter::<TrapError>()?;
    unreachable()
}

#[test]
fn data_segment_and_arithmetic() {
    let instance = Instance::instantiate().unwrap();

    // The segment stored 42 little-endian at address 0.
    assert_eq!(wasm_div_segment_word(&instance, 2), Ok(21));

    let trap = wasm_div_segment_word(&instance, 0).unwrap_err();
    assert_eq!(trap.kind(), TrapKind::IntegerDivisionByZero);

    // The trailing segment bytes are readable too.
    assert_eq!(
        memory::i32_load8_u::<0, u32, _, TrapError>(&instance.memory0, 0, 4),
        Ok(i32::from(b'w'))
    );
}

#[test]
fn indirect_calls() {
    let instance = Instance::instantiate().unwrap();

    assert_eq!(wasm_call_table(&instance, &TYPE_BINOP, 0, 40, 2), Ok(42));
    assert_eq!(wasm_call_table(&instance, &TYPE_BINOP, 2, 40, 2), Ok(38));

    // A foreign module's interned descriptor with the same digest also passes the check.
    assert_eq!(
        wasm_call_table(&instance, &TYPE_BINOP_FOREIGN, 0, 1, 1),
        Ok(2)
    );

    // Null entry, untouched entry, out-of-bounds index.
    for idx in [1, 3, 4] {
        let trap = wasm_call_table(&instance, &TYPE_BINOP, idx, 0, 0).unwrap_err();
        assert_eq!(trap.kind(), TrapKind::IndirectCallMismatch, "index {idx}");
    }
}

#[test]
fn call_stack_exhaustion_is_balanced() {
    let instance = Instance::instantiate().unwrap();

    let trap = wasm_recurse_forever(&instance).unwrap_err();
    assert_eq!(trap.kind(), TrapKind::CallStackExhausted);

    // Every frame guard ran its epilogue while the trap unwound the results.
    assert_eq!(instance.stack.depth(), 0);

    // The instance remains usable after the embedder caught the trap.
    assert_eq!(wasm_call_table(&instance, &TYPE_BINOP, 0, 1, 2), Ok(3));
}

#[test]
fn unreachable_traps() {
    let instance = Instance::instantiate().unwrap();

    let trap = wasm_unreachable(&instance).unwrap_err();
    assert_eq!(trap.kind(), TrapKind::Unreachable);
}

#[test]
fn table_mutation_through_helpers() {
    let instance = Instance::instantiate().unwrap();

    // `table.get` / `table.set` as generated for reference-manipulating code.
    let entry = table::get::<0, _, _, TrapError>(&instance.table0, 0).unwrap();
    table::set::<0, _, _, TrapError>(&instance.table0, 3, entry).unwrap();
    assert_eq!(wasm_call_table(&instance, &TYPE_BINOP, 3, 20, 22), Ok(42));

    table::fill::<0, _, _, TrapError>(&instance.table0, 0, FuncRef::NULL, 4).unwrap();
    let trap = wasm_call_table(&instance, &TYPE_BINOP, 3, 0, 0).unwrap_err();
    assert_eq!(trap.kind(), TrapKind::IndirectCallMismatch);
}

#[test]
fn element_traits_are_reexported() {
    fn assert_nullable<E: element::NullableTableElement>() {}

    assert_nullable::<FuncRef>();
    assert_nullable::<table::ExternRef>();
}

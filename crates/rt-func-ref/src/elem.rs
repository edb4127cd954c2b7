//! Element segments for function-reference tables.
//!
//! An element segment is a static table initialiser: a slice of [`ElemExpr`]s the translator
//! emits into the module's data, evaluated against a module instance when the segment is
//! dropped into a table at instantiation or by `table.init`.

use crate::{FuncRef, FuncType, RawFuncPtr};
use wasmbake_rt_core::trap::Trap;
use wasmbake_rt_table::{AccessError, Table};

/// The expression forms an element segment entry can take.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[allow(clippy::exhaustive_enums)]
pub enum ElemExprKind {
    /// `ref.func f`: materialise a reference to a function of the instantiating module.
    RefFunc,
    /// `ref.null func`: the **null** function reference.
    RefNull,
    /// `global.get g`: copy the function reference out of one of the instance's globals.
    GlobalGet,
}

/// One entry of a function-reference element segment.
///
/// `module_offset` is a byte offset into the module instance record, emitted by the translator:
/// for [`RefFunc`] it locates the instance (or imported-instance) pointer the reference is bound
/// to, and for [`GlobalGet`] it locates the global holding a pointer to the source [`FuncRef`].
///
/// [`RefFunc`]: ElemExprKind::RefFunc
/// [`GlobalGet`]: ElemExprKind::GlobalGet
#[derive(Clone, Copy, Debug)]
pub struct ElemExpr {
    /// Which expression form this entry is.
    pub kind: ElemExprKind,
    /// The type descriptor of the referenced function, for [`ElemExprKind::RefFunc`] entries.
    pub ty: Option<&'static FuncType>,
    /// The generated function, for [`ElemExprKind::RefFunc`] entries.
    pub func: Option<RawFuncPtr>,
    /// Byte offset into the module instance record; see the type documentation.
    pub module_offset: usize,
}

impl ElemExpr {
    /// A `ref.func` entry.
    pub const fn ref_func(ty: &'static FuncType, func: RawFuncPtr, module_offset: usize) -> Self {
        Self {
            kind: ElemExprKind::RefFunc,
            ty: Some(ty),
            func: Some(func),
            module_offset,
        }
    }

    /// A `ref.null func` entry.
    pub const fn ref_null() -> Self {
        Self {
            kind: ElemExprKind::RefNull,
            ty: None,
            func: None,
            module_offset: 0,
        }
    }

    /// A `global.get` entry reading the global at the given instance offset.
    pub const fn global_get(module_offset: usize) -> Self {
        Self {
            kind: ElemExprKind::GlobalGet,
            ty: None,
            func: None,
            module_offset,
        }
    }
}

/// This implements [`table.init`] and [active element segment initialization] for
/// function-reference tables.
///
/// Both the segment range `segment_idx..+length` and the destination range are checked before
/// any entry is evaluated or written. Each entry is then evaluated against `instance`:
/// [`RefFunc`] binds the pointer stored at `instance + module_offset` as the owning instance,
/// [`RefNull`] writes the canonical null reference, and [`GlobalGet`] copies the [`FuncRef`]
/// behind the pointer stored at `instance + module_offset`.
///
/// # Errors
///
/// Produces a trap if either range is out of bounds; nothing is written in that case.
///
/// # Safety
///
/// `instance` must point to the live module instance record the segment was emitted for, and
/// every `module_offset` in the evaluated range must be the translator-emitted offset of a
/// field of that record: for [`RefFunc`] any field (only the address is taken), for
/// [`GlobalGet`] a `*const FuncRef` global that points to a live function reference.
///
/// [`table.init`]: https://webassembly.github.io/spec/core/syntax/instructions.html#table-instructions
/// [active element segment initialization]: https://webassembly.github.io/spec/core/syntax/modules.html#element-segments
/// [`RefFunc`]: ElemExprKind::RefFunc
/// [`RefNull`]: ElemExprKind::RefNull
/// [`GlobalGet`]: ElemExprKind::GlobalGet
pub unsafe fn funcref_table_init<const TABLE: u32, T, E>(
    table: &T,
    table_idx: i32,
    segment_idx: i32,
    length: i32,
    segment: &[ElemExpr],
    instance: *const (),
) -> Result<(), E>
where
    T: Table<FuncRef> + ?Sized,
    E: Trap<AccessError>,
{
    let dst_idx = table_idx as u32;
    let src_idx = segment_idx as u32;
    let len = length as u32;

    let error = || {
        E::trap(AccessError {
            table: TABLE,
            index: dst_idx.saturating_add(len),
        })
    };

    let exprs = segment
        .get(usize::try_from(src_idx).map_err(|_| error())?..)
        .and_then(|rest| rest.get(..usize::try_from(len).ok()?))
        .ok_or_else(error)?;

    if u64::from(dst_idx) + u64::from(len) > u64::from(table.size()) {
        return Err(error());
    }

    for (i, expr) in exprs.iter().enumerate() {
        let evaluated = match expr.kind {
            ElemExprKind::RefFunc => {
                // SAFETY: `module_offset` stays within the instance record per the caller's
                // contract, so the offset pointer is valid to form (it is never read here).
                let owner = unsafe { instance.byte_add(expr.module_offset) };

                // A `ref.func` entry always carries its type and function.
                match (expr.ty, expr.func) {
                    (Some(ty), Some(func)) => FuncRef::new(ty, func, owner),
                    _ => FuncRef::NULL,
                }
            }
            ElemExprKind::RefNull => FuncRef::NULL,
            ElemExprKind::GlobalGet => {
                // SAFETY: per the caller's contract, `instance + module_offset` is a
                // `*const FuncRef` global pointing to a live function reference.
                unsafe {
                    let global = instance
                        .byte_add(expr.module_offset)
                        .cast::<*const FuncRef>()
                        .read();
                    global.read()
                }
            }
        };

        // In bounds per the check above.
        #[allow(clippy::cast_possible_truncation)]
        table
            .set(dst_idx + i as u32, evaluated)
            .map_err(|wasmbake_rt_core::BoundsCheckError| error())?;
    }

    Ok(())
}

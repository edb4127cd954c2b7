//! Function references and the indirect call check for `wasmbake`.
//!
//! A [`FuncRef`] is what a translated module stores in its function tables: a type descriptor, a
//! type-erased pointer to the generated function, and the pointer to the module instance the
//! function belongs to. The [`call_indirect()`] check validates an entry against the signature
//! the call site expects; invoking the checked entry is the generated caller's job, since only it
//! knows the concrete function pointer type to cast back to.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![deny(unreachable_pub)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::missing_safety_doc)]
#![deny(clippy::std_instead_of_core)]

#[cfg(feature = "std")]
extern crate std;

mod elem;

pub use elem::{funcref_table_init, ElemExpr, ElemExprKind};

use wasmbake_rt_core::{
    table::{NullableTableElement, TableElement},
    trap::{Trap, TrapInfo, TrapKind},
};
use wasmbake_rt_table::Table;

/// A function type descriptor: a globally interned 32-byte digest of the signature.
///
/// Descriptors are interned per module at translation time. Two descriptors denote the same
/// WebAssembly function type iff they are the same interned object *or* their 32 bytes compare
/// equal; the byte comparison is what lets modules that were linked against distinct interned
/// pools agree on type equality.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(transparent)]
pub struct FuncType([u8; 32]);

impl FuncType {
    /// Creates a descriptor from a signature digest.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The signature digest.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Determines whether two (possibly absent) descriptors denote the same function type.
    pub fn matches(a: Option<&'static FuncType>, b: Option<&'static FuncType>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => core::ptr::eq(a, b) || a.0 == b.0,
            (None, None) => true,
            _ => false,
        }
    }
}

/// A type-erased pointer to a generated function.
///
/// Every generated function has the C ABI and takes its module instance pointer as the first
/// parameter; the remaining parameter and result types are only known to the call site, which
/// casts the pointer back with [`FuncRef::typed()`].
pub type RawFuncPtr = unsafe extern "C" fn();

/// A [**funcref**] table entry.
///
/// The **null** reference is the entry whose function pointer is absent.
///
/// [**funcref**]: https://webassembly.github.io/spec/core/syntax/types.html#reference-types
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FuncRef {
    ty: Option<&'static FuncType>,
    func: Option<RawFuncPtr>,
    instance: *const (),
}

impl FuncRef {
    /// The canonical **null** function reference.
    pub const NULL: Self = Self {
        ty: None,
        func: None,
        instance: core::ptr::null(),
    };

    /// Creates a reference to the given generated function, owned by the given module instance.
    pub const fn new(ty: &'static FuncType, func: RawFuncPtr, instance: *const ()) -> Self {
        Self {
            ty: Some(ty),
            func: Some(func),
            instance,
        }
    }

    /// Returns `true` for the [`NULL`] reference.
    ///
    /// [`NULL`]: FuncRef::NULL
    pub fn is_null(&self) -> bool {
        self.func.is_none()
    }

    /// The type descriptor of the referenced function, if the reference is non-null.
    pub fn ty(&self) -> Option<&'static FuncType> {
        self.ty
    }

    /// The module instance the referenced function belongs to.
    ///
    /// Generated code passes this as the first argument when invoking the function.
    pub fn instance(&self) -> *const () {
        self.instance
    }

    /// Casts the function pointer back to its concrete type.
    ///
    /// Returns `None` for the null reference.
    ///
    /// # Safety
    ///
    /// `F` must be the exact `unsafe extern "C" fn` pointer type of the generated function this
    /// reference was created with; this is guaranteed by a successful [`call_indirect()`] check
    /// against the descriptor interned for `F`'s signature.
    pub unsafe fn typed<F>(&self) -> Option<F>
    where
        F: Copy
            + Send
            + Sync
            + core::marker::Unpin
            + core::panic::UnwindSafe
            + core::panic::RefUnwindSafe
            + 'static,
    {
        const {
            assert!(
                core::mem::size_of::<F>() == core::mem::size_of::<RawFuncPtr>(),
                "not a function pointer type"
            );
        }

        // SAFETY: `F` is a function pointer type per the caller's contract, and function
        // pointers all share one layout.
        self.func
            .as_ref()
            .map(|func| unsafe { core::mem::transmute_copy::<RawFuncPtr, F>(func) })
    }
}

impl Default for FuncRef {
    fn default() -> Self {
        Self::NULL
    }
}

impl TableElement for FuncRef {}

impl NullableTableElement for FuncRef {
    const NULL: Self = Self::NULL;
}

/// Describes which of the [`call_indirect()`] checks failed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[allow(clippy::exhaustive_enums)]
pub enum CallIndirectFailure {
    /// The element index was greater than or equal to the table size.
    OutOfBounds,
    /// The table entry was the **null** function reference.
    NullEntry,
    /// The entry's type descriptor did not match the one expected by the call site.
    SignatureMismatch,
}

/// Error type used when an indirect call fails its index, null, or signature check.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct CallIndirectError {
    /// The index of the table the call went through.
    pub table: u32,
    /// The element index operand of the call.
    pub index: u32,
    /// Which check failed.
    pub failure: CallIndirectFailure,
}

impl core::fmt::Display for CallIndirectError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "indirect call through table #{} at index {} failed: ",
            self.table, self.index
        )?;

        f.write_str(match self.failure {
            CallIndirectFailure::OutOfBounds => "index out of bounds",
            CallIndirectFailure::NullEntry => "null function reference",
            CallIndirectFailure::SignatureMismatch => "signature mismatch",
        })
    }
}

impl TrapInfo for CallIndirectError {
    fn kind(&self) -> TrapKind {
        TrapKind::IndirectCallMismatch
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CallIndirectError {}

#[cold]
#[inline(never)]
fn trap_call_indirect<E: Trap<CallIndirectError>>(
    table: u32,
    index: u32,
    failure: CallIndirectFailure,
) -> E {
    E::trap(CallIndirectError {
        table,
        index,
        failure,
    })
}

/// This implements the checks of the [`call_indirect`] instruction.
///
/// On success, the call site casts the returned entry back to the concrete function pointer type
/// with [`FuncRef::typed()`] and invokes it, passing [`FuncRef::instance()`] first.
///
/// # Errors
///
/// Produces a trap if `idx` is out of bounds, the entry is **null**, or the entry's type does
/// not [match] the `expected` descriptor.
///
/// [`call_indirect`]: https://webassembly.github.io/spec/core/syntax/instructions.html#control-instructions
/// [match]: FuncType::matches()
pub fn call_indirect<const TABLE: u32, T, E>(
    table: &T,
    expected: &'static FuncType,
    idx: i32,
) -> Result<FuncRef, E>
where
    T: Table<FuncRef> + ?Sized,
    E: Trap<CallIndirectError>,
{
    let index = idx as u32;

    let entry = match table.get(index) {
        Ok(entry) => entry,
        Err(wasmbake_rt_core::BoundsCheckError) => {
            return Err(trap_call_indirect(
                TABLE,
                index,
                CallIndirectFailure::OutOfBounds,
            ))
        }
    };

    if entry.is_null() {
        Err(trap_call_indirect(
            TABLE,
            index,
            CallIndirectFailure::NullEntry,
        ))
    } else if !FuncType::matches(Some(expected), entry.ty()) {
        Err(trap_call_indirect(
            TABLE,
            index,
            CallIndirectFailure::SignatureMismatch,
        ))
    } else {
        Ok(entry)
    }
}

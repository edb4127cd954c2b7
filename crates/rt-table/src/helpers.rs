//! Helper functions for accessing elements and performing other operations on [`Table`]s.
//!
//! Calls to these functions are generated as part of the `wasmbake` translation process; they are
//! the table half of the contract surface generated code relies on.

#![deny(unsafe_code)]

use crate::{AnyTable, BoundsCheckError, NullableTableElement, Table, TableElement};
use wasmbake_rt_core::trap::{Trap, TrapInfo, TrapKind};

/// Error type used when a table access is out of bounds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct AccessError {
    /// The index of the table the access was made into.
    pub table: u32,
    /// The out-of-bounds element index.
    pub index: u32,
}

impl core::fmt::Display for AccessError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "invalid access of table #{} at index {}",
            self.table, self.index
        )
    }
}

impl TrapInfo for AccessError {
    fn kind(&self) -> TrapKind {
        TrapKind::MemoryOutOfBounds
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AccessError {}

/// Error type used when the minimum required number of elements for a table could not be
/// allocated.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct AllocationError {
    pub(crate) size: u32,
}

impl AllocationError {
    /// The minimum number of elements that was requested.
    pub fn size(&self) -> u32 {
        self.size
    }
}

impl core::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "could not allocate {} elements for table", self.size)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AllocationError {}

/// This implements the [`table.size`] instruction.
///
/// [`table.size`]: https://webassembly.github.io/spec/core/syntax/instructions.html#table-instructions
pub fn size<T: AnyTable + ?Sized>(table: &T) -> i32 {
    table.size() as i32
}

/// This implements the [`table.grow`] instruction.
///
/// For more information, see the documentation for the [`AnyTable::grow()`] method.
///
/// [`table.grow`]: https://webassembly.github.io/spec/core/syntax/instructions.html#table-instructions
pub fn grow<T: AnyTable + ?Sized>(table: &T, delta: i32) -> i32 {
    table.grow(delta as u32) as i32
}

#[cold]
#[inline(never)]
fn trap_access_error<E: Trap<AccessError>>(table: u32, index: u32) -> E {
    E::trap(AccessError { table, index })
}

/// This implements the [`table.get`] instruction.
///
/// [`table.get`]: https://webassembly.github.io/spec/core/syntax/instructions.html#table-instructions
pub fn get<const TABLE: u32, R, T, E>(table: &T, idx: i32) -> Result<R, E>
where
    R: TableElement,
    T: Table<R> + ?Sized,
    E: Trap<AccessError>,
{
    table
        .get(idx as u32)
        .map_err(|BoundsCheckError| trap_access_error(TABLE, idx as u32))
}

/// This implements the [`table.set`] instruction.
///
/// [`table.set`]: https://webassembly.github.io/spec/core/syntax/instructions.html#table-instructions
pub fn set<const TABLE: u32, R, T, E>(table: &T, idx: i32, elem: R) -> Result<(), E>
where
    R: TableElement,
    T: Table<R> + ?Sized,
    E: Trap<AccessError>,
{
    table
        .set(idx as u32, elem)
        .map_err(|BoundsCheckError| trap_access_error(TABLE, idx as u32))
}

/// This implements the [`table.fill`] instruction.
///
/// For more information, see the documentation for the [`Table::fill()`] method.
///
/// [`table.fill`]: https://webassembly.github.io/spec/core/syntax/instructions.html#table-instructions
pub fn fill<const TABLE: u32, R, T, E>(table: &T, idx: i32, elem: R, len: i32) -> Result<(), E>
where
    R: TableElement,
    T: Table<R> + ?Sized,
    E: Trap<AccessError>,
{
    let index = idx as u32;
    let length = len as u32;
    table
        .fill(index, length, elem)
        .map_err(|BoundsCheckError| trap_access_error(TABLE, index.saturating_add(length)))
}

/// This implements the [`table.init`] instruction and [active element segment initialization]
/// for element segments whose expressions have already been evaluated into a slice.
///
/// Both the segment range `segment_idx..+length` and the destination range are checked before
/// any element is written.
///
/// [`table.init`]: https://webassembly.github.io/spec/core/syntax/instructions.html#table-instructions
/// [active element segment initialization]: https://webassembly.github.io/spec/core/syntax/modules.html#element-segments
pub fn init<const TABLE: u32, R, T, E>(
    table: &T,
    table_idx: i32,
    segment_idx: i32,
    length: i32,
    element_segment: &[R],
) -> Result<(), E>
where
    R: TableElement,
    T: Table<R> + ?Sized,
    E: Trap<AccessError>,
{
    fn source<R>(elements: &[R], offset: u32, len: u32) -> Option<&[R]> {
        elements
            .get(usize::try_from(offset).ok()?..)
            .and_then(|remaining| remaining.get(..usize::try_from(len).ok()?))
    }

    let dst_idx = table_idx as u32;
    let len = length as u32;
    source(element_segment, segment_idx as u32, len)
        .ok_or(BoundsCheckError)
        .and_then(|src| table.copy_from_slice(dst_idx, src))
        .map_err(|BoundsCheckError| trap_access_error(TABLE, dst_idx.saturating_add(len)))
}

/// Initialises a table range with **null** references.
///
/// This implements element segment initialization for extern-reference tables, which this
/// runtime only ever instantiates with `ref.null` expressions; the segment is described by its
/// size alone.
///
/// # Errors
///
/// Produces a trap if `segment_idx + length` exceeds `segment_size`, or if the destination range
/// is out of bounds.
pub fn init_null<const TABLE: u32, R, T, E>(
    table: &T,
    table_idx: i32,
    segment_idx: i32,
    length: i32,
    segment_size: u32,
) -> Result<(), E>
where
    R: NullableTableElement,
    T: Table<R> + ?Sized,
    E: Trap<AccessError>,
{
    let dst_idx = table_idx as u32;
    let len = length as u32;

    if u64::from(segment_idx as u32) + u64::from(len) > u64::from(segment_size) {
        return Err(trap_access_error(TABLE, dst_idx));
    }

    table
        .fill(dst_idx, len, R::NULL)
        .map_err(|BoundsCheckError| trap_access_error(TABLE, dst_idx.saturating_add(len)))
}

/// This implements the [`table.copy`] instruction in the typical case where the source and
/// destination are within the same table.
///
/// For more information, see the documentation for the [`Table::copy_within()`] method.
///
/// [`table.copy`]: https://webassembly.github.io/spec/core/syntax/instructions.html#table-instructions
pub fn copy_within<const TABLE: u32, R, T, E>(
    table: &T,
    dst_idx: i32,
    src_idx: i32,
    length: i32,
) -> Result<(), E>
where
    R: TableElement,
    T: Table<R> + ?Sized,
    E: Trap<AccessError>,
{
    let dst_idx = dst_idx as u32;
    let src_idx = src_idx as u32;
    let len = length as u32;
    table
        .copy_within(dst_idx, src_idx, len)
        .map_err(|BoundsCheckError| trap_access_error(TABLE, dst_idx.saturating_add(len)))
}

/// This implements the [`table.copy`] instruction in the case where the source and destination
/// tables differ.
///
/// For more information, see the documentation for the [`Table::copy_from()`] method.
///
/// [`table.copy`]: https://webassembly.github.io/spec/core/syntax/instructions.html#table-instructions
pub fn copy<const DST_TBL: u32, const SRC_TBL: u32, R, Dst, Src, E>(
    dst: &Dst,
    src: &Src,
    dst_idx: i32,
    src_idx: i32,
    len: i32,
) -> Result<(), E>
where
    R: TableElement,
    Dst: Table<R> + ?Sized,
    Src: Table<R> + ?Sized,
    E: Trap<AccessError>,
{
    let dst_idx = dst_idx as u32;
    let src_idx = src_idx as u32;
    let len = len as u32;
    dst.copy_from(src, dst_idx, src_idx, len)
        .map_err(|BoundsCheckError| {
            let (table, index) = match src_idx.checked_add(len) {
                Some(end) if end > src.size() => (SRC_TBL, src_idx),
                _ => (DST_TBL, dst_idx),
            };

            trap_access_error(table, index)
        })
}

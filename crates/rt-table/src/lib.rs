//! Implementation of WebAssembly tables for `wasmbake`.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![deny(unreachable_pub)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::missing_safety_doc)]
#![deny(clippy::alloc_instead_of_core)]
#![deny(clippy::std_instead_of_core)]

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "alloc")]
extern crate alloc;

#[doc(no_inline)]
pub use wasmbake_rt_core::{
    table::{NullableTableElement, TableElement},
    BoundsCheck, BoundsCheckError,
};

mod empty;
mod externref;
mod helpers;

#[cfg(feature = "alloc")]
mod heap;

pub use empty::EmptyTable;
pub use externref::ExternRef;
pub use helpers::*;

#[cfg(feature = "alloc")]
pub use heap::HeapTable;

/// Constant value returned by [`AnyTable::grow()`] used to indicate failure.
pub const GROW_FAILED: u32 = -1i32 as u32;

/// Trait for common operations shared by [`Table`]s of all element types.
pub trait AnyTable {
    /// Returns the current number of elements in the table.
    ///
    /// This should never be equal to [`GROW_FAILED`].
    fn size(&self) -> u32;

    /// Gets the maximum number of elements the table can contain.
    fn maximum(&self) -> u32;

    /// Increases the size of the table by the specified number of elements, and returns the old
    /// number of elements, or [`GROW_FAILED`] if the table could not grow.
    fn grow(&self, delta: u32) -> u32;
}

/// Checks that `idx + len` fits in the `size` of a table. 64-bit math sidesteps the overflow.
fn range_in_bounds(size: u32, idx: u32, len: u32) -> BoundsCheck<()> {
    if u64::from(idx) + u64::from(len) <= u64::from(size) {
        Ok(())
    } else {
        Err(BoundsCheckError)
    }
}

fn default_copy_conservative<E, Dst, Src>(
    dst: &Dst,
    src: &Src,
    dst_idx: u32,
    src_idx: u32,
    len: u32,
) -> BoundsCheck<()>
where
    E: TableElement,
    Dst: Table<E> + ?Sized,
    Src: Table<E> + ?Sized,
{
    range_in_bounds(src.size(), src_idx, len)?;
    range_in_bounds(dst.size(), dst_idx, len)?;

    // `src` and `dst` are assumed to be the same table; when the source range precedes an
    // overlapping destination range, copying in reverse preserves the source elements.
    if src_idx < dst_idx && u64::from(src_idx) + u64::from(len) > u64::from(dst_idx) {
        for (src_i, dst_i) in (src_idx..(src_idx + len))
            .zip(dst_idx..(dst_idx + len))
            .rev()
        {
            dst.set(dst_i, src.get(src_i)?)?;
        }
    } else {
        for (src_i, dst_i) in (src_idx..(src_idx + len)).zip(dst_idx..(dst_idx + len)) {
            dst.set(dst_i, src.get(src_i)?)?;
        }
    }

    Ok(())
}

/// Trait for implementations of [WebAssembly tables].
///
/// Elements are plain [`Copy`] data; operations that read an element return it by value, as
/// later [`Table::set()`] or [`AnyTable::grow()`] calls would invalidate references.
///
/// [WebAssembly tables]: https://webassembly.github.io/spec/core/syntax/modules.html#tables
pub trait Table<E: TableElement>: AnyTable {
    /// Gets the element at the given index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is greater than or equal to the [`AnyTable::size()`].
    fn get(&self, idx: u32) -> BoundsCheck<E>;

    /// Replaces the element at the given index with the given value, and returns the old value.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is greater than or equal to the [`AnyTable::size()`].
    fn replace(&self, idx: u32, new: E) -> BoundsCheck<E>;

    /// Returns a mutable slice containing the table's elements.
    fn as_mut_slice(&mut self) -> &mut [E];

    /// Sets the element at the given index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is greater than or equal to the [`AnyTable::size()`].
    fn set(&self, idx: u32, elem: E) -> BoundsCheck<()> {
        let _ = self.replace(idx, elem)?;
        Ok(())
    }

    /// Copies elements from `src` into the table starting at the specified index.
    ///
    /// # Errors
    ///
    /// Returns an error if the range of indices `idx..(idx + src.len())` is not in bounds; no
    /// element is written in that case.
    fn copy_from_slice(&self, idx: u32, src: &[E]) -> BoundsCheck<()> {
        let src_len = u32::try_from(src.len()).map_err(|_| BoundsCheckError)?;
        range_in_bounds(self.size(), idx, src_len)?;

        // The check above makes the per-element checks below unreachable.
        for (elem, i) in src.iter().copied().zip(idx..(idx + src_len)) {
            self.set(i, elem)?;
        }

        Ok(())
    }

    /// Copies elements from the table starting at the specified index into `dst`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range of indices `idx..(idx + dst.len())` is not in bounds.
    fn copy_into_slice(&self, idx: u32, dst: &mut [E]) -> BoundsCheck<()> {
        let dst_len = u32::try_from(dst.len()).map_err(|_| BoundsCheckError)?;
        range_in_bounds(self.size(), idx, dst_len)?;

        for (elem, i) in dst.iter_mut().zip(idx..(idx + dst_len)) {
            *elem = self.get(i)?;
        }

        Ok(())
    }

    /// Moves a range of elements within the table to another location, preserving the source
    /// range when it overlaps the destination.
    ///
    /// If elements need to be copied to another table, use [`Table::copy_from()`] instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the ranges `dst_idx..(dst_idx + len)` or `src_idx..(src_idx + len)`
    /// are not in bounds; no element is written in that case.
    fn copy_within(&self, dst_idx: u32, src_idx: u32, len: u32) -> BoundsCheck<()> {
        default_copy_conservative(self, self, dst_idx, src_idx, len)
    }

    /// Copies elements from `src` into `self`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range `dst_idx..(dst_idx + len)` is not in bounds in `self`, or
    /// if the range `src_idx..(src_idx + len)` is not in bounds in `src`; no element is written
    /// in that case.
    fn copy_from<Src>(&self, src: &Src, dst_idx: u32, src_idx: u32, len: u32) -> BoundsCheck<()>
    where
        Src: Table<E> + ?Sized,
    {
        // `self` and `src` may alias even when their addresses differ (ZSTs, `dyn` shenanigans),
        // so take the conservative path that is correct either way.
        default_copy_conservative(self, src, dst_idx, src_idx, len)
    }

    /// Fills a range with copies of the given element.
    ///
    /// # Errors
    ///
    /// Returns an error if the range of indices `idx..(idx + len)` is not in bounds; no element
    /// is written in that case.
    fn fill(&self, idx: u32, len: u32, elem: E) -> BoundsCheck<()> {
        range_in_bounds(self.size(), idx, len)?;

        for i in idx..(idx + len) {
            self.set(i, elem)?;
        }

        Ok(())
    }
}

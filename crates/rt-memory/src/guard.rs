//! Guard-paged linear memory.
//!
//! [`GuardPagedMemory`] reserves the entire 32-bit address range plus a trailing guard band up
//! front, so *any* effective address a sized access can produce lands inside the reservation.
//! Pages up to the current size are committed read-write; everything past them is `PROT_NONE`.
//! Sized loads and stores therefore perform no explicit range check: an out-of-bounds access
//! raises a hardware fault, which the embedder's fault handler is responsible for converting
//! into an out-of-bounds trap (that mechanism is outside this crate). Bulk operations take
//! lengths that could step over the guard band, so they keep their explicit checks.

use crate::{mmap::Reservation, BoundsCheck, BoundsCheckError, Memory, PAGE_SIZE};

/// The trailing guard band. Sized accesses are at most 8 bytes wide, so one wasm page is ample.
const GUARD_BAND: usize = PAGE_SIZE as usize;

/// The full 32-bit address range; a wild `addr` can never reach a neighbouring mapping.
const RESERVED: usize = (1 << 32) + GUARD_BAND;

/// A [`Memory`] implementation whose sized accesses are checked by the host MMU instead of
/// explicit comparisons.
///
/// Only 32-bit memories are supported; the reservation trick needs the address operand's range
/// to be coverable, which a 64-bit address space is not.
#[derive(Debug)]
pub struct GuardPagedMemory {
    reservation: Reservation,
    /// The maximum number of pages this linear memory can have.
    limit: u32,
}

impl GuardPagedMemory {
    /// Reserves the address range and commits `minimum` zero-filled pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the reservation or the initial commit fails, or if `minimum` exceeds
    /// `maximum`.
    pub fn with_limits(minimum: u32, maximum: u32) -> Result<Self, crate::AllocationError<u32>> {
        let error = || crate::AllocationError { size: minimum };

        if minimum > maximum || maximum > u32::MAX / PAGE_SIZE + 1 {
            return Err(error());
        }

        let mem = Self {
            reservation: Reservation::reserve(RESERVED).ok_or_else(error)?,
            limit: maximum,
        };

        mem.try_grow(minimum)?;
        Ok(mem)
    }

    /// Returns the size of the linear memory, in bytes.
    pub fn len(&self) -> usize {
        self.reservation.committed()
    }

    /// Returns `true` if the memory has a size of `0`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attempts to commit `delta` additional zero-filled pages.
    ///
    /// The base address never moves; growth only changes page protections.
    ///
    /// # Errors
    ///
    /// Returns an error if the new size would exceed the maximum or the commit fails.
    pub fn try_grow(&self, delta: u32) -> Result<(), crate::AllocationError<u32>> {
        if delta == 0 {
            return Ok(());
        }

        let error = || crate::AllocationError { size: delta };

        let new_size = match Memory::<u32>::size(self).checked_add(delta) {
            Some(sum) if sum <= self.limit => sum,
            _ => return Err(error()),
        };

        if self.reservation.commit(new_size as usize * PAGE_SIZE as usize) {
            Ok(())
        } else {
            Err(error())
        }
    }

    fn data(&self) -> *mut u8 {
        self.reservation.base().as_ptr()
    }

    fn in_bounds(&self, addr: u32, len: usize) -> BoundsCheck<usize> {
        let addr = addr as usize;
        match addr.checked_add(len) {
            Some(end) if end <= self.len() => Ok(addr),
            _ => Err(BoundsCheckError),
        }
    }
}

macro_rules! unchecked_accesses {
    {$(
        $int:ty : $load:ident / $store:ident;
    )*} => {$(
        /// Sized access with no explicit check; an out-of-bounds effective address faults on the
        /// guard region and never reaches another mapping.
        fn $load(&self, addr: u32) -> BoundsCheck<$int> {
            // SAFETY: `addr + size_of::<$int>() < RESERVED` for every `u32` address, so the read
            // stays inside this memory's own reservation. A fault on an uncommitted page is the
            // embedder's to handle; see the module documentation.
            let raw = unsafe {
                self.data()
                    .add(addr as usize)
                    .cast::<$int>()
                    .read_unaligned()
            };

            Ok(<$int>::from_le(raw))
        }

        /// Sized store counterpart of the unchecked load above.
        fn $store(&self, addr: u32, value: $int) -> BoundsCheck<()> {
            // SAFETY: same bounds argument as the unchecked load.
            unsafe {
                self.data()
                    .add(addr as usize)
                    .cast::<$int>()
                    .write_unaligned(value.to_le());
            }

            Ok(())
        }
    )*};
}

impl Memory<u32> for GuardPagedMemory {
    fn size(&self) -> u32 {
        u32::try_from(self.len() / PAGE_SIZE as usize).unwrap_or(u32::MAX)
    }

    fn maximum(&self) -> u32 {
        self.limit
    }

    fn len_bytes(&self) -> usize {
        self.len()
    }

    fn grow(&self, delta: u32) -> u32 {
        let old = Memory::<u32>::size(self);
        match self.try_grow(delta) {
            Ok(()) => old,
            Err(_) => u32::MAX,
        }
    }

    fn copy_to_slice(&self, addr: u32, dst: &mut [u8]) -> BoundsCheck<()> {
        let addr = self.in_bounds(addr, dst.len())?;

        // SAFETY: the range `addr..addr + dst.len()` is committed, per the check above.
        unsafe {
            core::ptr::copy_nonoverlapping(self.data().add(addr), dst.as_mut_ptr(), dst.len());
        }

        Ok(())
    }

    fn copy_from_slice(&self, addr: u32, src: &[u8]) -> BoundsCheck<()> {
        let addr = self.in_bounds(addr, src.len())?;

        // SAFETY: the range `addr..addr + src.len()` is committed, per the check above.
        unsafe {
            core::ptr::copy_nonoverlapping(src.as_ptr(), self.data().add(addr), src.len());
        }

        Ok(())
    }

    fn copy_within(&self, dst_addr: u32, src_addr: u32, len: u32) -> BoundsCheck<()> {
        let src = self.in_bounds(src_addr, len as usize)?;
        let dst = self.in_bounds(dst_addr, len as usize)?;

        // SAFETY: both ranges are committed; `copy` has `memmove` overlap semantics.
        unsafe {
            core::ptr::copy(self.data().add(src), self.data().add(dst), len as usize);
        }

        Ok(())
    }

    fn fill(&self, addr: u32, len: u32, byte: u8) -> BoundsCheck<()> {
        let addr = self.in_bounds(addr, len as usize)?;

        // SAFETY: the range `addr..addr + len` is committed, per the check above.
        unsafe {
            core::ptr::write_bytes(self.data().add(addr), byte, len as usize);
        }

        Ok(())
    }

    unchecked_accesses! {
        i8 : i8_load / i8_store;
        i16 : i16_load / i16_store;
        i32 : i32_load / i32_store;
        i64 : i64_load / i64_store;
    }
}

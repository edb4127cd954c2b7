//! The segmented-memory fast path.
//!
//! On x86-64 Linux the GS segment base register is unused by the ABI, so the distinguished
//! (single, unshared) linear memory of a module can mirror its data pointer into it with
//! [`SegueMemory::install()`]. The original form of this optimisation rewrites every memory
//! access to be GS-relative, which needs segment-qualified pointers that Rust does not have;
//! what is kept here is the full surface: base read/write through `rdgsbase`/`wrgsbase` or the
//! `arch_prctl` syscall shims, the [`FSGSBASE_INST_SUPPORTED`] switch, and a memory whose
//! accesses derive their data pointer from the segment base. Bounds and endian behaviour are
//! identical, so enabling it is always transparent.
//!
//! The embedder decides whether the `rdgsbase`/`wrgsbase` instructions may be executed (the
//! kernel must enable FSGSBASE) and sets [`FSGSBASE_INST_SUPPORTED`] accordingly; the default is
//! the syscall path, which works on any x86-64 Linux.

use crate::{mmap::Reservation, BoundsCheck, BoundsCheckError, Memory, PAGE_SIZE};
use core::sync::atomic::{AtomicBool, Ordering};

/// Whether the `rdgsbase`/`wrgsbase` instructions may be executed directly.
///
/// Set once by the embedder during start-up, before any translated code runs.
pub static FSGSBASE_INST_SUPPORTED: AtomicBool = AtomicBool::new(false);

const ARCH_SET_GS: libc::c_long = 0x1001;
const ARCH_GET_GS: libc::c_long = 0x1004;

/// Reads the GS segment base.
pub fn read_base() -> *mut u8 {
    if FSGSBASE_INST_SUPPORTED.load(Ordering::Relaxed) {
        let base: u64;
        // SAFETY: the embedder asserted that the kernel permits `rdgsbase`.
        unsafe {
            core::arch::asm!("rdgsbase {}", out(reg) base, options(nostack, preserves_flags));
        }
        base as *mut u8
    } else {
        let mut base = 0u64;
        // SAFETY: `ARCH_GET_GS` writes one `u64` through the provided pointer.
        unsafe {
            libc::syscall(libc::SYS_arch_prctl, ARCH_GET_GS, &mut base as *mut u64);
        }
        base as *mut u8
    }
}

/// Writes the GS segment base.
pub fn write_base(base: *mut u8) {
    if FSGSBASE_INST_SUPPORTED.load(Ordering::Relaxed) {
        // SAFETY: the embedder asserted that the kernel permits `wrgsbase`.
        unsafe {
            core::arch::asm!("wrgsbase {}", in(reg) base as u64, options(nostack, preserves_flags));
        }
    } else {
        // SAFETY: `ARCH_SET_GS` only changes the segment base, which nothing else here uses.
        unsafe {
            libc::syscall(libc::SYS_arch_prctl, ARCH_SET_GS, base as u64);
        }
    }
}

/// The distinguished linear memory whose data pointer lives in the GS segment base.
///
/// The backing allocation is a single fixed reservation, so growth never moves the base and the
/// installed segment register stays valid for the memory's whole lifetime. Accesses read the
/// pointer back from the segment base; with the `sanity-checks` feature each access asserts that
/// the base still matches the reservation.
#[derive(Debug)]
pub struct SegueMemory {
    reservation: Reservation,
    /// The maximum number of pages this linear memory can have.
    limit: u32,
}

impl SegueMemory {
    /// Reserves `maximum` pages and commits `minimum` zero-filled pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the reservation or initial commit fails, or if `minimum` exceeds
    /// `maximum`.
    pub fn with_limits(minimum: u32, maximum: u32) -> Result<Self, crate::AllocationError<u32>> {
        let error = || crate::AllocationError { size: minimum };

        if minimum > maximum || maximum > u32::MAX / PAGE_SIZE + 1 {
            return Err(error());
        }

        let reserved = (maximum as usize * PAGE_SIZE as usize).max(PAGE_SIZE as usize);
        let mem = Self {
            reservation: Reservation::reserve(reserved).ok_or_else(error)?,
            limit: maximum,
        };

        mem.try_grow(minimum)?;
        Ok(mem)
    }

    /// Mirrors the memory's data pointer into the GS segment base.
    ///
    /// Must be called before translated code accesses this memory, and again whenever the host
    /// OS or embedder has clobbered the segment base.
    pub fn install(&self) {
        write_base(self.reservation.base().as_ptr());
    }

    /// Returns the size of the linear memory, in bytes.
    pub fn len(&self) -> usize {
        self.reservation.committed()
    }

    /// Returns `true` if the memory has a size of `0`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attempts to commit `delta` additional zero-filled pages in place.
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
        let base = read_base();

        #[cfg(feature = "sanity-checks")]
        assert_eq!(
            base,
            self.reservation.base().as_ptr(),
            "segment base does not match the installed memory"
        );

        base
    }

    fn in_bounds(&self, addr: u32, len: usize) -> BoundsCheck<usize> {
        let addr = addr as usize;
        match addr.checked_add(len) {
            Some(end) if end <= self.len() => Ok(addr),
            _ => Err(BoundsCheckError),
        }
    }
}

impl Memory<u32> for SegueMemory {
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
}

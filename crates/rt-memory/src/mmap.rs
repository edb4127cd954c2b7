//! Minimal wrapper over an anonymous `mmap` reservation with commit-on-demand.

use core::{cell::Cell, ptr::NonNull};

/// An address-space reservation created with `PROT_NONE`, with a read-write committed prefix.
///
/// Freshly committed pages are zero-filled by the kernel.
pub(crate) struct Reservation {
    base: NonNull<u8>,
    reserved: usize,
    committed: Cell<usize>,
}

impl Reservation {
    /// Reserves `reserved` bytes of inaccessible address space.
    pub(crate) fn reserve(reserved: usize) -> Option<Self> {
        // SAFETY: requesting a fresh anonymous mapping; no existing memory is affected.
        let pointer = unsafe {
            libc::mmap(
                core::ptr::null_mut(),
                reserved,
                libc::PROT_NONE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };

        if pointer == libc::MAP_FAILED {
            return None;
        }

        Some(Self {
            base: NonNull::new(pointer.cast::<u8>())?,
            reserved,
            committed: Cell::new(0),
        })
    }

    pub(crate) fn base(&self) -> NonNull<u8> {
        self.base
    }

    pub(crate) fn committed(&self) -> usize {
        self.committed.get()
    }

    /// Makes the first `len` bytes of the reservation readable and writable.
    pub(crate) fn commit(&self, len: usize) -> bool {
        debug_assert!(len >= self.committed.get());

        if len > self.reserved {
            return false;
        }

        // SAFETY: `base..base + len` lies inside this mapping.
        let result =
            unsafe { libc::mprotect(self.base.as_ptr().cast(), len, libc::PROT_READ | libc::PROT_WRITE) };

        if result == 0 {
            self.committed.set(len);
            true
        } else {
            false
        }
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        // SAFETY: `base` and `reserved` describe the mapping created in `reserve()`.
        unsafe {
            libc::munmap(self.base.as_ptr().cast(), self.reserved);
        }
    }
}

impl core::fmt::Debug for Reservation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Reservation")
            .field("reserved", &self.reserved)
            .field("committed", &self.committed.get())
            .finish_non_exhaustive()
    }
}

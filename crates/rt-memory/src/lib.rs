//! Implementation of WebAssembly linear memory for `wasmbake`.
//!
//! Every sized access goes through [`u8::to_le_bytes`]-family conversions, so the buffer holds
//! little-endian representations on every host and generated code observes WebAssembly's byte
//! order without any per-host address arithmetic.

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

mod address;
mod empty;
mod helpers;

#[cfg(feature = "alloc")]
mod heap;

#[cfg(all(feature = "guard-pages", target_family = "unix", target_pointer_width = "64"))]
mod guard;

#[cfg(any(
    all(feature = "guard-pages", target_family = "unix", target_pointer_width = "64"),
    all(feature = "segue", target_arch = "x86_64", target_os = "linux")
))]
mod mmap;

#[cfg(all(feature = "segue", target_arch = "x86_64", target_os = "linux"))]
pub mod segue;

pub use address::Address;
pub use empty::EmptyMemory;
pub use helpers::*;

#[cfg(feature = "alloc")]
pub use heap::HeapMemory;

#[cfg(all(feature = "guard-pages", target_family = "unix", target_pointer_width = "64"))]
pub use guard::GuardPagedMemory;

use wasmbake_rt_core::trap::{TrapInfo, TrapKind};

pub use wasmbake_rt_core::{BoundsCheck, BoundsCheckError};

/// The size, in bytes, of a WebAssembly linear memory [page].
///
/// [page]: https://webassembly.github.io/spec/core/exec/runtime.html#page-size
pub const PAGE_SIZE: u32 = 65536;

/// Error type used when the minimum required number of [pages] for a linear memory could not be
/// allocated.
///
/// [pages]: PAGE_SIZE
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct AllocationError<I: Address = u32> {
    size: I,
}

impl<I: Address> AllocationError<I> {
    /// The minimum number of [pages] that was requested.
    ///
    /// [pages]: PAGE_SIZE
    pub fn size(&self) -> I {
        self.size
    }
}

impl<I: Address> core::fmt::Display for AllocationError<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "could not allocate {} pages for memory", self.size)
    }
}

#[cfg(feature = "std")]
impl<I: Address> std::error::Error for AllocationError<I> {}

/// Error type used when an attempt to read or write from a linear [`Memory`] fails.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct AccessError<I: Address = u32> {
    memory: u32,
    address: I,
    offset: I,
}

impl<I: Address> AccessError<I> {
    const fn new(memory: u32, offset: I, address: I) -> Self {
        Self {
            memory,
            offset,
            address,
        }
    }

    /// The index of the linear memory the access was made into.
    pub fn memory(&self) -> u32 {
        self.memory
    }

    /// The dynamic address operand of the access.
    pub fn address(&self) -> I {
        self.address
    }

    /// The static offset of the access.
    pub fn offset(&self) -> I {
        self.offset
    }
}

impl<I: Address> core::fmt::Display for AccessError<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "invalid access of linear memory #{} at address {:#X}",
            self.memory, self.address
        )?;

        if self.offset > I::ZERO {
            write!(f, " + {:#X}", self.offset)?;

            if let Some(effective_address) = self.address.checked_add(&self.offset) {
                write!(f, " = {effective_address:#X}")?;
            }
        }
        Ok(())
    }
}

impl<I: Address> TrapInfo for AccessError<I> {
    fn kind(&self) -> TrapKind {
        TrapKind::MemoryOutOfBounds
    }
}

#[cfg(feature = "std")]
impl<I: Address> std::error::Error for AccessError<I> {}

macro_rules! unaligned_integer_accesses {
    {
        $($int:ty : $load:ident / $store:ident;)*
    } => {$(
        fn $load<I: Address, M: Memory<I> + ?Sized>(mem: &M, addr: I) -> BoundsCheck<$int> {
            let mut dst = [0u8; core::mem::size_of::<$int>()];
            match mem.copy_to_slice(addr, &mut dst) {
                Ok(()) => Ok(<$int>::from_le_bytes(dst)),
                Err(e) => Err(e),
            }
        }

        fn $store<I, M>(mem: &M, addr: I, value: $int) -> BoundsCheck<()>
        where
            I: Address,
            M: Memory<I> + ?Sized,
        {
            mem.copy_from_slice(addr, &value.to_le_bytes())
        }
    )*};
}

unaligned_integer_accesses! {
    i16 : unaligned_i16_load / unaligned_i16_store;
    i32 : unaligned_i32_load / unaligned_i32_store;
    i64 : unaligned_i64_load / unaligned_i64_store;
}

fn default_copy_between<I, Dst, Src>(
    dst: &Dst,
    src: &Src,
    dst_addr: I,
    src_addr: I,
    len: I,
) -> BoundsCheck<()>
where
    I: Address,
    Dst: Memory<I> + ?Sized,
    Src: Memory<I> + ?Sized,
{
    /// Limit on the number of bytes to copy at a time.
    const BUFFER_SIZE: usize = 2048;

    // Validate both ranges up front so that no bytes move on a doomed copy.
    bounds(src.len_bytes(), src_addr, len)?;
    bounds(dst.len_bytes(), dst_addr, len)?;

    let mut buffer = [0u8; BUFFER_SIZE];
    let mut written = I::ZERO;
    while let Some(slice @ [_, ..]) = buffer.get_mut(..BUFFER_SIZE.min((len - written).as_())) {
        src.copy_to_slice(src_addr + written, slice)?;
        dst.copy_from_slice(dst_addr + written, slice)?;

        // `slice.len() <= buffer.len() <= u32::MAX`
        #[allow(clippy::cast_possible_truncation)]
        {
            written += I::cast_from_usize(slice.len());
        }
    }

    Ok(())
}

/// Checks that `addr + len` neither overflows `I` nor exceeds `size` bytes.
fn bounds<I: Address>(size: usize, addr: I, len: I) -> BoundsCheck<()> {
    match addr.checked_add(&len) {
        Some(end) if num_traits::AsPrimitive::<usize>::as_(end) <= size => Ok(()),
        _ => Err(BoundsCheckError),
    }
}

/// Trait for implementations of [WebAssembly linear memory].
///
/// A memory is a byte buffer `0..len_bytes()` observed by generated code in little-endian order.
/// The provided sized accesses are range-checked through [`copy_to_slice`]/[`copy_from_slice`];
/// implementations backed by host guard pages override them to elide the explicit check.
///
/// [WebAssembly linear memory]: https://webassembly.github.io/spec/core/syntax/modules.html#memories
/// [`copy_to_slice`]: Memory::copy_to_slice
/// [`copy_from_slice`]: Memory::copy_from_slice
pub trait Memory<I: Address = u32> {
    /// Returns the size of the linear memory, in terms of the [`PAGE_SIZE`].
    fn size(&self) -> I;

    /// Gets the maximum number of pages that this linear memory can have.
    fn maximum(&self) -> I;

    /// Returns the size of the linear memory, in bytes.
    fn len_bytes(&self) -> usize {
        num_traits::AsPrimitive::<usize>::as_(self.size()) * PAGE_SIZE as usize
    }

    /// Increases the size of the linear memory by the specified number of [pages], and returns
    /// the old number of pages, or [`Address::GROW_FAILED`] on failure.
    ///
    /// The default implementation only supports `delta == 0`.
    ///
    /// [pages]: PAGE_SIZE
    fn grow(&self, delta: I) -> I {
        if delta == I::ZERO {
            self.size()
        } else {
            I::GROW_FAILED
        }
    }

    /// Copies bytes from linear memory starting at the specified address into the given slice.
    ///
    /// # Errors
    ///
    /// Returns an error if the range of addresses `addr..(addr + dst.len())` is not in bounds.
    fn copy_to_slice(&self, addr: I, dst: &mut [u8]) -> BoundsCheck<()>;

    /// Copies bytes from the given slice into linear memory starting at the specified address.
    ///
    /// # Errors
    ///
    /// Returns an error if the range of addresses `addr..(addr + src.len())` is not in bounds.
    fn copy_from_slice(&self, addr: I, src: &[u8]) -> BoundsCheck<()>;

    /// Moves a range of bytes in this linear memory to another location, with
    /// overlap-preserving (`memmove`) semantics.
    ///
    /// # Errors
    ///
    /// Returns an error if `src_addr + len` or `dst_addr + len` is not in bounds; no bytes are
    /// written in that case.
    fn copy_within(&self, dst_addr: I, src_addr: I, len: I) -> BoundsCheck<()> {
        // A buffered chunk copy is only correct here when the ranges are disjoint or the
        // destination precedes the source by at least the buffer size; implementations with a
        // contiguous buffer override this with a real `memmove`.
        default_copy_between(self, self, dst_addr, src_addr, len)
    }

    /// Copies bytes from the given linear memory into `self`.
    ///
    /// # Errors
    ///
    /// Returns an error if `src_addr + len` is not in bounds in the source memory, or if
    /// `dst_addr + len` is not in bounds in `self`; no bytes are written in that case.
    fn copy_from<Src>(&self, src: &Src, dst_addr: I, src_addr: I, len: I) -> BoundsCheck<()>
    where
        Src: Memory<I> + ?Sized,
    {
        // If neither `src` or `self` are zero-sized types, then they should refer to the same
        // object if the pointers are equal.
        if core::mem::size_of_val(self) > 0
            && core::mem::size_of_val(src) > 0
            && core::ptr::addr_eq(self as *const Self, src as *const Src)
        {
            self.copy_within(dst_addr, src_addr, len)
        } else {
            default_copy_between(self, src, dst_addr, src_addr, len)
        }
    }

    /// Writes `len` copies of `byte` starting at the specified address.
    ///
    /// # Errors
    ///
    /// Returns an error if `addr + len` is not in bounds; no bytes are written in that case.
    fn fill(&self, addr: I, len: I, byte: u8) -> BoundsCheck<()> {
        const BUFFER_SIZE: usize = 512;

        bounds(self.len_bytes(), addr, len)?;

        let buffer = [byte; BUFFER_SIZE];
        let mut written = I::ZERO;
        while written < len {
            let chunk = BUFFER_SIZE.min((len - written).as_());
            self.copy_from_slice(addr + written, &buffer[..chunk])?;

            #[allow(clippy::cast_possible_truncation)]
            {
                written += I::cast_from_usize(chunk);
            }
        }

        Ok(())
    }

    /// Loads the value of the byte stored at the given address.
    fn i8_load(&self, addr: I) -> BoundsCheck<i8> {
        let mut dst = 0u8;
        match self.copy_to_slice(addr, core::slice::from_mut(&mut dst)) {
            Ok(()) => Ok(dst as i8),
            Err(e) => Err(e),
        }
    }

    /// Loads a 16-bit integer from the given address.
    fn i16_load(&self, addr: I) -> BoundsCheck<i16> {
        unaligned_i16_load(self, addr)
    }

    /// Loads a 32-bit integer from the given address.
    fn i32_load(&self, addr: I) -> BoundsCheck<i32> {
        unaligned_i32_load(self, addr)
    }

    /// Loads a 64-bit integer from the given address.
    fn i64_load(&self, addr: I) -> BoundsCheck<i64> {
        unaligned_i64_load(self, addr)
    }

    /// Writes into the byte at the given address.
    fn i8_store(&self, addr: I, value: i8) -> BoundsCheck<()> {
        self.copy_from_slice(addr, &[value as u8])
    }

    /// Stores a 16-bit integer into the given address.
    fn i16_store(&self, addr: I, value: i16) -> BoundsCheck<()> {
        unaligned_i16_store(self, addr, value)
    }

    /// Stores a 32-bit integer into the given address.
    fn i32_store(&self, addr: I, value: i32) -> BoundsCheck<()> {
        unaligned_i32_store(self, addr, value)
    }

    /// Stores a 64-bit integer into the given address.
    fn i64_store(&self, addr: I, value: i64) -> BoundsCheck<()> {
        unaligned_i64_store(self, addr, value)
    }
}

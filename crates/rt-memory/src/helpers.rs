//! Helper functions for performing memory accesses.
//!
//! Calls to these functions are generated as part of the `wasmbake` translation process; together
//! they are the memory half of the contract surface generated code relies on. Each function
//! computes the effective address from the instruction's static `offset` and dynamic `addr`
//! operand, performs the access through the [`Memory`] implementation, and converts an
//! out-of-bounds failure into a trap via [`Trap<AccessError>`].
//!
//! [`Trap<AccessError>`]: Trap

use crate::{AccessError, Address, BoundsCheck, BoundsCheckError, Memory};
use wasmbake_rt_core::trap::Trap;

/// This implements the [`memory.size`] instruction.
///
/// [`memory.size`]: https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-memory
pub fn size<I: Address, M: Memory<I> + ?Sized>(mem: &M) -> I::Signed {
    mem.size().as_()
}

/// This implements the [`memory.grow`] instruction.
///
/// For more information, see the documentation for the [`Memory::grow()`] method.
///
/// [`memory.grow`]: https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-memory
pub fn grow<I: Address, M: Memory<I> + ?Sized>(mem: &M, delta: I::Signed) -> I::Signed {
    mem.grow(I::cast_from_signed(delta)).as_()
}

#[cold]
#[inline(never)]
fn trap_access_error<I, E>(memory: u32, offset: I, address: I) -> E
where
    I: Address,
    E: Trap<AccessError<I>>,
{
    E::trap(AccessError::new(memory, offset, address))
}

/// Calculates an address from adding a static offset to a dynamic address operand.
///
/// This implements the calculation of the [*effective address*] for WebAssembly memory
/// instructions; overflow of the address type is out of bounds.
///
/// [*effective address*]: https://webassembly.github.io/spec/core/syntax/instructions.html#memory-instructions
#[inline]
fn effective_address<I: Address>(offset: I, address: I) -> BoundsCheck<I> {
    address.checked_add(&offset).ok_or(BoundsCheckError)
}

/// This implements the [`memory.init`] instruction and [active data segment initialization].
///
/// The data segment is a plain byte slice; both the segment range `segment_offset..+length` and
/// the destination range are checked before any byte is written.
///
/// [active data segment initialization]: https://webassembly.github.io/spec/core/syntax/modules.html#data-segments
/// [`memory.init`]: https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-memory
pub fn init<const MEMORY: u32, I, M, E>(
    mem: &M,
    memory_offset: I::Signed,
    segment_offset: I::Signed,
    length: I::Signed,
    data_segment: &[u8],
) -> Result<(), E>
where
    I: Address,
    M: Memory<I> + ?Sized,
    E: Trap<AccessError<I>>,
{
    fn source<I: Address>(segment: &[u8], offset: I, length: I) -> Option<&[u8]> {
        segment.get(offset.to_usize()?..)?.get(..length.to_usize()?)
    }

    fn inner<I: Address>(
        mem: &(impl Memory<I> + ?Sized),
        memory_offset: I,
        segment_offset: I,
        length: I,
        data: &[u8],
    ) -> BoundsCheck<()> {
        source(data, segment_offset, length)
            .ok_or(BoundsCheckError)
            .and_then(|src| mem.copy_from_slice(memory_offset, src))
    }

    let memory_offset = I::cast_from_signed(memory_offset);
    inner(
        mem,
        memory_offset,
        I::cast_from_signed(segment_offset),
        I::cast_from_signed(length),
        data_segment,
    )
    .map_err(|BoundsCheckError| trap_access_error(MEMORY, I::ZERO, memory_offset))
}

/// This implements the [`memory.fill`] instruction.
///
/// Only the low byte of the `value` operand is written.
///
/// [`memory.fill`]: https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-memory
#[allow(clippy::cast_possible_truncation)] // only the low byte of `value` is meaningful
pub fn fill<const MEMORY: u32, I, M, E>(
    mem: &M,
    addr: I::Signed,
    value: i32,
    length: I::Signed,
) -> Result<(), E>
where
    I: Address,
    M: Memory<I> + ?Sized,
    E: Trap<AccessError<I>>,
{
    let addr = I::cast_from_signed(addr);
    let length = I::cast_from_signed(length);
    mem.fill(addr, length, value as u8)
        .map_err(|BoundsCheckError| {
            trap_access_error(MEMORY, length.saturating_sub(I::ONE), addr)
        })
}

/// This implements the [`memory.copy`] instruction in the typical case where the source and
/// destination are within the same linear memory.
///
/// For more information, see the documentation for the [`Memory::copy_within()`] method.
///
/// [`memory.copy`]: https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-memory
pub fn copy_within<const MEMORY: u32, I, M, E>(
    mem: &M,
    dst_addr: I::Signed,
    src_addr: I::Signed,
    len: I::Signed,
) -> Result<(), E>
where
    I: Address,
    M: Memory<I> + ?Sized,
    E: Trap<AccessError<I>>,
{
    let dst_addr = I::cast_from_signed(dst_addr);
    let src_addr = I::cast_from_signed(src_addr);
    let len = I::cast_from_signed(len);
    mem.copy_within(dst_addr, src_addr, len)
        .map_err(|BoundsCheckError| {
            trap_access_error(
                MEMORY,
                len.saturating_sub(I::ONE),
                src_addr.max(dst_addr),
            )
        })
}

/// This implements the [`memory.copy`] instruction in the case where the source and destination
/// memories differ.
///
/// For more information, see the documentation for the [`Memory::copy_from()`] method.
///
/// [`memory.copy`]: https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-memory
pub fn copy<const DST_MEM: u32, const SRC_MEM: u32, I, Dst, Src, E>(
    dst: &Dst,
    src: &Src,
    dst_addr: I::Signed,
    src_addr: I::Signed,
    len: I::Signed,
) -> Result<(), E>
where
    I: Address,
    Dst: Memory<I>,
    Src: Memory<I> + ?Sized,
    E: Trap<AccessError<I>>,
{
    let dst_addr = I::cast_from_signed(dst_addr);
    let src_addr = I::cast_from_signed(src_addr);
    let len = I::cast_from_signed(len);
    dst.copy_from(src, dst_addr, src_addr, len)
        .map_err(|BoundsCheckError| {
            let (memory, address) = match src_addr.checked_add(&len) {
                Some(end) if num_traits::AsPrimitive::<usize>::as_(end) > src.len_bytes() => (SRC_MEM, src_addr),
                _ => (DST_MEM, dst_addr),
            };

            trap_access_error(memory, len.saturating_sub(I::ONE), address)
        })
}

macro_rules! memory_load {
    {$(
        $name:ident = $instr:literal : $trait_load:ident as $raw:ty => $value:ty = $extend:expr;
    )*} => {$(
        #[doc = concat!(
            "This implements the [`", $instr, "`] instruction.\n\nReads a little-endian [`",
            stringify!($raw), "`] at `addr + offset` and extends it to a [`", stringify!($value),
            "`].\n\n[`", $instr, "`]: ",
            "https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-memory"
        )]
        #[inline]
        pub fn $name<const MEMORY: u32, I, M, E>(
            mem: &M,
            offset: I::Signed,
            addr: I::Signed,
        ) -> Result<$value, E>
        where
            I: Address,
            M: Memory<I> + ?Sized,
            E: Trap<AccessError<I>>,
        {
            fn load<I: Address>(
                mem: &(impl Memory<I> + ?Sized),
                offset: I,
                addr: I,
            ) -> BoundsCheck<$raw> {
                mem.$trait_load(effective_address(offset, addr)?)
            }

            let offset = I::cast_from_signed(offset);
            let addr = I::cast_from_signed(addr);
            match load(mem, offset, addr) {
                Ok(raw) => {
                    let extend: fn($raw) -> $value = $extend;
                    Ok(extend(raw))
                }
                Err(BoundsCheckError) => Err(trap_access_error(MEMORY, offset, addr)),
            }
        }
    )*};
}

memory_load! {
    i32_load = "i32.load" : i32_load as i32 => i32 = |raw| raw;
    i64_load = "i64.load" : i64_load as i64 => i64 = |raw| raw;
    // Going through the integer load keeps a signalling-NaN payload bit-exact; the value never
    // transits an FPU register.
    f32_load = "f32.load" : i32_load as i32 => f32 = |raw| f32::from_bits(raw as u32);
    f64_load = "f64.load" : i64_load as i64 => f64 = |raw| f64::from_bits(raw as u64);
    i32_load8_s = "i32.load8_s" : i8_load as i8 => i32 = i32::from;
    i32_load8_u = "i32.load8_u" : i8_load as i8 => i32 = |raw| i32::from(raw as u8);
    i32_load16_s = "i32.load16_s" : i16_load as i16 => i32 = i32::from;
    i32_load16_u = "i32.load16_u" : i16_load as i16 => i32 = |raw| i32::from(raw as u16);
    i64_load8_s = "i64.load8_s" : i8_load as i8 => i64 = i64::from;
    i64_load8_u = "i64.load8_u" : i8_load as i8 => i64 = |raw| i64::from(raw as u8);
    i64_load16_s = "i64.load16_s" : i16_load as i16 => i64 = i64::from;
    i64_load16_u = "i64.load16_u" : i16_load as i16 => i64 = |raw| i64::from(raw as u16);
    i64_load32_s = "i64.load32_s" : i32_load as i32 => i64 = i64::from;
    i64_load32_u = "i64.load32_u" : i32_load as i32 => i64 = |raw| i64::from(raw as u32);
}

macro_rules! memory_store {
    {$(
        $name:ident = $instr:literal : $value:ty as $raw:ty => $trait_store:ident = $wrap:expr;
    )*} => {$(
        #[doc = concat!(
            "This implements the [`", $instr, "`] instruction.\n\nWraps the [`",
            stringify!($value), "`] operand to a [`", stringify!($raw), "`] and writes it ",
            "little-endian at `addr + offset`.\n\n[`", $instr, "`]: ",
            "https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-memory"
        )]
        #[inline]
        #[allow(clippy::cast_possible_truncation)] // wrapping to the access width is the point
        pub fn $name<const MEMORY: u32, I, M, E>(
            mem: &M,
            offset: I::Signed,
            addr: I::Signed,
            value: $value,
        ) -> Result<(), E>
        where
            I: Address,
            M: Memory<I> + ?Sized,
            E: Trap<AccessError<I>>,
        {
            fn store<I: Address>(
                mem: &(impl Memory<I> + ?Sized),
                offset: I,
                addr: I,
                raw: $raw,
            ) -> BoundsCheck<()> {
                mem.$trait_store(effective_address(offset, addr)?, raw)
            }

            let offset = I::cast_from_signed(offset);
            let addr = I::cast_from_signed(addr);
            let wrap: fn($value) -> $raw = $wrap;
            store(mem, offset, addr, wrap(value))
                .map_err(|BoundsCheckError| trap_access_error(MEMORY, offset, addr))
        }
    )*};
}

memory_store! {
    i32_store = "i32.store" : i32 as i32 => i32_store = |value| value;
    i64_store = "i64.store" : i64 as i64 => i64_store = |value| value;
    f32_store = "f32.store" : f32 as i32 => i32_store = |value| value.to_bits() as i32;
    f64_store = "f64.store" : f64 as i64 => i64_store = |value| value.to_bits() as i64;
    i32_store8 = "i32.store8" : i32 as i8 => i8_store = |value| value as i8;
    i32_store16 = "i32.store16" : i32 as i16 => i16_store = |value| value as i16;
    i64_store8 = "i64.store8" : i64 as i8 => i8_store = |value| value as i8;
    i64_store16 = "i64.store16" : i64 as i16 => i16_store = |value| value as i16;
    i64_store32 = "i64.store32" : i64 as i32 => i32_store = |value| value as i32;
}

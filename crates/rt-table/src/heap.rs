use crate::NullableTableElement;
use core::{cell::Cell, ptr::NonNull};

fn index_to_usize(idx: u32) -> crate::BoundsCheck<usize> {
    usize::try_from(idx).map_err(|_| crate::BoundsCheckError)
}

/// A growable [`Table`] implementation backed by a heap allocation.
///
/// Elements past a successful [`grow`] are initialised to [`E::NULL`].
///
/// [`Table`]: crate::Table
/// [`grow`]: crate::AnyTable::grow()
/// [`E::NULL`]: NullableTableElement::NULL
pub struct HeapTable<E: NullableTableElement> {
    allocation: Cell<NonNull<Cell<E>>>,
    /// The number of elements in the table.
    ///
    /// # Invariants
    ///
    /// - The `size` cannot exceed [`HeapTable::limit`].
    /// - The [`HeapTable::allocation`] must point to a valid `[Cell<E>; size]`.
    size: Cell<u32>,
    /// The maximum number of elements this table can have.
    limit: u32,
}

impl<E: NullableTableElement> HeapTable<E> {
    /// Creates an empty table with the specified [`maximum()`] number of elements.
    ///
    /// [`maximum()`]: crate::AnyTable::maximum()
    pub const fn with_maximum(maximum: u32) -> Self {
        Self {
            allocation: Cell::new(NonNull::dangling()),
            size: Cell::new(0),
            limit: maximum,
        }
    }

    /// Creates an empty table with no [`maximum()`] limit.
    ///
    /// [`maximum()`]: crate::AnyTable::maximum()
    pub const fn new() -> Self {
        Self::with_maximum(u32::MAX)
    }

    /// Allocates a table with the given minimum and maximum number of elements; the initial
    /// elements are [`E::NULL`].
    ///
    /// # Errors
    ///
    /// Returns an error if space for the `minimum` number of elements could not be allocated.
    ///
    /// [`E::NULL`]: NullableTableElement::NULL
    pub fn with_limits(minimum: u32, maximum: u32) -> Result<Self, crate::AllocationError> {
        let table = Self::with_maximum(maximum);
        table.try_grow(minimum)?;
        Ok(table)
    }

    /// Returns the [`size()`] of the table, in number of elements.
    ///
    /// [`size()`]: crate::AnyTable::size()
    #[allow(clippy::cast_possible_truncation)]
    pub fn len(&self) -> usize {
        // Won't fail, since `try_grow()` would catch an overflow.
        self.size.get() as usize
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.size.get() == 0
    }

    /// Attempts to increase the [`size()`] of the table by the given number of elements,
    /// returning the old number of elements. New elements are [`E::NULL`].
    ///
    /// # Errors
    ///
    /// Returns an error if space for the additional elements could not be allocated.
    ///
    /// [`size()`]: crate::AnyTable::size()
    /// [`E::NULL`]: NullableTableElement::NULL
    pub fn try_grow(&self, delta: u32) -> Result<u32, crate::AllocationError> {
        let old_size = self.size.get();
        if delta == 0 {
            return Ok(old_size);
        }

        let error = move || crate::AllocationError { size: delta };

        let new_size = match old_size.checked_add(delta) {
            Some(sum) if sum <= self.limit => sum,
            _ => return Err(error()),
        };

        // Table elements are references of one flavour or another, never ZSTs.
        debug_assert!(core::mem::size_of::<E>() > 0);

        let is_realloc = old_size != 0;
        let new_layout = usize::try_from(new_size)
            .ok()
            .and_then(|len| core::alloc::Layout::array::<Cell<E>>(len).ok())
            .ok_or_else(error)?;

        let pointer: *mut u8 = if is_realloc {
            let old_pointer = self.allocation.get().cast::<u8>().as_ptr();

            // SAFETY: `Ok` is returned since a previous call to `Layout::array()` returned `Ok`.
            #[allow(clippy::cast_possible_truncation)] // `old_size` is known to fit in an `usize`
            let old_layout = unsafe {
                core::alloc::Layout::array::<Cell<E>>(old_size as usize).unwrap_unchecked()
            };

            // SAFETY: `self.allocation` originates from the global allocator with `old_layout`.
            unsafe { alloc::alloc::realloc(old_pointer, old_layout, new_layout.size()) }
        } else {
            // SAFETY: `new_layout` size is guaranteed to be non-zero.
            unsafe { alloc::alloc::alloc(new_layout) }
        };

        let new_allocation = if let Some(allocation) = NonNull::new(pointer as *mut Cell<E>) {
            allocation
        } else {
            // `self.allocation` and `self.size` were not modified.
            return Err(error());
        };

        // Fill new elements with `E::NULL`.
        {
            // `Layout::array()` calculation ensures no overflow occurs.
            #[allow(clippy::cast_possible_truncation)]
            let mut full_elements = NonNull::slice_from_raw_parts(
                new_allocation.cast::<core::mem::MaybeUninit<Cell<E>>>(),
                new_size as usize,
            );

            // SAFETY: the allocation is not yet shared, so there is exclusive access to it.
            // SAFETY: `MaybeUninit<Cell<E>>` and `Cell<E>` have the same layout.
            let full_elements = unsafe { full_elements.as_mut() };

            // SAFETY: the range is in bounds, since `new_size > old_size`.
            let new_elements = unsafe { full_elements.get_unchecked_mut(old_size as usize..) };

            for uninit in new_elements.iter_mut() {
                uninit.write(Cell::new(E::NULL));
            }
        }

        self.allocation.set(new_allocation);
        self.size.set(new_size);
        Ok(old_size)
    }

    /// Returns a slice containing the table's elements.
    ///
    /// # Safety
    ///
    /// A reference to the returned slice must not exist when [`HeapTable::try_grow()`] is
    /// called.
    unsafe fn as_slice_of_cells(&self) -> &[Cell<E>] {
        let ptr = core::ptr::slice_from_raw_parts(self.allocation.get().as_ptr(), self.len());

        // SAFETY: slice lives for `self` as long as `try_grow()` isn't called.
        unsafe { &*ptr }
    }
}

impl<E: NullableTableElement> Default for HeapTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: NullableTableElement> crate::AnyTable for HeapTable<E> {
    fn size(&self) -> u32 {
        self.size.get()
    }

    fn grow(&self, delta: u32) -> u32 {
        self.try_grow(delta).unwrap_or(crate::GROW_FAILED)
    }

    fn maximum(&self) -> u32 {
        self.limit
    }
}

impl<E: NullableTableElement> crate::Table<E> for HeapTable<E> {
    fn get(&self, idx: u32) -> crate::BoundsCheck<E> {
        // SAFETY: no `try_grow()` calls in this method.
        let elements = unsafe { self.as_slice_of_cells() };

        elements
            .get(index_to_usize(idx)?)
            .map(Cell::get)
            .ok_or(crate::BoundsCheckError)
    }

    fn replace(&self, idx: u32, new: E) -> crate::BoundsCheck<E> {
        // SAFETY: no `try_grow()` calls in this method.
        let elements = unsafe { self.as_slice_of_cells() };

        Ok(elements
            .get(index_to_usize(idx)?)
            .ok_or(crate::BoundsCheckError)?
            .replace(new))
    }

    fn set(&self, idx: u32, elem: E) -> crate::BoundsCheck<()> {
        // SAFETY: no `try_grow()` calls in this method.
        let elements = unsafe { self.as_slice_of_cells() };

        elements
            .get(index_to_usize(idx)?)
            .ok_or(crate::BoundsCheckError)?
            .set(elem);

        Ok(())
    }

    fn as_mut_slice(&mut self) -> &mut [E] {
        let ptr =
            core::ptr::slice_from_raw_parts_mut(self.allocation.get_mut().as_ptr(), self.len());

        // SAFETY: `&mut self` ensures exclusive access.
        // SAFETY: allocation lives for `&self`.
        let cells: &mut Cell<[E]> = unsafe { &mut *(ptr as *mut Cell<[E]>) };

        cells.get_mut()
    }

    fn copy_from_slice(&self, idx: u32, src: &[E]) -> crate::BoundsCheck<()> {
        // SAFETY: no `try_grow()` calls in this method.
        let elements = unsafe { self.as_slice_of_cells() };

        let dst = elements
            .get(index_to_usize(idx)?..)
            .and_then(|slice| slice.get(..src.len()))
            .ok_or(crate::BoundsCheckError)?;

        for (d, s) in dst.iter().zip(src.iter().copied()) {
            d.set(s);
        }

        Ok(())
    }

    fn copy_into_slice(&self, idx: u32, dst: &mut [E]) -> crate::BoundsCheck<()> {
        // SAFETY: no `try_grow()` calls in this method.
        let elements = unsafe { self.as_slice_of_cells() };

        let src = elements
            .get(index_to_usize(idx)?..)
            .and_then(|slice| slice.get(..dst.len()))
            .ok_or(crate::BoundsCheckError)?;

        for (d, s) in dst.iter_mut().zip(src) {
            *d = s.get();
        }

        Ok(())
    }
}

impl<E: NullableTableElement> Drop for HeapTable<E> {
    fn drop(&mut self) {
        if !self.is_empty() {
            // SAFETY: `Ok` is returned since `try_grow()` already made this exact layout.
            let layout =
                unsafe { core::alloc::Layout::array::<Cell<E>>(self.len()).unwrap_unchecked() };

            // Elements are `Copy`, so deallocating without dropping them is fine.
            // SAFETY: `is_empty()` check ensures the pointer is to a valid allocation.
            unsafe {
                alloc::alloc::dealloc(self.allocation.get().cast::<u8>().as_ptr(), layout);
            }
        }
    }
}

impl<E: NullableTableElement> core::fmt::Debug for HeapTable<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut list = f.debug_list();

        // SAFETY: no `try_grow()` calls in this method.
        let elements = unsafe { self.as_slice_of_cells() };

        for cell in elements {
            list.entry(&cell.get());
        }

        list.finish()
    }
}

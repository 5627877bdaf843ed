//! Bounds-checked typed access to one mapped page.

use core::marker::PhantomData;
use core::ptr::NonNull;
use physmem_addresses::{PAGE_SIZE, PageOffset};

mod sealed {
    pub trait Sealed {}
}

/// Unsigned integer types that can be loaded from and stored into a page.
///
/// Values cross the tool boundary as `u64`; [`Scalar::truncate`] keeps the low
/// `BITS` bits and [`Scalar::widen`] zero-extends back.
pub trait Scalar: sealed::Sealed + Copy + Eq + core::fmt::Debug + core::fmt::LowerHex {
    const BITS: u32;

    fn truncate(value: u64) -> Self;
    fn widen(self) -> u64;
}

macro_rules! impl_scalar {
    ($($t:ty),*) => {$(
        impl sealed::Sealed for $t {}
        impl Scalar for $t {
            const BITS: u32 = <$t>::BITS;

            #[inline]
            #[allow(clippy::cast_possible_truncation)]
            fn truncate(value: u64) -> Self {
                value as $t
            }

            #[inline]
            #[allow(clippy::cast_lossless)]
            fn widen(self) -> u64 {
                self as u64
            }
        }
    )*};
}

impl_scalar!(u8, u16, u32, u64, usize);

/// Why an access into the window was refused.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("access of {len} bytes at page offset {offset:#x} exceeds the mapped page")]
    OutOfBounds { offset: u64, len: usize },
}

/// A mutable view of exactly one mapped page.
///
/// All offsets are validated against the page size before the memory is
/// touched; any alignment is accepted. Single loads and stores at naturally
/// aligned offsets are volatile, unaligned ones go through
/// `read_unaligned`/`write_unaligned`. Bulk transfers are one byte-wise
/// `memcpy` each.
pub struct PageWindow<'a> {
    base: NonNull<u8>,
    _borrow: PhantomData<&'a mut [u8; PAGE_SIZE]>,
}

impl PageWindow<'_> {
    /// # Safety
    /// `base` must be valid for reads and writes of [`PAGE_SIZE`] bytes for
    /// the lifetime of the window and not be accessed through other paths
    /// meanwhile.
    #[must_use]
    pub const unsafe fn from_raw(base: NonNull<u8>) -> Self {
        Self {
            base,
            _borrow: PhantomData,
        }
    }

    /// Process-virtual address of the first byte of the page.
    #[inline]
    #[must_use]
    pub fn base_ptr(&self) -> *const u8 {
        self.base.as_ptr()
    }

    /// Process-virtual address of `offset`, for reporting.
    #[inline]
    #[must_use]
    pub fn address_of(&self, offset: PageOffset) -> *const u8 {
        self.base.as_ptr().wrapping_add(offset.as_usize())
    }

    fn checked(&self, offset: PageOffset, len: usize) -> Result<NonNull<u8>, WindowError> {
        let start = offset.as_usize();
        if start.checked_add(len).is_none_or(|end| end > PAGE_SIZE) {
            return Err(WindowError::OutOfBounds {
                offset: offset.as_u64(),
                len,
            });
        }
        // SAFETY: start + len <= PAGE_SIZE, so the pointer stays inside the page.
        Ok(unsafe { self.base.add(start) })
    }

    /// Load one `T` at `offset`.
    ///
    /// # Errors
    /// [`WindowError`] if the value does not fit into the page.
    pub fn load<T: Scalar>(&self, offset: PageOffset) -> Result<T, WindowError> {
        let ptr = self.checked(offset, size_of::<T>())?.cast::<T>();
        // SAFETY: in bounds, see `checked`; alignment picks the read flavor.
        Ok(unsafe {
            if ptr.as_ptr().is_aligned() {
                ptr.read_volatile()
            } else {
                ptr.read_unaligned()
            }
        })
    }

    /// Store one `T` at `offset`.
    ///
    /// # Errors
    /// [`WindowError`] if the value does not fit into the page.
    pub fn store<T: Scalar>(&mut self, offset: PageOffset, value: T) -> Result<(), WindowError> {
        let ptr = self.checked(offset, size_of::<T>())?.cast::<T>();
        // SAFETY: in bounds, see `checked`; alignment picks the write flavor.
        unsafe {
            if ptr.as_ptr().is_aligned() {
                ptr.write_volatile(value);
            } else {
                ptr.write_unaligned(value);
            }
        }
        Ok(())
    }

    /// Copy `dst.len()` consecutive elements starting at `offset` out of the page.
    ///
    /// # Errors
    /// [`WindowError`] if the range leaves the page.
    pub fn read_into<T: Scalar>(&self, offset: PageOffset, dst: &mut [T]) -> Result<(), WindowError> {
        let len = size_of_val(dst);
        let ptr = self.checked(offset, len)?;
        // SAFETY: source range validated; `dst` is a distinct Rust allocation and
        // `Scalar` types are valid for any bit pattern.
        unsafe { core::ptr::copy_nonoverlapping(ptr.as_ptr(), dst.as_mut_ptr().cast::<u8>(), len) };
        Ok(())
    }

    /// Copy all of `src` into the page starting at `offset`.
    ///
    /// # Errors
    /// [`WindowError`] if the range leaves the page.
    pub fn write_from<T: Scalar>(&mut self, offset: PageOffset, src: &[T]) -> Result<(), WindowError> {
        let len = size_of_val(src);
        let ptr = self.checked(offset, len)?;
        // SAFETY: destination range validated; `src` is a distinct Rust allocation.
        unsafe { core::ptr::copy_nonoverlapping(src.as_ptr().cast::<u8>(), ptr.as_ptr(), len) };
        Ok(())
    }
}

use crate::{Granule, Offset, PhysicalAddress};
use core::fmt;
use core::marker::PhantomData;

/// Physical page base for size `S`.
///
/// A `PhysicalPage<S>` represents the **aligned base** of a physical granule
/// of size `S` (`S::SIZE` bytes). For [`Page4K`](crate::Page4K) this is the
/// file offset handed to `mmap` on the physical-memory device.
///
/// ### Invariants
/// - The low `S::SHIFT` bits of the base are always zero.
///
/// ### Examples
/// ```rust
/// # use physmem_addresses::*;
/// let pa = PhysicalAddress::new(0x0000_0008_1234_5678);
/// let pp = pa.page::<Page4K>();
/// assert_eq!(pp.base().as_u64(), 0x0000_0008_1234_5000);
/// let pa2 = pp.join(pa.offset::<Page4K>());
/// assert_eq!(pa2, pa);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalPage<S: Granule> {
    value: u64,
    _phantom: PhantomData<S>,
}

impl<S: Granule> PhysicalPage<S> {
    /// Page that contains `addr` (aligns down).
    #[inline]
    #[must_use]
    pub const fn containing(addr: PhysicalAddress) -> Self {
        Self {
            value: addr.as_u64() & !S::MASK,
            _phantom: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub const fn base(self) -> PhysicalAddress {
        PhysicalAddress::new(self.value)
    }

    /// Combine with an offset to form a full address.
    #[inline]
    #[must_use]
    pub const fn join(self, off: Offset<S>) -> PhysicalAddress {
        PhysicalAddress::new(self.value + off.as_u64())
    }
}

impl<S> fmt::Display for PhysicalPage<S>
where
    S: Granule,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}/{}", self.value, S::as_str())
    }
}

impl<S: Granule> fmt::Debug for PhysicalPage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysicalPage<{}>({:#018X})", S::as_str(), self.value)
    }
}

use crate::{Granule, Offset, PhysicalPage};
use core::fmt;

/// Physical memory address.
///
/// A thin wrapper around a raw `u64` that denotes **physical** addresses
/// (RAM / MMIO) as handed to the tools on the command line. It carries intent
/// so physical targets are never confused with pointers into the process.
///
/// ### Semantics
/// - Use [`PhysicalAddress::page`] / [`PhysicalAddress::offset`] / [`PhysicalAddress::split`]
///   to derive the page base and in-page offset for a concrete [`Granule`].
/// - Combine a [`PhysicalPage<S>`] with an [`Offset<S>`] using
///   [`PhysicalPage::join`] to reconstruct the original `PhysicalAddress`.
///
/// ### Examples
/// ```rust
/// # use physmem_addresses::*;
/// let pa = PhysicalAddress::new(0x0000_0010_2000_0042);
/// let (pp, off) = pa.split::<Page4K>();
/// assert_eq!(pp.base().as_u64() & (Page4K::SIZE - 1), 0);
/// assert_eq!(pp.join(off).as_u64(), pa.as_u64());
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalAddress(u64);

impl PhysicalAddress {
    #[inline]
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0)
    }

    #[inline]
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The granule of size `S` that contains this address (lower bits zeroed).
    #[inline]
    #[must_use]
    pub const fn page<S: Granule>(self) -> PhysicalPage<S> {
        PhysicalPage::containing(self)
    }

    /// The offset within the granule of size `S` that contains this address.
    #[inline]
    #[must_use]
    pub const fn offset<S: Granule>(self) -> Offset<S> {
        Offset::from_bits(self.0)
    }

    /// Split into (`PhysicalPage<S>`, `Offset<S>`).
    #[inline]
    #[must_use]
    pub const fn split<S: Granule>(self) -> (PhysicalPage<S>, Offset<S>) {
        (self.page::<S>(), self.offset::<S>())
    }
}

impl fmt::Debug for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PA(0x{:016X})", self.0)
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

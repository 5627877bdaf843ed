use crate::Granule;
use core::fmt;
use core::marker::PhantomData;
use core::ops::Add;

/// The offset within a granule of size `S` (`0..S::SIZE-1`).
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Offset<S: Granule> {
    value: u64,
    _phantom: PhantomData<S>,
}

impl<S: Granule> Offset<S> {
    /// Create from a raw value, asserting it is < `S::SIZE` in debug.
    #[inline]
    #[must_use]
    pub fn new(value: u64) -> Self {
        debug_assert!(value < S::SIZE, "offset must be < granule size");
        Self::from_bits(value)
    }

    /// Keep only the low `S::SHIFT` bits of `value`.
    #[inline]
    #[must_use]
    pub const fn from_bits(value: u64) -> Self {
        Self {
            value: value & S::MASK,
            _phantom: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.value
    }

    /// The offset as an index into a mapped region of `S::SIZE` bytes.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn as_usize(self) -> usize {
        // value < S::SIZE, which fits any supported usize
        self.value as usize
    }

    /// Align down to a smaller granule `G` while staying inside `S`.
    ///
    /// Used for the cache-line realignment of an in-page offset.
    #[inline]
    #[must_use]
    pub const fn align_down<G: Granule>(self) -> Self {
        Self::from_bits(self.value & !G::MASK)
    }
}

impl<S: Granule> fmt::Debug for Offset<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Offset<{}>({:#X})", S::as_str(), self.value)
    }
}

impl<S: Granule> fmt::Display for Offset<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.value)
    }
}

impl<S: Granule> fmt::LowerHex for Offset<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.value, f)
    }
}

impl<S: Granule> Add<u64> for Offset<S> {
    type Output = Self;

    /// Wraps within the granule.
    #[inline]
    fn add(self, rhs: u64) -> Self::Output {
        Self::from_bits(self.value.wrapping_add(rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CacheLine, Page4K};

    #[test]
    fn cache_line_realignment() {
        let off = Offset::<Page4K>::new(0x47F);
        assert_eq!(off.align_down::<CacheLine>().as_u64(), 0x440);
        assert_eq!(Offset::<Page4K>::new(0x40).align_down::<CacheLine>().as_u64(), 0x40);
    }

    #[test]
    fn addition_wraps_within_granule() {
        let off = Offset::<Page4K>::new(0xFF8);
        assert_eq!((off + 4).as_u64(), 0xFFC);
        assert_eq!((off + 8).as_u64(), 0);
    }
}

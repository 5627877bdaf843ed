use core::fmt;
use core::hash::Hash;

/// Sealed trait pattern to restrict `Granule` impls to our markers.
mod sealed {
    pub trait Sealed {}
}

/// Marker trait for the power-of-two units addresses get aligned to.
pub trait Granule:
    sealed::Sealed + Clone + Copy + Eq + PartialEq + Ord + PartialOrd + Hash + fmt::Display + fmt::Debug
{
    /// Granule size in bytes (power of two).
    const SIZE: u64;
    /// log2(SIZE), i.e., number of low bits used for the offset.
    const SHIFT: u32;
    /// Mask selecting the bits below the granule boundary.
    const MASK: u64 = Self::SIZE - 1;

    fn as_str() -> &'static str;
}

/// 4 KiB page (4096 bytes), the only mapping unit used by the tools.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Page4K;
impl sealed::Sealed for Page4K {}
impl Granule for Page4K {
    const SIZE: u64 = 4096;
    const SHIFT: u32 = 12;

    fn as_str() -> &'static str {
        "4K"
    }
}

/// 64-byte cache line, the bulk transfer unit.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CacheLine;
impl sealed::Sealed for CacheLine {}
impl Granule for CacheLine {
    const SIZE: u64 = 64;
    const SHIFT: u32 = 6;

    fn as_str() -> &'static str {
        "64B"
    }
}

impl fmt::Display for Page4K {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(Self::as_str())
    }
}

impl fmt::Display for CacheLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(Self::as_str())
    }
}

impl fmt::Debug for Page4K {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self, f)
    }
}

impl fmt::Debug for CacheLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_matches_size() {
        assert_eq!(1u64 << Page4K::SHIFT, Page4K::SIZE);
        assert_eq!(1u64 << CacheLine::SHIFT, CacheLine::SIZE);
        assert_eq!(Page4K::MASK, 0xFFF);
        assert_eq!(CacheLine::MASK, 0x3F);
    }
}

//! # Physical Address Types
//!
//! Strongly typed wrappers for the physical target addresses the tools act
//! upon, and for the page and cache-line arithmetic derived from them.
//!
//! ## Overview
//!
//! | Concept | Generic | Description |
//! |----------|----------|-------------|
//! | [`PhysicalAddress`] | – | A raw 64-bit physical address, not necessarily aligned. |
//! | [`PhysicalPage<S>`] | [`S: Granule`](Granule) | The aligned base of the granule of size `S` containing an address. |
//! | [`Offset<S>`] | [`S: Granule`](Granule) | An offset within a granule of size `S`. |
//!
//! ## Granules
//!
//! - [`Page4K`]: 4 KiB pages, the mapping unit
//! - [`CacheLine`]: 64-byte lines, the bulk transfer unit
//!
//! ## Typical Usage
//!
//! ```rust
//! # use physmem_addresses::*;
//! let target = PhysicalAddress::new(0x3F20_0047);
//!
//! // Split into the page to map and the in-page offset of the target
//! let (page, off) = target.split::<Page4K>();
//! assert_eq!(page.base().as_u64(), 0x3F20_0000);
//! assert_eq!(off.as_u64(), 0x47);
//!
//! // Cache-line accesses realign the in-page offset
//! assert_eq!(off.align_down::<CacheLine>().as_u64(), 0x40);
//! assert_eq!(page.join(off), target);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod granule;
mod offset;
mod physical_address;
mod physical_page;

pub use granule::{CacheLine, Granule, Page4K};
pub use offset::Offset;
pub use physical_address::PhysicalAddress;
pub use physical_page::PhysicalPage;

/// Offset of a byte inside the mapped page.
pub type PageOffset = Offset<Page4K>;

/// Size of the single page the tools ever map.
#[allow(clippy::cast_possible_truncation)]
pub const PAGE_SIZE: usize = Page4K::SIZE as usize;

/// Size of one cache line in bytes.
#[allow(clippy::cast_possible_truncation)]
pub const CACHE_LINE_SIZE: usize = CacheLine::SIZE as usize;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_join_4k() {
        let a = PhysicalAddress::new(0x1234_5678_9ABC_DEF0);
        let (p, o) = a.split::<Page4K>();
        assert_eq!(p.base().as_u64() & 0xFFF, 0);
        assert_eq!(o.as_u64(), a.as_u64() & 0xFFF);
        assert_eq!(p.join(o).as_u64(), a.as_u64());
    }

    #[test]
    fn split_cache_line() {
        let a = PhysicalAddress::new(0x0000_0008_1234_5678);
        let (p, o) = a.split::<CacheLine>();
        assert_eq!(p.base().as_u64(), 0x0000_0008_1234_5640);
        assert_eq!(o.as_u64(), 0x38);
        assert_eq!(p.join(o), a);
    }

    #[test]
    fn alignment_helpers() {
        let a = PhysicalAddress::new(0x12345);
        assert_eq!(a.page::<Page4K>().base().as_u64(), 0x12000);
        assert_eq!(a.offset::<Page4K>().as_u64(), 0x345);
        assert_eq!(a.page::<CacheLine>().base().as_u64(), 0x12340);
    }

    #[test]
    fn page_offset_is_address_mod_page_size() {
        for raw in [0u64, 0x100, 0xFFF, 0x1000, 0xDEAD_BEEF, u64::MAX] {
            let off: PageOffset = PhysicalAddress::new(raw).offset();
            assert_eq!(off.as_u64(), raw % Page4K::SIZE);
        }
    }
}

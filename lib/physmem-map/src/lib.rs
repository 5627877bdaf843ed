//! # Physical Page Mapping
//!
//! Acquires the single page the diagnostic tools operate on and hands out a
//! bounds-checked [`PageWindow`] into it.
//!
//! ## Backends
//!
//! | Mapper | Memory | Use |
//! |--------|--------|-----|
//! | [`DevMemMapper`] | a shared `mmap` of the physical-memory device | hardware bring-up |
//! | [`FakeMapper`] | a pattern-initialized heap page | tests and dry runs |
//! | [`Backend`] | either of the above, picked at startup | the command-line tools |
//!
//! ## Lifecycle
//!
//! ```rust
//! use physmem_addresses::PhysicalAddress;
//! use physmem_map::{FakeMapper, Mapper, PageMapping};
//!
//! let (mut mapping, offset) = FakeMapper.acquire(PhysicalAddress::new(0x100)).unwrap();
//! let value: u16 = mapping.window().load(offset).unwrap();
//! assert_eq!(value, 0x80);
//! mapping.release().unwrap();
//! ```
//!
//! [`PageMapping::release`] consumes the mapping, so it can run at most once.
//! A mapping that is dropped without being released is still torn down.

mod backend;
mod devmem;
mod error;
mod fake;
mod window;

pub use backend::{Backend, BackendMapping};
pub use devmem::{DEFAULT_DEVICE, DevMemMapper, DevMemMapping};
pub use error::{MapError, OsFailure};
pub use fake::{FakeMapper, FakeMapping};
pub use window::{PageWindow, Scalar, WindowError};

use physmem_addresses::{Page4K, PageOffset, PhysicalAddress, PhysicalPage};
use std::io;

/// Strategy that makes the page containing a physical address accessible.
pub trait Mapper {
    type Mapping: PageMapping;

    /// Map the page containing `target`.
    ///
    /// # Errors
    /// OS failures opening or mapping the backing memory.
    fn map(&self, target: PhysicalAddress) -> Result<Self::Mapping, MapError>;

    /// Map the page containing `target` and return the target's in-page offset.
    ///
    /// # Errors
    /// See [`Mapper::map`].
    fn acquire(&self, target: PhysicalAddress) -> Result<(Self::Mapping, PageOffset), MapError> {
        let mapping = self.map(target)?;
        Ok((mapping, target.offset()))
    }
}

/// One mapped page.
pub trait PageMapping {
    /// The physical page this mapping covers.
    fn page(&self) -> PhysicalPage<Page4K>;

    /// Borrow the page for typed access.
    fn window(&mut self) -> PageWindow<'_>;

    /// Write the operator-facing confirmation of the mapping.
    ///
    /// # Errors
    /// Errors writing to `out`.
    fn announce(&self, out: &mut dyn io::Write) -> io::Result<()>;

    /// Tear the mapping down.
    ///
    /// # Errors
    /// The OS refused to unmap the page.
    fn release(self) -> Result<(), MapError>
    where
        Self: Sized;
}

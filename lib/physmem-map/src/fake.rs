//! Test backend: a heap page standing in for physical memory.

use crate::{MapError, Mapper, PageMapping, PageWindow};
use core::ptr::NonNull;
use physmem_addresses::{PAGE_SIZE, Page4K, PhysicalAddress, PhysicalPage};
use std::io;

#[repr(C, align(64))]
struct FakePage([u8; PAGE_SIZE]);

/// Hands out freshly allocated pages instead of touching hardware.
///
/// Every page is initialized with an ascending 16-bit pattern: the `i`-th
/// two-byte slot holds `i` in native byte order, so reads produce predictable
/// and non-zero values.
#[derive(Debug, Default, Clone, Copy)]
pub struct FakeMapper;

impl Mapper for FakeMapper {
    type Mapping = FakeMapping;

    fn map(&self, target: PhysicalAddress) -> Result<Self::Mapping, MapError> {
        let mut memory = Box::new(FakePage([0; PAGE_SIZE]));
        for (i, slot) in (0u16..).zip(memory.0.chunks_exact_mut(2)) {
            slot.copy_from_slice(&i.to_ne_bytes());
        }
        let page = target.page::<Page4K>();
        log::debug!("fake page {page} allocated at {:p}", memory.0.as_ptr());
        Ok(FakeMapping { page, memory })
    }
}

/// A heap page posing as the mapped physical page.
pub struct FakeMapping {
    page: PhysicalPage<Page4K>,
    memory: Box<FakePage>,
}

impl PageMapping for FakeMapping {
    fn page(&self) -> PhysicalPage<Page4K> {
        self.page
    }

    fn window(&mut self) -> PageWindow<'_> {
        let base = NonNull::from(&mut self.memory.0).cast::<u8>();
        // SAFETY: 64-byte aligned PAGE_SIZE heap buffer, exclusively borrowed.
        unsafe { PageWindow::from_raw(base) }
    }

    fn announce(&self, out: &mut dyn io::Write) -> io::Result<()> {
        writeln!(out, "TEST mode: use fake memory")
    }

    fn release(self) -> Result<(), MapError> {
        log::debug!("fake page {} released", self.page);
        Ok(())
    }
}

impl core::fmt::Debug for FakeMapping {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FakeMapping")
            .field("page", &self.page)
            .field("base", &self.memory.0.as_ptr())
            .finish()
    }
}

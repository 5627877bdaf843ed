use crate::{DevMemMapper, DevMemMapping, FakeMapper, FakeMapping, MapError, Mapper, PageMapping, PageWindow};
use physmem_addresses::{Page4K, PhysicalAddress, PhysicalPage};
use std::io;

/// Mapping strategy selected at startup.
#[derive(Debug, Clone)]
pub enum Backend {
    DevMem(DevMemMapper),
    Fake(FakeMapper),
}

impl Backend {
    #[must_use]
    pub const fn is_fake(&self) -> bool {
        matches!(self, Self::Fake(_))
    }
}

impl Mapper for Backend {
    type Mapping = BackendMapping;

    fn map(&self, target: PhysicalAddress) -> Result<Self::Mapping, MapError> {
        match self {
            Self::DevMem(m) => m.map(target).map(BackendMapping::DevMem),
            Self::Fake(m) => m.map(target).map(BackendMapping::Fake),
        }
    }
}

/// Mapping produced by a [`Backend`].
#[derive(Debug)]
pub enum BackendMapping {
    DevMem(DevMemMapping),
    Fake(FakeMapping),
}

impl PageMapping for BackendMapping {
    fn page(&self) -> PhysicalPage<Page4K> {
        match self {
            Self::DevMem(m) => m.page(),
            Self::Fake(m) => m.page(),
        }
    }

    fn window(&mut self) -> PageWindow<'_> {
        match self {
            Self::DevMem(m) => m.window(),
            Self::Fake(m) => m.window(),
        }
    }

    fn announce(&self, out: &mut dyn io::Write) -> io::Result<()> {
        match self {
            Self::DevMem(m) => m.announce(out),
            Self::Fake(m) => m.announce(out),
        }
    }

    fn release(self) -> Result<(), MapError> {
        match self {
            Self::DevMem(m) => m.release(),
            Self::Fake(m) => m.release(),
        }
    }
}

//! Production backend: one page of the physical-memory device.

use crate::{MapError, Mapper, OsFailure, PageMapping, PageWindow};
use core::ptr::NonNull;
use physmem_addresses::{PAGE_SIZE, Page4K, PhysicalAddress, PhysicalPage};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// Default physical-memory device on Linux.
pub const DEFAULT_DEVICE: &str = "/dev/mem";

/// Maps pages of a physical-memory device (normally `/dev/mem`).
#[derive(Debug, Clone)]
pub struct DevMemMapper {
    path: PathBuf,
}

impl DevMemMapper {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for DevMemMapper {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE)
    }
}

impl Mapper for DevMemMapper {
    type Mapping = DevMemMapping;

    fn map(&self, target: PhysicalAddress) -> Result<Self::Mapping, MapError> {
        let page = target.page::<Page4K>();
        let device_offset = libc::off_t::try_from(page.base().as_u64())
            .map_err(|_| MapError::AddressOutOfRange(target))?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(&self.path)
            .map_err(|e| MapError::OpenFailed {
                path: self.path.clone(),
                failure: OsFailure::new(e),
            })?;
        log::debug!("{} opened for {target}", self.path.display());

        // SAFETY: a fresh shared mapping of one page; the kernel picks the address.
        let ptr = unsafe {
            libc::mmap(
                core::ptr::null_mut(),
                PAGE_SIZE,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                device_offset,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(MapError::MapFailed {
                page,
                failure: OsFailure::last_os_error(),
            });
        }
        let Some(base) = NonNull::new(ptr.cast::<u8>()) else {
            return Err(MapError::MapFailed {
                page,
                failure: OsFailure::new(io::Error::from(io::ErrorKind::AddrNotAvailable)),
            });
        };
        log::debug!("page {page} mapped at {base:p}");

        Ok(DevMemMapping {
            page,
            path: self.path.clone(),
            _file: file,
            base,
            mapped: true,
        })
    }
}

/// One page of the device mapped into this process.
///
/// The device handle stays open for as long as the mapping lives and is closed
/// when the mapping is dropped.
#[derive(Debug)]
pub struct DevMemMapping {
    page: PhysicalPage<Page4K>,
    path: PathBuf,
    _file: File,
    base: NonNull<u8>,
    mapped: bool,
}

impl DevMemMapping {
    fn unmap(&mut self) -> Result<(), MapError> {
        if !self.mapped {
            return Ok(());
        }
        self.mapped = false;

        // SAFETY: `base` came from a successful mmap of PAGE_SIZE bytes and is
        // unmapped at most once.
        if unsafe { libc::munmap(self.base.as_ptr().cast(), PAGE_SIZE) } == -1 {
            return Err(MapError::UnmapFailed {
                page: self.page,
                failure: OsFailure::last_os_error(),
            });
        }
        log::debug!("page {} unmapped", self.page);
        Ok(())
    }
}

impl PageMapping for DevMemMapping {
    fn page(&self) -> PhysicalPage<Page4K> {
        self.page
    }

    fn window(&mut self) -> PageWindow<'_> {
        // SAFETY: page-aligned, PAGE_SIZE bytes, read/write, exclusively borrowed.
        unsafe { PageWindow::from_raw(self.base) }
    }

    fn announce(&self, out: &mut dyn io::Write) -> io::Result<()> {
        writeln!(out, "{} opened.", self.path.display())?;
        writeln!(out, "Memory mapped at address {:p}.", self.base)
    }

    fn release(mut self) -> Result<(), MapError> {
        self.unmap()
    }
}

impl Drop for DevMemMapping {
    fn drop(&mut self) {
        if let Err(e) = self.unmap() {
            log::error!("{e}");
        }
    }
}

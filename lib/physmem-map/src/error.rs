use core::fmt;
use core::panic::Location;
use physmem_addresses::{Page4K, PhysicalAddress, PhysicalPage};
use std::io;
use std::path::PathBuf;

/// An OS call that failed, together with the place in this crate that issued it.
#[derive(Debug)]
pub struct OsFailure {
    location: &'static Location<'static>,
    source: io::Error,
}

impl OsFailure {
    /// Wrap `source`, recording the caller as the originating call site.
    #[track_caller]
    #[must_use]
    pub fn new(source: io::Error) -> Self {
        Self {
            location: Location::caller(),
            source,
        }
    }

    /// Capture `errno` right after a failed libc call.
    #[track_caller]
    #[must_use]
    pub fn last_os_error() -> Self {
        Self::new(io::Error::last_os_error())
    }

    #[must_use]
    pub const fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// The raw OS error number, or `0` if the error did not come from the OS.
    #[must_use]
    pub fn errno(&self) -> i32 {
        self.source.raw_os_error().unwrap_or(0)
    }
}

impl fmt::Display for OsFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error at line {}, file {} ({}) [{}]",
            self.location.line(),
            self.location.file(),
            self.errno(),
            self.source
        )
    }
}

impl core::error::Error for OsFailure {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Failure to acquire or release the page mapping. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("{failure}: cannot open {}", .path.display())]
    OpenFailed { path: PathBuf, failure: OsFailure },
    #[error("{failure}: cannot map page {page}")]
    MapFailed {
        page: PhysicalPage<Page4K>,
        failure: OsFailure,
    },
    #[error("{failure}: cannot unmap page {page}")]
    UnmapFailed {
        page: PhysicalPage<Page4K>,
        failure: OsFailure,
    },
    #[error("physical address {0} cannot be expressed as a device offset")]
    AddressOutOfRange(PhysicalAddress),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_call_site_and_errno() {
        let failure = OsFailure::new(io::Error::from_raw_os_error(libc::EACCES));
        let line = line!() - 1;
        let text = failure.to_string();
        assert!(text.starts_with(&format!("Error at line {line}, file ")), "{text}");
        assert!(text.contains("error.rs"), "{text}");
        assert!(text.contains(&format!("({})", libc::EACCES)), "{text}");
        assert_eq!(failure.errno(), libc::EACCES);
    }
}

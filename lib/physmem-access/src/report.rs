//! What an access produced, rendered as operator text.

use crate::AccessWidth;
use core::fmt;
use physmem_addresses::{PageOffset, PhysicalAddress};

/// One value loaded from the page.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Sample {
    pub physical: PhysicalAddress,
    /// Process-virtual address the value was loaded from.
    pub virt: usize,
    pub value: u64,
}

/// Outcome of writing one element and reading it straight back.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Readback {
    pub physical: PhysicalAddress,
    pub virt: usize,
    /// The value as stored, i.e. truncated to the access width.
    pub written: u64,
    pub readback: u64,
}

impl Readback {
    #[must_use]
    pub const fn matches(&self) -> bool {
        self.written == self.readback
    }
}

/// An element whose readback differs from what was expected.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub physical: PhysicalAddress,
    pub offset: PageOffset,
    pub virt: usize,
    pub expected: u64,
    pub actual: u64,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mismatch at address {:#x} ({:#x}): expected {:#x}, read {:#x}",
            self.physical, self.virt, self.expected, self.actual
        )
    }
}

/// Result of a chunked multi-word write and its verification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSummary {
    pub start: PhysicalAddress,
    pub count: usize,
    pub chunks: usize,
    pub mismatches: Vec<Mismatch>,
}

/// Everything a single [`access`](crate::access) produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessReport {
    pub width: AccessWidth,
    pub target: PhysicalAddress,
    pub reads: Vec<Sample>,
    pub writes: Vec<Readback>,
    pub bulk: Option<BulkSummary>,
}

impl AccessReport {
    #[must_use]
    pub const fn new(width: AccessWidth, target: PhysicalAddress) -> Self {
        Self {
            width,
            target,
            reads: Vec::new(),
            writes: Vec::new(),
            bulk: None,
        }
    }

    /// Number of elements whose readback did not match.
    #[must_use]
    pub fn mismatch_count(&self) -> usize {
        let single = self.writes.iter().filter(|w| !w.matches()).count();
        let bulk = self.bulk.as_ref().map_or(0, |b| b.mismatches.len());
        single + bulk
    }
}

impl fmt::Display for AccessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sample in &self.reads {
            writeln!(
                f,
                "Value at address {:#x} ({:#x}): {:#x}",
                sample.physical, sample.virt, sample.value
            )?;
        }

        for write in &self.writes {
            if self.width == AccessWidth::CacheLine {
                write!(
                    f,
                    "Value at address {:#x} ({:#x}): Written {:#x} readback {:#x}",
                    write.physical, write.virt, write.written, write.readback
                )?;
            } else {
                write!(f, "Written {:#x}; readback {:#x}", write.written, write.readback)?;
            }
            if write.matches() {
                writeln!(f)?;
            } else {
                writeln!(f, ", mismatch")?;
            }
        }

        if let Some(bulk) = &self.bulk {
            writeln!(
                f,
                "Written {} words from {:#x} in {} chunks",
                bulk.count, bulk.start, bulk.chunks
            )?;
            for mismatch in &bulk.mismatches {
                writeln!(f, "{mismatch}")?;
            }
            writeln!(
                f,
                "Readback of {} words: {} mismatches",
                bulk.count,
                bulk.mismatches.len()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_single_write() {
        let mut report = AccessReport::new(AccessWidth::HalfWord, PhysicalAddress::new(0x40));
        report.reads.push(Sample {
            physical: PhysicalAddress::new(0x40),
            virt: 0x7000_0040,
            value: 0x20,
        });
        report.writes.push(Readback {
            physical: PhysicalAddress::new(0x40),
            virt: 0x7000_0040,
            written: 0xBEEF,
            readback: 0xBEEF,
        });
        assert_eq!(
            report.to_string(),
            "Value at address 0x40 (0x70000040): 0x20\nWritten 0xbeef; readback 0xbeef\n"
        );
        assert_eq!(report.mismatch_count(), 0);
    }

    #[test]
    fn flags_mismatches() {
        let mut report = AccessReport::new(AccessWidth::CacheLine, PhysicalAddress::new(0x80));
        report.writes.push(Readback {
            physical: PhysicalAddress::new(0x88),
            virt: 0x1088,
            written: 1,
            readback: 2,
        });
        assert_eq!(
            report.to_string(),
            "Value at address 0x88 (0x1088): Written 0x1 readback 0x2, mismatch\n"
        );
        assert_eq!(report.mismatch_count(), 1);
    }
}

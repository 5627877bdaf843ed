//! Whole-page tests run by the `memtest` tool.

use crate::report::Mismatch;
use core::fmt;
use physmem_addresses::{CACHE_LINE_SIZE, PAGE_SIZE, Page4K, PageOffset, PhysicalPage};
use physmem_map::{PageWindow, Scalar, WindowError};

/// 32-bit lanes per cache line.
const LANES: usize = CACHE_LINE_SIZE / size_of::<u32>();

#[allow(clippy::cast_possible_truncation)]
const LINES: u64 = (PAGE_SIZE / CACHE_LINE_SIZE) as u64;

/// A test selectable by numeric id.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PageTest {
    /// Fill the page with ascending 32-bit values and verify it.
    Fill,
    /// Dump the page.
    Read,
}

impl PageTest {
    pub const ALL: [Self; 2] = [Self::Fill, Self::Read];

    #[must_use]
    pub fn from_id(id: u64) -> Option<Self> {
        usize::try_from(id).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fill => "fill-4k",
            Self::Read => "read-4k",
        }
    }
}

impl fmt::Display for PageTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn line_offsets() -> impl Iterator<Item = PageOffset> {
    (0..LINES).map(|i| PageOffset::new(i * CACHE_LINE_SIZE as u64))
}

fn ascending_line(first: u32) -> [u32; LANES] {
    core::array::from_fn(|i| first.wrapping_add(u32::try_from(i).unwrap_or(u32::MAX)))
}

/// Write ascending 32-bit values over the whole page, one line per transfer.
///
/// `on_line` runs before each line is written and may abort the fill.
/// Returns the value following the last one written.
///
/// # Errors
/// Whatever `on_line` returns, or a window refusal, which a full page never
/// produces.
#[allow(clippy::cast_possible_truncation)]
pub fn fill_page<E: From<WindowError>>(
    window: &mut PageWindow<'_>,
    first: u32,
    mut on_line: impl FnMut(PageOffset) -> Result<(), E>,
) -> Result<u32, E> {
    let mut next = first;
    for offset in line_offsets() {
        on_line(offset)?;
        window.write_from(offset, &ascending_line(next))?;
        next = next.wrapping_add(LANES as u32);
    }
    Ok(next)
}

/// Compare the whole page against what [`fill_page`] wrote, line by line.
///
/// # Errors
/// Only if the window refuses a line, which a full page never does.
#[allow(clippy::cast_possible_truncation)]
pub fn verify_page(
    window: &PageWindow<'_>,
    page: PhysicalPage<Page4K>,
    first: u32,
) -> Result<Vec<Mismatch>, WindowError> {
    let mut mismatches = Vec::new();
    let mut next = first;
    for line in line_offsets() {
        let expected = ascending_line(next);
        let mut readback = [0u32; LANES];
        window.read_into(line, &mut readback)?;

        for (lane, (&e, &a)) in expected.iter().zip(readback.iter()).enumerate() {
            if e != a {
                let offset = line + (lane * size_of::<u32>()) as u64;
                mismatches.push(Mismatch {
                    physical: page.join(offset),
                    offset,
                    virt: window.address_of(offset).addr(),
                    expected: e.widen(),
                    actual: a.widen(),
                });
            }
        }
        next = next.wrapping_add(LANES as u32);
    }
    Ok(mismatches)
}

/// Four 32-bit values of a page dump.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DumpRow {
    pub offset: PageOffset,
    pub values: [u32; 4],
}

impl fmt::Display for DumpRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.values;
        write!(
            f,
            "{:08x}: 0x{a:08x} 0x{b:08x} 0x{c:08x} 0x{d:08x}",
            self.offset.as_u64()
        )
    }
}

/// Read the page one cache line at a time, split into rows of four values.
///
/// # Errors
/// Only if the window refuses a line, which a full page never does.
pub fn dump_page(window: &PageWindow<'_>) -> Result<Vec<DumpRow>, WindowError> {
    let mut rows = Vec::with_capacity(PAGE_SIZE / 16);
    for line in line_offsets() {
        let mut words = [0u32; LANES];
        window.read_into(line, &mut words)?;
        for (row, chunk) in (0u64..).zip(words.chunks_exact(4)) {
            rows.push(DumpRow {
                offset: line + row * 16,
                values: [chunk[0], chunk[1], chunk[2], chunk[3]],
            });
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use physmem_addresses::PhysicalAddress;
    use physmem_map::{FakeMapper, Mapper, PageMapping};

    #[test]
    fn ids_select_tests() {
        assert_eq!(PageTest::from_id(0), Some(PageTest::Fill));
        assert_eq!(PageTest::from_id(1), Some(PageTest::Read));
        assert_eq!(PageTest::from_id(2), None);
        assert_eq!(PageTest::Fill.to_string(), "fill-4k");
    }

    #[test]
    fn fill_then_verify_is_clean() {
        let target = PhysicalAddress::new(0x4000_1234);
        let mut mapping = FakeMapper.map(target).unwrap();
        let mut window = mapping.window();

        let mut lines = Vec::new();
        let next = fill_page::<WindowError>(&mut window, 5, |line| {
            lines.push(line.as_u64());
            Ok(())
        })
        .unwrap();
        assert_eq!(next, 5 + 1024);
        assert_eq!(lines.len(), 64);
        assert_eq!(lines[1], 0x40);
        assert_eq!(lines[63], 0xFC0);
        assert_eq!(window.load::<u32>(PageOffset::new(0)).unwrap(), 5);
        assert_eq!(window.load::<u32>(PageOffset::new(0xFFC)).unwrap(), 5 + 1023);

        let mismatches = verify_page(&window, target.page(), 5).unwrap();
        assert!(mismatches.is_empty());
    }

    #[test]
    fn verify_reports_every_mismatch() {
        let target = PhysicalAddress::new(0x4000_0000);
        let mut mapping = FakeMapper.map(target).unwrap();
        let mut window = mapping.window();
        fill_page::<WindowError>(&mut window, 0, |_| Ok(())).unwrap();
        window.store(PageOffset::new(0x44), 0xFFFF_FFFFu32).unwrap();
        window.store(PageOffset::new(0xF00), 0u32).unwrap();

        let mismatches = verify_page(&window, target.page(), 0).unwrap();
        assert_eq!(mismatches.len(), 2);
        assert_eq!(mismatches[0].physical.as_u64(), 0x4000_0044);
        assert_eq!(mismatches[0].expected, 0x11);
        assert_eq!(mismatches[0].actual, 0xFFFF_FFFF);
        assert_eq!(mismatches[1].offset.as_u64(), 0xF00);
        assert_eq!(mismatches[1].expected, 0x3C0);
        mapping.release().unwrap();
    }

    #[test]
    fn fill_stops_when_progress_fails() {
        let mut mapping = FakeMapper.map(PhysicalAddress::zero()).unwrap();
        let mut window = mapping.window();
        let result = fill_page(&mut window, 0xAAAA, |line| {
            if line.as_u64() == 0x80 {
                Err(WindowError::OutOfBounds { offset: 0x80, len: 0 })
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
        assert_eq!(window.load::<u32>(PageOffset::new(0x40)).unwrap(), 0xAAAA + 16);
        // the line after the failure keeps the fake pattern
        assert_ne!(window.load::<u32>(PageOffset::new(0x80)).unwrap(), 0xAAAA + 32);
    }

    #[test]
    fn dump_covers_page() {
        let mut mapping = FakeMapper.map(PhysicalAddress::zero()).unwrap();
        let rows = dump_page(&mapping.window()).unwrap();
        assert_eq!(rows.len(), 256);
        assert_eq!(rows[1].offset.as_u64(), 0x10);
        if cfg!(target_endian = "little") {
            assert_eq!(rows[0].to_string(), "00000000: 0x00010000 0x00030002 0x00050004 0x00070006");
        }
        assert_eq!(rows[255].offset.as_u64(), 0xFF0);
    }
}

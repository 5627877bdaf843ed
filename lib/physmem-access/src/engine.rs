//! The typed access engine.
//!
//! Every operation first reads the target at the requested width and then,
//! if asked to, writes and verifies:
//!
//! | Width | Effective offset | Read | Write |
//! |-------|------------------|------|-------|
//! | `b`/`h`/`w` | in-page offset of the target | one volatile load | volatile store, then load back |
//! | `c` | in-page offset aligned down to 64 bytes | one 64-byte copy | synthesized line, one 64-byte copy, copy back |
//!
//! [`Operation::WriteMultiple`] streams an ascending sequence of native words
//! through a [`TransferBuffer`] and re-reads the whole extent chunk by chunk.
//! Mismatches never abort a scan; all of them end up in the [`AccessReport`].

use crate::report::{AccessReport, BulkSummary, Mismatch, Readback, Sample};
use crate::{AccessWidth, TransferBuffer};
use physmem_addresses::{CACHE_LINE_SIZE, CacheLine, PAGE_SIZE, Page4K, PageOffset, PhysicalAddress, PhysicalPage};
use physmem_map::{PageWindow, Scalar, WindowError};

/// Native words per cache line.
pub const WORDS_PER_LINE: usize = AccessWidth::CacheLine.bytes() / AccessWidth::Word.bytes();

/// What to do at the target.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operation {
    Read,
    /// Store the value (truncated to the width) and read it back.
    WriteAndVerify(u64),
    /// Store `value, value + 1, …` into `count` consecutive native words.
    WriteMultiple { value: u64, count: usize },
}

/// Fatal access failures. Readback mismatches are not errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error("multi-word writes need word access, not {0} access")]
    BulkRequiresWord(AccessWidth),
    #[error("word count must be at least 1")]
    ZeroCount,
    #[error("{count} words from page offset {offset:#x} do not fit into the mapped page")]
    ExtentTooLarge { offset: u64, count: usize },
}

/// Where an access lands: the mapped page, and the window into it.
struct Site<'w, 'a> {
    window: &'w mut PageWindow<'a>,
    page: PhysicalPage<Page4K>,
}

impl Site<'_, '_> {
    fn physical(&self, offset: PageOffset) -> PhysicalAddress {
        self.page.join(offset)
    }

    fn virt(&self, offset: PageOffset) -> usize {
        self.window.address_of(offset).addr()
    }

    fn sample(&self, offset: PageOffset, value: u64) -> Sample {
        Sample {
            physical: self.physical(offset),
            virt: self.virt(offset),
            value,
        }
    }

    fn readback(&self, offset: PageOffset, written: u64, readback: u64) -> Readback {
        Readback {
            physical: self.physical(offset),
            virt: self.virt(offset),
            written,
            readback,
        }
    }
}

/// Run `op` against the page seen through `window`.
///
/// `target` is the full physical address given by the operator; only its
/// in-page offset selects the location inside `window`.
///
/// # Errors
/// Accesses that do not fit the page, and malformed multi-word requests. These are detected before anything is written.
pub fn access(
    window: &mut PageWindow<'_>,
    target: PhysicalAddress,
    width: AccessWidth,
    op: Operation,
) -> Result<AccessReport, AccessError> {
    let (page, offset) = target.split::<Page4K>();
    if let Operation::WriteMultiple { count, .. } = op {
        check_extent(width, offset, count)?;
    }
    log::debug!("{width} access at {target} (page {page}, offset {offset}): {op:?}");

    let mut site = Site { window, page };
    let mut report = AccessReport::new(width, target);

    match width {
        AccessWidth::Byte => report.reads.push(read_one::<u8>(&site, offset)?),
        AccessWidth::HalfWord => report.reads.push(read_one::<u16>(&site, offset)?),
        AccessWidth::Word => report.reads.push(read_one::<usize>(&site, offset)?),
        AccessWidth::CacheLine => report.reads.extend(read_line(&site, line_offset(offset))?),
    }

    match (op, width) {
        (Operation::Read, _) => {}
        (Operation::WriteAndVerify(value), AccessWidth::Byte) => {
            report.writes.push(write_one::<u8>(&mut site, offset, value)?);
        }
        (Operation::WriteAndVerify(value), AccessWidth::HalfWord) => {
            report.writes.push(write_one::<u16>(&mut site, offset, value)?);
        }
        (Operation::WriteAndVerify(value), AccessWidth::Word) => {
            report.writes.push(write_one::<usize>(&mut site, offset, value)?);
        }
        (Operation::WriteAndVerify(value), AccessWidth::CacheLine) => {
            report.writes.extend(write_line(&mut site, line_offset(offset), value)?);
        }
        (Operation::WriteMultiple { value, count }, _) => {
            report.bulk = Some(write_multiple(&mut site, offset, value, count)?);
        }
    }

    if report.mismatch_count() > 0 {
        log::warn!("{} readback mismatches at {target}", report.mismatch_count());
    }
    Ok(report)
}

/// Cache-line accesses realign the *in-page* offset, not the full target.
#[must_use]
pub const fn line_offset(offset: PageOffset) -> PageOffset {
    offset.align_down::<CacheLine>()
}

fn check_extent(width: AccessWidth, offset: PageOffset, count: usize) -> Result<(), AccessError> {
    if width != AccessWidth::Word {
        return Err(AccessError::BulkRequiresWord(width));
    }
    if count == 0 {
        return Err(AccessError::ZeroCount);
    }
    let fits = count
        .checked_mul(width.bytes())
        .and_then(|len| len.checked_add(offset.as_usize()))
        .is_some_and(|end| end <= PAGE_SIZE);
    if !fits {
        return Err(AccessError::ExtentTooLarge {
            offset: offset.as_u64(),
            count,
        });
    }
    Ok(())
}

fn read_one<T: Scalar>(site: &Site<'_, '_>, offset: PageOffset) -> Result<Sample, AccessError> {
    let value = site.window.load::<T>(offset)?;
    Ok(site.sample(offset, value.widen()))
}

fn write_one<T: Scalar>(site: &mut Site<'_, '_>, offset: PageOffset, value: u64) -> Result<Readback, AccessError> {
    let written = T::truncate(value);
    site.window.store(offset, written)?;
    let readback = site.window.load::<T>(offset)?;
    Ok(site.readback(offset, written.widen(), readback.widen()))
}

fn read_line(site: &Site<'_, '_>, line: PageOffset) -> Result<Vec<Sample>, AccessError> {
    let mut words = [0usize; WORDS_PER_LINE];
    site.window.read_into(line, &mut words)?;
    Ok(words
        .iter()
        .zip(word_offsets(line))
        .map(|(&word, offset)| site.sample(offset, word.widen()))
        .collect())
}

fn write_line(site: &mut Site<'_, '_>, line: PageOffset, value: u64) -> Result<Vec<Readback>, AccessError> {
    let written = synthesize_line(value);
    site.window.write_from(line, &written)?;

    let mut readback = [0usize; WORDS_PER_LINE];
    site.window.read_into(line, &mut readback)?;

    Ok(written
        .iter()
        .zip(readback.iter())
        .zip(word_offsets(line))
        .map(|((&w, &r), offset)| site.readback(offset, w.widen(), r.widen()))
        .collect())
}

fn word_offsets(start: PageOffset) -> impl Iterator<Item = PageOffset> {
    (0u64..).map(move |i| start + i * AccessWidth::WORD_SIZE as u64)
}

/// Fill one cache line with `value, value + 1, …`.
///
/// The lanes use the narrowest of `u16`, `u32` and the native word that holds
/// `value` unchanged; the line is returned reinterpreted as native words.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn synthesize_line(value: u64) -> [usize; WORDS_PER_LINE] {
    let mut bytes = [0u8; CACHE_LINE_SIZE];
    if let Ok(v) = u16::try_from(value) {
        fill_lanes(&mut bytes, |i| v.wrapping_add(i as u16).to_ne_bytes());
    } else if let Ok(v) = u32::try_from(value) {
        fill_lanes(&mut bytes, |i| v.wrapping_add(i as u32).to_ne_bytes());
    } else {
        let v = value as usize;
        fill_lanes(&mut bytes, |i| v.wrapping_add(i).to_ne_bytes());
    }

    core::array::from_fn(|i| {
        let mut word = [0u8; AccessWidth::WORD_SIZE];
        word.copy_from_slice(&bytes[i * AccessWidth::WORD_SIZE..(i + 1) * AccessWidth::WORD_SIZE]);
        usize::from_ne_bytes(word)
    })
}

fn fill_lanes<const N: usize>(bytes: &mut [u8; CACHE_LINE_SIZE], lane: impl Fn(usize) -> [u8; N]) {
    for (i, chunk) in bytes.chunks_exact_mut(N).enumerate() {
        chunk.copy_from_slice(&lane(i));
    }
}

/// Expected content of the `index`-th word of a multi-word write.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn sequence_word(value: u64, index: usize) -> usize {
    (value as usize).wrapping_add(index)
}

fn write_multiple(
    site: &mut Site<'_, '_>,
    start: PageOffset,
    value: u64,
    count: usize,
) -> Result<BulkSummary, AccessError> {
    let mut buffer = TransferBuffer::new();
    let mut words = (0..count).map(|index| sequence_word(value, index));
    let mut dst = start;
    let mut chunks = 0;

    while buffer.stage(&mut words) > 0 {
        let bytes = buffer.flush_to(&mut *site.window, dst)?;
        log::trace!("flushed {bytes} bytes to page offset {dst}");
        dst = dst + bytes as u64;
        chunks += 1;
    }

    Ok(BulkSummary {
        start: site.physical(start),
        count,
        chunks,
        mismatches: verify_words(site.window, site.page, start, value, count)?,
    })
}

/// Re-read `count` native words from `start` in transfer-buffer sized chunks
/// and compare the `i`-th one with [`sequence_word`]`(value, i)`.
///
/// Every differing word is reported; a mismatch never ends the scan.
///
/// # Errors
/// The extent does not fit into the page.
pub fn verify_words(
    window: &PageWindow<'_>,
    page: PhysicalPage<Page4K>,
    start: PageOffset,
    value: u64,
    count: usize,
) -> Result<Vec<Mismatch>, AccessError> {
    let mut buffer = TransferBuffer::new();
    let mut mismatches = Vec::new();
    let mut src = start;
    let mut index = 0;
    while index < count {
        let chunk = buffer.load_from(window, src, count - index)?;
        for (&actual, offset) in chunk.iter().zip(word_offsets(src)) {
            let expected = sequence_word(value, index);
            if actual != expected {
                mismatches.push(Mismatch {
                    physical: page.join(offset),
                    offset,
                    virt: window.address_of(offset).addr(),
                    expected: expected.widen(),
                    actual: actual.widen(),
                });
            }
            index += 1;
        }
        src = src + (chunk.len() * AccessWidth::WORD_SIZE) as u64;
    }
    Ok(mismatches)
}

//! # `devmem` / `memtest`
//!
//! Command-line front ends for poking at physical memory during board
//! bring-up. Both map exactly one page, act on it and release it again, on
//! every path out of [`run_devmem`] and [`run_memtest`].

pub mod args;
pub mod config;
mod error;
pub mod logger;
pub mod numeric;

pub use args::{DevmemRequest, MemtestRequest};
pub use config::{BackendKind, Config};
pub use error::CliError;
pub use logger::StderrLogger;

use physmem_access::{
    AccessError, AccessReport, Mismatch, PageTest, access, dump_page, fill_page, verify_page,
};
use physmem_addresses::{PAGE_SIZE, PhysicalAddress};
use physmem_map::{Mapper, PageMapping};
use std::io::{self, Write};

/// Usage text for `devmem`.
#[must_use]
pub fn devmem_usage(program: &str) -> String {
    format!(
        "\nUsage:\t{program} {{ address }} [ type [ data [ count ] ] ]\n\
         \taddress : memory address to act upon\n\
         \ttype    : access operation type : [b]yte, [h]alfword, [w]ord, [c]ache line\n\
         \tdata    : data to be written\n\
         \tcount   : number of consecutive words to write (word access only)\n"
    )
}

/// Usage text for `memtest`.
#[must_use]
pub fn memtest_usage(program: &str) -> String {
    let tests: Vec<String> = PageTest::ALL
        .iter()
        .enumerate()
        .map(|(id, t)| format!("{id} {t}"))
        .collect();
    format!(
        "\nUsage:\t{program} {{ address }} [ test_id [ data ] ]\n\
         \taddress : memory address to act upon\n\
         \ttest_id : {}\n\
         \tdata    : first value written by fill tests\n",
        tests.join(", ")
    )
}

/// Map the target page with `mapper`, run `f`, and always release the page.
///
/// An error from `f` wins over a failure to release; the latter is logged.
fn with_mapping<M, T>(
    mapper: &M,
    target: PhysicalAddress,
    out: &mut dyn Write,
    f: impl FnOnce(&mut M::Mapping, &mut dyn Write) -> Result<T, CliError>,
) -> Result<T, CliError>
where
    M: Mapper,
{
    let (mut mapping, offset) = mapper.acquire(target)?;
    log::debug!("acquired page {} for offset {offset}", mapping.page());

    let result = mapping
        .announce(out)
        .map_err(CliError::from)
        .and_then(|()| f(&mut mapping, out));
    let released = mapping.release();

    match result {
        Ok(value) => {
            released?;
            Ok(value)
        }
        Err(e) => {
            if let Err(release_error) = released {
                log::error!("{release_error}");
            }
            Err(e)
        }
    }
}

/// Perform one `devmem` request and print its report to `out`.
///
/// # Errors
/// Mapping failures and refused accesses. Readback mismatches are reported,
/// not returned as errors.
pub fn run_devmem<M: Mapper>(
    mapper: &M,
    request: &DevmemRequest,
    out: &mut dyn Write,
) -> Result<AccessReport, CliError> {
    with_mapping(mapper, request.address, out, |mapping, out| {
        let report = access(
            &mut mapping.window(),
            request.address,
            request.width,
            request.operation,
        )?;
        write!(out, "{report}")?;
        out.flush()?;
        Ok(report)
    })
}

/// Run one `memtest` page test.
///
/// Progress and results go to `out`, verification failures to `diag`.
/// Returns the mismatches found by a fill test; they do not make the run fail.
///
/// # Errors
/// Mapping failures.
pub fn run_memtest<M: Mapper>(
    mapper: &M,
    request: &MemtestRequest,
    out: &mut dyn Write,
    diag: &mut dyn Write,
) -> Result<Vec<Mismatch>, CliError> {
    with_mapping(mapper, request.address, out, |mapping, out| {
        let page = mapping.page();
        let mut window = mapping.window();
        writeln!(out, "run {}...", request.test)?;

        let mismatches = match request.test {
            PageTest::Fill => {
                writeln!(out, "start fill {PAGE_SIZE:x}")?;
                fill_page(&mut window, request.data, |line| -> Result<(), CliError> {
                    writeln!(out, "write off {:x}", line.as_u64())?;
                    Ok(())
                })?;
                let mismatches = verify_page(&window, page, request.data).map_err(AccessError::from)?;
                report_mismatches(&mismatches, diag)?;
                if mismatches.is_empty() {
                    writeln!(out, "verify {PAGE_SIZE} done")?;
                }
                mismatches
            }
            PageTest::Read => {
                let rows = dump_page(&window).map_err(AccessError::from)?;
                for row in rows {
                    writeln!(out, "{row}")?;
                }
                Vec::new()
            }
        };
        out.flush()?;
        Ok(mismatches)
    })
}

fn report_mismatches(mismatches: &[Mismatch], diag: &mut dyn Write) -> io::Result<()> {
    for m in mismatches {
        writeln!(
            diag,
            " fail at page offset {:x}, expected {:x}, but {:x}",
            m.offset.as_u64(),
            m.expected,
            m.actual
        )?;
    }
    diag.flush()
}

/// Print `error` to stderr the way the tools do and return the exit status.
#[must_use]
pub fn report_error(error: &CliError, usage: impl FnOnce() -> String) -> u8 {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{error}");
    if error.is_usage() {
        let _ = write!(stderr, "{}", usage());
    }
    error.exit_code()
}

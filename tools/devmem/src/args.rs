//! Positional arguments of the two tools.

use crate::CliError;
use crate::numeric::parse_ulong;
use physmem_access::{AccessWidth, Operation, PageTest};
use physmem_addresses::PhysicalAddress;

/// What `devmem` was asked to do.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DevmemRequest {
    pub address: PhysicalAddress,
    pub width: AccessWidth,
    pub operation: Operation,
}

impl DevmemRequest {
    /// Parse `<address> [type] [data] [count]` (program name already removed).
    ///
    /// Everything is validated here, before any memory is mapped.
    ///
    /// # Errors
    /// [`CliError::Usage`] for a missing address or an unusable count,
    /// [`CliError::InvalidWidth`] for an unknown type character.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, CliError> {
        let mut args = args.iter().map(AsRef::as_ref);
        let address = args
            .next()
            .map(|a| PhysicalAddress::new(parse_ulong("address", a)))
            .ok_or_else(|| CliError::Usage("missing address".into()))?;
        let width = args.next().map_or(Ok(AccessWidth::default()), str::parse::<AccessWidth>)?;
        let data = args.next().map(|d| parse_ulong("data", d));
        let count = args.next().map(|c| parse_ulong("count", c));

        let operation = match (data, count) {
            (None, _) => Operation::Read,
            (Some(value), None) => Operation::WriteAndVerify(value),
            (Some(value), Some(count)) => {
                if width != AccessWidth::Word {
                    return Err(CliError::Usage(format!(
                        "count is only supported for word access, not {width}"
                    )));
                }
                let count = usize::try_from(count)
                    .ok()
                    .filter(|&c| c > 0)
                    .ok_or_else(|| CliError::Usage(format!("invalid count {count}")))?;
                Operation::WriteMultiple { value, count }
            }
        };

        Ok(Self {
            address,
            width,
            operation,
        })
    }
}

/// What `memtest` was asked to do.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemtestRequest {
    pub address: PhysicalAddress,
    pub test: PageTest,
    pub data: u32,
}

impl MemtestRequest {
    /// Parse `<address> [test_id] [data]` (program name already removed).
    ///
    /// # Errors
    /// [`CliError::Usage`] for a missing address, [`CliError::UnknownTest`]
    /// for a test id out of range.
    #[allow(clippy::cast_possible_truncation)]
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, CliError> {
        let mut args = args.iter().map(AsRef::as_ref);
        let address = args
            .next()
            .map(|a| PhysicalAddress::new(parse_ulong("address", a)))
            .ok_or_else(|| CliError::Usage("missing address".into()))?;
        let id = args.next().map_or(0, |t| parse_ulong("test_id", t));
        let test = PageTest::from_id(id).ok_or(CliError::UnknownTest(id))?;
        // fill values are 32 bits wide; higher bits are dropped
        let data = args.next().map_or(0, |d| parse_ulong("data", d) as u32);

        Ok(Self { address, test, data })
    }
}

use physmem_access::{AccessError, InvalidAccessWidth};
use physmem_map::{MapError, WindowError};
use std::io;

/// Everything that ends a tool run early.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    InvalidWidth(#[from] InvalidAccessWidth),
    #[error("no such test {0}")]
    UnknownTest(u64),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("cannot write report: {0}")]
    Output(#[from] io::Error),
}

impl From<WindowError> for CliError {
    fn from(e: WindowError) -> Self {
        Self::Access(AccessError::from(e))
    }
}

impl CliError {
    /// Process exit status for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidWidth(_) => 2,
            Self::Usage(_) | Self::UnknownTest(_) | Self::Map(_) | Self::Access(_) | Self::Output(_) => 1,
        }
    }

    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(CliError::Usage("missing address".into()).exit_code(), 1);
        assert_eq!(CliError::InvalidWidth(InvalidAccessWidth(Some('x'))).exit_code(), 2);
        assert_eq!(CliError::Access(AccessError::ZeroCount).exit_code(), 1);
        assert_eq!(CliError::UnknownTest(9).exit_code(), 1);
    }
}

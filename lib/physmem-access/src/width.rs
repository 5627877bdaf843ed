use core::fmt;
use core::str::FromStr;
use physmem_addresses::CACHE_LINE_SIZE;

/// Granularity of a single access.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AccessWidth {
    /// 8 bits.
    Byte,
    /// 16 bits.
    HalfWord,
    /// The native word (`usize`).
    #[default]
    Word,
    /// One 64-byte line, transferred as native words.
    CacheLine,
}

/// The type character did not name an [`AccessWidth`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Illegal data type '{}'.", .0.map(String::from).unwrap_or_default())]
pub struct InvalidAccessWidth(pub Option<char>);

impl AccessWidth {
    /// Native word size in bytes.
    pub const WORD_SIZE: usize = size_of::<usize>();

    /// Number of bytes one access of this width touches.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::HalfWord => 2,
            Self::Word => Self::WORD_SIZE,
            Self::CacheLine => CACHE_LINE_SIZE,
        }
    }

    /// Decode a type character, ignoring case.
    ///
    /// # Errors
    /// Any character other than `b`, `h`, `w` or `c`.
    pub const fn from_code(code: char) -> Result<Self, InvalidAccessWidth> {
        match code.to_ascii_lowercase() {
            'b' => Ok(Self::Byte),
            'h' => Ok(Self::HalfWord),
            'w' => Ok(Self::Word),
            'c' => Ok(Self::CacheLine),
            _ => Err(InvalidAccessWidth(Some(code))),
        }
    }
}

/// Only the first character of the argument is significant.
impl FromStr for AccessWidth {
    type Err = InvalidAccessWidth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .next()
            .map_or(Err(InvalidAccessWidth(None)), Self::from_code)
    }
}

impl fmt::Display for AccessWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Byte => "byte",
            Self::HalfWord => "half-word",
            Self::Word => "word",
            Self::CacheLine => "cache line",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("b".parse(), Ok(AccessWidth::Byte));
        assert_eq!("H".parse(), Ok(AccessWidth::HalfWord));
        assert_eq!("word".parse(), Ok(AccessWidth::Word));
        assert_eq!("c".parse(), Ok(AccessWidth::CacheLine));
    }

    #[test]
    fn rejects_unknown_codes() {
        assert_eq!("x".parse::<AccessWidth>(), Err(InvalidAccessWidth(Some('x'))));
        assert_eq!("".parse::<AccessWidth>(), Err(InvalidAccessWidth(None)));
        assert_eq!(
            InvalidAccessWidth(Some('x')).to_string(),
            "Illegal data type 'x'."
        );
    }

    #[test]
    fn widths_in_bytes() {
        assert_eq!(AccessWidth::Byte.bytes(), 1);
        assert_eq!(AccessWidth::HalfWord.bytes(), 2);
        assert_eq!(AccessWidth::Word.bytes(), size_of::<usize>());
        assert_eq!(AccessWidth::CacheLine.bytes(), 64);
        assert_eq!(AccessWidth::default(), AccessWidth::Word);
    }
}

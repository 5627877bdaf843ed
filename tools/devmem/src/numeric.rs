//! Numbers as `strtoul(s, NULL, 0)` reads them.
//!
//! `0x`/`0X` selects hex, a leading `0` octal, anything else decimal. Leading
//! whitespace and one sign are accepted, parsing stops at the first character
//! that is not a digit of the base, and overflow saturates at `u64::MAX`.

/// Parse the leading number of `s`, returning it with the unparsed remainder.
#[must_use]
pub fn parse_prefix(s: &str) -> (u64, &str) {
    let trimmed = s.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '\x0b');
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (radix, digits) = match unsigned.as_bytes() {
        [b'0', b'x' | b'X', d, ..] if d.is_ascii_hexdigit() => (16, &unsigned[2..]),
        [b'0', ..] => (8, unsigned),
        _ => (10, unsigned),
    };

    let mut value: u64 = 0;
    let mut overflow = false;
    let mut consumed = 0;
    for c in digits.chars() {
        let Some(d) = c.to_digit(radix) else { break };
        match value.checked_mul(u64::from(radix)).and_then(|v| v.checked_add(u64::from(d))) {
            Some(v) => value = v,
            None => overflow = true,
        }
        consumed += c.len_utf8();
    }

    if consumed == 0 {
        // no conversion: the whole input is unparsed
        return (0, s);
    }

    let value = if overflow {
        u64::MAX
    } else if negative {
        value.wrapping_neg()
    } else {
        value
    };
    (value, &digits[consumed..])
}

/// Parse `s` leniently, warning about anything after the number.
#[must_use]
pub fn parse_ulong(what: &str, s: &str) -> u64 {
    let (value, rest) = parse_prefix(s);
    if !rest.is_empty() {
        log::warn!("{what}: ignoring trailing {rest:?} in {s:?}, using {value:#x}");
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bases() {
        assert_eq!(parse_prefix("0x100"), (0x100, ""));
        assert_eq!(parse_prefix("0XdeadBEEF"), (0xDEAD_BEEF, ""));
        assert_eq!(parse_prefix("0755"), (0o755, ""));
        assert_eq!(parse_prefix("0"), (0, ""));
        assert_eq!(parse_prefix("20"), (20, ""));
    }

    #[test]
    fn stops_at_first_invalid_digit() {
        assert_eq!(parse_prefix("12abc"), (12, "abc"));
        assert_eq!(parse_prefix("089"), (0, "89"));
        assert_eq!(parse_prefix("0x"), (0, "x"));
        assert_eq!(parse_prefix("0xg"), (0, "xg"));
        assert_eq!(parse_prefix("abc"), (0, "abc"));
        assert_eq!(parse_prefix(""), (0, ""));
    }

    #[test]
    fn whitespace_and_sign() {
        assert_eq!(parse_prefix("  +42"), (42, ""));
        assert_eq!(parse_prefix("-1"), (u64::MAX, ""));
        assert_eq!(parse_prefix("\t0x10"), (0x10, ""));
    }

    #[test]
    fn overflow_saturates() {
        assert_eq!(parse_prefix("0xFFFFFFFFFFFFFFFF"), (u64::MAX, ""));
        assert_eq!(parse_prefix("0x10000000000000000"), (u64::MAX, ""));
        assert_eq!(parse_prefix("-99999999999999999999"), (u64::MAX, ""));
    }

    #[test]
    fn lenient_parse_keeps_prefix() {
        assert_eq!(parse_ulong("data", "0x10zz"), 0x10);
    }
}

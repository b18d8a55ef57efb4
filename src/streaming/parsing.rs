//! Zero-allocation sample parsing utilities.
//!
//! These functions parse sample lines without any heap allocation in the
//! hot path.

use crate::sample::Sample;
use memchr::memchr;

/// Fast i64 parsing - no allocation, no error formatting.
///
/// Accepts an optional leading `-`. Returns None if the input is empty,
/// contains non-digit characters or overflows.
#[inline(always)]
pub fn parse_i64_fast(bytes: &[u8]) -> Option<i64> {
    let (negative, digits) = match bytes.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some(_) => (false, bytes),
        None => return None,
    };
    if digits.is_empty() {
        return None;
    }
    let mut n: i64 = 0;
    for &b in digits {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_sub(d as i64)?;
    }
    // Accumulated as a negative so i64::MIN parses.
    if negative {
        Some(n)
    } else {
        n.checked_neg()
    }
}

/// Parse a float field. Floats are rare enough per line that std parsing
/// is used after a cheap UTF-8 check.
#[inline]
pub fn parse_f64(bytes: &[u8]) -> Option<f64> {
    std::str::from_utf8(bytes).ok()?.trim().parse().ok()
}

/// Split off the next tab-delimited field.
#[inline(always)]
fn next_field(rest: &[u8]) -> (&[u8], &[u8]) {
    match memchr(b'\t', rest) {
        Some(tab) => (&rest[..tab], &rest[tab + 1..]),
        None => (rest, &rest[rest.len()..]),
    }
}

/// Parse `line_id, position, neighbor_id, join_distance` using memchr.
///
/// Columns after the fourth are ignored. Returns None if a field is missing
/// or malformed.
#[inline]
pub fn parse_sample_bytes(line: &[u8]) -> Option<Sample> {
    let tab1 = memchr(b'\t', line)?;
    let line_id = parse_i64_fast(&line[..tab1])?;

    let rest1 = &line[tab1 + 1..];
    let tab2 = memchr(b'\t', rest1)?;
    let position = parse_f64(&rest1[..tab2])?;

    let rest2 = &rest1[tab2 + 1..];
    let tab3 = memchr(b'\t', rest2)?;
    let neighbor_id = parse_i64_fast(&rest2[..tab3])?;

    let (dist, _) = next_field(&rest2[tab3 + 1..]);
    let dist_len = memchr(b'\n', dist).unwrap_or(dist.len());
    let join_distance = parse_f64(&dist[..dist_len])?;

    Some(Sample::new(line_id, position, neighbor_id, join_distance))
}

/// Check if a line should be skipped (empty or comment).
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    line.is_empty() || line[0] == b'#'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_i64_fast() {
        assert_eq!(parse_i64_fast(b"12345"), Some(12345));
        assert_eq!(parse_i64_fast(b"0"), Some(0));
        assert_eq!(parse_i64_fast(b"-1"), Some(-1));
        assert_eq!(parse_i64_fast(b""), None);
        assert_eq!(parse_i64_fast(b"-"), None);
        assert_eq!(parse_i64_fast(b"abc"), None);
        assert_eq!(parse_i64_fast(b"12a"), None);
        assert_eq!(parse_i64_fast(b"9223372036854775807"), Some(i64::MAX));
        assert_eq!(parse_i64_fast(b"-9223372036854775808"), Some(i64::MIN));
        assert_eq!(parse_i64_fast(b"9223372036854775808"), None);
    }

    #[test]
    fn test_parse_f64() {
        assert_eq!(parse_f64(b"0.5"), Some(0.5));
        assert_eq!(parse_f64(b"2"), Some(2.0));
        assert_eq!(parse_f64(b"1e-3"), Some(0.001));
        assert_eq!(parse_f64(b"x"), None);
    }

    #[test]
    fn test_parse_sample_bytes() {
        assert_eq!(
            parse_sample_bytes(b"5\t0.5\t12\t2.25"),
            Some(Sample::new(5, 0.5, 12, 2.25))
        );
        assert_eq!(
            parse_sample_bytes(b"5\t1\t-1\t0\tname"),
            Some(Sample::new(5, 1.0, -1, 0.0))
        );
        assert_eq!(
            parse_sample_bytes(b"5\t1\t-1\t0\n"),
            Some(Sample::new(5, 1.0, -1, 0.0))
        );
        assert_eq!(parse_sample_bytes(b"5\t1\t-1"), None);
        assert_eq!(parse_sample_bytes(b"5\tx\t1\t0"), None);
        assert_eq!(parse_sample_bytes(b""), None);
    }

    #[test]
    fn test_should_skip_line() {
        assert!(should_skip_line(b""));
        assert!(should_skip_line(b"#line_id\tposition"));
        assert!(!should_skip_line(b"1\t0\t2\t0.5"));
    }
}

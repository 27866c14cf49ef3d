//! Verify-or-fallback combinator and round-trip comparison

use std::fmt;

use tracing::trace;

use crate::FormatError;

/// Result of a verified decode
#[derive(Debug)]
pub enum Verified<T> {
    /// Decoded and re-encoded to the identical bytes
    Structured(T),
    /// Decode failed or the re-encode differed; keep the span opaque
    Fallback(FormatError),
}

impl<T> Verified<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Structured(value) => Some(value),
            Self::Fallback(_) => None,
        }
    }
}

/// Decode `raw`, re-encode the result and keep it only if the bytes match.
///
/// A structured value that would not reproduce its source is never returned,
/// so callers can always fall back to storing `raw` verbatim.
pub fn verify_or_fallback<T, D, E>(raw: &[u8], decode: D, encode: E) -> Verified<T>
where
    D: FnOnce(&[u8]) -> Result<T, FormatError>,
    E: FnOnce(&T) -> Vec<u8>,
{
    let value = match decode(raw) {
        Ok(value) => value,
        Err(err) => {
            trace!("structured decode rejected: {}", err);
            return Verified::Fallback(err);
        }
    };
    let rebuilt = encode(&value);
    match first_difference(raw, &rebuilt) {
        None => Verified::Structured(value),
        Some(offset) => {
            trace!(
                "re-encode differs at 0x{:04X} ({} vs {} bytes)",
                offset,
                raw.len(),
                rebuilt.len()
            );
            Verified::Fallback(FormatError::VerificationMismatch { offset })
        }
    }
}

/// First offset at which `a` and `b` differ, counting a length difference as
/// a difference at the shorter length
pub fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}

/// Outcome of comparing a rebuilt file against its source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTrip {
    Match {
        len: usize,
    },
    Mismatch {
        offset: usize,
        original_len: usize,
        rebuilt_len: usize,
    },
}

impl RoundTrip {
    pub fn compare(original: &[u8], rebuilt: &[u8]) -> Self {
        match first_difference(original, rebuilt) {
            None => Self::Match {
                len: original.len(),
            },
            Some(offset) => Self::Mismatch {
                offset,
                original_len: original.len(),
                rebuilt_len: rebuilt.len(),
            },
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match { .. })
    }
}

impl fmt::Display for RoundTrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match { len } => write!(f, "identical ({len} bytes)"),
            Self::Mismatch {
                offset,
                original_len,
                rebuilt_len,
            } => write!(
                f,
                "differs at 0x{offset:04X} (original {original_len} bytes, rebuilt {rebuilt_len} bytes)"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Reader;

    fn decode_pair(raw: &[u8]) -> Result<(u16, u16), FormatError> {
        let mut reader = Reader::new(raw);
        Ok((reader.read_u16()?, reader.read_u16()?))
    }

    fn encode_pair(pair: &(u16, u16)) -> Vec<u8> {
        let mut out = pair.0.to_le_bytes().to_vec();
        out.extend_from_slice(&pair.1.to_le_bytes());
        out
    }

    #[test]
    fn test_first_difference() {
        assert_eq!(first_difference(b"abcd", b"abcd"), None);
        assert_eq!(first_difference(b"abcd", b"abXd"), Some(2));
        assert_eq!(first_difference(b"abc", b"abcd"), Some(3));
        assert_eq!(first_difference(b"", b""), None);
    }

    #[test]
    fn test_exact_span_is_structured() {
        let raw = [1, 0, 2, 0];
        match verify_or_fallback(&raw, decode_pair, encode_pair) {
            Verified::Structured(pair) => assert_eq!(pair, (1, 2)),
            Verified::Fallback(err) => panic!("unexpected fallback: {err}"),
        }
    }

    #[test]
    fn test_extra_bytes_fall_back_with_offset() {
        // Decoder ignores the fifth byte, so the re-encode comes up short
        let raw = [1, 0, 2, 0, 9];
        match verify_or_fallback(&raw, decode_pair, encode_pair) {
            Verified::Fallback(FormatError::VerificationMismatch { offset }) => {
                assert_eq!(offset, 4)
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_error_falls_back() {
        let verified = verify_or_fallback(&[1, 0], decode_pair, encode_pair);
        assert!(matches!(
            verified,
            Verified::Fallback(FormatError::TruncatedInput { .. })
        ));
        assert!(verified.ok().is_none());
    }

    #[test]
    fn test_round_trip_compare() {
        assert!(RoundTrip::compare(b"xyz", b"xyz").is_match());
        let mismatch = RoundTrip::compare(b"xyz", b"xy");
        assert_eq!(
            mismatch,
            RoundTrip::Mismatch {
                offset: 2,
                original_len: 3,
                rebuilt_len: 2
            }
        );
        assert!(mismatch.to_string().contains("0x0002"));
    }
}

//! Error types for container decoding, encoding and editing

use std::io;

/// Errors that can occur when decoding, encoding or editing containers
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Buffer exhausted before a required field
    #[error("truncated input: {needed} byte(s) needed at 0x{offset:04X}")]
    TruncatedInput { offset: usize, needed: usize },

    /// A length prefix exceeds the sanity ceiling (corrupt data or misaligned cursor)
    #[error("declared length {length} at 0x{offset:04X} exceeds sanity bound")]
    OversizedDeclaredLength { offset: usize, length: u32 },

    /// A structural predicate failed; selects a different parse branch
    #[error("structural mismatch at 0x{offset:04X}: {reason}")]
    StructuralMismatch { offset: usize, reason: &'static str },

    /// A structured re-encode did not reproduce the source bytes
    #[error("re-encoded bytes differ from source at offset 0x{offset:04X}")]
    VerificationMismatch { offset: usize },

    /// A record cannot be written: no retained span and fields are insufficient
    #[error("cannot rebuild record {index} (\"{name}\"): {reason}")]
    UnreconstructableRecord {
        index: usize,
        name: String,
        reason: &'static str,
    },

    /// Interchange document is for a different container kind
    #[error("interchange format mismatch: expected \"{expected}\", found \"{found}\"")]
    FormatMismatch {
        expected: &'static str,
        found: String,
    },

    /// Interchange JSON could not be read or written (includes malformed hex spans)
    #[error("interchange JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error while reading or writing a container
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Chunk index outside the document
    #[error("chunk {index} out of range ({len} chunk(s))")]
    ChunkIndex { index: usize, len: usize },

    /// Phase index outside the chunk
    #[error("phase {phase} out of range in chunk {index} ({len} phase(s))")]
    PhaseIndex {
        index: usize,
        phase: usize,
        len: usize,
    },

    /// Edit requested on a chunk kind that does not support it
    #[error("chunk {index} ({tag}) is not editable by field")]
    NotEditable { index: usize, tag: String },
}

impl FormatError {
    /// Whether this error belongs to the decode-time branch selection family.
    ///
    /// Bounds, length and structural failures abort the current record only;
    /// the caller resynchronizes and keeps going.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TruncatedInput { .. }
                | Self::OversizedDeclaredLength { .. }
                | Self::StructuralMismatch { .. }
                | Self::VerificationMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_offset() {
        let err = FormatError::TruncatedInput {
            offset: 0x1A,
            needed: 4,
        };
        assert_eq!(
            err.to_string(),
            "truncated input: 4 byte(s) needed at 0x001A"
        );
    }

    #[test]
    fn test_recoverable_split() {
        assert!(
            FormatError::OversizedDeclaredLength {
                offset: 0,
                length: 9999
            }
            .is_recoverable()
        );
        assert!(
            !FormatError::FormatMismatch {
                expected: "canim_v10",
                found: "other".into()
            }
            .is_recoverable()
        );
    }
}

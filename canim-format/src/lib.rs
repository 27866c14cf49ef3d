//! canim-format: byte-exact decoder and encoder for `.canim` and `.canim-meta` containers
//!
//! Both containers are undocumented and variable-structured: several sections have no
//! length prefix, so record boundaries are inferred by speculative, self-validating
//! parsing. Anything the decoder claims to understand re-encodes to the identical
//! source bytes; anything it does not understand is kept as an opaque byte span.
//!
//! # Containers
//!
//! - **Animation container** (`.canim`): header, layer and clip name tables, an optional
//!   fixed-layout section/element block, then a "build" region of symbols and timeline
//!   blocks with no table of contents. See [`AnimDocument`].
//! - **Event container** (`.canim-meta`): a 12-byte header followed by chunks located by
//!   scanning for 4-byte tags. Hit-phase and collision chunks are promoted to structured
//!   form only when they re-encode exactly. See [`EventDocument`].
//!
//! # Usage
//!
//! ```ignore
//! use canim_format::{AnimDocument, EventDocument};
//!
//! let bytes = std::fs::read("idle.canim")?;
//! let doc = AnimDocument::decode(&bytes)?;
//! assert_eq!(doc.encode()?, bytes);
//!
//! let meta = EventDocument::decode(&std::fs::read("idle.canim-meta")?)?;
//! println!("{} chunk(s)", meta.chunks.len());
//! ```

pub mod anim;
pub mod batch;
pub mod codec;
mod error;
pub mod interchange;
pub mod meta;
mod serde_util;
pub mod verify;

pub use anim::{
    AnimBody, AnimCounts, AnimDocument, AnimHeader, AnimSummary, BodyCandidate, BuildEntry,
    Clip, CompositeLayout, Diagnostic, Element, Matrix2, Section, Sprite, StandardBody, Symbol,
    SymbolBody, SymbolShape, TimelineBlock, BODY_PRIORITY,
};
pub use batch::{BatchEntry, BatchReport, BatchStatus, Outcome};
pub use error::FormatError;
pub use interchange::{ANIM_FORMAT, META_FORMAT};
pub use meta::{
    BoundingBox, Chunk, CollisionChunk, CollisionPhase, EventDocument, EventSummary, HitChunk,
    HitPhase, OpaqueChunk, Point, Segment,
};
pub use verify::{RoundTrip, Verified, first_difference, verify_or_fallback};

// =============================================================================
// Primitive limits
// =============================================================================

/// Largest length prefix accepted by the string codec
pub const MAX_STRING_LEN: u32 = 500;

/// Largest length accepted for a "valid name" in structural predicates
pub const MAX_NAME_LEN: u32 = 300;

// =============================================================================
// Animation container
// =============================================================================

/// Smallest file the animation decoder will look at
pub const MIN_ANIM_FILE_LEN: usize = 20;

/// Frame rates a symbol header may declare
pub const KNOWN_FRAME_RATES: [u8; 15] = [1, 2, 3, 4, 5, 6, 8, 10, 12, 15, 20, 24, 25, 30, 60];

/// Largest sprite count a symbol header may declare
pub const MAX_SYMBOL_SPRITES: u16 = 5000;

/// Sprite geometry must stay within +/- this bound
pub const MAX_SPRITE_COORD: f32 = 10000.0;

/// Sprite width and height must not exceed this
pub const MAX_SPRITE_EXTENT: f32 = 5000.0;

/// Upper bound on section frame and element counts
pub const MAX_SECTION_COUNT: u16 = 10000;

/// Layer indices above this are implausible when out of the layer table's range
pub const MAX_DANGLING_LAYER: u16 = 100;

/// Count-prefixed composite lists hold fewer than this many names
pub const MAX_COMPOSITE_NAMES: u16 = 200;

/// Fixed byte size of one section element record
pub const ELEMENT_RECORD_LEN: usize = 43;

// =============================================================================
// Event container
// =============================================================================

/// Event container header: version, anim hash, declared chunk count
pub const META_HEADER_LEN: usize = 12;

/// Hit-phase chunk tag
pub const HIT_TAG: &[u8; 4] = b"MHIT";

/// Collision chunk tag
pub const COLLISION_TAG: &[u8; 4] = b"MCOL";

/// Action chunk tag (script payload, always opaque)
pub const ACTION_TAG: &[u8; 4] = b"MACT";

/// Every tag that starts a chunk
pub const CHUNK_TAGS: [&[u8; 4]; 3] = [HIT_TAG, COLLISION_TAG, ACTION_TAG];

/// Fixed header size shared by hit and collision chunks (tag through phase count)
pub const CHUNK_HEADER_LEN: usize = 28;

/// Collision phases hold between 1 and this many segments
pub const MAX_PHASE_SEGMENTS: u32 = 200;

/// Zero bytes following every collision segment
pub const SEGMENT_SEPARATOR: [u8; 5] = [0; 5];

/// Offset of the script text inside an action chunk
pub const ACTION_SCRIPT_OFFSET: usize = 26;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(CHUNK_TAGS.len(), 3);
        assert!(KNOWN_FRAME_RATES.contains(&24));
        assert!(!KNOWN_FRAME_RATES.contains(&0));
        assert!(MAX_NAME_LEN < MAX_STRING_LEN);
        // index, aux, layer, aux (8) + matrix, translate (24) + z, type, rgba (7) + reserved (4)
        assert_eq!(ELEMENT_RECORD_LEN, 8 + 24 + 7 + 4);
    }
}

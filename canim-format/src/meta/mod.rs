//! Event container (`.canim-meta`)
//!
//! # Layout
//!
//! ```text
//! 0x00  u32 LE  version
//! 0x04  u32 LE  animation hash
//! 0x08  u32 LE  declared chunk count
//! 0x0C  chunks, back to back, each opening with a 4-byte tag
//!       trailing bytes
//! ```
//!
//! Chunks carry no length. A chunk runs from its tag to the next tag found by
//! a byte-wise scan, or to the end of the file.
//!
//! ## Hit-phase chunk (`MHIT`)
//!
//! ```text
//! tag, anim hash, event hash, start f32, end f32, element id, phase count
//! phase*  time f32, point count u32, (x f32, y f32) * point count
//! u32     reference count
//! u32*    reference hashes
//! [u8]    footer extra
//! ```
//!
//! ## Collision chunk (`MCOL`)
//!
//! ```text
//! tag, anim hash, event hash, start f32, end f32, element id, phase count
//! phase*  time f32, segment count u32 (1..=200),
//!         (x1, y1, x2, y2 f32, 5 zero bytes) * segment count
//! u32     reference count
//! ```
//!
//! Any other tag (`MACT` carries a script) is kept as an opaque span. Hit and
//! collision chunks are kept structured only when they re-encode to the exact
//! source span; see [`crate::verify_or_fallback`].

mod edit;
mod read;
mod summary;
mod types;
mod write;

pub use summary::{ChunkRow, DetailView, EventSummary};
pub use types::{
    BoundingBox, Chunk, CollisionChunk, CollisionPhase, EventDocument, HitChunk, HitPhase,
    OpaqueChunk, Point, Segment,
};

//! Animation container (`.canim`)
//!
//! # Layout
//!
//! ```text
//! 0x00  [u8; 4]  magic
//! 0x04  u32 LE   version
//! 0x08  u16 LE   layout flag (0 = minimal layout)
//! 0x0A  u16 LE   auxiliary flag
//! 0x0C  string   animation name (u32 length + ASCII)
//!       u8       frame rate
//! ```
//!
//! ## Minimal layout (layout flag 0)
//!
//! An opaque metadata blob, then bare sprites (`name, w, h, pivot_x, pivot_y`)
//! until one fails validation, then the trailing tail.
//!
//! ## Standard layout
//!
//! ```text
//! u16 x5   clip, section, element, aux and layer counts
//! string*  layer names
//! (string, u16)*  clips
//! section* optional fixed-layout sections with 43-byte elements
//! entry*   build region: symbols and timeline blocks, no table of contents
//! [u8]     trailing tail
//! ```
//!
//! The build region has no explicit record lengths. Record boundaries are found
//! with the structural predicates in [`probe`] and every decoded record keeps
//! the exact byte span it occupied, which the encoder prefers over synthesis.

pub mod probe;
mod read;
mod summary;
mod types;
mod write;

pub use read::{BODY_PRIORITY, BodyCandidate, Diagnostic};
pub use summary::{AnimSummary, SymbolRow};
pub use types::{
    AnimBody, AnimCounts, AnimDocument, AnimHeader, BuildEntry, Clip, CompositeLayout, Element,
    Matrix2, Section, Sprite, StandardBody, Symbol, SymbolBody, SymbolShape, TimelineBlock,
};

//! Event container document model

use serde::{Deserialize, Serialize};

use crate::codec::{decode_ascii_lossy, peek_f32, peek_u32};
use crate::serde_util::{float, hash32, hash32_seq, hex_bytes, hex_bytes_opt, tag4};
use crate::{ACTION_SCRIPT_OFFSET, ACTION_TAG, COLLISION_TAG, HIT_TAG};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(with = "float")]
    pub x: f32,
    #[serde(with = "float")]
    pub y: f32,
}

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BoundingBox {
    /// Smallest box holding every point; `None` for no points
    pub fn from_points(points: impl IntoIterator<Item = (f32, f32)>) -> Option<Self> {
        points.into_iter().fold(None, |bounds, (x, y)| {
            Some(match bounds {
                None => Self {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                },
                Some(b) => Self {
                    min_x: b.min_x.min(x),
                    min_y: b.min_y.min(y),
                    max_x: b.max_x.max(x),
                    max_y: b.max_y.max(y),
                },
            })
        })
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// (min,min), (min,max), (max,max), (max,min)
    pub fn corners(&self) -> [Point; 4] {
        [
            Point {
                x: self.min_x,
                y: self.min_y,
            },
            Point {
                x: self.min_x,
                y: self.max_y,
            },
            Point {
                x: self.max_x,
                y: self.max_y,
            },
            Point {
                x: self.max_x,
                y: self.min_y,
            },
        ]
    }
}

/// One timestamped hit shape. The point-count tag on disk is `points.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitPhase {
    #[serde(with = "float")]
    pub time: f32,
    pub points: Vec<Point>,
}

impl HitPhase {
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.points.iter().map(|p| (p.x, p.y)))
    }

    /// Replace the shape with the four corners of `bounds`
    pub fn set_bounding_box(&mut self, bounds: BoundingBox) {
        self.points = bounds.corners().to_vec();
    }

    /// Scale every point about the centre of this phase's own box
    pub fn scale(&mut self, factor: f32) {
        let Some(bounds) = self.bounding_box() else {
            return;
        };
        let (cx, cy) = bounds.center();
        for point in &mut self.points {
            point.x = cx + (point.x - cx) * factor;
            point.y = cy + (point.y - cy) * factor;
        }
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        for point in &mut self.points {
            point.x += dx;
            point.y += dy;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitChunk {
    #[serde(with = "hash32")]
    pub anim_hash: u32,
    #[serde(with = "hash32")]
    pub event_hash: u32,
    #[serde(with = "float")]
    pub start_time: f32,
    #[serde(with = "float")]
    pub end_time: f32,
    pub element_id: u32,
    pub phases: Vec<HitPhase>,
    #[serde(with = "hash32_seq")]
    pub ref_hashes: Vec<u32>,
    /// Bytes after the reference list
    #[serde(default, with = "hex_bytes")]
    pub footer_extra: Vec<u8>,
}

/// A line segment; 16 bytes plus a 5-byte zero separator on disk
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(with = "float")]
    pub x1: f32,
    #[serde(with = "float")]
    pub y1: f32,
    #[serde(with = "float")]
    pub x2: f32,
    #[serde(with = "float")]
    pub y2: f32,
}

impl Segment {
    pub fn length(&self) -> f32 {
        (self.x2 - self.x1).hypot(self.y2 - self.y1)
    }

    fn scale_about(&mut self, factor: f32, (cx, cy): (f32, f32)) {
        self.x1 = cx + (self.x1 - cx) * factor;
        self.y1 = cy + (self.y1 - cy) * factor;
        self.x2 = cx + (self.x2 - cx) * factor;
        self.y2 = cy + (self.y2 - cy) * factor;
    }

    fn endpoints(&self) -> [(f32, f32); 2] {
        [(self.x1, self.y1), (self.x2, self.y2)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionPhase {
    #[serde(with = "float")]
    pub time: f32,
    pub segments: Vec<Segment>,
}

impl CollisionPhase {
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.segments.iter().flat_map(Segment::endpoints))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionChunk {
    #[serde(with = "hash32")]
    pub anim_hash: u32,
    #[serde(with = "hash32")]
    pub event_hash: u32,
    #[serde(with = "float")]
    pub start_time: f32,
    #[serde(with = "float")]
    pub end_time: f32,
    pub element_id: u32,
    pub phases: Vec<CollisionPhase>,
    pub ref_count: u32,
}

impl CollisionChunk {
    /// Box around every segment of every phase
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(
            self.phases
                .iter()
                .flat_map(|phase| phase.segments.iter().flat_map(Segment::endpoints)),
        )
    }

    /// Scale every segment about the centre of the whole chunk's box, so the
    /// phases keep their layout relative to each other
    pub fn scale(&mut self, factor: f32) {
        let Some(bounds) = self.bounds() else {
            return;
        };
        let center = bounds.center();
        for segment in self.phases.iter_mut().flat_map(|p| p.segments.iter_mut()) {
            segment.scale_about(factor, center);
        }
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        for segment in self.phases.iter_mut().flat_map(|p| p.segments.iter_mut()) {
            segment.x1 += dx;
            segment.x2 += dx;
            segment.y1 += dy;
            segment.y2 += dy;
        }
    }

    pub fn segment_count(&self) -> usize {
        self.phases.iter().map(|p| p.segments.len()).sum()
    }
}

/// A chunk kept as its exact source bytes (tag included).
///
/// Only an interchange document can leave `raw` unset; such a chunk cannot be
/// encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpaqueChunk {
    #[serde(with = "tag4")]
    pub tag: [u8; 4],
    #[serde(
        default,
        with = "hex_bytes_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub raw: Option<Vec<u8>>,
}

impl OpaqueChunk {
    pub fn new(tag: [u8; 4], raw: Vec<u8>) -> Self {
        Self {
            tag,
            raw: Some(raw),
        }
    }

    /// Retained bytes, empty when the span is missing
    pub fn bytes(&self) -> &[u8] {
        self.raw.as_deref().unwrap_or_default()
    }

    pub fn anim_hash(&self) -> u32 {
        peek_u32(self.bytes(), 4).unwrap_or(0)
    }

    pub fn event_hash(&self) -> u32 {
        peek_u32(self.bytes(), 8).unwrap_or(0)
    }

    pub fn start_time(&self) -> f32 {
        peek_f32(self.bytes(), 12).unwrap_or(0.0)
    }

    pub fn end_time(&self) -> f32 {
        peek_f32(self.bytes(), 16).unwrap_or(0.0)
    }

    pub fn element_id(&self) -> u32 {
        peek_u32(self.bytes(), 20).unwrap_or(0)
    }

    /// Embedded script text of an action chunk, for display
    pub fn script(&self) -> Option<String> {
        let bytes = self.bytes();
        if &self.tag != ACTION_TAG || bytes.len() <= ACTION_SCRIPT_OFFSET {
            return None;
        }
        Some(decode_ascii_lossy(&bytes[ACTION_SCRIPT_OFFSET..]))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Chunk {
    #[serde(rename = "MHIT")]
    Hit(HitChunk),
    #[serde(rename = "MCOL")]
    Collision(CollisionChunk),
    #[serde(rename = "opaque")]
    Opaque(OpaqueChunk),
}

impl Chunk {
    pub fn tag(&self) -> [u8; 4] {
        match self {
            Self::Hit(_) => *HIT_TAG,
            Self::Collision(_) => *COLLISION_TAG,
            Self::Opaque(chunk) => chunk.tag,
        }
    }

    pub fn tag_name(&self) -> String {
        decode_ascii_lossy(&self.tag())
    }

    pub fn is_structured(&self) -> bool {
        !matches!(self, Self::Opaque(_))
    }

    pub fn anim_hash(&self) -> u32 {
        match self {
            Self::Hit(chunk) => chunk.anim_hash,
            Self::Collision(chunk) => chunk.anim_hash,
            Self::Opaque(chunk) => chunk.anim_hash(),
        }
    }

    pub fn event_hash(&self) -> u32 {
        match self {
            Self::Hit(chunk) => chunk.event_hash,
            Self::Collision(chunk) => chunk.event_hash,
            Self::Opaque(chunk) => chunk.event_hash(),
        }
    }

    pub fn start_time(&self) -> f32 {
        match self {
            Self::Hit(chunk) => chunk.start_time,
            Self::Collision(chunk) => chunk.start_time,
            Self::Opaque(chunk) => chunk.start_time(),
        }
    }

    pub fn end_time(&self) -> f32 {
        match self {
            Self::Hit(chunk) => chunk.end_time,
            Self::Collision(chunk) => chunk.end_time,
            Self::Opaque(chunk) => chunk.end_time(),
        }
    }

    pub fn element_id(&self) -> u32 {
        match self {
            Self::Hit(chunk) => chunk.element_id,
            Self::Collision(chunk) => chunk.element_id,
            Self::Opaque(chunk) => chunk.element_id(),
        }
    }
}

/// A decoded event container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDocument {
    pub version: u32,
    #[serde(with = "hash32")]
    pub anim_hash: u32,
    /// Count from the header, written back as-is. Duplicate and delete set it
    /// to the new chunk total.
    pub chunk_count: u32,
    pub chunks: Vec<Chunk>,
    /// Bytes after the last chunk (only possible when no chunk was found)
    #[serde(with = "hex_bytes")]
    pub tail: Vec<u8>,
}

//! Event container decoding

use tracing::{debug, trace};

use super::types::{
    Chunk, CollisionChunk, CollisionPhase, EventDocument, HitChunk, HitPhase, OpaqueChunk, Point,
    Segment,
};
use crate::codec::{Reader, peek_u32};
use crate::verify::{Verified, verify_or_fallback};
use crate::{
    CHUNK_TAGS, COLLISION_TAG, FormatError, HIT_TAG, MAX_PHASE_SEGMENTS, META_HEADER_LEN,
    SEGMENT_SEPARATOR,
};

impl EventDocument {
    /// Decode an event container.
    ///
    /// Only a file shorter than its header is an error. Every chunk span is
    /// kept, structured when it verifies and opaque otherwise.
    pub fn decode(data: &[u8]) -> Result<Self, FormatError> {
        if data.len() < META_HEADER_LEN {
            return Err(FormatError::TruncatedInput {
                offset: data.len(),
                needed: META_HEADER_LEN - data.len(),
            });
        }

        let mut reader = Reader::new(data);
        let version = reader.read_u32()?;
        let anim_hash = reader.read_u32()?;
        let chunk_count = reader.read_u32()?;

        let starts = chunk_starts(data);
        let mut chunks = Vec::with_capacity(starts.len());
        for (i, &start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(data.len());
            chunks.push(decode_chunk(&data[start..end], start));
        }

        let tail = if starts.is_empty() {
            data[META_HEADER_LEN..].to_vec()
        } else {
            Vec::new()
        };

        if chunks.len() != chunk_count as usize {
            debug!(
                "header declares {} chunk(s), found {}",
                chunk_count,
                chunks.len()
            );
        }

        Ok(Self {
            version,
            anim_hash,
            chunk_count,
            chunks,
            tail,
        })
    }
}

/// Offsets of every chunk tag after the header. A match skips its four tag
/// bytes, so tags never overlap.
fn chunk_starts(data: &[u8]) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut pos = META_HEADER_LEN;
    while pos + 4 <= data.len() {
        if CHUNK_TAGS.iter().any(|tag| data[pos..pos + 4] == tag[..]) {
            starts.push(pos);
            pos += 4;
        } else {
            pos += 1;
        }
    }
    starts
}

fn decode_chunk(raw: &[u8], offset: usize) -> Chunk {
    let mut tag = [0u8; 4];
    tag.copy_from_slice(&raw[..4]);

    let reason = if &tag == HIT_TAG {
        match verify_or_fallback(raw, HitChunk::decode, HitChunk::encode) {
            Verified::Structured(chunk) => return Chunk::Hit(chunk),
            Verified::Fallback(err) => err,
        }
    } else if &tag == COLLISION_TAG {
        match verify_or_fallback(raw, CollisionChunk::decode, CollisionChunk::encode) {
            Verified::Structured(chunk) => return Chunk::Collision(chunk),
            Verified::Fallback(err) => err,
        }
    } else {
        return Chunk::Opaque(OpaqueChunk::new(tag, raw.to_vec()));
    };

    trace!("chunk at 0x{:04X} kept opaque: {}", offset, reason);
    Chunk::Opaque(OpaqueChunk::new(tag, raw.to_vec()))
}

/// Fields shared by hit and collision chunk headers
struct ChunkHeader {
    anim_hash: u32,
    event_hash: u32,
    start_time: f32,
    end_time: f32,
    element_id: u32,
    phase_count: u32,
}

fn read_chunk_header(
    reader: &mut Reader<'_>,
    expected: &[u8; 4],
) -> Result<ChunkHeader, FormatError> {
    if &reader.read_tag()? != expected {
        return Err(FormatError::StructuralMismatch {
            offset: 0,
            reason: "unexpected chunk tag",
        });
    }
    Ok(ChunkHeader {
        anim_hash: reader.read_u32()?,
        event_hash: reader.read_u32()?,
        start_time: reader.read_f32()?,
        end_time: reader.read_f32()?,
        element_id: reader.read_u32()?,
        phase_count: reader.read_u32()?,
    })
}

impl HitChunk {
    /// Decode one hit-phase chunk span (tag included).
    ///
    /// Phases are read while they fit; a declared phase or reference that
    /// runs past the span is a structural failure.
    pub fn decode(raw: &[u8]) -> Result<Self, FormatError> {
        let mut reader = Reader::new(raw);
        let header = read_chunk_header(&mut reader, HIT_TAG)?;

        let mut phases = Vec::new();
        for _ in 0..header.phase_count {
            let pos = reader.pos();
            let fits = peek_u32(raw, pos + 4)
                .and_then(|count| (count as usize).checked_mul(8))
                .and_then(|points| points.checked_add(pos + 8))
                .is_some_and(|end| end <= raw.len());
            if !fits {
                break;
            }
            let time = reader.read_f32()?;
            let count = reader.read_u32()?;
            let mut points = Vec::with_capacity(count as usize);
            for _ in 0..count {
                points.push(Point {
                    x: reader.read_f32()?,
                    y: reader.read_f32()?,
                });
            }
            phases.push(HitPhase { time, points });
        }
        if phases.len() != header.phase_count as usize {
            return Err(FormatError::StructuralMismatch {
                offset: reader.pos(),
                reason: "hit phase overruns chunk",
            });
        }

        let ref_count = reader.read_u32()?;
        if (ref_count as usize).saturating_mul(4) > reader.remaining() {
            return Err(FormatError::StructuralMismatch {
                offset: reader.pos(),
                reason: "reference list overruns chunk",
            });
        }
        let ref_hashes = (0..ref_count)
            .map(|_| reader.read_u32())
            .collect::<Result<Vec<_>, _>>()?;
        let footer_extra = raw[reader.pos()..].to_vec();

        Ok(Self {
            anim_hash: header.anim_hash,
            event_hash: header.event_hash,
            start_time: header.start_time,
            end_time: header.end_time,
            element_id: header.element_id,
            phases,
            ref_hashes,
            footer_extra,
        })
    }
}

impl CollisionChunk {
    /// Decode one collision chunk span (tag included). Any malformed phase
    /// fails the whole chunk.
    pub fn decode(raw: &[u8]) -> Result<Self, FormatError> {
        let mut reader = Reader::new(raw);
        let header = read_chunk_header(&mut reader, COLLISION_TAG)?;

        let mut phases = Vec::new();
        for _ in 0..header.phase_count {
            let time = reader.read_f32()?;
            let count_offset = reader.pos();
            let count = reader.read_u32()?;
            if count == 0 || count > MAX_PHASE_SEGMENTS {
                return Err(FormatError::StructuralMismatch {
                    offset: count_offset,
                    reason: "implausible segment count",
                });
            }
            let mut segments = Vec::with_capacity(count as usize);
            for _ in 0..count {
                segments.push(Segment {
                    x1: reader.read_f32()?,
                    y1: reader.read_f32()?,
                    x2: reader.read_f32()?,
                    y2: reader.read_f32()?,
                });
                let separator_offset = reader.pos();
                if reader.read_bytes(SEGMENT_SEPARATOR.len())? != SEGMENT_SEPARATOR {
                    return Err(FormatError::StructuralMismatch {
                        offset: separator_offset,
                        reason: "non-zero segment separator",
                    });
                }
            }
            phases.push(CollisionPhase { time, segments });
        }

        let ref_count = reader.read_u32()?;

        Ok(Self {
            anim_hash: header.anim_hash,
            event_hash: header.event_hash,
            start_time: header.start_time,
            end_time: header.end_time,
            element_id: header.element_id,
            phases,
            ref_count,
        })
    }
}

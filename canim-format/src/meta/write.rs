//! Event container encoding

use super::types::{Chunk, CollisionChunk, EventDocument, HitChunk, OpaqueChunk};
use crate::codec::{decode_ascii_lossy, write_f32, write_u32};
use crate::error::FormatError;
use crate::{COLLISION_TAG, HIT_TAG, SEGMENT_SEPARATOR};

impl EventDocument {
    /// Encode the container. Opaque chunks are written verbatim, so a
    /// document that was decoded and not edited reproduces its source.
    pub fn encode(&self) -> Result<Vec<u8>, FormatError> {
        let mut output = Vec::new();
        write_u32(&mut output, self.version);
        write_u32(&mut output, self.anim_hash);
        write_u32(&mut output, self.chunk_count);
        for (index, chunk) in self.chunks.iter().enumerate() {
            match chunk {
                Chunk::Hit(hit) => hit.encode_into(&mut output),
                Chunk::Collision(collision) => collision.encode_into(&mut output),
                Chunk::Opaque(opaque) => output.extend_from_slice(opaque.span(index)?),
            }
        }
        output.extend_from_slice(&self.tail);
        Ok(output)
    }

    /// Fail on the first opaque chunk that has no retained bytes
    pub fn require_spans(&self) -> Result<(), FormatError> {
        for (index, chunk) in self.chunks.iter().enumerate() {
            if let Chunk::Opaque(opaque) = chunk {
                opaque.span(index)?;
            }
        }
        Ok(())
    }
}

impl OpaqueChunk {
    fn span(&self, index: usize) -> Result<&[u8], FormatError> {
        self.raw
            .as_deref()
            .ok_or_else(|| FormatError::UnreconstructableRecord {
                index,
                name: decode_ascii_lossy(&self.tag),
                reason: "opaque chunk has no retained span",
            })
    }
}

fn write_chunk_header(
    output: &mut Vec<u8>,
    tag: &[u8; 4],
    fields: (u32, u32, f32, f32, u32),
    phase_count: usize,
) {
    let (anim_hash, event_hash, start_time, end_time, element_id) = fields;
    output.extend_from_slice(tag);
    write_u32(output, anim_hash);
    write_u32(output, event_hash);
    write_f32(output, start_time);
    write_f32(output, end_time);
    write_u32(output, element_id);
    write_u32(output, phase_count as u32);
}

impl HitChunk {
    pub fn encode(&self) -> Vec<u8> {
        let mut output = Vec::new();
        self.encode_into(&mut output);
        output
    }

    fn encode_into(&self, output: &mut Vec<u8>) {
        write_chunk_header(
            output,
            HIT_TAG,
            (
                self.anim_hash,
                self.event_hash,
                self.start_time,
                self.end_time,
                self.element_id,
            ),
            self.phases.len(),
        );
        for phase in &self.phases {
            write_f32(output, phase.time);
            write_u32(output, phase.points.len() as u32);
            for point in &phase.points {
                write_f32(output, point.x);
                write_f32(output, point.y);
            }
        }
        write_u32(output, self.ref_hashes.len() as u32);
        for hash in &self.ref_hashes {
            write_u32(output, *hash);
        }
        output.extend_from_slice(&self.footer_extra);
    }
}

impl CollisionChunk {
    pub fn encode(&self) -> Vec<u8> {
        let mut output = Vec::new();
        self.encode_into(&mut output);
        output
    }

    fn encode_into(&self, output: &mut Vec<u8>) {
        write_chunk_header(
            output,
            COLLISION_TAG,
            (
                self.anim_hash,
                self.event_hash,
                self.start_time,
                self.end_time,
                self.element_id,
            ),
            self.phases.len(),
        );
        for phase in &self.phases {
            write_f32(output, phase.time);
            write_u32(output, phase.segments.len() as u32);
            for segment in &phase.segments {
                write_f32(output, segment.x1);
                write_f32(output, segment.y1);
                write_f32(output, segment.x2);
                write_f32(output, segment.y2);
                output.extend_from_slice(&SEGMENT_SEPARATOR);
            }
        }
        write_u32(output, self.ref_count);
    }
}

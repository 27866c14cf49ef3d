//! Field edits on decoded event containers
//!
//! Indices are zero-based. Opaque chunks only support duplicate and delete.

use tracing::debug;

use super::types::{BoundingBox, Chunk, EventDocument};
use crate::FormatError;

impl EventDocument {
    pub fn chunk(&self, index: usize) -> Result<&Chunk, FormatError> {
        self.chunks.get(index).ok_or(FormatError::ChunkIndex {
            index,
            len: self.chunks.len(),
        })
    }

    pub fn chunk_mut(&mut self, index: usize) -> Result<&mut Chunk, FormatError> {
        let len = self.chunks.len();
        self.chunks
            .get_mut(index)
            .ok_or(FormatError::ChunkIndex { index, len })
    }

    /// Set a chunk's start and end times
    pub fn set_time_window(
        &mut self,
        index: usize,
        start: f32,
        end: f32,
    ) -> Result<(), FormatError> {
        match self.chunk_mut(index)? {
            Chunk::Hit(hit) => {
                hit.start_time = start;
                hit.end_time = end;
            }
            Chunk::Collision(collision) => {
                collision.start_time = start;
                collision.end_time = end;
            }
            Chunk::Opaque(opaque) => return Err(not_editable(index, &opaque.tag)),
        }
        debug!("chunk {} time window set to {}..{}", index, start, end);
        Ok(())
    }

    /// Replace one hit phase's shape with the corners of `bounds`
    pub fn set_bounding_box(
        &mut self,
        index: usize,
        phase: usize,
        bounds: BoundingBox,
    ) -> Result<(), FormatError> {
        let hit = match self.chunk_mut(index)? {
            Chunk::Hit(hit) => hit,
            other => return Err(not_editable(index, &other.tag())),
        };
        let len = hit.phases.len();
        let target = hit
            .phases
            .get_mut(phase)
            .ok_or(FormatError::PhaseIndex { index, phase, len })?;
        target.set_bounding_box(bounds);
        Ok(())
    }

    /// Scale a chunk's geometry. Hit phases scale about their own box
    /// centres; collision segments scale about the centre of the whole chunk.
    pub fn scale(&mut self, index: usize, factor: f32) -> Result<(), FormatError> {
        match self.chunk_mut(index)? {
            Chunk::Hit(hit) => hit.phases.iter_mut().for_each(|phase| phase.scale(factor)),
            Chunk::Collision(collision) => collision.scale(factor),
            Chunk::Opaque(opaque) => return Err(not_editable(index, &opaque.tag)),
        }
        Ok(())
    }

    pub fn translate(&mut self, index: usize, dx: f32, dy: f32) -> Result<(), FormatError> {
        match self.chunk_mut(index)? {
            Chunk::Hit(hit) => hit
                .phases
                .iter_mut()
                .for_each(|phase| phase.translate(dx, dy)),
            Chunk::Collision(collision) => collision.translate(dx, dy),
            Chunk::Opaque(opaque) => return Err(not_editable(index, &opaque.tag)),
        }
        Ok(())
    }

    /// Append a copy of a chunk; returns the copy's index
    pub fn duplicate(&mut self, index: usize) -> Result<usize, FormatError> {
        let copy = self.chunk(index)?.clone();
        self.chunks.push(copy);
        self.sync_chunk_count();
        Ok(self.chunks.len() - 1)
    }

    pub fn delete(&mut self, index: usize) -> Result<Chunk, FormatError> {
        self.chunk(index)?;
        let removed = self.chunks.remove(index);
        self.sync_chunk_count();
        Ok(removed)
    }

    /// Set the header's declared count to the number of chunks held
    pub fn sync_chunk_count(&mut self) {
        self.chunk_count = self.chunks.len() as u32;
    }
}

fn not_editable(index: usize, tag: &[u8; 4]) -> FormatError {
    FormatError::NotEditable {
        index,
        tag: crate::codec::decode_ascii_lossy(tag),
    }
}

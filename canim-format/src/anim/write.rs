//! Animation container encoder
//!
//! Retained spans are written as-is. Records without one are synthesized from
//! their fields, which only simple symbols support.

use crate::anim::types::{
    AnimBody, AnimDocument, AnimHeader, BuildEntry, Element, Section, Sprite, StandardBody,
    Symbol, SymbolBody,
};
use crate::codec::{write_f32, write_string, write_u8, write_u16, write_u32};
use crate::error::FormatError;

impl AnimDocument {
    /// Encode back to container bytes
    pub fn encode(&self) -> Result<Vec<u8>, FormatError> {
        let mut output = Vec::new();
        write_header(&mut output, &self.header);

        match &self.body {
            AnimBody::Minimal { metadata, symbol } => {
                let metadata = metadata.as_ref().ok_or_else(|| {
                    FormatError::UnreconstructableRecord {
                        index: 0,
                        name: self.header.name.clone(),
                        reason: "minimal layout has no retained metadata blob",
                    }
                })?;
                output.extend_from_slice(metadata);
                write_bare_symbol(&mut output, symbol)?;
            }
            AnimBody::Standard(body) => write_standard(&mut output, body)?,
        }

        output.extend_from_slice(&self.tail);
        Ok(output)
    }
}

impl Symbol {
    /// Append this symbol as a build-region record.
    ///
    /// `index` is the record's position in the build region, used for error
    /// reporting only.
    pub fn encode_into(&self, output: &mut Vec<u8>, index: usize) -> Result<(), FormatError> {
        if let Some(raw) = &self.raw {
            output.extend_from_slice(raw);
            return Ok(());
        }
        let sprites = match &self.body {
            SymbolBody::Simple { sprites } => sprites,
            SymbolBody::Composite { .. } => {
                return Err(self.unreconstructable(index, "composite symbol has no retained span"));
            }
            SymbolBody::Opaque { .. } => {
                return Err(self.unreconstructable(index, "opaque symbol has no retained span"));
            }
        };
        let count = u16::try_from(sprites.len())
            .map_err(|_| self.unreconstructable(index, "sprite count exceeds u16"))?;

        write_string(output, &self.name);
        write_u8(output, self.frame_rate);
        write_u16(output, count);
        for sprite in sprites {
            write_sprite(output, sprite);
        }
        Ok(())
    }

    fn unreconstructable(&self, index: usize, reason: &'static str) -> FormatError {
        FormatError::UnreconstructableRecord {
            index,
            name: self.name.clone(),
            reason,
        }
    }
}

fn write_header(output: &mut Vec<u8>, header: &AnimHeader) {
    output.extend_from_slice(&header.magic);
    write_u32(output, header.version);
    write_u16(output, header.layout_flag);
    write_u16(output, header.aux_flag);
    match header.name_bytes() {
        Some(raw) => {
            write_u32(output, raw.len() as u32);
            output.extend_from_slice(raw);
        }
        None => write_string(output, &header.name),
    }
    write_u8(output, header.frame_rate);
}

fn write_standard(output: &mut Vec<u8>, body: &StandardBody) -> Result<(), FormatError> {
    let counts = &body.counts;
    write_u16(output, counts.clips);
    write_u16(output, counts.sections);
    write_u16(output, counts.elements);
    write_u16(output, counts.aux);
    write_u16(output, counts.layers);

    for layer in &body.layers {
        write_string(output, layer);
    }
    for clip in &body.clips {
        write_string(output, &clip.name);
        write_u16(output, clip.value);
    }
    for section in body.sections.iter().flatten() {
        write_section(output, section);
    }

    for (index, entry) in body.build.iter().enumerate() {
        match entry {
            BuildEntry::Symbol(symbol) => symbol.encode_into(output, index)?,
            BuildEntry::Timeline(block) => {
                let raw = block
                    .raw
                    .as_ref()
                    .ok_or_else(|| FormatError::UnreconstructableRecord {
                        index,
                        name: block.name.clone(),
                        reason: "timeline block has no retained span",
                    })?;
                output.extend_from_slice(raw);
            }
        }
    }
    Ok(())
}

fn write_section(output: &mut Vec<u8>, section: &Section) {
    write_string(output, &section.name);
    write_u32(output, section.aux);
    write_u8(output, section.facing);
    write_u16(output, section.frame_count);
    write_u16(output, section.element_count);
    for element in &section.elements {
        write_element(output, element);
    }
}

fn write_element(output: &mut Vec<u8>, element: &Element) {
    write_u16(output, element.index);
    write_u16(output, element.aux1);
    write_u16(output, element.layer_index);
    write_u16(output, element.aux2);
    let m = &element.matrix;
    for value in [m.a, m.d, m.b, m.c, element.tx, element.ty] {
        write_f32(output, value);
    }
    write_u16(output, element.z_order);
    write_u8(output, element.kind);
    output.extend_from_slice(&element.color);
    output.extend_from_slice(&element.reserved);
}

fn write_sprite(output: &mut Vec<u8>, sprite: &Sprite) {
    write_u16(output, sprite.frame);
    write_u16(output, sprite.aux);
    write_string(output, &sprite.name);
    write_geometry(output, sprite);
}

fn write_geometry(output: &mut Vec<u8>, sprite: &Sprite) {
    for value in [sprite.width, sprite.height, sprite.pivot_x, sprite.pivot_y] {
        write_f32(output, value);
    }
}

/// The minimal layout's sprite list: name and geometry only
fn write_bare_symbol(output: &mut Vec<u8>, symbol: &Symbol) -> Result<(), FormatError> {
    if let Some(raw) = &symbol.raw {
        output.extend_from_slice(raw);
        return Ok(());
    }
    let SymbolBody::Simple { sprites } = &symbol.body else {
        return Err(symbol.unreconstructable(0, "minimal layout holds only a sprite list"));
    };
    for sprite in sprites {
        write_string(output, &sprite.name);
        write_geometry(output, sprite);
    }
    Ok(())
}

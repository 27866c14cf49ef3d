//! Human-readable overview of a decoded animation container

use std::fmt;

use crate::anim::types::{AnimBody, AnimDocument, BuildEntry, Symbol, SymbolShape};

/// Per-symbol overview line
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolRow {
    pub name: String,
    pub shape: SymbolShape,
    pub sprites: usize,
    pub placeholders: usize,
    /// Lowest and highest frame index among textured sprites
    pub frames: Option<(u16, u16)>,
    pub sub_symbols: usize,
    pub span_len: Option<usize>,
}

impl SymbolRow {
    fn new(symbol: &Symbol) -> Self {
        let sprites = symbol.sprites();
        let placeholders = sprites.iter().filter(|s| s.is_placeholder()).count();
        let frames = sprites
            .iter()
            .filter(|s| !s.is_placeholder())
            .map(|s| s.frame)
            .fold(None, |range: Option<(u16, u16)>, frame| match range {
                Some((lo, hi)) => Some((lo.min(frame), hi.max(frame))),
                None => Some((frame, frame)),
            });
        Self {
            name: symbol.name.clone(),
            shape: symbol.body.shape(),
            sprites: sprites.len(),
            placeholders,
            frames,
            sub_symbols: symbol.sub_symbols().len(),
            span_len: symbol.raw.as_ref().map(Vec::len),
        }
    }
}

/// Counts and per-symbol rows for `view`
#[derive(Debug, Clone, PartialEq)]
pub struct AnimSummary {
    pub name: String,
    pub frame_rate: u8,
    pub minimal: bool,
    pub layers: usize,
    pub declared_layers: u16,
    pub clips: usize,
    pub declared_clips: u16,
    /// `None` when sections are embedded in the build region
    pub sections: Option<usize>,
    pub declared_sections: u16,
    pub elements: usize,
    pub declared_elements: u16,
    pub simple_symbols: usize,
    pub composite_symbols: usize,
    pub opaque_symbols: usize,
    pub timeline_blocks: usize,
    pub sprites: usize,
    pub placeholder_sprites: usize,
    pub tail_len: usize,
    pub symbols: Vec<SymbolRow>,
}

impl AnimDocument {
    pub fn summary(&self) -> AnimSummary {
        let mut summary = AnimSummary {
            name: self.header.name.clone(),
            frame_rate: self.header.frame_rate,
            minimal: self.is_minimal(),
            layers: 0,
            declared_layers: 0,
            clips: 0,
            declared_clips: 0,
            sections: None,
            declared_sections: 0,
            elements: 0,
            declared_elements: 0,
            simple_symbols: 0,
            composite_symbols: 0,
            opaque_symbols: 0,
            timeline_blocks: 0,
            sprites: 0,
            placeholder_sprites: 0,
            tail_len: self.tail.len(),
            symbols: self.symbols().map(SymbolRow::new).collect(),
        };

        if let AnimBody::Standard(body) = &self.body {
            summary.layers = body.layers.len();
            summary.declared_layers = body.counts.layers;
            summary.clips = body.clips.len();
            summary.declared_clips = body.counts.clips;
            summary.declared_sections = body.counts.sections;
            summary.declared_elements = body.counts.elements;
            if let Some(sections) = &body.sections {
                summary.sections = Some(sections.len());
                summary.elements = sections.iter().map(|s| s.elements.len()).sum();
            }
            summary.timeline_blocks = body
                .build
                .iter()
                .filter(|entry| matches!(entry, BuildEntry::Timeline(_)))
                .count();
        }

        for row in &summary.symbols {
            match row.shape {
                SymbolShape::Simple => summary.simple_symbols += 1,
                SymbolShape::Composite => summary.composite_symbols += 1,
                SymbolShape::Opaque => summary.opaque_symbols += 1,
            }
            summary.sprites += row.sprites;
            summary.placeholder_sprites += row.placeholders;
        }
        summary
    }
}

impl fmt::Display for AnimSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Anim:     \"{}\"  rate={}fps", self.name, self.frame_rate)?;
        if self.minimal {
            writeln!(f, "Format:   minimal")?;
        } else {
            writeln!(f, "Layers:   {} (declared {})", self.layers, self.declared_layers)?;
            writeln!(f, "Clips:    {} (declared {})", self.clips, self.declared_clips)?;
            match self.sections {
                Some(count) => writeln!(
                    f,
                    "Sections: {}/{} ({}/{} elements)",
                    count, self.declared_sections, self.elements, self.declared_elements
                )?,
                None => writeln!(
                    f,
                    "Sections: embedded in build region (declared {}, {} elements)",
                    self.declared_sections, self.declared_elements
                )?,
            }
            if self.timeline_blocks > 0 {
                writeln!(f, "Timeline: {} block(s)", self.timeline_blocks)?;
            }
        }
        writeln!(
            f,
            "Symbols:  {} ({} simple, {} composite, {} opaque)  Sprites: {} ({} empty)",
            self.symbols.len(),
            self.simple_symbols,
            self.composite_symbols,
            self.opaque_symbols,
            self.sprites,
            self.placeholder_sprites
        )?;
        writeln!(f, "Trailing: {} byte(s)", self.tail_len)?;

        for row in &self.symbols {
            let frames = match row.frames {
                Some((lo, hi)) => format!("{lo}-{hi}"),
                None => "none".to_string(),
            };
            write!(
                f,
                "  {:<24} {:<9} spr={:<4} fr={}",
                format!("\"{}\"", row.name),
                row.shape,
                row.sprites,
                frames
            )?;
            if row.placeholders > 0 {
                write!(f, " ({} empty)", row.placeholders)?;
            }
            if row.sub_symbols > 0 {
                write!(f, " subs={}", row.sub_symbols)?;
            }
            if let Some(len) = row.span_len {
                write!(f, " span={len}B")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

//! Animation container decoder

use std::fmt;

use tracing::{debug, warn};

use crate::anim::probe::{
    SymbolScanner, is_empty_string, is_minimal_sprite_start, is_symbol_header, is_valid_name,
    looks_like_section, probe_bare_sprite, probe_count_prefixed, probe_sprite,
    probe_string_delimited,
};
use crate::anim::types::{
    AnimBody, AnimCounts, AnimDocument, AnimHeader, BuildEntry, Clip, CompositeLayout, Element,
    Matrix2, Section, StandardBody, Symbol, SymbolBody, TimelineBlock,
};
use crate::codec::Reader;
use crate::error::FormatError;
use crate::MIN_ANIM_FILE_LEN;

/// Candidate interpretations of a symbol body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyCandidate {
    /// `count` sprite records (or, for a zero count, nothing before the next header)
    SpriteList,
    /// u16 name count, u16 aux word, names; only after a zero-count header
    CountPrefixedComposite,
    /// Names back-to-back; only after a non-zero-count header
    StringDelimitedComposite,
    /// Everything up to the next symbol header
    OpaqueResync,
}

/// Order in which body candidates are tried. The first that decodes wins.
pub const BODY_PRIORITY: [BodyCandidate; 4] = [
    BodyCandidate::SpriteList,
    BodyCandidate::CountPrefixedComposite,
    BodyCandidate::StringDelimitedComposite,
    BodyCandidate::OpaqueResync,
];

impl BodyCandidate {
    /// Whether this candidate is considered for a header declaring `count`
    pub fn applies(self, count: u16) -> bool {
        match self {
            Self::SpriteList | Self::OpaqueResync => true,
            Self::CountPrefixedComposite => count == 0,
            Self::StringDelimitedComposite => count > 0,
        }
    }
}

/// Non-fatal observations made while decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Layer table ended on an invalid name before the declared count
    LayerTableShort {
        offset: usize,
        declared: u16,
        parsed: usize,
    },
    /// Clip table ended before the declared count
    ClipTableShort {
        offset: usize,
        declared: u16,
        parsed: usize,
    },
    /// Section block held a different number of elements than the header declares
    ElementCountMismatch {
        offset: usize,
        declared: u16,
        parsed: usize,
    },
    /// A sprite failed validation mid-list; the build region ends here
    SpriteListAborted {
        offset: usize,
        symbol: String,
        declared: u16,
        parsed: usize,
    },
    /// Both composite grammars decode the same bytes; needs manual review
    AmbiguousComposite { offset: usize, symbol: String },
}

impl Diagnostic {
    pub fn offset(&self) -> usize {
        match self {
            Self::LayerTableShort { offset, .. }
            | Self::ClipTableShort { offset, .. }
            | Self::ElementCountMismatch { offset, .. }
            | Self::SpriteListAborted { offset, .. }
            | Self::AmbiguousComposite { offset, .. } => *offset,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LayerTableShort {
                offset,
                declared,
                parsed,
            } => write!(
                f,
                "0x{offset:04X}: layer table has {parsed} of {declared} declared name(s)"
            ),
            Self::ClipTableShort {
                offset,
                declared,
                parsed,
            } => write!(
                f,
                "0x{offset:04X}: clip table has {parsed} of {declared} declared clip(s)"
            ),
            Self::ElementCountMismatch {
                offset,
                declared,
                parsed,
            } => write!(
                f,
                "0x{offset:04X}: sections hold {parsed} element(s), header declares {declared}"
            ),
            Self::SpriteListAborted {
                offset,
                symbol,
                declared,
                parsed,
            } => write!(
                f,
                "0x{offset:04X}: symbol \"{symbol}\" stopped after {parsed} of {declared} sprite(s)"
            ),
            Self::AmbiguousComposite { offset, symbol } => write!(
                f,
                "0x{offset:04X}: symbol \"{symbol}\" also parses as a count-prefixed composite"
            ),
        }
    }
}

/// Outcome of one body candidate
struct BodyParse {
    body: SymbolBody,
    end: usize,
    /// The sprite list stopped early; nothing after it is trusted
    aborted: bool,
}

impl AnimDocument {
    /// Decode an animation container
    pub fn decode(data: &[u8]) -> Result<Self, FormatError> {
        Self::decode_with_diagnostics(data).map(|(doc, _)| doc)
    }

    /// Decode an animation container, also returning non-fatal diagnostics
    pub fn decode_with_diagnostics(data: &[u8]) -> Result<(Self, Vec<Diagnostic>), FormatError> {
        if data.len() < MIN_ANIM_FILE_LEN {
            return Err(FormatError::TruncatedInput {
                offset: data.len(),
                needed: MIN_ANIM_FILE_LEN - data.len(),
            });
        }

        let mut reader = Reader::new(data);
        let magic = reader.read_tag()?;
        let version = reader.read_u32()?;
        let layout_flag = reader.read_u16()?;
        let aux_flag = reader.read_u16()?;
        let name_start = reader.pos() + 4;
        let name = reader.read_string()?;
        let name_bytes = &data[name_start..reader.pos()];
        let header = AnimHeader {
            magic,
            version,
            layout_flag,
            aux_flag,
            name,
            name_raw: (!name_bytes.is_ascii()).then(|| name_bytes.to_vec()),
            frame_rate: reader.read_u8()?,
        };

        let mut decoder = Decoder::new(data);

        if header.layout_flag == 0 {
            if let Some((body, end)) = decoder.read_minimal(&header, reader.pos()) {
                debug!("\"{}\": minimal layout", header.name);
                let doc = Self {
                    header,
                    body,
                    tail: data[end..].to_vec(),
                };
                return Ok((doc, decoder.diagnostics));
            }
        }

        let body = decoder.read_standard(&mut reader)?;
        let doc = Self {
            header,
            body: AnimBody::Standard(body),
            tail: data[reader.pos()..].to_vec(),
        };
        Ok((doc, decoder.diagnostics))
    }
}

struct Decoder<'a> {
    data: &'a [u8],
    scanner: SymbolScanner<'a>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            scanner: SymbolScanner::new(data),
            diagnostics: Vec::new(),
        }
    }

    fn note(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// Metadata blob, then bare sprites. `None` when no first sprite is found.
    fn read_minimal(&self, header: &AnimHeader, meta_start: usize) -> Option<(AnimBody, usize)> {
        let data = self.data;
        let sprite_start = (meta_start..data.len().saturating_sub(4))
            .find(|&pos| is_minimal_sprite_start(data, pos))?;

        let mut sprites = Vec::new();
        let mut pos = sprite_start;
        while pos + 4 < data.len() {
            let Some((sprite, next)) = probe_bare_sprite(data, pos) else {
                break;
            };
            sprites.push(sprite);
            pos = next;
        }

        let symbol = Symbol {
            name: header.name.clone(),
            frame_rate: header.frame_rate,
            count: sprites.len() as u16,
            body: SymbolBody::Simple { sprites },
            raw: Some(data[sprite_start..pos].to_vec()),
        };
        let body = AnimBody::Minimal {
            metadata: Some(data[meta_start..sprite_start].to_vec()),
            symbol,
        };
        Some((body, pos))
    }

    fn read_standard(&mut self, reader: &mut Reader<'a>) -> Result<StandardBody, FormatError> {
        let counts = AnimCounts {
            clips: reader.read_u16()?,
            sections: reader.read_u16()?,
            elements: reader.read_u16()?,
            aux: reader.read_u16()?,
            layers: reader.read_u16()?,
        };

        let layers = self.read_layers(reader, counts.layers);
        let clips = self.read_clips(reader, counts.clips);

        let sections = if looks_like_section(self.data, reader.pos(), layers.len()) {
            Some(self.read_sections(reader, &counts, layers.len()))
        } else {
            debug!("no fixed-layout sections at 0x{:04X}", reader.pos());
            None
        };

        let (build, end) = self.read_build(reader.pos());
        reader.seek(end);

        Ok(StandardBody {
            counts,
            layers,
            clips,
            sections,
            build,
        })
    }

    fn read_layers(&mut self, reader: &mut Reader<'a>, declared: u16) -> Vec<String> {
        let mut layers = Vec::with_capacity(declared as usize);
        for _ in 0..declared {
            if !is_valid_name(self.data, reader.pos()) {
                break;
            }
            match reader.read_string() {
                Ok(name) => layers.push(name),
                Err(_) => break,
            }
        }
        if layers.len() < declared as usize {
            self.note(Diagnostic::LayerTableShort {
                offset: reader.pos(),
                declared,
                parsed: layers.len(),
            });
        }
        layers
    }

    fn read_clips(&mut self, reader: &mut Reader<'a>, declared: u16) -> Vec<Clip> {
        let mut clips = Vec::with_capacity(declared as usize);
        for _ in 0..declared {
            if !is_valid_name(self.data, reader.pos()) {
                break;
            }
            // Commit only whole clips so a cut-off name stays in the stream
            let mut trial = reader.clone();
            match read_clip(&mut trial) {
                Ok(clip) => {
                    clips.push(clip);
                    *reader = trial;
                }
                Err(_) => break,
            }
        }
        if clips.len() < declared as usize {
            self.note(Diagnostic::ClipTableShort {
                offset: reader.pos(),
                declared,
                parsed: clips.len(),
            });
        }
        clips
    }

    fn read_sections(
        &mut self,
        reader: &mut Reader<'a>,
        counts: &AnimCounts,
        layer_count: usize,
    ) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut total = 0usize;

        for _ in 0..counts.sections {
            if !looks_like_section(self.data, reader.pos(), layer_count) {
                break;
            }
            let start = reader.pos();
            let Ok(mut section) = read_section_header(reader) else {
                reader.seek(start);
                break;
            };

            let mut cut = false;
            for _ in 0..section.element_count {
                let element_start = reader.pos();
                match read_element(reader) {
                    Ok(element) => section.elements.push(element),
                    Err(_) => {
                        reader.seek(element_start);
                        cut = true;
                        break;
                    }
                }
            }
            total += section.elements.len();
            sections.push(section);
            if cut {
                break;
            }
        }

        if total != counts.elements as usize {
            self.note(Diagnostic::ElementCountMismatch {
                offset: reader.pos(),
                declared: counts.elements,
                parsed: total,
            });
        }
        sections
    }

    /// Build region: symbols and timeline blocks until the data stops looking
    /// like records. Returns the entries and the offset where the tail begins.
    fn read_build(&mut self, mut pos: usize) -> (Vec<BuildEntry>, usize) {
        let data = self.data;
        let mut entries = Vec::new();

        while pos + 4 < data.len() {
            if !is_valid_name(data, pos) && !is_empty_string(data, pos) {
                break;
            }

            if is_symbol_header(data, pos) {
                let Ok((symbol, end, aborted)) = self.read_symbol(pos) else {
                    break;
                };
                entries.push(BuildEntry::Symbol(symbol));
                pos = end;
                if aborted {
                    break;
                }
            } else {
                let mut reader = Reader::at(data, pos);
                let Ok(name) = reader.read_string() else {
                    break;
                };
                let next = self.scanner.next_header(pos + 1);
                debug!(
                    "timeline block \"{}\" at 0x{:04X} ({} bytes)",
                    name,
                    pos,
                    next - pos
                );
                entries.push(BuildEntry::Timeline(TimelineBlock {
                    name,
                    raw: Some(data[pos..next].to_vec()),
                }));
                pos = next;
            }
        }

        (entries, pos)
    }

    fn read_symbol(&mut self, start: usize) -> Result<(Symbol, usize, bool), FormatError> {
        let mut reader = Reader::at(self.data, start);
        let name = reader.read_string()?;
        let frame_rate = reader.read_u8()?;
        let count = reader.read_u16()?;

        let parse = self.choose_body(&name, count, reader.pos());
        let symbol = Symbol {
            name,
            frame_rate,
            count,
            body: parse.body,
            raw: Some(self.data[start..parse.end].to_vec()),
        };
        Ok((symbol, parse.end, parse.aborted))
    }

    fn choose_body(&mut self, name: &str, count: u16, body_start: usize) -> BodyParse {
        for candidate in BODY_PRIORITY {
            if !candidate.applies(count) {
                continue;
            }
            if let Some(parse) = self.try_body(candidate, name, count, body_start) {
                debug!(
                    "symbol \"{}\" at 0x{:04X}: {:?} ({} bytes)",
                    name,
                    body_start,
                    candidate,
                    parse.end - body_start
                );
                return parse;
            }
        }
        self.opaque_body(body_start)
    }

    fn try_body(
        &mut self,
        candidate: BodyCandidate,
        name: &str,
        count: u16,
        body_start: usize,
    ) -> Option<BodyParse> {
        let data = self.data;
        match candidate {
            BodyCandidate::SpriteList if count == 0 => {
                // Nothing between this header and the next one
                (self.scanner.next_header(body_start) == body_start).then(|| BodyParse {
                    body: SymbolBody::Simple {
                        sprites: Vec::new(),
                    },
                    end: body_start,
                    aborted: false,
                })
            }
            BodyCandidate::SpriteList => {
                probe_sprite(data, body_start)?;
                let mut sprites = Vec::with_capacity(count as usize);
                let mut pos = body_start;
                let mut aborted = false;
                for _ in 0..count {
                    match probe_sprite(data, pos) {
                        Some((sprite, next)) => {
                            sprites.push(sprite);
                            pos = next;
                        }
                        None => {
                            aborted = true;
                            break;
                        }
                    }
                }
                if aborted {
                    self.note(Diagnostic::SpriteListAborted {
                        offset: pos,
                        symbol: name.to_string(),
                        declared: count,
                        parsed: sprites.len(),
                    });
                }
                Some(BodyParse {
                    body: SymbolBody::Simple { sprites },
                    end: pos,
                    aborted,
                })
            }
            BodyCandidate::CountPrefixedComposite => {
                let next = self.scanner.next_header(body_start);
                if next <= body_start {
                    return None;
                }
                let (aux, sub_symbols) = probe_count_prefixed(data, body_start, next)?;
                Some(BodyParse {
                    body: SymbolBody::Composite {
                        layout: CompositeLayout::CountPrefixed { aux },
                        sub_symbols,
                    },
                    end: next,
                    aborted: false,
                })
            }
            BodyCandidate::StringDelimitedComposite => {
                if !is_valid_name(data, body_start) {
                    return None;
                }
                let (sub_symbols, names_end) = probe_string_delimited(data, body_start, count);
                let next = self.scanner.next_header(names_end);
                if probe_count_prefixed(data, body_start, next).is_some() {
                    self.note(Diagnostic::AmbiguousComposite {
                        offset: body_start,
                        symbol: name.to_string(),
                    });
                }
                Some(BodyParse {
                    body: SymbolBody::Composite {
                        layout: CompositeLayout::StringDelimited,
                        sub_symbols,
                    },
                    end: next,
                    aborted: false,
                })
            }
            BodyCandidate::OpaqueResync => Some(self.opaque_body(body_start)),
        }
    }

    fn opaque_body(&mut self, body_start: usize) -> BodyParse {
        let next = self.scanner.next_header(body_start);
        BodyParse {
            body: SymbolBody::Opaque {
                payload_len: next - body_start,
            },
            end: next,
            aborted: false,
        }
    }
}

fn read_clip(reader: &mut Reader<'_>) -> Result<Clip, FormatError> {
    Ok(Clip {
        name: reader.read_string()?,
        value: reader.read_u16()?,
    })
}

fn read_section_header(reader: &mut Reader<'_>) -> Result<Section, FormatError> {
    Ok(Section {
        name: reader.read_string()?,
        aux: reader.read_u32()?,
        facing: reader.read_u8()?,
        frame_count: reader.read_u16()?,
        element_count: reader.read_u16()?,
        elements: Vec::new(),
    })
}

fn read_element(reader: &mut Reader<'_>) -> Result<Element, FormatError> {
    let index = reader.read_u16()?;
    let aux1 = reader.read_u16()?;
    let layer_index = reader.read_u16()?;
    let aux2 = reader.read_u16()?;
    // file order: a, d, b, c
    let a = reader.read_f32()?;
    let d = reader.read_f32()?;
    let b = reader.read_f32()?;
    let c = reader.read_f32()?;
    Ok(Element {
        index,
        aux1,
        layer_index,
        aux2,
        matrix: Matrix2 { a, b, c, d },
        tx: reader.read_f32()?,
        ty: reader.read_f32()?,
        z_order: reader.read_u16()?,
        kind: reader.read_u8()?,
        color: reader.read_array()?,
        reserved: reader.read_array()?,
    })
}

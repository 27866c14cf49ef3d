//! Animation container document model

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::decode_ascii_lossy;
use crate::serde_util::{float, hex_bytes, hex_bytes_opt, tag4};

/// Fixed header fields, written back verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimHeader {
    #[serde(with = "tag4")]
    pub magic: [u8; 4],
    pub version: u32,
    /// Zero selects the minimal layout (when a bare sprite list is found)
    pub layout_flag: u16,
    pub aux_flag: u16,
    pub name: String,
    /// Source bytes of a name that did not decode as plain ASCII
    #[serde(
        default,
        with = "hex_bytes_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub name_raw: Option<Vec<u8>>,
    pub frame_rate: u8,
}

impl AnimHeader {
    /// Bytes to write for the name: the source bytes while they still decode
    /// to `name`, else `name` itself
    pub fn name_bytes(&self) -> Option<&[u8]> {
        self.name_raw
            .as_deref()
            .filter(|raw| decode_ascii_lossy(raw) == self.name)
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.name_raw = None;
    }
}

/// The five header counts of the standard layout.
///
/// These are declared values. They are never recomputed from the tables, so a
/// file whose tables are shorter than declared still round-trips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimCounts {
    pub clips: u16,
    pub sections: u16,
    pub elements: u16,
    pub aux: u16,
    pub layers: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub name: String,
    pub value: u16,
}

/// 2x2 transform. Stored on disk in the order a, d, b, c.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix2 {
    #[serde(with = "float")]
    pub a: f32,
    #[serde(with = "float")]
    pub b: f32,
    #[serde(with = "float")]
    pub c: f32,
    #[serde(with = "float")]
    pub d: f32,
}

impl Matrix2 {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
    };
}

/// One placed layer inside a section frame (43 bytes on disk)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub index: u16,
    pub aux1: u16,
    /// Index into the layer table; may dangle
    pub layer_index: u16,
    pub aux2: u16,
    pub matrix: Matrix2,
    #[serde(with = "float")]
    pub tx: f32,
    #[serde(with = "float")]
    pub ty: f32,
    pub z_order: u16,
    pub kind: u8,
    /// RGBA
    pub color: [u8; 4],
    pub reserved: [u8; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub aux: u32,
    pub facing: u8,
    pub frame_count: u16,
    /// Declared element count; `elements` may be shorter when the section was cut off
    pub element_count: u16,
    pub elements: Vec<Element>,
}

/// One frame of a simple symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub frame: u16,
    pub aux: u16,
    /// Empty for a placeholder sprite with no texture
    pub name: String,
    #[serde(with = "float")]
    pub width: f32,
    #[serde(with = "float")]
    pub height: f32,
    #[serde(with = "float")]
    pub pivot_x: f32,
    #[serde(with = "float")]
    pub pivot_y: f32,
}

impl Sprite {
    pub fn is_placeholder(&self) -> bool {
        self.name.is_empty()
    }
}

/// How a composite symbol lists its sub-symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompositeLayout {
    /// Zero-count header, then a u16 name count and a u16 auxiliary word
    CountPrefixed { aux: u16 },
    /// Non-zero header count, names follow back-to-back
    StringDelimited,
}

/// The shape discovered for a symbol's body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum SymbolBody {
    Simple {
        sprites: Vec<Sprite>,
    },
    Composite {
        layout: CompositeLayout,
        sub_symbols: Vec<String>,
    },
    /// Uninterpreted payload; its bytes live only in the symbol's retained span
    Opaque {
        payload_len: usize,
    },
}

/// Which of the three body shapes a symbol has
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolShape {
    Simple,
    Composite,
    Opaque,
}

impl SymbolShape {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Composite => "composite",
            Self::Opaque => "opaque",
        }
    }
}

impl fmt::Display for SymbolShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl SymbolBody {
    pub fn shape(&self) -> SymbolShape {
        match self {
            Self::Simple { .. } => SymbolShape::Simple,
            Self::Composite { .. } => SymbolShape::Composite,
            Self::Opaque { .. } => SymbolShape::Opaque,
        }
    }
}

/// A named animation record from the build region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub frame_rate: u8,
    /// Count declared in the symbol header
    pub count: u16,
    pub body: SymbolBody,
    /// Exact source bytes, header included. Cleared by edits.
    #[serde(
        default,
        with = "hex_bytes_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub raw: Option<Vec<u8>>,
}

impl Symbol {
    /// A new simple symbol with no retained span
    pub fn simple(name: impl Into<String>, frame_rate: u8, sprites: Vec<Sprite>) -> Self {
        Self {
            name: name.into(),
            frame_rate,
            count: sprites.len() as u16,
            body: SymbolBody::Simple { sprites },
            raw: None,
        }
    }

    pub fn sprites(&self) -> &[Sprite] {
        match &self.body {
            SymbolBody::Simple { sprites } => sprites,
            _ => &[],
        }
    }

    /// Mutable sprite list of a simple symbol. Drops the retained span.
    pub fn sprites_mut(&mut self) -> Option<&mut Vec<Sprite>> {
        match &mut self.body {
            SymbolBody::Simple { sprites } => {
                self.raw = None;
                Some(sprites)
            }
            _ => None,
        }
    }

    pub fn set_frame_rate(&mut self, frame_rate: u8) {
        self.frame_rate = frame_rate;
        self.raw = None;
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.raw = None;
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.body, SymbolBody::Composite { .. })
    }

    pub fn sub_symbols(&self) -> &[String] {
        match &self.body {
            SymbolBody::Composite { sub_symbols, .. } => sub_symbols,
            _ => &[],
        }
    }
}

/// A build entry without a symbol header: a name and an opaque payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineBlock {
    pub name: String,
    #[serde(
        default,
        with = "hex_bytes_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub raw: Option<Vec<u8>>,
}

/// One record of the build region, in on-disk order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum BuildEntry {
    Symbol(Symbol),
    Timeline(TimelineBlock),
}

impl BuildEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::Symbol(symbol) => &symbol.name,
            Self::Timeline(block) => &block.name,
        }
    }

    pub fn raw(&self) -> Option<&[u8]> {
        match self {
            Self::Symbol(symbol) => symbol.raw.as_deref(),
            Self::Timeline(block) => block.raw.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardBody {
    pub counts: AnimCounts,
    pub layers: Vec<String>,
    pub clips: Vec<Clip>,
    /// `None` when no fixed-layout section block was detected
    pub sections: Option<Vec<Section>>,
    pub build: Vec<BuildEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum AnimBody {
    /// Metadata blob plus one bare sprite list. The symbol mirrors the header's
    /// name and frame rate; only its sprites (or retained span) are written.
    Minimal {
        #[serde(
            default,
            with = "hex_bytes_opt",
            skip_serializing_if = "Option::is_none"
        )]
        metadata: Option<Vec<u8>>,
        symbol: Symbol,
    },
    Standard(StandardBody),
}

/// A decoded animation container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimDocument {
    pub header: AnimHeader,
    pub body: AnimBody,
    /// Bytes after the last recognised record
    #[serde(with = "hex_bytes")]
    pub tail: Vec<u8>,
}

impl AnimDocument {
    /// Every symbol in on-disk order
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        let (minimal, build): (Option<&Symbol>, &[BuildEntry]) = match &self.body {
            AnimBody::Minimal { symbol, .. } => (Some(symbol), &[]),
            AnimBody::Standard(body) => (None, &body.build),
        };
        minimal.into_iter().chain(build.iter().filter_map(|entry| match entry {
            BuildEntry::Symbol(symbol) => Some(symbol),
            BuildEntry::Timeline(_) => None,
        }))
    }

    pub fn symbols_mut(&mut self) -> impl Iterator<Item = &mut Symbol> {
        let (minimal, build): (Option<&mut Symbol>, &mut [BuildEntry]) = match &mut self.body {
            AnimBody::Minimal { symbol, .. } => (Some(symbol), Default::default()),
            AnimBody::Standard(body) => (None, &mut body.build),
        };
        minimal
            .into_iter()
            .chain(build.iter_mut().filter_map(|entry| match entry {
                BuildEntry::Symbol(symbol) => Some(symbol),
                BuildEntry::Timeline(_) => None,
            }))
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols().find(|symbol| symbol.name == name)
    }

    pub fn symbol_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.symbols_mut().find(|symbol| symbol.name == name)
    }

    pub fn is_minimal(&self) -> bool {
        matches!(self.body, AnimBody::Minimal { .. })
    }

    pub fn layers(&self) -> &[String] {
        match &self.body {
            AnimBody::Standard(body) => &body.layers,
            AnimBody::Minimal { .. } => &[],
        }
    }
}

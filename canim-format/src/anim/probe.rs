//! Structural predicates for the animation build region
//!
//! These are pure functions over the file buffer. None of them move a cursor
//! or return errors: a failed predicate is a branch decision, not a fault.

use crate::anim::types::Sprite;
use crate::codec::{Reader, peek_f32, peek_u16, peek_u32};
use crate::{
    KNOWN_FRAME_RATES, MAX_COMPOSITE_NAMES, MAX_DANGLING_LAYER, MAX_NAME_LEN, MAX_SECTION_COUNT,
    MAX_SPRITE_COORD, MAX_SPRITE_EXTENT, MAX_SYMBOL_SPRITES,
};

/// A length-prefixed string of 1..=300 printable ASCII bytes starts at `pos`
pub fn is_valid_name(data: &[u8], pos: usize) -> bool {
    name_span(data, pos).is_some()
}

/// Byte range of a valid name's text, if one starts at `pos`
fn name_span(data: &[u8], pos: usize) -> Option<(usize, usize)> {
    let len = peek_u32(data, pos)?;
    if len == 0 || len > MAX_NAME_LEN {
        return None;
    }
    let start = pos + 4;
    let end = start + len as usize;
    let text = data.get(start..end)?;
    text.iter()
        .all(|b| (0x20..0x7F).contains(b))
        .then_some((start, end))
}

/// A zero length prefix starts at `pos`
pub fn is_empty_string(data: &[u8], pos: usize) -> bool {
    peek_u32(data, pos) == Some(0)
}

pub fn is_reasonable(value: f32) -> bool {
    value.is_finite() && (-MAX_SPRITE_COORD..=MAX_SPRITE_COORD).contains(&value)
}

fn is_valid_extent(value: f32) -> bool {
    (0.0..=MAX_SPRITE_EXTENT).contains(&value)
}

fn read_geometry(reader: &mut Reader<'_>) -> Option<[f32; 4]> {
    Some([
        reader.read_f32().ok()?,
        reader.read_f32().ok()?,
        reader.read_f32().ok()?,
        reader.read_f32().ok()?,
    ])
}

fn geometry_is_valid([width, height, pivot_x, pivot_y]: [f32; 4]) -> bool {
    [width, height, pivot_x, pivot_y]
        .into_iter()
        .all(is_reasonable)
        && is_valid_extent(width)
        && is_valid_extent(height)
}

/// Trial decode of one sprite record at `pos`.
///
/// A zero-length name is a placeholder; its geometry is taken as-is. A named
/// sprite must pass the name and geometry checks. Returns the sprite and the
/// offset just past it.
pub fn probe_sprite(data: &[u8], pos: usize) -> Option<(Sprite, usize)> {
    let mut reader = Reader::at(data, pos);
    let frame = reader.read_u16().ok()?;
    let aux = reader.read_u16().ok()?;

    let name = if is_empty_string(data, reader.pos()) {
        reader.read_u32().ok()?;
        String::new()
    } else if is_valid_name(data, reader.pos()) {
        reader.read_string().ok()?
    } else {
        return None;
    };

    let geometry = read_geometry(&mut reader)?;
    if !name.is_empty() && !geometry_is_valid(geometry) {
        return None;
    }

    let [width, height, pivot_x, pivot_y] = geometry;
    let sprite = Sprite {
        frame,
        aux,
        name,
        width,
        height,
        pivot_x,
        pivot_y,
    };
    Some((sprite, reader.pos()))
}

/// Trial decode of a bare sprite (name and geometry only) at `pos`
pub fn probe_bare_sprite(data: &[u8], pos: usize) -> Option<(Sprite, usize)> {
    if !is_valid_name(data, pos) {
        return None;
    }
    let mut reader = Reader::at(data, pos);
    let name = reader.read_string().ok()?;
    let geometry = read_geometry(&mut reader)?;
    if !geometry_is_valid(geometry) {
        return None;
    }

    let [width, height, pivot_x, pivot_y] = geometry;
    let sprite = Sprite {
        frame: 0,
        aux: 0,
        name,
        width,
        height,
        pivot_x,
        pivot_y,
    };
    Some((sprite, reader.pos()))
}

/// First bare sprite of the minimal layout: a hyphenated name followed by a
/// plausible, strictly positive width and height
pub fn is_minimal_sprite_start(data: &[u8], pos: usize) -> bool {
    let Some((start, end)) = name_span(data, pos) else {
        return false;
    };
    if !data[start..end].contains(&b'-') {
        return false;
    }
    if data.len() < end + 16 {
        return false;
    }
    let plausible = |value: Option<f32>| value.is_some_and(|v| v > 0.0 && v < MAX_SPRITE_EXTENT);
    plausible(peek_f32(data, end)) && plausible(peek_f32(data, end + 4))
}

/// A symbol header starts at `pos`: a valid name without `/`, a known frame
/// rate and a sprite count no larger than 5000
pub fn is_symbol_header(data: &[u8], pos: usize) -> bool {
    let Some((start, end)) = name_span(data, pos) else {
        return false;
    };
    if end + 3 > data.len() {
        return false;
    }
    let rate = data[end];
    let Some(count) = peek_u16(data, end + 1) else {
        return false;
    };
    KNOWN_FRAME_RATES.contains(&rate)
        && count <= MAX_SYMBOL_SPRITES
        && !data[start..end].contains(&b'/')
}

/// Forward scanner for the next symbol header.
///
/// Remembers the last answer so repeated lookups from inside an already
/// scanned gap do not rescan it.
#[derive(Debug)]
pub struct SymbolScanner<'a> {
    data: &'a [u8],
    last: Option<(usize, usize)>,
}

impl<'a> SymbolScanner<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, last: None }
    }

    /// Offset of the first symbol header at or after `from`, or the buffer
    /// length when there is none. The last 7 bytes are never scanned.
    pub fn next_header(&mut self, from: usize) -> usize {
        if let Some((start, found)) = self.last {
            if start <= from && from <= found {
                return found;
            }
        }
        let limit = self.data.len().saturating_sub(7);
        let found = (from..limit)
            .find(|&pos| is_symbol_header(self.data, pos))
            .unwrap_or(self.data.len());
        self.last = Some((from, found));
        found
    }
}

/// A fixed-layout section header starts at `pos`.
///
/// The frame and element counts must each be at most 10000 and not both
/// zero. When the first element is visible, its layer index must be in range
/// or small enough to be a tolerated dangling reference.
pub fn looks_like_section(data: &[u8], pos: usize, layer_count: usize) -> bool {
    let Some((_, end)) = name_span(data, pos) else {
        return false;
    };
    if end + 9 > data.len() {
        return false;
    }
    // skip aux (4) and facing (1)
    let (Some(frame_count), Some(element_count)) = (peek_u16(data, end + 5), peek_u16(data, end + 7))
    else {
        return false;
    };
    if frame_count > MAX_SECTION_COUNT || element_count > MAX_SECTION_COUNT {
        return false;
    }
    if frame_count == 0 && element_count == 0 {
        return false;
    }
    if element_count > 0 {
        if let Some(layer) = peek_u16(data, end + 9 + 4) {
            if layer as usize >= layer_count && layer > MAX_DANGLING_LAYER {
                return false;
            }
        }
    }
    true
}

/// A count-prefixed sub-symbol list at `pos`, bounded by the next header at
/// `next`.
///
/// Layout: u16 name count (1..=199), u16 auxiliary word, then exactly that
/// many valid names, all ending at or before `next`.
pub fn probe_count_prefixed(data: &[u8], pos: usize, next: usize) -> Option<(u16, Vec<String>)> {
    let count = peek_u16(data, pos)?;
    let aux = peek_u16(data, pos + 2)?;
    if count == 0 || count >= MAX_COMPOSITE_NAMES || pos + 4 >= next {
        return None;
    }
    let mut reader = Reader::at(data, pos + 4);
    let mut names = Vec::with_capacity(count as usize);
    for _ in 0..count {
        if !is_valid_name(data, reader.pos()) {
            return None;
        }
        names.push(reader.read_string().ok()?);
    }
    (reader.pos() <= next).then_some((aux, names))
}

/// A string-delimited sub-symbol list at `pos`.
///
/// Reads names back-to-back until `count` are collected, the next position is
/// not a valid name, or the next position is a symbol header whose body opens
/// with a sprite. Returns the names and the offset past the last one.
pub fn probe_string_delimited(data: &[u8], pos: usize, count: u16) -> (Vec<String>, usize) {
    let mut reader = Reader::at(data, pos);
    let mut names = Vec::new();
    while is_valid_name(data, reader.pos()) {
        if opens_sprite_list(data, reader.pos()) {
            break;
        }
        let Ok(name) = reader.read_string() else {
            break;
        };
        names.push(name);
        if names.len() >= count as usize {
            break;
        }
    }
    (names, reader.pos())
}

/// A symbol header at `pos` immediately followed by a decodable sprite
fn opens_sprite_list(data: &[u8], pos: usize) -> bool {
    if !is_symbol_header(data, pos) {
        return false;
    }
    name_span(data, pos).is_some_and(|(_, end)| probe_sprite(data, end + 3).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{write_f32, write_string, write_u8, write_u16};

    fn header(name: &str, rate: u8, count: u16) -> Vec<u8> {
        let mut out = Vec::new();
        write_string(&mut out, name);
        write_u8(&mut out, rate);
        write_u16(&mut out, count);
        out
    }

    fn sprite(name: &str, w: f32, h: f32) -> Vec<u8> {
        let mut out = Vec::new();
        write_u16(&mut out, 3);
        write_u16(&mut out, 0);
        write_string(&mut out, name);
        for v in [w, h, 1.0, 2.0] {
            write_f32(&mut out, v);
        }
        out
    }

    #[test]
    fn test_valid_name_bounds() {
        let mut data = Vec::new();
        write_string(&mut data, "ok");
        assert!(is_valid_name(&data, 0));

        let mut empty = Vec::new();
        write_string(&mut empty, "");
        assert!(!is_valid_name(&empty, 0));
        assert!(is_empty_string(&empty, 0));

        let mut control = Vec::new();
        write_string(&mut control, "a\tb");
        assert!(!is_valid_name(&control, 0));

        let long = "x".repeat(301);
        let mut too_long = Vec::new();
        write_string(&mut too_long, &long);
        assert!(!is_valid_name(&too_long, 0));
    }

    #[test]
    fn test_symbol_header_predicate() {
        assert!(is_symbol_header(&header("walk", 24, 3), 0));
        assert!(!is_symbol_header(&header("walk", 23, 3), 0));
        assert!(!is_symbol_header(&header("walk", 24, 5001), 0));
        assert!(!is_symbol_header(&header("Slot0/walk", 24, 3), 0));
        // header cut short before the count
        let data = header("walk", 24, 3);
        assert!(!is_symbol_header(&data[..data.len() - 1], 0));
    }

    #[test]
    fn test_sprite_rejects_oversized_width() {
        let data = sprite("arm", 6000.0, 10.0);
        assert!(probe_sprite(&data, 0).is_none());

        let data = sprite("arm", 5000.0, 10.0);
        let (decoded, end) = probe_sprite(&data, 0).unwrap();
        assert_eq!(decoded.width, 5000.0);
        assert_eq!(end, data.len());
    }

    #[test]
    fn test_placeholder_sprite_skips_geometry_checks() {
        let data = sprite("", f32::NAN, -1.0);
        let (decoded, _) = probe_sprite(&data, 0).unwrap();
        assert!(decoded.is_placeholder());
        assert!(decoded.width.is_nan());
    }

    #[test]
    fn test_minimal_sprite_start() {
        let mut data = Vec::new();
        write_string(&mut data, "a-1");
        for v in [10.0, 10.0, 0.0, 0.0] {
            write_f32(&mut data, v);
        }
        assert!(is_minimal_sprite_start(&data, 0));

        let mut flat = Vec::new();
        write_string(&mut flat, "a-1");
        for v in [0.0, 10.0, 0.0, 0.0] {
            write_f32(&mut flat, v);
        }
        assert!(!is_minimal_sprite_start(&flat, 0));
    }

    #[test]
    fn test_scanner_memoizes_and_finds_header() {
        let mut data = vec![0xEE; 5];
        let at = data.len();
        data.extend(header("run", 12, 0));
        data.extend([0u8; 8]);

        let mut scanner = SymbolScanner::new(&data);
        assert_eq!(scanner.next_header(0), at);
        assert_eq!(scanner.next_header(2), at);
        assert_eq!(scanner.next_header(at), at);
        assert_eq!(scanner.next_header(at + 1), data.len());
    }

    #[test]
    fn test_section_predicate() {
        let mut data = Vec::new();
        write_string(&mut data, "front");
        data.extend(0u32.to_le_bytes());
        write_u8(&mut data, 1);
        write_u16(&mut data, 4);
        write_u16(&mut data, 1);
        // element: index, aux1, layer index
        write_u16(&mut data, 0);
        write_u16(&mut data, 0);
        write_u16(&mut data, 2);
        assert!(looks_like_section(&data, 0, 3));

        // out-of-range layer index above the dangling tolerance
        let len = data.len();
        data[len - 2..].copy_from_slice(&500u16.to_le_bytes());
        assert!(!looks_like_section(&data, 0, 3));
    }

    #[test]
    fn test_count_prefixed_list() {
        let mut data = Vec::new();
        write_u16(&mut data, 2);
        write_u16(&mut data, 9);
        write_string(&mut data, "head");
        write_string(&mut data, "torso");
        let end = data.len();
        data.extend([0u8; 4]);

        let (aux, names) = probe_count_prefixed(&data, 0, data.len()).unwrap();
        assert_eq!(aux, 9);
        assert_eq!(names, vec!["head", "torso"]);
        // names must not run into the next header
        assert!(probe_count_prefixed(&data, 0, end - 1).is_none());
    }

    #[test]
    fn test_string_delimited_stops_at_sprite_symbol() {
        let mut data = Vec::new();
        write_string(&mut data, "leg");
        data.extend(header("arm", 24, 1));
        data.extend(sprite("arm_0", 8.0, 8.0));

        let (names, end) = probe_string_delimited(&data, 0, 5);
        assert_eq!(names, vec!["leg"]);
        assert_eq!(end, 7);
    }
}

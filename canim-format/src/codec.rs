//! Primitive codec: little-endian integers, floats and length-prefixed ASCII strings
//!
//! Every read is bounds-checked against the end of the buffer. Writers are the
//! exact structural inverse and never fail.

use crate::error::FormatError;
use crate::MAX_STRING_LEN;

/// Glyph substituted for non-ASCII bytes when decoding strings
pub const REPLACEMENT_GLYPH: char = '\u{FFFD}';

/// Forward-only cursor over a byte buffer
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Take `n` bytes, advancing the cursor
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(FormatError::TruncatedInput {
                offset: self.pos,
                needed: n,
            })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.read_bytes(N)?);
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, FormatError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, FormatError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, FormatError> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    pub fn read_tag(&mut self) -> Result<[u8; 4], FormatError> {
        self.read_array()
    }

    /// Read a 32-bit length-prefixed string, decoded as lossy ASCII
    pub fn read_string(&mut self) -> Result<String, FormatError> {
        let start = self.pos;
        let len = self.read_u32()?;
        if len > MAX_STRING_LEN {
            self.pos = start;
            return Err(FormatError::OversizedDeclaredLength {
                offset: start,
                length: len,
            });
        }
        match self.read_bytes(len as usize) {
            Ok(bytes) => Ok(decode_ascii_lossy(bytes)),
            Err(err) => {
                self.pos = start;
                Err(err)
            }
        }
    }
}

/// Decode bytes as ASCII, replacing anything above 0x7F with a placeholder glyph.
///
/// One char per byte, so offsets computed from the text stay aligned.
pub fn decode_ascii_lossy(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { REPLACEMENT_GLYPH })
        .collect()
}

pub fn peek_u16(data: &[u8], pos: usize) -> Option<u16> {
    let bytes = data.get(pos..pos.checked_add(2)?)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

pub fn peek_u32(data: &[u8], pos: usize) -> Option<u32> {
    let bytes = data.get(pos..pos.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub fn peek_f32(data: &[u8], pos: usize) -> Option<f32> {
    peek_u32(data, pos).map(f32::from_bits)
}

pub fn write_u8(output: &mut Vec<u8>, value: u8) {
    output.push(value);
}

pub fn write_u16(output: &mut Vec<u8>, value: u16) {
    output.extend_from_slice(&value.to_le_bytes());
}

pub fn write_u32(output: &mut Vec<u8>, value: u32) {
    output.extend_from_slice(&value.to_le_bytes());
}

pub fn write_f32(output: &mut Vec<u8>, value: f32) {
    output.extend_from_slice(&value.to_le_bytes());
}

/// Write a 32-bit length prefix followed by the ASCII bytes of `text`.
///
/// Non-ASCII chars (including the decode placeholder) are written as `?`.
pub fn write_string(output: &mut Vec<u8>, text: &str) {
    let bytes: Vec<u8> = text
        .chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect();
    write_u32(output, bytes.len() as u32);
    output.extend_from_slice(&bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_bytes(text: &[u8]) -> Vec<u8> {
        let mut out = (text.len() as u32).to_le_bytes().to_vec();
        out.extend_from_slice(text);
        out
    }

    #[test]
    fn test_read_integers() {
        let data = [0x2A, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.read_u8().unwrap(), 0x2A);
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_u32().unwrap(), 0x12345678);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_read_past_end_is_truncated() {
        let data = [0u8; 3];
        let mut reader = Reader::at(&data, 1);
        let err = reader.read_u32().unwrap_err();
        assert!(matches!(
            err,
            FormatError::TruncatedInput {
                offset: 1,
                needed: 4
            }
        ));
        // Cursor does not move on failure
        assert_eq!(reader.pos(), 1);
    }

    #[test]
    fn test_read_string_lossy() {
        let data = string_bytes(b"ab\xFFc");
        let mut reader = Reader::new(&data);
        let text = reader.read_string().unwrap();
        assert_eq!(text, "ab\u{FFFD}c");
        assert_eq!(text.chars().count(), 4);
        assert_eq!(reader.pos(), 8);
    }

    #[test]
    fn test_read_string_oversized() {
        let data = 501u32.to_le_bytes();
        let mut reader = Reader::new(&data);
        assert!(matches!(
            reader.read_string(),
            Err(FormatError::OversizedDeclaredLength { length: 501, .. })
        ));
        assert_eq!(reader.pos(), 0);
    }

    #[test]
    fn test_read_string_runs_past_buffer() {
        let mut data = 10u32.to_le_bytes().to_vec();
        data.extend_from_slice(b"abc");
        let mut reader = Reader::new(&data);
        assert!(matches!(
            reader.read_string(),
            Err(FormatError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_writers_mirror_readers() {
        let mut out = Vec::new();
        write_u8(&mut out, 24);
        write_u16(&mut out, 5000);
        write_f32(&mut out, -1.5);
        write_string(&mut out, "walk-01");

        let mut reader = Reader::new(&out);
        assert_eq!(reader.read_u8().unwrap(), 24);
        assert_eq!(reader.read_u16().unwrap(), 5000);
        assert_eq!(reader.read_f32().unwrap(), -1.5);
        assert_eq!(reader.read_string().unwrap(), "walk-01");
    }

    #[test]
    fn test_peek_helpers() {
        let data = [0x01, 0x00, 0x00, 0x80, 0x3F];
        assert_eq!(peek_u16(&data, 0), Some(1));
        assert_eq!(peek_f32(&data, 1), Some(1.0));
        assert_eq!(peek_u32(&data, 2), None);
        assert_eq!(peek_u16(&data, usize::MAX), None);
    }
}

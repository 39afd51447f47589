//! Text encodings understood by the reverse reader, and the block decoder
//! that turns tail-to-head byte blocks into text.
//!
//! Blocks arrive in reverse file order.  Single-byte encodings decode each
//! block independently.  UTF-8 characters may straddle a block boundary:
//! the continuation bytes of such a character sit at the *start* of the
//! later block, which is decoded first.  [`BlockDecoder`] holds those bytes
//! back and decodes them together with the next (earlier) block.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Longest run of continuation bytes a UTF-8 character can carry.
const MAX_UTF8_CONTINUATION: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// 7-bit ASCII; any byte ≥ 0x80 is a decoding error.
    #[default]
    Ascii,
    /// ISO-8859-1; every byte maps to the code point of the same value.
    Latin1,
    Utf8,
}

impl TextEncoding {
    /// Human-readable name (for diagnostics).
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Ascii  => "ascii",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Utf8   => "utf-8",
        }
    }

    /// Parse from a CLI string.  Accepts the common aliases.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "ascii" | "us-ascii"                  => Some(TextEncoding::Ascii),
            "latin-1" | "latin1" | "iso-8859-1"   => Some(TextEncoding::Latin1),
            "utf-8" | "utf8"                      => Some(TextEncoding::Utf8),
            _                                     => None,
        }
    }
}

/// An encoding name outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown encoding '{0}' (expected ascii, latin-1 or utf-8)")]
pub struct UnknownEncoding(pub String);

impl FromStr for TextEncoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownEncoding(s.to_owned()))
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure to decode bytes; `offset` is the absolute byte offset of the
/// first offending byte in the resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    pub encoding: TextEncoding,
    pub offset:   u64,
}

// ── Block decoder ────────────────────────────────────────────────────────────

/// Stateful decoder for blocks delivered tail-to-head.
#[derive(Debug)]
pub struct BlockDecoder {
    encoding: TextEncoding,
    /// Leading UTF-8 continuation bytes of the previously decoded block.
    held:     Vec<u8>,
    /// Offset of the first held byte.
    held_at:  u64,
}

impl BlockDecoder {
    pub fn new(encoding: TextEncoding) -> Self {
        Self { encoding, held: Vec::new(), held_at: 0 }
    }

    /// Decode the block that starts at `offset`.
    pub fn decode(&mut self, offset: u64, block: &[u8]) -> Result<String, DecodeFailure> {
        match self.encoding {
            TextEncoding::Ascii => match block.iter().position(|b| !b.is_ascii()) {
                Some(i) => Err(self.failure(offset + i as u64)),
                None    => Ok(block.iter().map(|&b| b as char).collect()),
            },
            TextEncoding::Latin1 => Ok(block.iter().map(|&b| b as char).collect()),
            TextEncoding::Utf8   => self.decode_utf8(offset, block),
        }
    }

    /// Check that no bytes are still held once the head of the resource
    /// has been decoded.
    pub fn finish(&mut self) -> Result<(), DecodeFailure> {
        if self.held.is_empty() {
            Ok(())
        } else {
            self.held.clear();
            Err(self.failure(self.held_at))
        }
    }

    fn decode_utf8(&mut self, offset: u64, block: &[u8]) -> Result<String, DecodeFailure> {
        let mut bytes = Vec::with_capacity(block.len() + self.held.len());
        bytes.extend_from_slice(block);
        bytes.append(&mut self.held);

        let lead = bytes.iter().take_while(|&&b| is_continuation(b)).count();
        if lead > MAX_UTF8_CONTINUATION {
            return Err(self.failure(offset));
        }
        // Nothing precedes offset 0, so a leading continuation there is invalid
        // and left for from_utf8 to report.
        if offset > 0 {
            self.held    = bytes.drain(..lead).collect();
            self.held_at = offset;
        }

        let start = offset + self.held.len() as u64;
        String::from_utf8(bytes)
            .map_err(|e| self.failure(start + e.utf8_error().valid_up_to() as u64))
    }

    fn failure(&self, offset: u64) -> DecodeFailure {
        DecodeFailure { encoding: self.encoding, offset }
    }
}

fn is_continuation(b: u8) -> bool {
    b & 0xC0 == 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for enc in [TextEncoding::Ascii, TextEncoding::Latin1, TextEncoding::Utf8] {
            assert_eq!(TextEncoding::from_name(enc.name()), Some(enc));
        }
        assert_eq!(TextEncoding::from_name("UTF_8"), Some(TextEncoding::Utf8));
        assert_eq!(TextEncoding::from_name("ebcdic"), None);
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert_eq!("Latin_1".parse::<TextEncoding>(), Ok(TextEncoding::Latin1));
        let err = "cp1250".parse::<TextEncoding>().unwrap_err();
        assert_eq!(err, UnknownEncoding("cp1250".to_owned()));
        assert!(err.to_string().contains("cp1250"));
    }

    #[test]
    fn ascii_rejects_high_bytes() {
        let mut dec = BlockDecoder::new(TextEncoding::Ascii);
        let err = dec.decode(10, b"ab\xe9").unwrap_err();
        assert_eq!(err.offset, 12);
    }

    #[test]
    fn latin1_maps_every_byte() {
        let mut dec = BlockDecoder::new(TextEncoding::Latin1);
        assert_eq!(dec.decode(0, b"caf\xe9").unwrap(), "café");
    }

    #[test]
    fn utf8_character_split_across_blocks() {
        // "aé" = 61 C3 A9, split as [61 C3] [A9]; the tail block comes first.
        let mut dec = BlockDecoder::new(TextEncoding::Utf8);
        assert_eq!(dec.decode(2, b"\xa9").unwrap(), "");
        assert_eq!(dec.decode(0, b"a\xc3").unwrap(), "aé");
        dec.finish().unwrap();
    }

    #[test]
    fn utf8_dangling_continuation_at_head() {
        let mut dec = BlockDecoder::new(TextEncoding::Utf8);
        assert!(dec.decode(0, b"\xa9x").is_err());
    }

    #[test]
    fn utf8_invalid_sequence_reports_offset() {
        let mut dec = BlockDecoder::new(TextEncoding::Utf8);
        let err = dec.decode(100, b"ok\xff").unwrap_err();
        assert_eq!(err.offset, 102);
    }
}

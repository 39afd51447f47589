//! Hex string ⇄ byte conversions.
//!
//! Thin, strict wrappers over the `hex` crate plus the two conversions it
//! does not cover: range-checked integer lists and nibble swapping (used
//! for BCD-style fields such as semi-octet phone numbers).

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum HexError {
    #[error("Input must be a non-empty hex string")]
    Empty,
    #[error("Invalid hex string: {0}")]
    Invalid(#[from] hex::FromHexError),
    #[error("Value {0} does not fit in a byte")]
    ByteOutOfRange(u32),
    #[error("Odd-length string ({0} characters)")]
    OddLength(usize),
}

/// Decode a hex string (either case) into bytes.
pub fn hexstr_to_bytes(hexstr: &str) -> Result<Vec<u8>, HexError> {
    if hexstr.is_empty() {
        return Err(HexError::Empty);
    }
    Ok(hex::decode(hexstr)?)
}

/// Narrow integer values to bytes; fails on the first value above 255.
pub fn bytes_list_to_bin(values: &[u32]) -> Result<Vec<u8>, HexError> {
    values
        .iter()
        .map(|&v| u8::try_from(v).map_err(|_| HexError::ByteOutOfRange(v)))
        .collect()
}

/// Encode integer values as a hex string.
pub fn bytes_list_to_hexstr(values: &[u32], uppercase: bool) -> Result<String, HexError> {
    Ok(bytes_to_hexstr(&bytes_list_to_bin(values)?, uppercase))
}

pub fn bytes_to_hexstr(bytes: &[u8], uppercase: bool) -> String {
    if uppercase {
        hex::encode_upper(bytes)
    } else {
        hex::encode(bytes)
    }
}

/// True when `s` decodes as hex.
pub fn is_hexstr(s: &str) -> bool {
    hex::decode(s).is_ok()
}

/// Swap the two characters of every pair: `"d1c1a1b1"` → `"1d1c1a1b"`.
///
/// Any characters are accepted, not only hex digits.
pub fn swap_nibbles(s: &str) -> Result<String, HexError> {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() % 2 != 0 {
        return Err(HexError::OddLength(chars.len()));
    }
    Ok(chars.chunks_exact(2).flat_map(|pair| [pair[1], pair[0]]).collect())
}

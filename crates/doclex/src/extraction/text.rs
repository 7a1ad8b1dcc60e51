//! Plain text decoding.
//!
//! Bytes are read as UTF-8 first. Anything that is not valid UTF-8 is decoded as
//! Latin-1 (ISO-8859-1), which maps every byte to the code point of the same
//! value and therefore never fails.
//!
//! # Example
//!
//! ```rust
//! use doclex::extraction::text::decode_text;
//!
//! assert_eq!(decode_text(b"caf\xc3\xa9").unwrap(), "café");
//! assert_eq!(decode_text(b"caf\xe9").unwrap(), "café");
//! ```

use crate::error::Result;

pub fn decode_text(bytes: &[u8]) -> Result<String> {
    if let Some(text) = decode_utf8(bytes) {
        return Ok(text.to_owned());
    }

    tracing::debug!("Input is not valid UTF-8, decoding as Latin-1");
    Ok(decode_latin1(bytes))
}

#[cfg(feature = "simd-utf8")]
fn decode_utf8(bytes: &[u8]) -> Option<&str> {
    simdutf8::basic::from_utf8(bytes).ok()
}

#[cfg(not(feature = "simd-utf8"))]
fn decode_utf8(bytes: &[u8]) -> Option<&str> {
    std::str::from_utf8(bytes).ok()
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_returned_unchanged() {
        let input = "John Smith visited New York.\nZürich, 東京";
        assert_eq!(decode_text(input.as_bytes()).unwrap(), input);
    }

    #[test]
    fn test_latin1_fallback() {
        let bytes = [0x4d, 0xfc, 0x6c, 0x6c, 0x65, 0x72];
        assert_eq!(decode_text(&bytes).unwrap(), "Müller");
    }

    #[test]
    fn test_latin1_maps_every_byte() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let decoded = decode_latin1(&bytes);
        assert_eq!(decoded.chars().count(), 256);
        assert_eq!(decoded.chars().last(), Some('\u{ff}'));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(decode_text(b"").unwrap(), "");
    }
}

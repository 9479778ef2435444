//! Text encodings for `WordBuffer`.
//!
//! Hex and latin1 are total over bytes; UTF-8, hex, and base64 decoding can
//! fail and report `Error::MalformedText`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::buffer::WordBuffer;
use blockvault_common::{Error, Result};

/// Encode as lowercase hex.
pub fn to_hex(buffer: &WordBuffer) -> String {
    let mut out = String::with_capacity(buffer.len() * 2);
    for i in 0..buffer.len() {
        out.push_str(&format!("{:02x}", buffer.byte_at(i)));
    }
    out
}

/// Decode a hex string.
///
/// # Errors
/// - `Error::MalformedText` on odd length or non-hex characters.
pub fn from_hex(text: &str) -> Result<WordBuffer> {
    if text.len() % 2 != 0 {
        return Err(Error::MalformedText(
            "hex string has odd length".to_string(),
        ));
    }
    let mut bytes = Vec::with_capacity(text.len() / 2);
    for chunk in text.as_bytes().chunks(2) {
        let pair = std::str::from_utf8(chunk)
            .map_err(|_| Error::MalformedText("non-ASCII in hex string".to_string()))?;
        let byte = u8::from_str_radix(pair, 16)
            .map_err(|_| Error::MalformedText(format!("invalid hex pair `{pair}`")))?;
        bytes.push(byte);
    }
    Ok(WordBuffer::from_bytes(&bytes))
}

/// Encode each byte as the latin1 code point of the same value.
pub fn to_latin1(buffer: &WordBuffer) -> String {
    (0..buffer.len())
        .map(|i| char::from(buffer.byte_at(i)))
        .collect()
}

/// Decode a latin1 string, keeping the low byte of each char.
pub fn from_latin1(text: &str) -> WordBuffer {
    let bytes: Vec<u8> = text.chars().map(|c| (c as u32 & 0xff) as u8).collect();
    WordBuffer::from_bytes(&bytes)
}

/// Decode the buffer's bytes as UTF-8 text.
///
/// # Errors
/// - `Error::MalformedText` if the bytes are not valid UTF-8.
pub fn to_utf8(buffer: &WordBuffer) -> Result<String> {
    String::from_utf8(buffer.to_bytes())
        .map_err(|_| Error::MalformedText("malformed UTF-8 data".to_string()))
}

/// Encode UTF-8 text as bytes.
pub fn from_utf8(text: &str) -> WordBuffer {
    WordBuffer::from_bytes(text.as_bytes())
}

/// Encode as standard base64.
pub fn to_base64(buffer: &WordBuffer) -> String {
    STANDARD.encode(buffer.to_bytes())
}

/// Decode standard base64.
///
/// # Errors
/// - `Error::MalformedText` on invalid base64 input.
pub fn from_base64(text: &str) -> Result<WordBuffer> {
    let bytes = STANDARD
        .decode(text)
        .map_err(|e| Error::MalformedText(format!("invalid base64: {e}")))?;
    Ok(WordBuffer::from_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let buf = WordBuffer::from_bytes(&[0x00, 0xab, 0xcd, 0xef, 0x12]);
        let hex = to_hex(&buf);
        assert_eq!(hex, "00abcdef12");
        assert_eq!(from_hex(&hex).unwrap().to_bytes(), buf.to_bytes());
    }

    #[test]
    fn test_hex_rejects_odd_and_garbage() {
        assert!(matches!(from_hex("abc"), Err(Error::MalformedText(_))));
        assert!(matches!(from_hex("zz"), Err(Error::MalformedText(_))));
    }

    #[test]
    fn test_utf8_roundtrip() {
        let buf = from_utf8("héllo wörld");
        assert_eq!(to_utf8(&buf).unwrap(), "héllo wörld");
    }

    #[test]
    fn test_utf8_rejects_invalid_bytes() {
        let buf = WordBuffer::from_bytes(&[0xff, 0xfe, 0xfd]);
        assert!(matches!(to_utf8(&buf), Err(Error::MalformedText(_))));
    }

    #[test]
    fn test_latin1_roundtrip_all_bytes() {
        let bytes: Vec<u8> = (0..=255).collect();
        let buf = WordBuffer::from_bytes(&bytes);
        let text = to_latin1(&buf);
        assert_eq!(from_latin1(&text).to_bytes(), bytes);
    }

    #[test]
    fn test_base64_roundtrip() {
        let buf = WordBuffer::from_bytes(b"any carnal pleasure");
        let encoded = to_base64(&buf);
        assert_eq!(from_base64(&encoded).unwrap().to_bytes(), buf.to_bytes());
    }

    #[test]
    fn test_base64_rejects_garbage() {
        assert!(matches!(
            from_base64("not valid!!"),
            Err(Error::MalformedText(_))
        ));
    }
}

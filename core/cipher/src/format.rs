//! Self-describing ciphertext framing.
//!
//! The OpenSSL format is `base64("Salted__" || salt || ciphertext)` when a
//! salt is present and `base64(ciphertext)` otherwise, so a decryptor can
//! recover the salt from the container alone.

use std::fmt;

use crate::buffer::WordBuffer;
use crate::encoding;
use crate::serializable::CipherResult;
use blockvault_common::Result;

/// The ASCII bytes "Salted__" as two big-endian words.
const SALTED_MAGIC: [u32; 2] = [0x5361_6c74, 0x6564_5f5f];

/// Ciphertext and the salt recovered from a container, if any.
#[derive(Debug, Clone)]
pub struct ParsedCiphertext {
    pub ciphertext: WordBuffer,
    pub salt: Option<WordBuffer>,
}

/// Container framing strategy between cipher results and text.
pub trait CiphertextFormat: fmt::Debug + Send + Sync {
    /// Stable identifier for configuration by name.
    fn id(&self) -> &'static str;

    /// Serialize a result to text.
    fn stringify(&self, result: &CipherResult) -> String;

    /// Parse text back into ciphertext and an optional salt.
    ///
    /// # Errors
    /// - `Error::MalformedText` if the text is not valid base64.
    fn parse(&self, text: &str) -> Result<ParsedCiphertext>;
}

/// OpenSSL `Salted__` container format.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSslFormat;

impl CiphertextFormat for OpenSslFormat {
    fn id(&self) -> &'static str {
        "openssl"
    }

    fn stringify(&self, result: &CipherResult) -> String {
        match &result.salt {
            Some(salt) => {
                let mut framed = WordBuffer::from_full_words(SALTED_MAGIC.to_vec());
                framed.concat(salt).concat(&result.ciphertext);
                encoding::to_base64(&framed)
            }
            None => encoding::to_base64(&result.ciphertext),
        }
    }

    fn parse(&self, text: &str) -> Result<ParsedCiphertext> {
        let mut ciphertext = encoding::from_base64(text)?;

        let salted = ciphertext.len() >= 16
            && ciphertext.words()[0] == SALTED_MAGIC[0]
            && ciphertext.words()[1] == SALTED_MAGIC[1];
        if !salted {
            return Ok(ParsedCiphertext {
                ciphertext,
                salt: None,
            });
        }

        let salt = WordBuffer::from_words(ciphertext.words()[2..4].to_vec(), 8);
        // Strip the 16-byte marker-plus-salt prefix.
        ciphertext.drain_words(4, 16);
        Ok(ParsedCiphertext {
            ciphertext,
            salt: Some(salt),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn result_with(ciphertext: WordBuffer, salt: Option<WordBuffer>) -> CipherResult {
        CipherResult {
            ciphertext,
            key: None,
            iv: None,
            salt,
            algorithm: "toy",
            mode: "cbc",
            padding: "pkcs7",
            block_size_words: 4,
            format: Arc::new(OpenSslFormat),
        }
    }

    #[test]
    fn test_salted_container_roundtrip() {
        let ciphertext = WordBuffer::from_bytes(&[0xaa; 32]);
        let salt = WordBuffer::from_bytes(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let text = OpenSslFormat.stringify(&result_with(ciphertext.clone(), Some(salt.clone())));

        let parsed = OpenSslFormat.parse(&text).unwrap();
        assert_eq!(parsed.ciphertext.to_bytes(), ciphertext.to_bytes());
        assert_eq!(parsed.salt.unwrap().to_bytes(), salt.to_bytes());
    }

    #[test]
    fn test_salted_container_starts_with_magic() {
        let text = OpenSslFormat.stringify(&result_with(
            WordBuffer::from_bytes(&[0u8; 16]),
            Some(WordBuffer::from_bytes(&[0u8; 8])),
        ));
        let decoded = encoding::from_base64(&text).unwrap();
        assert_eq!(&decoded.to_bytes()[..8], b"Salted__");
    }

    #[test]
    fn test_unsalted_container_roundtrip() {
        let ciphertext = WordBuffer::from_bytes(&[0x5c; 16]);
        let text = OpenSslFormat.stringify(&result_with(ciphertext.clone(), None));

        let parsed = OpenSslFormat.parse(&text).unwrap();
        assert_eq!(parsed.ciphertext.to_bytes(), ciphertext.to_bytes());
        assert!(parsed.salt.is_none());
    }

    #[test]
    fn test_short_container_is_not_salted() {
        // Shorter than marker+salt: must not be misread as salted.
        let text = encoding::to_base64(&WordBuffer::from_bytes(b"Salted__"));
        let parsed = OpenSslFormat.parse(&text).unwrap();
        assert!(parsed.salt.is_none());
        assert_eq!(parsed.ciphertext.to_bytes(), b"Salted__");
    }

    #[test]
    fn test_parse_rejects_bad_base64() {
        assert!(OpenSslFormat.parse("@@@").is_err());
    }
}

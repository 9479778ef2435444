//! Orchestration layer: serializable results, raw-key and password flows.
//!
//! `SerializableCipher` runs a full message through a session and wraps the
//! outcome in a `CipherResult` that can round-trip through its format.
//! `PasswordBasedCipher` layers key derivation and salt management on top.
//! The single entry point is `encrypt`/`decrypt`, dispatching on
//! `KeyMaterial` to select the flow.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::buffer::WordBuffer;
use crate::cipher::{BlockCipher, CipherAlgorithm};
use crate::config::CipherConfig;
use crate::encoding;
use crate::format::{CiphertextFormat, OpenSslFormat, ParsedCiphertext};
use crate::kdf::{default_hasher, DerivedKeyMaterial, OpenSslKdf, SALT_SIZE};
use crate::rng::SecureRandom;
use blockvault_common::{Error, Result};

/// Key material selecting the cipher flow: a raw key buffer runs the direct
/// flow, a password runs KDF-based derivation.
#[derive(Clone, Copy)]
pub enum KeyMaterial<'a> {
    Raw(&'a WordBuffer),
    Password(&'a str),
}

impl<'a> From<&'a WordBuffer> for KeyMaterial<'a> {
    fn from(key: &'a WordBuffer) -> Self {
        KeyMaterial::Raw(key)
    }
}

impl<'a> From<&'a str> for KeyMaterial<'a> {
    fn from(password: &'a str) -> Self {
        KeyMaterial::Password(password)
    }
}

/// Ciphertext input to a decrypt call: serialized text to be parsed through
/// the configured format, or an already-structured result.
#[derive(Clone, Copy)]
pub enum CiphertextInput<'a> {
    Text(&'a str),
    Result(&'a CipherResult),
}

impl<'a> From<&'a str> for CiphertextInput<'a> {
    fn from(text: &'a str) -> Self {
        CiphertextInput::Text(text)
    }
}

impl<'a> From<&'a CipherResult> for CiphertextInput<'a> {
    fn from(result: &'a CipherResult) -> Self {
        CiphertextInput::Result(result)
    }
}

/// Everything produced by one encrypt call.
///
/// Immutable after construction; serializable through its formatter.
#[derive(Clone)]
pub struct CipherResult {
    pub ciphertext: WordBuffer,
    pub key: Option<WordBuffer>,
    pub iv: Option<WordBuffer>,
    pub salt: Option<WordBuffer>,
    pub algorithm: &'static str,
    pub mode: &'static str,
    pub padding: &'static str,
    pub block_size_words: usize,
    pub format: Arc<dyn CiphertextFormat>,
}

impl CipherResult {
    /// Serialize through an explicit formatter instead of the attached one.
    pub fn to_string_with(&self, format: &dyn CiphertextFormat) -> String {
        format.stringify(self)
    }
}

impl fmt::Display for CipherResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format.stringify(self))
    }
}

impl fmt::Debug for CipherResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherResult")
            .field("ciphertext", &self.ciphertext)
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("iv", &self.iv)
            .field("salt", &self.salt)
            .field("algorithm", &self.algorithm)
            .field("mode", &self.mode)
            .field("padding", &self.padding)
            .field("block_size_words", &self.block_size_words)
            .finish()
    }
}

fn format_from(cfg: &CipherConfig) -> Arc<dyn CiphertextFormat> {
    cfg.format.clone().unwrap_or_else(|| Arc::new(OpenSslFormat))
}

/// Raw-key flow: encrypt a whole message and wrap it for serialization.
pub struct SerializableCipher;

impl SerializableCipher {
    /// Encrypt `message` under `key`, returning a serializable result.
    pub fn encrypt<A: CipherAlgorithm>(
        message: impl Into<WordBuffer>,
        key: &WordBuffer,
        cfg: &CipherConfig,
    ) -> Result<CipherResult> {
        let mut encryptor = BlockCipher::<A>::encryptor(key, cfg)?;
        let ciphertext = encryptor.finalize_all(message)?;
        trace!(
            algorithm = A::ID,
            mode = encryptor.mode_id(),
            ciphertext_bytes = ciphertext.len(),
            "message encrypted"
        );

        Ok(CipherResult {
            ciphertext,
            key: Some(key.clone()),
            iv: encryptor.iv().cloned(),
            salt: None,
            algorithm: A::ID,
            mode: encryptor.mode_id(),
            padding: encryptor.padding_id(),
            block_size_words: encryptor.block_size_words(),
            format: format_from(cfg),
        })
    }

    /// Decrypt serialized text or a structured result under `key`.
    pub fn decrypt<'a, A: CipherAlgorithm>(
        ciphertext: impl Into<CiphertextInput<'a>>,
        key: &WordBuffer,
        cfg: &CipherConfig,
    ) -> Result<WordBuffer> {
        let parsed = Self::parse(ciphertext.into(), cfg)?;
        let mut decryptor = BlockCipher::<A>::decryptor(key, cfg)?;
        decryptor.finalize_all(&parsed.ciphertext)
    }

    pub(crate) fn parse(input: CiphertextInput<'_>, cfg: &CipherConfig) -> Result<ParsedCiphertext> {
        match input {
            CiphertextInput::Text(text) => format_from(cfg).parse(text),
            CiphertextInput::Result(result) => Ok(ParsedCiphertext {
                ciphertext: result.ciphertext.clone(),
                salt: result.salt.clone(),
            }),
        }
    }
}

/// Password flow: derive key material, then run the raw-key flow.
pub struct PasswordBasedCipher;

impl PasswordBasedCipher {
    /// Encrypt under a password, generating a fresh salt when none is
    /// configured and embedding it in the result.
    pub fn encrypt<A: CipherAlgorithm>(
        message: impl Into<WordBuffer>,
        password: &str,
        cfg: &CipherConfig,
        rng: &mut dyn SecureRandom,
    ) -> Result<CipherResult> {
        let salt = match &cfg.salt {
            Some(salt) => salt.clone(),
            None => WordBuffer::random(rng, SALT_SIZE)?,
        };
        let derived = Self::derive::<A>(password, &salt, cfg)?;
        debug!(kdf_salt_bytes = salt.len(), "derived key material for encryption");

        let mut derived_cfg = cfg.clone();
        derived_cfg.iv = Some(derived.iv.clone());

        let mut result = SerializableCipher::encrypt::<A>(message, &derived.key, &derived_cfg)?;
        result.salt = Some(salt);
        Ok(result)
    }

    /// Decrypt under a password, recovering the salt from the container and
    /// re-deriving the identical key and IV.
    ///
    /// # Errors
    /// - `Error::InvalidInput` if neither the container nor the config
    ///   carries a salt.
    pub fn decrypt<'a, A: CipherAlgorithm>(
        ciphertext: impl Into<CiphertextInput<'a>>,
        password: &str,
        cfg: &CipherConfig,
    ) -> Result<WordBuffer> {
        let parsed = SerializableCipher::parse(ciphertext.into(), cfg)?;
        let salt = parsed
            .salt
            .clone()
            .or_else(|| cfg.salt.clone())
            .ok_or_else(|| {
                Error::InvalidInput(
                    "ciphertext carries no salt and none was configured".to_string(),
                )
            })?;
        let derived = Self::derive::<A>(password, &salt, cfg)?;

        let mut derived_cfg = cfg.clone();
        derived_cfg.iv = Some(derived.iv.clone());

        let mut decryptor = BlockCipher::<A>::decryptor(&derived.key, &derived_cfg)?;
        decryptor.finalize_all(&parsed.ciphertext)
    }

    fn derive<A: CipherAlgorithm>(
        password: &str,
        salt: &WordBuffer,
        cfg: &CipherConfig,
    ) -> Result<DerivedKeyMaterial> {
        let kdf = cfg.kdf.clone().unwrap_or_else(|| Arc::new(OpenSslKdf));
        let hasher = cfg.hasher.clone().unwrap_or_else(default_hasher);
        let key_size = cfg.key_size.unwrap_or(A::KEY_SIZE_WORDS);
        let iv_size = cfg.iv_size.unwrap_or(A::IV_SIZE_WORDS);
        kdf.derive(
            &encoding::from_utf8(password),
            key_size,
            iv_size,
            salt,
            hasher.as_ref(),
        )
    }
}

/// Encrypt `message`, dispatching on the key material.
///
/// The RNG is consulted only by the password flow, for salt generation.
pub fn encrypt<A: CipherAlgorithm>(
    message: impl Into<WordBuffer>,
    key: KeyMaterial<'_>,
    cfg: &CipherConfig,
    rng: &mut dyn SecureRandom,
) -> Result<CipherResult> {
    match key {
        KeyMaterial::Raw(key) => SerializableCipher::encrypt::<A>(message, key, cfg),
        KeyMaterial::Password(password) => {
            PasswordBasedCipher::encrypt::<A>(message, password, cfg, rng)
        }
    }
}

/// Decrypt `ciphertext`, dispatching on the key material.
pub fn decrypt<'a, A: CipherAlgorithm>(
    ciphertext: impl Into<CiphertextInput<'a>>,
    key: KeyMaterial<'_>,
    cfg: &CipherConfig,
) -> Result<WordBuffer> {
    match key {
        KeyMaterial::Raw(raw) => SerializableCipher::decrypt::<A>(ciphertext, raw, cfg),
        KeyMaterial::Password(password) => {
            PasswordBasedCipher::decrypt::<A>(ciphertext, password, cfg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::OsRandom;
    use crate::testutil::ToyBlockCipher;

    fn key() -> WordBuffer {
        WordBuffer::from("0123456789abcdef")
    }

    #[test]
    fn test_raw_key_roundtrip_through_text() {
        let cfg = CipherConfig::new().with_iv(WordBuffer::from_bytes(&[3u8; 16]));
        let result =
            SerializableCipher::encrypt::<ToyBlockCipher>("attack at dawn", &key(), &cfg).unwrap();
        assert_eq!(result.algorithm, "toy");
        assert_eq!(result.mode, "cbc");
        assert_eq!(result.padding, "pkcs7");
        assert!(result.salt.is_none());

        let serialized = result.to_string();
        let plaintext =
            SerializableCipher::decrypt::<ToyBlockCipher>(serialized.as_str(), &key(), &cfg)
                .unwrap();
        assert_eq!(encoding::to_utf8(&plaintext).unwrap(), "attack at dawn");
    }

    #[test]
    fn test_raw_key_roundtrip_through_result() {
        let cfg = CipherConfig::new();
        let result =
            SerializableCipher::encrypt::<ToyBlockCipher>("hello world", &key(), &cfg).unwrap();
        let plaintext =
            SerializableCipher::decrypt::<ToyBlockCipher>(&result, &key(), &cfg).unwrap();
        assert_eq!(encoding::to_utf8(&plaintext).unwrap(), "hello world");
    }

    #[test]
    fn test_password_flow_roundtrip() {
        let mut rng = OsRandom;
        let cfg = CipherConfig::new();
        let result = PasswordBasedCipher::encrypt::<ToyBlockCipher>(
            "secret message",
            "hunter2",
            &cfg,
            &mut rng,
        )
        .unwrap();
        assert!(result.salt.is_some());

        let serialized = result.to_string();
        let plaintext = PasswordBasedCipher::decrypt::<ToyBlockCipher>(
            serialized.as_str(),
            "hunter2",
            &cfg,
        )
        .unwrap();
        assert_eq!(encoding::to_utf8(&plaintext).unwrap(), "secret message");
    }

    #[test]
    fn test_password_flow_fresh_salts_differ() {
        let mut rng = OsRandom;
        let cfg = CipherConfig::new();
        let a = PasswordBasedCipher::encrypt::<ToyBlockCipher>("same", "pw", &cfg, &mut rng)
            .unwrap();
        let b = PasswordBasedCipher::encrypt::<ToyBlockCipher>("same", "pw", &cfg, &mut rng)
            .unwrap();

        assert_ne!(
            a.salt.as_ref().unwrap().to_bytes(),
            b.salt.as_ref().unwrap().to_bytes()
        );
        assert_ne!(a.ciphertext.to_bytes(), b.ciphertext.to_bytes());

        // Both still decrypt with the right password.
        for result in [&a, &b] {
            let text = result.to_string();
            let plaintext =
                PasswordBasedCipher::decrypt::<ToyBlockCipher>(text.as_str(), "pw", &cfg)
                    .unwrap();
            assert_eq!(encoding::to_utf8(&plaintext).unwrap(), "same");
        }
    }

    #[test]
    fn test_password_flow_explicit_salt_is_deterministic() {
        let mut rng = OsRandom;
        let cfg = CipherConfig::new().with_salt(WordBuffer::from_bytes(&[9u8; 8]));
        let a = PasswordBasedCipher::encrypt::<ToyBlockCipher>("msg", "pw", &cfg, &mut rng)
            .unwrap();
        let b = PasswordBasedCipher::encrypt::<ToyBlockCipher>("msg", "pw", &cfg, &mut rng)
            .unwrap();
        assert_eq!(a.ciphertext.to_bytes(), b.ciphertext.to_bytes());
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_password_decrypt_without_salt_errors() {
        let cfg = CipherConfig::new();
        // An unsalted container cannot drive key derivation.
        let unsalted =
            SerializableCipher::encrypt::<ToyBlockCipher>("x", &key(), &cfg).unwrap();
        let text = unsalted.to_string();
        assert!(matches!(
            PasswordBasedCipher::decrypt::<ToyBlockCipher>(text.as_str(), "pw", &cfg),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_wrong_password_gives_garbage_or_error() {
        let mut rng = OsRandom;
        let cfg = CipherConfig::new();
        let result = PasswordBasedCipher::encrypt::<ToyBlockCipher>(
            "the plaintext",
            "right",
            &cfg,
            &mut rng,
        )
        .unwrap();
        let text = result.to_string();

        match PasswordBasedCipher::decrypt::<ToyBlockCipher>(text.as_str(), "wrong", &cfg) {
            Ok(garbage) => assert_ne!(garbage.to_bytes(), b"the plaintext"),
            Err(Error::InsufficientData(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_top_level_dispatch() {
        let mut rng = OsRandom;
        let cfg = CipherConfig::new();

        let raw = encrypt::<ToyBlockCipher>("m", KeyMaterial::Raw(&key()), &cfg, &mut rng)
            .unwrap();
        assert!(raw.salt.is_none());

        let password =
            encrypt::<ToyBlockCipher>("m", KeyMaterial::Password("pw"), &cfg, &mut rng).unwrap();
        assert!(password.salt.is_some());

        let text = password.to_string();
        let plaintext =
            decrypt::<ToyBlockCipher>(text.as_str(), KeyMaterial::Password("pw"), &cfg).unwrap();
        assert_eq!(encoding::to_utf8(&plaintext).unwrap(), "m");
    }

    #[test]
    fn test_explicit_formatter_override() {
        let cfg = CipherConfig::new();
        let result =
            SerializableCipher::encrypt::<ToyBlockCipher>("abc", &key(), &cfg).unwrap();
        assert_eq!(result.to_string_with(&OpenSslFormat), result.to_string());
    }
}

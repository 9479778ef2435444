//! Cipher configuration.
//!
//! `CipherConfig` is an explicit struct of optional injected strategies.
//! Layering works by override-merge: a
//! child config wins wherever it sets a field, and `merged_with` produces a
//! new config without mutating either input.

use std::fmt;
use std::sync::Arc;

use crate::buffer::WordBuffer;
use crate::format::{CiphertextFormat, OpenSslFormat};
use crate::kdf::{HasherFactory, Kdf, OpenSslKdf};
use crate::mode::{BlockMode, Cbc};
use crate::padding::{Padding, Pkcs7};
use blockvault_common::{Error, Result};

/// Recognized cipher options. Unset fields fall back to defaults at the
/// point of use: CBC, PKCS#7, the OpenSSL KDF, and the OpenSSL format.
#[derive(Clone, Default)]
pub struct CipherConfig {
    pub mode: Option<Arc<dyn BlockMode>>,
    pub padding: Option<Arc<dyn Padding>>,
    pub iv: Option<WordBuffer>,
    pub salt: Option<WordBuffer>,
    pub kdf: Option<Arc<dyn Kdf>>,
    pub hasher: Option<Arc<dyn HasherFactory>>,
    pub key_size: Option<usize>,
    pub iv_size: Option<usize>,
    pub format: Option<Arc<dyn CiphertextFormat>>,
}

impl CipherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: impl BlockMode + 'static) -> Self {
        self.mode = Some(Arc::new(mode));
        self
    }

    pub fn with_padding(mut self, padding: impl Padding + 'static) -> Self {
        self.padding = Some(Arc::new(padding));
        self
    }

    pub fn with_iv(mut self, iv: WordBuffer) -> Self {
        self.iv = Some(iv);
        self
    }

    pub fn with_salt(mut self, salt: WordBuffer) -> Self {
        self.salt = Some(salt);
        self
    }

    pub fn with_kdf(mut self, kdf: impl Kdf + 'static) -> Self {
        self.kdf = Some(Arc::new(kdf));
        self
    }

    pub fn with_hasher(mut self, hasher: impl HasherFactory + 'static) -> Self {
        self.hasher = Some(Arc::new(hasher));
        self
    }

    pub fn with_key_size(mut self, words: usize) -> Self {
        self.key_size = Some(words);
        self
    }

    pub fn with_iv_size(mut self, words: usize) -> Self {
        self.iv_size = Some(words);
        self
    }

    pub fn with_format(mut self, format: impl CiphertextFormat + 'static) -> Self {
        self.format = Some(Arc::new(format));
        self
    }

    /// Select a chaining mode by name.
    ///
    /// # Errors
    /// - `Error::UnsupportedConfiguration` for an unrecognized name.
    pub fn with_mode_name(self, name: &str) -> Result<Self> {
        match name {
            "cbc" => Ok(self.with_mode(Cbc)),
            other => Err(Error::UnsupportedConfiguration(format!(
                "unknown mode `{other}`"
            ))),
        }
    }

    /// Select a padding scheme by name.
    ///
    /// # Errors
    /// - `Error::UnsupportedConfiguration` for an unrecognized name.
    pub fn with_padding_name(self, name: &str) -> Result<Self> {
        match name {
            "pkcs7" => Ok(self.with_padding(Pkcs7)),
            other => Err(Error::UnsupportedConfiguration(format!(
                "unknown padding `{other}`"
            ))),
        }
    }

    /// Select a key derivation function by name.
    ///
    /// # Errors
    /// - `Error::UnsupportedConfiguration` for an unrecognized name.
    pub fn with_kdf_name(self, name: &str) -> Result<Self> {
        match name {
            "openssl" => Ok(self.with_kdf(OpenSslKdf)),
            other => Err(Error::UnsupportedConfiguration(format!(
                "unknown kdf `{other}`"
            ))),
        }
    }

    /// Select a serialization format by name.
    ///
    /// # Errors
    /// - `Error::UnsupportedConfiguration` for an unrecognized name.
    pub fn with_format_name(self, name: &str) -> Result<Self> {
        match name {
            "openssl" => Ok(self.with_format(OpenSslFormat)),
            other => Err(Error::UnsupportedConfiguration(format!(
                "unknown format `{other}`"
            ))),
        }
    }

    /// Layer this config over `base`, producing a new config.
    ///
    /// Fields set here override the base; neither input is mutated.
    pub fn merged_with(&self, base: &CipherConfig) -> CipherConfig {
        CipherConfig {
            mode: self.mode.clone().or_else(|| base.mode.clone()),
            padding: self.padding.clone().or_else(|| base.padding.clone()),
            iv: self.iv.clone().or_else(|| base.iv.clone()),
            salt: self.salt.clone().or_else(|| base.salt.clone()),
            kdf: self.kdf.clone().or_else(|| base.kdf.clone()),
            hasher: self.hasher.clone().or_else(|| base.hasher.clone()),
            key_size: self.key_size.or(base.key_size),
            iv_size: self.iv_size.or(base.iv_size),
            format: self.format.clone().or_else(|| base.format.clone()),
        }
    }
}

impl fmt::Debug for CipherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherConfig")
            .field("mode", &self.mode.as_ref().map(|m| m.id()))
            .field("padding", &self.padding.as_ref().map(|p| p.id()))
            .field("iv", &self.iv)
            .field("salt", &self.salt)
            .field("kdf", &self.kdf.as_ref().map(|k| k.id()))
            .field("key_size", &self.key_size)
            .field("iv_size", &self.iv_size)
            .field("format", &self.format.as_ref().map(|fm| fm.id()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_overrides() {
        let base = CipherConfig::new()
            .with_iv(WordBuffer::from_bytes(&[1; 16]))
            .with_key_size(4);
        let child = CipherConfig::new().with_key_size(8);

        let merged = child.merged_with(&base);
        assert_eq!(merged.key_size, Some(8));
        assert_eq!(merged.iv.unwrap().to_bytes(), vec![1; 16]);
    }

    #[test]
    fn test_merge_does_not_mutate_base() {
        let base = CipherConfig::new().with_key_size(4);
        let child = CipherConfig::new().with_key_size(8);
        let _ = child.merged_with(&base);
        assert_eq!(base.key_size, Some(4));
    }

    #[test]
    fn test_unknown_names_rejected() {
        assert!(matches!(
            CipherConfig::new().with_mode_name("ctr"),
            Err(Error::UnsupportedConfiguration(_))
        ));
        assert!(matches!(
            CipherConfig::new().with_padding_name("zero"),
            Err(Error::UnsupportedConfiguration(_))
        ));
        assert!(matches!(
            CipherConfig::new().with_kdf_name("argon2"),
            Err(Error::UnsupportedConfiguration(_))
        ));
        assert!(matches!(
            CipherConfig::new().with_format_name("json"),
            Err(Error::UnsupportedConfiguration(_))
        ));
    }

    #[test]
    fn test_known_names_resolve() {
        let cfg = CipherConfig::new()
            .with_mode_name("cbc")
            .unwrap()
            .with_padding_name("pkcs7")
            .unwrap()
            .with_kdf_name("openssl")
            .unwrap()
            .with_format_name("openssl")
            .unwrap();
        assert_eq!(cfg.mode.unwrap().id(), "cbc");
        assert_eq!(cfg.padding.unwrap().id(), "pkcs7");
    }
}

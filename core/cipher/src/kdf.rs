//! Password-based key derivation.
//!
//! The hash primitive is an external collaborator: the KDF drives any
//! `StreamingHasher`, and the `DigestHasher` adapter lifts RustCrypto
//! `digest` implementations into that contract. MD5 is the default for
//! OpenSSL `EVP_BytesToKey` compatibility; callers wanting a different
//! digest inject another factory.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use digest::{Digest, FixedOutputReset};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::buffer::WordBuffer;
use blockvault_common::{Error, Result};

/// Salt length in bytes used when generating a fresh salt.
pub const SALT_SIZE: usize = 8;

/// Streaming digest contract used by the KDF.
pub trait StreamingHasher {
    /// Absorb more input.
    fn update(&mut self, data: &WordBuffer);

    /// Produce the digest and reset for reuse.
    fn finalize_reset(&mut self) -> WordBuffer;
}

/// Mints fresh hasher instances for each derivation.
pub trait HasherFactory: fmt::Debug + Send + Sync {
    fn create(&self) -> Box<dyn StreamingHasher>;
}

/// Adapter lifting a RustCrypto digest into `StreamingHasher`.
pub struct DigestHasher<D> {
    inner: D,
}

impl<D: Digest + FixedOutputReset> StreamingHasher for DigestHasher<D> {
    fn update(&mut self, data: &WordBuffer) {
        Digest::update(&mut self.inner, data.to_bytes());
    }

    fn finalize_reset(&mut self) -> WordBuffer {
        let digest = Digest::finalize_reset(&mut self.inner);
        WordBuffer::from_bytes(digest.as_slice())
    }
}

/// Factory producing `DigestHasher<D>` instances.
pub struct DigestHasherFactory<D> {
    _digest: PhantomData<D>,
}

impl<D> DigestHasherFactory<D> {
    pub fn new() -> Self {
        Self {
            _digest: PhantomData,
        }
    }
}

impl<D> Default for DigestHasherFactory<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Clone for DigestHasherFactory<D> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<D> fmt::Debug for DigestHasherFactory<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DigestHasherFactory<{}>", std::any::type_name::<D>())
    }
}

impl<D> HasherFactory for DigestHasherFactory<D>
where
    D: Digest + FixedOutputReset + Send + Sync + 'static,
{
    fn create(&self) -> Box<dyn StreamingHasher> {
        Box::new(DigestHasher { inner: D::new() })
    }
}

/// The hasher used when a config does not inject one.
pub fn default_hasher() -> Arc<dyn HasherFactory> {
    Arc::new(DigestHasherFactory::<md5::Md5>::new())
}

/// Derived key, IV, and the salt they were derived from.
///
/// Key and IV are zeroized on drop; the salt is persisted alongside the
/// ciphertext and is not secret.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeyMaterial {
    pub key: WordBuffer,
    pub iv: WordBuffer,
    pub salt: WordBuffer,
}

impl fmt::Debug for DerivedKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKeyMaterial([REDACTED], salt {} bytes)", self.salt.len())
    }
}

/// OpenSSL `EVP_BytesToKey`-style derivation.
///
/// Each round hashes `(previous block || password || salt)` — the first
/// round has no previous block — and successive digests are concatenated
/// until `key_size_words` words are available.
///
/// # Errors
/// - `Error::InvalidInput` if the hasher produces empty digests.
pub fn evp_kdf(
    password: &WordBuffer,
    salt: &WordBuffer,
    key_size_words: usize,
    iterations: u32,
    hasher: &dyn HasherFactory,
) -> Result<WordBuffer> {
    let mut hasher = hasher.create();
    let mut derived = WordBuffer::new();
    let mut block: Option<WordBuffer> = None;

    while derived.len() < key_size_words * 4 {
        if let Some(prev) = &block {
            hasher.update(prev);
        }
        hasher.update(password);
        hasher.update(salt);
        let mut digest = hasher.finalize_reset();

        for _ in 1..iterations {
            hasher.update(&digest);
            digest = hasher.finalize_reset();
        }

        if digest.is_empty() {
            return Err(Error::InvalidInput(
                "hasher produced an empty digest".to_string(),
            ));
        }
        derived.concat(&digest);
        block = Some(digest);
    }

    derived.truncate(key_size_words * 4);
    derived.clamp();
    Ok(derived)
}

/// Key derivation strategy turning a password and salt into key material.
pub trait Kdf: fmt::Debug + Send + Sync {
    /// Stable identifier for serialized results.
    fn id(&self) -> &'static str;

    /// Derive `key_size_words` of key and `iv_size_words` of IV.
    ///
    /// Deterministic: salt generation is the caller's concern, so the same
    /// `(password, salt)` always re-derives identical material.
    fn derive(
        &self,
        password: &WordBuffer,
        key_size_words: usize,
        iv_size_words: usize,
        salt: &WordBuffer,
        hasher: &dyn HasherFactory,
    ) -> Result<DerivedKeyMaterial>;
}

/// OpenSSL-compatible KDF with a single hash iteration.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSslKdf;

impl Kdf for OpenSslKdf {
    fn id(&self) -> &'static str {
        "openssl"
    }

    fn derive(
        &self,
        password: &WordBuffer,
        key_size_words: usize,
        iv_size_words: usize,
        salt: &WordBuffer,
        hasher: &dyn HasherFactory,
    ) -> Result<DerivedKeyMaterial> {
        let mut output = evp_kdf(password, salt, key_size_words + iv_size_words, 1, hasher)?;

        let iv_words = output.words()[key_size_words..key_size_words + iv_size_words].to_vec();
        let iv = WordBuffer::from_words(iv_words, iv_size_words * 4);

        output.truncate(key_size_words * 4);
        output.clamp();

        Ok(DerivedKeyMaterial {
            key: output,
            iv,
            salt: salt.clone(),
        })
    }
}

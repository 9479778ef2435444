//! Streaming block cipher framework for BlockVault.
//!
//! This crate provides:
//! - Word-packed binary buffers with byte-precise significant lengths
//! - Incremental block buffering with chunk-size-independent output
//! - CBC chaining and PKCS#7 padding behind strategy traits
//! - OpenSSL-compatible key derivation and `Salted__` container framing
//! - Raw-key and password-based orchestration over any block primitive
//!
//! The raw block primitive is an external collaborator: anything
//! implementing [`CipherAlgorithm`] plugs into the full streaming, chaining,
//! padding, and serialization pipeline.
//!
//! # Security Guarantees
//! - Derived key material is zeroized on drop
//! - No key material or plaintext is ever logged
//! - Salt generation uses an injected secure randomness provider

pub mod buffer;
pub mod buffered;
pub mod cipher;
pub mod config;
pub mod encoding;
pub mod format;
pub mod kdf;
pub mod mode;
pub mod padding;
pub mod rng;
pub mod serializable;

#[cfg(test)]
pub(crate) mod testutil;

pub use blockvault_common::{Error, Result};

pub use buffer::WordBuffer;
pub use buffered::BlockBuffer;
pub use cipher::{BlockCipher, BlockTransform, CipherAlgorithm, Direction};
pub use config::CipherConfig;
pub use format::{CiphertextFormat, OpenSslFormat, ParsedCiphertext};
pub use kdf::{evp_kdf, DerivedKeyMaterial, HasherFactory, Kdf, OpenSslKdf, StreamingHasher};
pub use mode::{BlockMode, Cbc, ModeState};
pub use padding::{Padding, Pkcs7};
pub use rng::{OsRandom, SecureRandom};
pub use serializable::{
    decrypt, encrypt, CipherResult, CiphertextInput, KeyMaterial, PasswordBasedCipher,
    SerializableCipher,
};

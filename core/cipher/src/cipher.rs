//! Block cipher state machine.
//!
//! `BlockCipher` composes the streaming buffer, a chaining mode, and a
//! padding scheme around a raw block primitive. The primitive itself is an
//! external collaborator behind the `CipherAlgorithm` seam; this crate never
//! implements a key schedule or round function.

use std::sync::Arc;

use crate::buffer::WordBuffer;
use crate::buffered::BlockBuffer;
use crate::config::CipherConfig;
use crate::mode::{BlockMode, Cbc, ModeState};
use crate::padding::{Padding, Pkcs7};
use blockvault_common::{Error, Result};

/// Object-safe contract of a raw block primitive.
///
/// Implementations operate in place on a fixed-size word window starting at
/// `offset`.
pub trait BlockTransform {
    /// Block size in 32-bit words.
    fn block_size_words(&self) -> usize;

    /// Encrypt one block in place.
    fn encrypt_block(&mut self, words: &mut [u32], offset: usize);

    /// Decrypt one block in place.
    fn decrypt_block(&mut self, words: &mut [u32], offset: usize);
}

/// A block primitive that can be keyed and identified.
pub trait CipherAlgorithm: BlockTransform + Clone + 'static {
    /// Stable identifier for serialized results.
    const ID: &'static str;

    /// Key size in words expected by the password flow.
    const KEY_SIZE_WORDS: usize = 4;

    /// IV size in words expected by the password flow.
    const IV_SIZE_WORDS: usize = 4;

    /// Run the primitive's key schedule.
    ///
    /// # Errors
    /// - `Error::InvalidInput` if the key has the wrong size.
    fn from_key(key: &WordBuffer) -> Result<Self>;
}

/// Transform direction, fixed for a session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// Streaming encrypt/decrypt session over a block primitive.
pub struct BlockCipher<A: CipherAlgorithm> {
    algorithm: A,
    direction: Direction,
    mode: Arc<dyn BlockMode>,
    padding: Arc<dyn Padding>,
    iv: Option<WordBuffer>,
    buffer: BlockBuffer,
    mode_state: Option<Box<dyn ModeState>>,
}

impl<A: CipherAlgorithm> Clone for BlockCipher<A> {
    fn clone(&self) -> Self {
        Self {
            algorithm: self.algorithm.clone(),
            direction: self.direction,
            mode: self.mode.clone(),
            padding: self.padding.clone(),
            iv: self.iv.clone(),
            buffer: self.buffer.clone(),
            mode_state: self.mode_state.as_ref().map(|s| s.boxed_clone()),
        }
    }
}

impl<A: CipherAlgorithm> BlockCipher<A> {
    /// Build an encrypting session.
    pub fn encryptor(key: &WordBuffer, cfg: &CipherConfig) -> Result<Self> {
        Self::with_direction(Direction::Encrypt, key, cfg)
    }

    /// Build a decrypting session.
    pub fn decryptor(key: &WordBuffer, cfg: &CipherConfig) -> Result<Self> {
        Self::with_direction(Direction::Decrypt, key, cfg)
    }

    fn with_direction(direction: Direction, key: &WordBuffer, cfg: &CipherConfig) -> Result<Self> {
        let algorithm = A::from_key(key)?;
        let block_size = algorithm.block_size_words();
        let mut cipher = Self {
            algorithm,
            direction,
            mode: cfg.mode.clone().unwrap_or_else(|| Arc::new(Cbc)),
            padding: cfg.padding.clone().unwrap_or_else(|| Arc::new(Pkcs7)),
            iv: cfg.iv.clone(),
            buffer: BlockBuffer::new(block_size),
            mode_state: None,
        };
        cipher.reset();
        Ok(cipher)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn block_size_words(&self) -> usize {
        self.algorithm.block_size_words()
    }

    pub fn mode_id(&self) -> &'static str {
        self.mode.id()
    }

    pub fn padding_id(&self) -> &'static str {
        self.padding.id()
    }

    /// The IV this session chains from, if one was configured.
    pub fn iv(&self) -> Option<&WordBuffer> {
        self.iv.as_ref()
    }

    /// Total bytes fed into the session so far.
    pub fn bytes_processed(&self) -> usize {
        self.buffer.bytes_seen()
    }

    /// Re-initialize the streaming buffer and chaining state.
    ///
    /// The existing mode state is re-initialized in place; it is only
    /// allocated on first use, since the direction (and therefore the mode
    /// factory) never changes for a session.
    pub fn reset(&mut self) {
        self.buffer.reset();
        if self.direction == Direction::Decrypt {
            // The last ciphertext block stays buffered until finalize so
            // padding is removed from a complete block.
            self.buffer.set_min_buffered_blocks(1);
        }

        let iv_words = self.iv.as_ref().map(|iv| iv.words().to_vec());
        let iv = iv_words.as_deref();
        match &mut self.mode_state {
            Some(state) => state.reinit(iv),
            None => {
                let state = match self.direction {
                    Direction::Encrypt => self.mode.encryptor(iv),
                    Direction::Decrypt => self.mode.decryptor(iv),
                };
                self.mode_state = Some(state);
            }
        }
    }

    /// Feed data into the session, returning any blocks that became ready.
    ///
    /// May be called any number of times; returns an empty buffer while
    /// insufficient data has accumulated.
    pub fn process(&mut self, data: impl Into<WordBuffer>) -> WordBuffer {
        self.buffer.append(&data.into());
        self.process_ready(false)
    }

    /// Flush the session.
    ///
    /// Encrypting: pads the buffered tail and emits all remaining blocks.
    /// Decrypting: emits all remaining blocks, including the reserved last
    /// one, and unpads the result.
    ///
    /// # Errors
    /// - `Error::InsufficientData` if a decryptor holds less than one full
    ///   block, leaving nothing to unpad.
    pub fn finalize(&mut self) -> Result<WordBuffer> {
        match self.direction {
            Direction::Encrypt => {
                let block_size = self.algorithm.block_size_words();
                self.padding.pad(self.buffer.data_mut(), block_size);
                Ok(self.process_ready(true))
            }
            Direction::Decrypt => {
                let block_size_bytes = self.algorithm.block_size_words() * 4;
                let buffered = self.buffer.buffered_bytes();
                if buffered < block_size_bytes {
                    return Err(Error::InsufficientData(format!(
                        "decryption requires at least one full block ({block_size_bytes} bytes), {buffered} buffered"
                    )));
                }
                let mut plaintext = self.process_ready(true);
                self.padding.unpad(&mut plaintext)?;
                Ok(plaintext)
            }
        }
    }

    /// Append a final chunk and flush in one call.
    pub fn finalize_all(&mut self, data: impl Into<WordBuffer>) -> Result<WordBuffer> {
        let mut out = self.process(data);
        out.concat(&self.finalize()?);
        Ok(out)
    }

    fn process_ready(&mut self, flush: bool) -> WordBuffer {
        let Self {
            algorithm,
            buffer,
            mode_state,
            ..
        } = self;
        match mode_state {
            Some(state) => buffer.process(flush, |words, offset| {
                state.process_block(&mut *algorithm, words, offset)
            }),
            None => WordBuffer::new(),
        }
    }
}

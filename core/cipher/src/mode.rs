//! Block chaining modes.
//!
//! A `BlockMode` is a factory for per-session `ModeState` transforms. The
//! state carries the chaining value; the IV is consumed on the first block
//! and cleared so later blocks chain off ciphertext.

use std::fmt;

use crate::cipher::BlockTransform;

/// Stateful per-block chaining transform for one encrypt or decrypt session.
pub trait ModeState {
    /// Transform one block in place through the primitive.
    fn process_block(&mut self, primitive: &mut dyn BlockTransform, words: &mut [u32], offset: usize);

    /// Restore the initial chaining state for a fresh session with `iv`.
    fn reinit(&mut self, iv: Option<&[u32]>);

    /// Deep copy for checkpoint/fork of a streaming session.
    fn boxed_clone(&self) -> Box<dyn ModeState>;
}

/// Chaining strategy, yielding encryptor and decryptor states.
pub trait BlockMode: fmt::Debug + Send + Sync {
    /// Stable identifier for serialized results.
    fn id(&self) -> &'static str;

    /// Build the encrypting transform.
    fn encryptor(&self, iv: Option<&[u32]>) -> Box<dyn ModeState>;

    /// Build the decrypting transform.
    fn decryptor(&self, iv: Option<&[u32]>) -> Box<dyn ModeState>;
}

/// Cipher Block Chaining.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cbc;

impl BlockMode for Cbc {
    fn id(&self) -> &'static str {
        "cbc"
    }

    fn encryptor(&self, iv: Option<&[u32]>) -> Box<dyn ModeState> {
        Box::new(CbcEncryptor {
            chain: ChainingState::new(iv),
        })
    }

    fn decryptor(&self, iv: Option<&[u32]>) -> Box<dyn ModeState> {
        Box::new(CbcDecryptor {
            chain: ChainingState::new(iv),
        })
    }
}

/// Chaining value shared by the CBC directions.
///
/// `iv` is present only until the first block; afterwards `prev_block`
/// carries the previous ciphertext block. Missing words XOR as zero, so an
/// absent IV behaves as the all-zero IV.
#[derive(Debug, Clone)]
struct ChainingState {
    iv: Option<Vec<u32>>,
    prev_block: Vec<u32>,
}

impl ChainingState {
    fn new(iv: Option<&[u32]>) -> Self {
        Self {
            iv: iv.map(<[u32]>::to_vec),
            prev_block: Vec::new(),
        }
    }

    fn reinit(&mut self, iv: Option<&[u32]>) {
        self.iv = iv.map(<[u32]>::to_vec);
        self.prev_block.clear();
    }

    fn xor_block(&mut self, words: &mut [u32], offset: usize, block_size: usize) {
        if let Some(iv) = self.iv.take() {
            for i in 0..block_size {
                words[offset + i] ^= iv.get(i).copied().unwrap_or(0);
            }
        } else {
            for i in 0..block_size {
                words[offset + i] ^= self.prev_block.get(i).copied().unwrap_or(0);
            }
        }
    }
}

#[derive(Debug, Clone)]
struct CbcEncryptor {
    chain: ChainingState,
}

impl ModeState for CbcEncryptor {
    fn process_block(&mut self, primitive: &mut dyn BlockTransform, words: &mut [u32], offset: usize) {
        let block_size = primitive.block_size_words();

        // XOR with the chain value, encrypt, remember the ciphertext block.
        self.chain.xor_block(words, offset, block_size);
        primitive.encrypt_block(words, offset);
        self.chain.prev_block = words[offset..offset + block_size].to_vec();
    }

    fn reinit(&mut self, iv: Option<&[u32]>) {
        self.chain.reinit(iv);
    }

    fn boxed_clone(&self) -> Box<dyn ModeState> {
        Box::new(self.clone())
    }
}

#[derive(Debug, Clone)]
struct CbcDecryptor {
    chain: ChainingState,
}

impl ModeState for CbcDecryptor {
    fn process_block(&mut self, primitive: &mut dyn BlockTransform, words: &mut [u32], offset: usize) {
        let block_size = primitive.block_size_words();

        // The incoming ciphertext block becomes the next chain value; it must
        // be captured before the in-place decrypt overwrites it.
        let this_block = words[offset..offset + block_size].to_vec();
        primitive.decrypt_block(words, offset);
        self.chain.xor_block(words, offset, block_size);
        self.chain.prev_block = this_block;
    }

    fn reinit(&mut self, iv: Option<&[u32]>) {
        self.chain.reinit(iv);
    }

    fn boxed_clone(&self) -> Box<dyn ModeState> {
        Box::new(self.clone())
    }
}

//! Test-only block primitive.
//!
//! An invertible 128-bit toy transform, good enough to exercise buffering,
//! chaining, padding, and serialization without pulling a real cipher into
//! the tree. Provides no security.

use crate::buffer::WordBuffer;
use crate::cipher::{BlockTransform, CipherAlgorithm};
use blockvault_common::{Error, Result};

#[derive(Debug, Clone)]
pub(crate) struct ToyBlockCipher {
    key: [u32; 4],
}

impl BlockTransform for ToyBlockCipher {
    fn block_size_words(&self) -> usize {
        4
    }

    fn encrypt_block(&mut self, words: &mut [u32], offset: usize) {
        for i in 0..4 {
            let w = words[offset + i] ^ self.key[i];
            words[offset + i] = w
                .rotate_left((i as u32) * 7 + 3)
                .wrapping_add(self.key[(i + 1) % 4]);
        }
    }

    fn decrypt_block(&mut self, words: &mut [u32], offset: usize) {
        for i in 0..4 {
            let w = words[offset + i].wrapping_sub(self.key[(i + 1) % 4]);
            words[offset + i] = w.rotate_right((i as u32) * 7 + 3) ^ self.key[i];
        }
    }
}

impl CipherAlgorithm for ToyBlockCipher {
    const ID: &'static str = "toy";

    fn from_key(key: &WordBuffer) -> Result<Self> {
        if key.len() != 16 {
            return Err(Error::InvalidInput(format!(
                "key must be 16 bytes, got {}",
                key.len()
            )));
        }
        let words = key.words();
        Ok(Self {
            key: [words[0], words[1], words[2], words[3]],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_is_invertible() {
        let mut cipher = ToyBlockCipher::from_key(&WordBuffer::from("0123456789abcdef")).unwrap();
        let original = [0xdead_beefu32, 0x0102_0304, 0, 0xffff_ffff];
        let mut words = original;
        cipher.encrypt_block(&mut words, 0);
        assert_ne!(words, original);
        cipher.decrypt_block(&mut words, 0);
        assert_eq!(words, original);
    }

    #[test]
    fn test_rejects_short_key() {
        assert!(matches!(
            ToyBlockCipher::from_key(&WordBuffer::from("short")),
            Err(Error::InvalidInput(_))
        ));
    }
}

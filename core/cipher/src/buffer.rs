//! Word-packed byte buffer.
//!
//! `WordBuffer` is the carrier type for every byte sequence in the engine:
//! plaintext, ciphertext, keys, IVs, and salts. Bytes are packed big-endian
//! into 32-bit words, and a separate significant-byte count allows the
//! buffer to hold a partial tail word. The allocated word vector may be
//! longer than the significant bytes require; `clamp` restores the tight
//! representation.

use zeroize::Zeroize;

use crate::rng::SecureRandom;
use blockvault_common::Result;

/// Packed 32-bit-word byte container with partial-tail tracking.
///
/// Invariant: `sig_bytes <= words.len() * 4`. Bits beyond `sig_bytes` are
/// unspecified until `clamp` zeroes them.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct WordBuffer {
    words: Vec<u32>,
    sig_bytes: usize,
}

impl WordBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer from words and an explicit significant-byte count.
    ///
    /// # Preconditions
    /// - `sig_bytes` must not exceed `words.len() * 4`
    pub fn from_words(words: Vec<u32>, sig_bytes: usize) -> Self {
        debug_assert!(sig_bytes <= words.len() * 4);
        Self { words, sig_bytes }
    }

    /// Create a buffer from words, all of them significant.
    pub fn from_full_words(words: Vec<u32>) -> Self {
        let sig_bytes = words.len() * 4;
        Self { words, sig_bytes }
    }

    /// Pack a byte slice big-endian into words.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut words = vec![0u32; bytes.len().div_ceil(4)];
        for (i, &b) in bytes.iter().enumerate() {
            words[i >> 2] |= u32::from(b) << (24 - (i % 4) * 8);
        }
        Self {
            words,
            sig_bytes: bytes.len(),
        }
    }

    /// Fill a buffer with `n_bytes` from a cryptographically secure source.
    ///
    /// # Errors
    /// - `Error::RandomSource` if the provider cannot supply entropy. There
    ///   is no fallback to a non-secure generator.
    pub fn random(rng: &mut dyn SecureRandom, n_bytes: usize) -> Result<Self> {
        let mut bytes = vec![0u8; n_bytes];
        rng.fill_bytes(&mut bytes)?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Number of significant bytes.
    pub fn len(&self) -> usize {
        self.sig_bytes
    }

    /// Whether the buffer holds no significant bytes.
    pub fn is_empty(&self) -> bool {
        self.sig_bytes == 0
    }

    /// The backing words, including any allocated but insignificant tail.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub(crate) fn words_mut(&mut self) -> &mut [u32] {
        &mut self.words
    }

    /// The significant byte at `index`.
    ///
    /// # Panics
    /// Panics if `index >= self.len()`.
    pub fn byte_at(&self, index: usize) -> u8 {
        assert!(index < self.sig_bytes);
        ((self.words[index >> 2] >> (24 - (index % 4) * 8)) & 0xff) as u8
    }

    /// Unpack the significant bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        (0..self.sig_bytes).map(|i| self.byte_at(i)).collect()
    }

    /// Append `other`'s significant bytes onto this buffer.
    ///
    /// Uses a word-by-word copy when this buffer ends on a word boundary
    /// and a shifted byte-by-byte copy otherwise.
    pub fn concat(&mut self, other: &WordBuffer) -> &mut Self {
        let that_sig = other.sig_bytes;

        // Zero stray bits so the OR-merge below is sound.
        self.clamp();

        if self.sig_bytes % 4 != 0 {
            let base = self.sig_bytes;
            for i in 0..that_sig {
                self.or_byte(base + i, other.byte_at(i));
            }
        } else {
            let needed = (self.sig_bytes + that_sig).div_ceil(4);
            if self.words.len() < needed {
                self.words.resize(needed, 0);
            }
            for j in (0..that_sig).step_by(4) {
                self.words[(self.sig_bytes + j) >> 2] = other.words[j >> 2];
            }
        }
        self.sig_bytes += that_sig;
        self
    }

    fn or_byte(&mut self, index: usize, byte: u8) {
        let word = index >> 2;
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= u32::from(byte) << (24 - (index % 4) * 8);
    }

    /// Zero all bits beyond the significant bytes and drop excess words.
    pub fn clamp(&mut self) {
        let sig = self.sig_bytes;
        if sig % 4 != 0 {
            if let Some(w) = self.words.get_mut(sig >> 2) {
                *w &= 0xffff_ffffu32 << (32 - (sig % 4) * 8);
            }
        }
        self.words.truncate(sig.div_ceil(4));
    }

    /// Reduce the significant-byte count to `new_sig_bytes`.
    ///
    /// Backing words are left in place; `clamp` tightens them.
    pub fn truncate(&mut self, new_sig_bytes: usize) {
        if new_sig_bytes < self.sig_bytes {
            self.sig_bytes = new_sig_bytes;
        }
    }

    /// Grow the word vector with zeros up to `n_words` entries.
    pub(crate) fn extend_words_to(&mut self, n_words: usize) {
        if self.words.len() < n_words {
            self.words.resize(n_words, 0);
        }
    }

    /// Remove the first `n_words` words, accounting for `n_bytes`
    /// significant bytes, and return them as a new buffer.
    pub(crate) fn drain_words(&mut self, n_words: usize, n_bytes: usize) -> WordBuffer {
        let n_words = n_words.min(self.words.len());
        let drained: Vec<u32> = self.words.drain(..n_words).collect();
        self.sig_bytes -= n_bytes;
        WordBuffer {
            words: drained,
            sig_bytes: n_bytes,
        }
    }
}

impl Zeroize for WordBuffer {
    fn zeroize(&mut self) {
        self.words.zeroize();
        self.sig_bytes.zeroize();
    }
}

impl std::fmt::Debug for WordBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WordBuffer({} bytes)", self.sig_bytes)
    }
}

impl From<&WordBuffer> for WordBuffer {
    fn from(buffer: &WordBuffer) -> Self {
        buffer.clone()
    }
}

impl From<&[u8]> for WordBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for WordBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(&bytes)
    }
}

impl From<&str> for WordBuffer {
    fn from(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }
}

impl From<String> for WordBuffer {
    fn from(text: String) -> Self {
        Self::from_bytes(text.as_bytes())
    }
}

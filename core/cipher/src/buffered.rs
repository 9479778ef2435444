//! Streaming block accumulator.
//!
//! `BlockBuffer` collects arbitrarily sized input and releases it in whole
//! blocks to a per-block transform. A configurable reserve keeps trailing
//! blocks buffered until the flush, which is how a decryptor holds back the
//! final ciphertext block for unpadding.

use crate::buffer::WordBuffer;
use crate::encoding;

/// Accumulate/emit engine underlying the cipher state machines.
#[derive(Debug, Clone, Default)]
pub struct BlockBuffer {
    data: WordBuffer,
    bytes_seen: usize,
    block_size: usize,
    min_buffered_blocks: usize,
}

impl BlockBuffer {
    /// Create a buffer for blocks of `block_size_words` words.
    pub fn new(block_size_words: usize) -> Self {
        Self {
            data: WordBuffer::new(),
            bytes_seen: 0,
            block_size: block_size_words,
            min_buffered_blocks: 0,
        }
    }

    /// Discard buffered data and the total-bytes counter.
    ///
    /// The block reserve is configuration, not data, and survives a reset.
    pub fn reset(&mut self) {
        self.data = WordBuffer::new();
        self.bytes_seen = 0;
    }

    /// Number of whole blocks to keep buffered outside a flush.
    pub fn set_min_buffered_blocks(&mut self, blocks: usize) {
        self.min_buffered_blocks = blocks;
    }

    /// Bytes currently buffered and not yet emitted.
    pub fn buffered_bytes(&self) -> usize {
        self.data.len()
    }

    /// Total bytes appended over the session's lifetime.
    pub fn bytes_seen(&self) -> usize {
        self.bytes_seen
    }

    /// Append raw data.
    pub fn append(&mut self, data: &WordBuffer) {
        self.data.concat(data);
        self.bytes_seen += data.len();
    }

    /// Append UTF-8 text.
    pub fn append_text(&mut self, text: &str) {
        self.append(&encoding::from_utf8(text));
    }

    pub(crate) fn data_mut(&mut self) -> &mut WordBuffer {
        &mut self.data
    }

    /// Run `per_block` over every ready block and drain the consumed words.
    ///
    /// Outside a flush, ready blocks are the buffered whole blocks minus the
    /// reserve. Under a flush, a trailing partial block is zero-extended and
    /// processed too.
    pub fn process<F>(&mut self, flush: bool, mut per_block: F) -> WordBuffer
    where
        F: FnMut(&mut [u32], usize),
    {
        let block_size_bytes = self.block_size * 4;
        let buffered = self.data.len();

        let blocks_ready = if flush {
            buffered.div_ceil(block_size_bytes)
        } else {
            (buffered / block_size_bytes).saturating_sub(self.min_buffered_blocks)
        };
        let words_ready = blocks_ready * self.block_size;
        let bytes_ready = (words_ready * 4).min(buffered);

        if words_ready == 0 {
            return WordBuffer::new();
        }

        self.data.extend_words_to(words_ready);
        for offset in (0..words_ready).step_by(self.block_size) {
            per_block(self.data.words_mut(), offset);
        }
        self.data.drain_words(words_ready, bytes_ready)
    }
}

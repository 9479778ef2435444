//! Block-alignment padding strategies.

use std::fmt;

use crate::buffer::WordBuffer;
use blockvault_common::{Error, Result};

/// Deterministic extension of a message to a block-size multiple.
pub trait Padding: fmt::Debug + Send + Sync {
    /// Stable identifier for serialized results.
    fn id(&self) -> &'static str;

    /// Extend `data` to the next multiple of the block size.
    fn pad(&self, data: &mut WordBuffer, block_size_words: usize);

    /// Remove a previously applied extension.
    ///
    /// # Errors
    /// - `Error::InsufficientData` if the encoded padding length cannot be
    ///   removed from the buffer.
    fn unpad(&self, data: &mut WordBuffer) -> Result<()>;
}

/// PKCS #5/7 padding.
///
/// Always appends between 1 and `block_size_bytes` bytes, each holding the
/// padding length, so an aligned message still grows by a full block.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pkcs7;

impl Padding for Pkcs7 {
    fn id(&self) -> &'static str {
        "pkcs7"
    }

    fn pad(&self, data: &mut WordBuffer, block_size_words: usize) {
        let block_size_bytes = block_size_words * 4;
        let n_padding = block_size_bytes - data.len() % block_size_bytes;
        let padding = WordBuffer::from_bytes(&vec![n_padding as u8; n_padding]);
        data.concat(&padding);
    }

    fn unpad(&self, data: &mut WordBuffer) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InsufficientData(
                "cannot unpad an empty buffer".to_string(),
            ));
        }
        // The last byte's value is trusted; the padding bytes themselves are
        // not validated. Wrong-key decryption yields truncated garbage, not
        // an integrity failure.
        let n_padding = data.byte_at(data.len() - 1) as usize;
        if n_padding > data.len() {
            return Err(Error::InsufficientData(format!(
                "padding length {} exceeds buffer of {} bytes",
                n_padding,
                data.len()
            )));
        }
        let new_len = data.len() - n_padding;
        data.truncate(new_len);
        Ok(())
    }
}

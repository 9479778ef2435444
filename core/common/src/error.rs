//! Common error types for BlockVault.

use thiserror::Error;

/// Top-level error type for BlockVault operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No cryptographically secure random source is available.
    ///
    /// Operations that need entropy fail with this error rather than
    /// falling back to a non-secure generator.
    #[error("Secure random source unavailable: {0}")]
    RandomSource(String),

    /// A text payload could not be decoded (invalid UTF-8, hex, or base64).
    #[error("Malformed text: {0}")]
    MalformedText(String),

    /// Finalizing a decryptor without at least one full buffered block.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A requested mode, padding, KDF, or format is not recognized.
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InsufficientData("need one full block".to_string());
        assert_eq!(
            err.to_string(),
            "Insufficient data: need one full block"
        );
    }

    #[test]
    fn test_random_source_display() {
        let err = Error::RandomSource("os entropy exhausted".to_string());
        assert!(err.to_string().contains("Secure random source unavailable"));
    }
}

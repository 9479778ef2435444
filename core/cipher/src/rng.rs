//! Injected secure-random provider.
//!
//! Components that need entropy take a `SecureRandom` by reference instead
//! of reaching for process-wide state. The host resolves a provider once at
//! startup; `OsRandom` is the standard choice. There is deliberately no
//! fallback to a non-secure generator: when the OS source fails, every
//! operation requiring randomness fails with `Error::RandomSource`.

use rand::rngs::OsRng;
use rand::RngCore;

use blockvault_common::{Error, Result};

/// Source of cryptographically secure random bytes.
pub trait SecureRandom {
    /// Fill `dest` with random bytes.
    ///
    /// # Errors
    /// - `Error::RandomSource` if no secure entropy is available.
    fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<()>;
}

/// Provider backed by the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl SecureRandom for OsRandom {
    fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| Error::RandomSource(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_random_fills() {
        let mut rng = OsRandom;
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        rng.fill_bytes(&mut a).unwrap();
        rng.fill_bytes(&mut b).unwrap();
        assert_ne!(a, b);
    }

    /// A provider with no entropy must surface an error, never degrade.
    struct NoEntropy;

    impl SecureRandom for NoEntropy {
        fn fill_bytes(&mut self, _dest: &mut [u8]) -> Result<()> {
            Err(Error::RandomSource("no source".to_string()))
        }
    }

    #[test]
    fn test_unavailable_source_errors() {
        use crate::buffer::WordBuffer;
        let mut rng = NoEntropy;
        assert!(matches!(
            WordBuffer::random(&mut rng, 8),
            Err(Error::RandomSource(_))
        ));
    }
}

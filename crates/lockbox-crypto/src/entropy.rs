//! Randomness source abstraction.
//!
//! Every random byte the engine consumes (ephemeral keys, nonces, content
//! keys) is drawn through [`Entropy`]. Production code uses [`OsEntropy`];
//! tests inject a seeded source to make wire output reproducible.

/// Source of random bytes.
///
/// # Invariants
///
/// - Production implementations MUST be cryptographically secure
/// - `fill_bytes` fills the whole buffer or does not return
pub trait Entropy: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    fn fill_bytes(&self, buffer: &mut [u8]);

    /// Returns a fixed-size array of random bytes.
    fn random_array<const N: usize>(&self) -> [u8; N] {
        let mut bytes = [0u8; N];
        self.fill_bytes(&mut bytes);
        bytes
    }
}

/// Operating system CSPRNG (getrandom).
///
/// # Panics
///
/// Panics if the OS RNG fails. Nothing in this crate can operate securely
/// without it, and the failure indicates an OS-level problem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl Entropy for OsEntropy {
    #[allow(clippy::disallowed_methods)]
    #[allow(clippy::expect_used)]
    fn fill_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use seeded::SeededEntropy;

#[cfg(any(test, feature = "test-utils"))]
mod seeded {
    use std::sync::{Arc, Mutex, PoisonError};

    use rand_chacha::{
        ChaCha20Rng,
        rand_core::{RngCore, SeedableRng},
    };

    use super::Entropy;

    /// Deterministic entropy for tests (ChaCha20 seeded from a `u64`).
    ///
    /// Clones share one stream, so a codec and its inner core draw from the
    /// same sequence exactly as they would from the OS RNG.
    #[derive(Clone)]
    pub struct SeededEntropy {
        rng: Arc<Mutex<ChaCha20Rng>>,
    }

    impl SeededEntropy {
        /// Create a source that replays the stream for `seed`.
        pub fn from_seed(seed: u64) -> Self {
            Self { rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))) }
        }
    }

    impl Entropy for SeededEntropy {
        fn fill_bytes(&self, buffer: &mut [u8]) {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            rng.fill_bytes(buffer);
        }
    }

    impl std::fmt::Debug for SeededEntropy {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("SeededEntropy").finish_non_exhaustive()
        }
    }
}

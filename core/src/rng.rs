//! Deterministic random number generation.
//!
//! RULE: Nothing in the selection path may call any platform RNG.
//! All randomness flows through a single SpinRng seeded once at engine
//! construction. Same seed, same outcome sequence — the property the
//! determinism test pins down.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// The engine's one deterministic RNG stream.
pub struct SpinRng {
    inner: Pcg64Mcg,
}

impl SpinRng {
    pub fn seed_from_u64(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }
}

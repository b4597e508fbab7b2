//! Deterministic random number generation.
//!
//! RULE: Nothing in the generator may call any platform RNG.
//! All randomness flows through one SimRng seeded once from the
//! configured `random_seed`, and is advanced strictly sequentially:
//!   1. reference entities, in catalog order
//!   2. target population, campaign-major / visitor-minor
//!   3. funnel, in target population order
//!
//! Changing the draw order of any component changes every draw after it.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// The single, named PRNG for a generation run.
pub struct SimRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
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

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniform float in [lo, hi).
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Uniform integer in [lo, hi], both ends included.
    pub fn range_inclusive(&mut self, lo: u64, hi: u64) -> u64 {
        assert!(hi >= lo, "empty range {lo}..={hi}");
        lo + self.next_u64_below(hi - lo + 1)
    }
}

/// Round `value` half away from zero to `places` decimal digits.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

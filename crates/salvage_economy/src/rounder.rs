//! # Probabilistic Rounding
//!
//! Turns a fractional expected yield into a whole item count whose
//! expectation equals the fractional value.
//!
//! ## Regimes
//!
//! - `expected_per_unit >= 1`: deterministic, `consumed * ceil(expected)`
//! - `consumed <= 100`: one Bernoulli trial per consumed unit
//! - `consumed > 100`: guaranteed `floor(expected * consumed)` plus one
//!   Bernoulli trial for the fractional remainder
//!
//! The large-batch regime keeps the cost O(1) while preserving the mean.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Largest batch rolled unit by unit.
pub const PER_UNIT_TRIAL_LIMIT: u32 = 100;

/// Seeded yield rounder.
#[derive(Clone, Debug)]
pub struct ProbabilisticRounder {
    rng: ChaCha8Rng,
}

impl ProbabilisticRounder {
    /// Creates a rounder with a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Creates a rounder seeded from the system clock.
    #[must_use]
    pub fn from_clock() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::new(seed)
    }

    /// Rounds `consumed * expected_per_unit` to a whole yield.
    ///
    /// Non-positive or non-finite expectations yield 0.
    pub fn round(&mut self, consumed: u32, expected_per_unit: f64) -> u32 {
        if consumed == 0 || !expected_per_unit.is_finite() || expected_per_unit <= 0.0 {
            return 0;
        }

        if expected_per_unit >= 1.0 {
            let per_unit = expected_per_unit.ceil();
            return (f64::from(consumed) * per_unit).min(f64::from(u32::MAX)) as u32;
        }

        if consumed <= PER_UNIT_TRIAL_LIMIT {
            return (0..consumed)
                .filter(|_| self.rng.gen_bool(expected_per_unit))
                .count() as u32;
        }

        let expected = expected_per_unit * f64::from(consumed);
        let guaranteed = expected.floor();
        let remainder = (expected - guaranteed).clamp(0.0, 1.0);
        let bonus = u32::from(self.rng.gen_bool(remainder));
        guaranteed as u32 + bonus
    }
}

impl Default for ProbabilisticRounder {
    fn default() -> Self {
        Self::from_clock()
    }
}

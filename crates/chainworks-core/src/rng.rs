//! Deterministic random source for quality rolls.
//!
//! Stages never reach for ambient randomness: every upgrade chance is drawn
//! from a [`RandomSource`] handed in by the driver. [`SimRng`] is the
//! SplitMix64 generator used by facilities; tests can script outcomes.

use crate::fixed::Fixed64;

/// Seedable source of randomness injected into quality derivation.
pub trait RandomSource {
    /// Next raw 64-bit value.
    fn next_u64(&mut self) -> u64;

    /// Bernoulli draw. Non-positive probabilities never hit; probabilities
    /// of one or more always hit without consuming a value.
    fn chance(&mut self, probability: Fixed64) -> bool {
        if probability <= Fixed64::ZERO {
            return false;
        }
        if probability >= Fixed64::from_num(1) {
            return true;
        }
        // For p in (0,1) the Q32.32 bits are the fraction scaled to [0, 2^32).
        let upper = (self.next_u64() >> 32) as u32;
        (upper as u64) < probability.to_bits() as u64
    }
}

/// SplitMix64 over a single `u64` word, which is all a snapshot stores.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Raw generator word.
    pub fn state(&self) -> u64 {
        self.state
    }
}

impl RandomSource for SimRng {
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

//! Ordered output grades and the tables keyed by them.

use crate::fixed::Fixed64;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// QualityTier
// ---------------------------------------------------------------------------

/// Output grade of a batch. Ordered: `Standard < Good < VeryGood < Legendary`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum QualityTier {
    #[default]
    Standard,
    Good,
    VeryGood,
    Legendary,
}

impl QualityTier {
    pub const ALL: [QualityTier; 4] = [
        QualityTier::Standard,
        QualityTier::Good,
        QualityTier::VeryGood,
        QualityTier::Legendary,
    ];

    /// Numeric level, 0 for `Standard` through 3 for `Legendary`.
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Inverse of [`level`](Self::level); levels above 3 saturate.
    pub fn from_level(level: u8) -> Self {
        Self::ALL[(level as usize).min(Self::ALL.len() - 1)]
    }

    /// One tier up. `Legendary` stays `Legendary`.
    pub fn upgrade(self) -> Self {
        Self::from_level(self.level().saturating_add(1))
    }

    /// One tier down. `Standard` stays `Standard`.
    pub fn downgrade(self) -> Self {
        Self::from_level(self.level().saturating_sub(1))
    }

    /// Canonical persisted name.
    pub fn as_str(self) -> &'static str {
        match self {
            QualityTier::Standard => "STANDARD",
            QualityTier::Good => "GOOD",
            QualityTier::VeryGood => "VERY_GOOD",
            QualityTier::Legendary => "LEGENDARY",
        }
    }

    /// Parse a persisted name, ignoring case. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Tier implied by a timing score.
    pub fn from_score(score: Fixed64, thresholds: &ScoreThresholds) -> Self {
        if score >= thresholds.legendary {
            QualityTier::Legendary
        } else if score >= thresholds.very_good {
            QualityTier::VeryGood
        } else if score >= thresholds.good {
            QualityTier::Good
        } else {
            QualityTier::Standard
        }
    }
}

// ---------------------------------------------------------------------------
// Score thresholds
// ---------------------------------------------------------------------------

/// Minimum score for each tier above `Standard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreThresholds {
    pub good: Fixed64,
    pub very_good: Fixed64,
    pub legendary: Fixed64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            good: Fixed64::from_num(0.5),
            very_good: Fixed64::from_num(0.7),
            legendary: Fixed64::from_num(0.9),
        }
    }
}

// ---------------------------------------------------------------------------
// Multiplier table
// ---------------------------------------------------------------------------

/// Per-tier value multipliers used by downstream pricing or effect code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityMultipliers([Fixed64; 4]);

impl QualityMultipliers {
    pub fn new(standard: Fixed64, good: Fixed64, very_good: Fixed64, legendary: Fixed64) -> Self {
        Self([standard, good, very_good, legendary])
    }

    pub fn get(&self, tier: QualityTier) -> Fixed64 {
        self.0[tier.level() as usize]
    }
}

impl Default for QualityMultipliers {
    fn default() -> Self {
        Self::new(
            Fixed64::from_num(0.7),
            Fixed64::from_num(1),
            Fixed64::from_num(1.5),
            Fixed64::from_num(2.5),
        )
    }
}

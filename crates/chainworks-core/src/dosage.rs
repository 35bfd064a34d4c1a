//! Operator-set potency slider and its potency/yield trade-off.

use serde::{Deserialize, Serialize};

/// Slider position used when nothing (or garbage) was persisted.
pub const DEFAULT_SLIDER: u8 = 50;

/// Upper bound of the slider.
pub const SLIDER_MAX: u8 = 100;

/// Clamp any requested slider value into `[0, 100]`.
pub fn clamp_slider(value: i64) -> u8 {
    value.clamp(0, SLIDER_MAX as i64) as u8
}

/// Constants of the potency mapping and the charge-yield formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DosageProfile {
    /// Potency at slider 0, in micrograms.
    pub min_ug: u32,
    /// Potency at slider 100, in micrograms.
    pub max_ug: u32,
    /// `K` in `max(1, K - potency / P)`.
    pub base_charges: u32,
    /// `P` in `max(1, K - potency / P)`.
    pub ug_per_charge: u32,
}

impl Default for DosageProfile {
    fn default() -> Self {
        Self {
            min_ug: 50,
            max_ug: 300,
            base_charges: 10,
            ug_per_charge: 50,
        }
    }
}

impl DosageProfile {
    pub fn is_valid(&self) -> bool {
        self.min_ug <= self.max_ug && self.ug_per_charge > 0
    }

    /// Linear map of the slider onto `[min_ug, max_ug]`.
    pub fn potency(&self, slider: u8) -> u32 {
        let span = self.max_ug.saturating_sub(self.min_ug) as u64;
        let step = span * slider.min(SLIDER_MAX) as u64 / SLIDER_MAX as u64;
        self.min_ug + step as u32
    }

    /// Output units per input unit at the given potency. Never below 1.
    pub fn charge_yield(&self, potency_ug: u32) -> u32 {
        let spent = potency_ug / self.ug_per_charge.max(1);
        self.base_charges.saturating_sub(spent).max(1)
    }

    pub fn reading(&self, slider: u8) -> DosageReading {
        let potency_ug = self.potency(slider);
        DosageReading {
            slider,
            potency_ug,
            charges_per_unit: self.charge_yield(potency_ug),
            band: DosageBand::from_slider(slider),
        }
    }
}

/// Coarse strength label by slider quarter, for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DosageBand {
    Weak,
    Standard,
    Strong,
    Intense,
}

impl DosageBand {
    pub fn from_slider(slider: u8) -> Self {
        match slider {
            0..25 => DosageBand::Weak,
            25..50 => DosageBand::Standard,
            50..75 => DosageBand::Strong,
            _ => DosageBand::Intense,
        }
    }
}

/// Everything a dosage panel shows for one slider position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosageReading {
    pub slider: u8,
    pub potency_ug: u32,
    pub charges_per_unit: u32,
    pub band: DosageBand,
}

//! Heat-controlled stages.
//!
//! The operator switches a heater on and off. Progress only advances while
//! the vessel is at working temperature, and the share of the batch spent
//! in the optimal and danger bands feeds the quality roll. Running past the
//! critical temperature destroys whatever is loaded.

use crate::fixed::{Fixed64, ratio};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatProfile {
    pub ambient: Fixed64,
    pub optimal_min: Fixed64,
    pub optimal_max: Fixed64,
    pub danger_max: Fixed64,
    /// Temperature at or above which the loaded batch is lost.
    pub critical: Fixed64,
    pub rise_per_tick: Fixed64,
    pub fall_per_tick: Fixed64,
    /// Extra heat from the reaction while a batch is cooking.
    pub process_heat: Fixed64,
    /// Drop applied when a batch completes.
    pub cooldown_after_batch: Fixed64,
}

impl Default for HeatProfile {
    fn default() -> Self {
        Self {
            ambient: Fixed64::from_num(20),
            optimal_min: Fixed64::from_num(80),
            optimal_max: Fixed64::from_num(120),
            danger_max: Fixed64::from_num(150),
            critical: Fixed64::from_num(151),
            rise_per_tick: Fixed64::from_num(1.5),
            fall_per_tick: Fixed64::from_num(0.8),
            process_heat: Fixed64::from_num(0.3),
            cooldown_after_batch: Fixed64::from_num(30),
        }
    }
}

impl HeatProfile {
    pub fn is_valid(&self) -> bool {
        self.ambient < self.optimal_min
            && self.optimal_min <= self.optimal_max
            && self.optimal_max <= self.danger_max
            && self.danger_max < self.critical
            && self.rise_per_tick > Fixed64::ZERO
            && self.fall_per_tick > Fixed64::ZERO
    }

    pub fn zone(&self, temperature: Fixed64) -> HeatZone {
        if temperature < self.optimal_min {
            HeatZone::Cold
        } else if temperature <= self.optimal_max {
            HeatZone::Optimal
        } else if temperature <= self.danger_max {
            HeatZone::Danger
        } else {
            HeatZone::Critical
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeatZone {
    Cold,
    Optimal,
    Danger,
    Critical,
}

// ---------------------------------------------------------------------------
// Quality policy
// ---------------------------------------------------------------------------

/// Thresholds of the heat-based quality roll, as shares of the batch duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatQuality {
    /// Danger share strictly above this downgrades the input tier.
    pub danger_share_limit: Fixed64,
    pub legendary_share: Fixed64,
    pub legendary_chance: Fixed64,
    pub upgrade_share: Fixed64,
    pub upgrade_chance: Fixed64,
}

impl Default for HeatQuality {
    fn default() -> Self {
        Self {
            danger_share_limit: Fixed64::from_num(0.3),
            legendary_share: Fixed64::from_num(0.9),
            legendary_chance: Fixed64::from_num(0.3),
            upgrade_share: Fixed64::from_num(0.7),
            upgrade_chance: Fixed64::from_num(0.5),
        }
    }
}

/// Time-in-band totals of one finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatRecord {
    pub optimal_ticks: u32,
    pub danger_ticks: u32,
    pub duration: u32,
}

impl HeatRecord {
    pub fn optimal_share(&self) -> Fixed64 {
        ratio(self.optimal_ticks as u64, self.duration as u64)
    }

    pub fn danger_share(&self) -> Fixed64 {
        ratio(self.danger_ticks as u64, self.duration as u64)
    }
}

// ---------------------------------------------------------------------------
// Runtime state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThermalState {
    pub temperature: Fixed64,
    pub heating: bool,
    pub optimal_ticks: u32,
    pub danger_ticks: u32,
}

/// What one heat update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatStep {
    /// Below working temperature; the batch does not advance.
    Cold,
    /// At working temperature; the batch may advance.
    Working,
    /// Critical temperature reached.
    Overheated,
}

impl ThermalState {
    pub fn ambient(profile: &HeatProfile) -> Self {
        Self {
            temperature: profile.ambient,
            heating: false,
            optimal_ticks: 0,
            danger_ticks: 0,
        }
    }

    /// Apply one tick of heating or cooling.
    ///
    /// `cooking` adds reaction heat; `output_pending` forces the heater off.
    pub fn update(&mut self, profile: &HeatProfile, cooking: bool, output_pending: bool) -> HeatStep {
        if output_pending {
            self.heating = false;
        }
        if self.heating {
            self.temperature += profile.rise_per_tick;
            if cooking {
                self.temperature += profile.process_heat;
            }
        } else if self.temperature > profile.ambient {
            self.temperature = (self.temperature - profile.fall_per_tick).max(profile.ambient);
        }

        if self.temperature >= profile.critical {
            HeatStep::Overheated
        } else if self.temperature >= profile.optimal_min {
            HeatStep::Working
        } else {
            HeatStep::Cold
        }
    }

    /// Count the current tick towards the band it was spent in.
    pub fn record_progress_tick(&mut self, profile: &HeatProfile) {
        match profile.zone(self.temperature) {
            HeatZone::Optimal => self.optimal_ticks += 1,
            HeatZone::Danger => self.danger_ticks += 1,
            HeatZone::Cold | HeatZone::Critical => {}
        }
    }

    pub fn record(&self, duration: u32) -> HeatRecord {
        HeatRecord {
            optimal_ticks: self.optimal_ticks,
            danger_ticks: self.danger_ticks,
            duration,
        }
    }

    /// Reset band counters, switch the heater off and drop the post-batch
    /// cooldown.
    pub fn finish_batch(&mut self, profile: &HeatProfile) {
        self.heating = false;
        self.optimal_ticks = 0;
        self.danger_ticks = 0;
        self.temperature = (self.temperature - profile.cooldown_after_batch).max(profile.ambient);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_valid() {
        assert!(HeatProfile::default().is_valid());
        let broken = HeatProfile {
            optimal_min: Fixed64::from_num(200),
            ..HeatProfile::default()
        };
        assert!(!broken.is_valid());
    }

    #[test]
    fn zones_partition_temperature() {
        let p = HeatProfile::default();
        assert_eq!(p.zone(Fixed64::from_num(79)), HeatZone::Cold);
        assert_eq!(p.zone(Fixed64::from_num(80)), HeatZone::Optimal);
        assert_eq!(p.zone(Fixed64::from_num(120)), HeatZone::Optimal);
        assert_eq!(p.zone(Fixed64::from_num(121)), HeatZone::Danger);
        assert_eq!(p.zone(Fixed64::from_num(150.5)), HeatZone::Critical);
    }

    #[test]
    fn heating_reaches_working_temperature() {
        let p = HeatProfile::default();
        let mut s = ThermalState::ambient(&p);
        s.heating = true;
        // (80 - 20) / 1.5 = 40 ticks
        for _ in 0..39 {
            assert_eq!(s.update(&p, false, false), HeatStep::Cold);
        }
        assert_eq!(s.update(&p, false, false), HeatStep::Working);
    }

    #[test]
    fn cooling_stops_at_ambient() {
        let p = HeatProfile::default();
        let mut s = ThermalState::ambient(&p);
        s.temperature = Fixed64::from_num(21);
        s.update(&p, false, false);
        s.update(&p, false, false);
        assert_eq!(s.temperature, p.ambient);
    }

    #[test]
    fn pending_output_switches_heater_off() {
        let p = HeatProfile::default();
        let mut s = ThermalState::ambient(&p);
        s.heating = true;
        s.update(&p, false, true);
        assert!(!s.heating);
        assert_eq!(s.temperature, p.ambient);
    }

    #[test]
    fn overheat_detected_at_critical() {
        let p = HeatProfile::default();
        let mut s = ThermalState::ambient(&p);
        s.temperature = Fixed64::from_num(150);
        s.heating = true;
        assert_eq!(s.update(&p, false, false), HeatStep::Overheated);
    }

    #[test]
    fn band_counters_and_cooldown() {
        let p = HeatProfile::default();
        let mut s = ThermalState::ambient(&p);
        s.temperature = Fixed64::from_num(100);
        s.record_progress_tick(&p);
        s.temperature = Fixed64::from_num(130);
        s.record_progress_tick(&p);
        let r = s.record(4);
        assert_eq!(r.optimal_share(), Fixed64::from_num(0.25));
        assert_eq!(r.danger_share(), Fixed64::from_num(0.25));
        s.finish_batch(&p);
        assert_eq!(s.temperature, Fixed64::from_num(100));
        assert_eq!(s.optimal_ticks, 0);
    }
}

//! Fuel tanks for stages that burn a consumable while working.

use crate::id::ActorId;
use serde::{Deserialize, Serialize};

/// Currency collaborator charged when a tank is refilled.
pub trait Wallet {
    /// Take `amount` from the actor's funds. `false` leaves funds untouched.
    fn withdraw_funds(&mut self, actor: ActorId, amount: u64) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelProfile {
    pub capacity: u32,
    /// One unit is burned every this many progress ticks.
    pub ticks_per_unit: u32,
    pub price_per_unit: u64,
}

impl Default for FuelProfile {
    fn default() -> Self {
        Self {
            capacity: 100,
            ticks_per_unit: 20,
            price_per_unit: 5,
        }
    }
}

impl FuelProfile {
    pub fn is_valid(&self) -> bool {
        self.capacity > 0 && self.ticks_per_unit > 0
    }

    /// Whether the progress tick just taken burns a unit.
    pub fn burns_at(&self, progress: u32) -> bool {
        progress > 0 && progress % self.ticks_per_unit.max(1) == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefuelOutcome {
    Refueled { units: u32, cost: u64 },
    TankFull,
    InsufficientFunds,
    /// The stage has no tank.
    NotFuelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burns_every_interval() {
        let p = FuelProfile::default();
        assert!(!p.burns_at(0));
        assert!(!p.burns_at(19));
        assert!(p.burns_at(20));
        assert!(p.burns_at(40));
    }

    #[test]
    fn zero_interval_is_invalid() {
        let p = FuelProfile {
            ticks_per_unit: 0,
            ..FuelProfile::default()
        };
        assert!(!p.is_valid());
        assert!(FuelProfile::default().is_valid());
    }
}

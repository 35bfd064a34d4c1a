//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::dosage::DosageProfile;
use crate::event::ActivitySink;
use crate::fixed::Fixed64;
use crate::fuel::{FuelProfile, Wallet};
use crate::id::{ActorId, ItemTypeId, StageId};
use crate::recipe::*;
use crate::registry::ItemCatalog;
use crate::rng::RandomSource;
use crate::stage::ProcessingStage;
use crate::thermal::{HeatProfile, HeatQuality};
use crate::timing::TimingWindow;
use std::collections::HashMap;
use std::sync::Arc;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Item constructors
// ===========================================================================

pub fn raw() -> ItemTypeId {
    ItemTypeId(0)
}
pub fn product() -> ItemTypeId {
    ItemTypeId(1)
}
pub fn trigger() -> ItemTypeId {
    ItemTypeId(2)
}
pub fn binder() -> ItemTypeId {
    ItemTypeId(3)
}
pub fn reagent_a() -> ItemTypeId {
    ItemTypeId(10)
}
pub fn reagent_a_plus() -> ItemTypeId {
    ItemTypeId(11)
}
pub fn reagent_b() -> ItemTypeId {
    ItemTypeId(12)
}
pub fn reagent_c() -> ItemTypeId {
    ItemTypeId(13)
}

const FIXTURE_NAMES: [(ItemTypeId, &str); 8] = [
    (ItemTypeId(0), "raw"),
    (ItemTypeId(1), "product"),
    (ItemTypeId(2), "trigger"),
    (ItemTypeId(3), "binder"),
    (ItemTypeId(10), "reagent_a"),
    (ItemTypeId(11), "reagent_a_plus"),
    (ItemTypeId(12), "reagent_b"),
    (ItemTypeId(13), "reagent_c"),
];

/// Names the fixture item IDs above.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCatalog;

impl ItemCatalog for FixtureCatalog {
    fn resolve_item_type(&self, name: &str) -> Option<ItemTypeId> {
        FIXTURE_NAMES.iter().find(|(_, n)| *n == name).map(|(id, _)| *id)
    }

    fn item_name(&self, id: ItemTypeId) -> Option<&str> {
        FIXTURE_NAMES.iter().find(|(i, _)| *i == id).map(|(_, n)| *n)
    }
}

// ===========================================================================
// Recipe constructors
// ===========================================================================

pub fn pooled_recipe(capacity: u32, start: BatchStart, duration: u32) -> Arc<RecipeDefinition> {
    let inputs = InputRule::Pooled {
        accepts: vec![AcceptedInput::plain(raw())],
        capacity,
        start,
        reagent: None,
    };
    Arc::new(RecipeDefinition::timed("pool", inputs, duration, product()))
}

pub fn pooled_stage(capacity: u32, start: BatchStart, duration: u32) -> ProcessingStage {
    ProcessingStage::new(pooled_recipe(capacity, start, duration))
}

/// `[reagent_a | reagent_a_plus(+0.1)] -> reagent_b -> reagent_c`.
pub fn ordered_recipe(duration: u32) -> Arc<RecipeDefinition> {
    let inputs = InputRule::Ordered {
        slots: vec![
            vec![
                AcceptedInput::plain(reagent_a()),
                AcceptedInput::with_bonus(reagent_a_plus(), fixed(0.1)),
            ],
            vec![AcceptedInput::plain(reagent_b())],
            vec![AcceptedInput::plain(reagent_c())],
        ],
    };
    Arc::new(RecipeDefinition::timed("combine", inputs, duration, product()))
}

pub fn ordered_stage(duration: u32) -> ProcessingStage {
    ProcessingStage::new(ordered_recipe(duration))
}

/// Manual-start press over `raw` with a per-unit `binder`, tablet window.
pub fn press_recipe() -> Arc<RecipeDefinition> {
    let inputs = InputRule::Pooled {
        accepts: vec![AcceptedInput::plain(raw())],
        capacity: 16,
        start: BatchStart::Manual,
        reagent: Some(Reagent {
            item_type: binder(),
            capacity: 16,
            usage: ReagentUsage::PerUnit,
        }),
    };
    Arc::new(
        RecipeDefinition::minigame("press", inputs, TimingWindow::pill_press(), product())
            .with_cosmetics(),
    )
}

/// Manual-start dosage stage, 20 ticks, charge yield.
pub fn dosage_recipe() -> Arc<RecipeDefinition> {
    let inputs = InputRule::Pooled {
        accepts: vec![AcceptedInput::plain(raw())],
        capacity: 8,
        start: BatchStart::Manual,
        reagent: None,
    };
    Arc::new(
        RecipeDefinition::timed("dose", inputs, 20, product())
            .with_yield(YieldRule::Charges)
            .with_dosage(DosageProfile::default()),
    )
}

/// Single-unit heat-controlled kettle, 400 ticks.
pub fn kettle_recipe() -> Arc<RecipeDefinition> {
    let inputs = InputRule::Single {
        accepts: vec![AcceptedInput::plain(raw())],
    };
    Arc::new(
        RecipeDefinition::timed("kettle", inputs, 400, product())
            .with_heat(HeatProfile::default())
            .with_quality(QualityRule::Heat(HeatQuality::default())),
    )
}

/// Single-unit fuelled stage, 40 ticks.
pub fn fuel_recipe() -> Arc<RecipeDefinition> {
    let inputs = InputRule::Single {
        accepts: vec![AcceptedInput::plain(raw())],
    };
    Arc::new(
        RecipeDefinition::timed("refine", inputs, 40, product())
            .with_fuel(FuelProfile::default())
            .with_quality(QualityRule::UpgradeChance { chance: fixed(0.2) }),
    )
}

// ===========================================================================
// Collaborator doubles
// ===========================================================================

/// Random source with a fixed draw. `chance(p)` succeeds exactly when `p`
/// is above the draw.
#[derive(Debug, Clone, Copy)]
pub struct ScriptedRng {
    draw: u64,
}

impl ScriptedRng {
    /// Every chance with positive probability succeeds.
    pub fn always() -> Self {
        Self { draw: 0 }
    }

    /// Every chance below certainty fails.
    pub fn never() -> Self {
        Self { draw: u64::MAX }
    }

    /// Chances strictly above `p` succeed.
    pub fn threshold(p: Fixed64) -> Self {
        Self {
            draw: (p.to_bits() as u64) << 32,
        }
    }
}

impl RandomSource for ScriptedRng {
    fn next_u64(&mut self) -> u64 {
        self.draw
    }
}

/// Wallet with per-actor balances.
#[derive(Debug, Default, Clone)]
pub struct TestWallet {
    funds: HashMap<ActorId, u64>,
}

impl TestWallet {
    pub fn with_funds(actor: ActorId, amount: u64) -> Self {
        let mut funds = HashMap::new();
        funds.insert(actor, amount);
        Self { funds }
    }

    pub fn balance(&self, actor: ActorId) -> u64 {
        self.funds.get(&actor).copied().unwrap_or(0)
    }
}

impl Wallet for TestWallet {
    fn withdraw_funds(&mut self, actor: ActorId, amount: u64) -> bool {
        match self.funds.get_mut(&actor) {
            Some(balance) if *balance >= amount => {
                *balance -= amount;
                true
            }
            _ => false,
        }
    }
}

/// Activity sink that remembers every report in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub reports: Vec<(StageId, bool)>,
}

impl RecordingSink {
    pub fn for_stage(&self, stage: StageId) -> Vec<bool> {
        self.reports
            .iter()
            .filter(|(id, _)| *id == stage)
            .map(|(_, active)| *active)
            .collect()
    }
}

impl ActivitySink for RecordingSink {
    fn report_activity(&mut self, stage: StageId, active: bool) {
        self.reports.push((stage, active));
    }
}

//! Immutable stage contracts.
//!
//! A [`RecipeDefinition`] says what a stage accepts and in which order, how
//! a batch is started and how long it runs, what it yields, and how the
//! output grade is derived. Every product chain is expressed as data through
//! these types; the stage state machine never matches on product names.

use crate::dosage::DosageProfile;
use crate::fixed::Fixed64;
use crate::fuel::FuelProfile;
use crate::id::ItemTypeId;
use crate::quality::{QualityTier, ScoreThresholds};
use crate::rng::RandomSource;
use crate::thermal::{HeatProfile, HeatQuality, HeatRecord};
use crate::timing::TimingWindow;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One acceptable input type and the upgrade-chance bonus it brings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedInput {
    pub item_type: ItemTypeId,
    pub quality_bonus: Fixed64,
}

impl AcceptedInput {
    pub fn plain(item_type: ItemTypeId) -> Self {
        Self {
            item_type,
            quality_bonus: Fixed64::ZERO,
        }
    }

    pub fn with_bonus(item_type: ItemTypeId, quality_bonus: Fixed64) -> Self {
        Self {
            item_type,
            quality_bonus,
        }
    }
}

/// What moves a pooled stage from filling to processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStart {
    /// Start with the first unit; more units may top up the running batch.
    OnFirstUnit,
    /// Start when the pool reaches capacity.
    WhenFull,
    /// Start when this item is offered. It is consumed, never counted.
    Trigger(ItemTypeId),
    /// Start only on an explicit operator action.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReagentUsage {
    /// One reagent per primary unit; the batch is the smaller of the two pools.
    PerUnit,
    /// One reagent per batch regardless of size.
    PerBatch,
}

/// A secondary co-input (binder, baking soda) kept in its own pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reagent {
    pub item_type: ItemTypeId,
    pub capacity: u32,
    pub usage: ReagentUsage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputRule {
    /// Capacity one; the single add both fills and starts the batch.
    Single { accepts: Vec<AcceptedInput> },
    /// A pool of interchangeable units.
    Pooled {
        accepts: Vec<AcceptedInput>,
        capacity: u32,
        start: BatchStart,
        reagent: Option<Reagent>,
    },
    /// Distinct inputs that must arrive in slot order; the last starts the batch.
    Ordered { slots: Vec<Vec<AcceptedInput>> },
}

// ---------------------------------------------------------------------------
// Activation and yield
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    /// Runs unattended for a fixed number of ticks.
    Timed { duration: u32 },
    /// Resolves on a player press within a timing window.
    Minigame(TimingWindow),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YieldRule {
    /// `k` output units per batch unit.
    PerUnit(u32),
    /// `max(1, size * numerator / denominator)`.
    Fraction { numerator: u32, denominator: u32 },
    /// `size * charge_yield(potency)`, from the recipe's dosage profile.
    Charges,
}

// ---------------------------------------------------------------------------
// Quality derivation
// ---------------------------------------------------------------------------

/// One step of a batch-size upgrade policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchChance {
    /// Applies when the batch size is strictly greater than this.
    pub above: u32,
    pub chance: Fixed64,
}

/// Everything a quality rule may look at when a batch completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityContext {
    pub input_quality: QualityTier,
    pub batch_size: u32,
    /// Best bonus among the loaded inputs.
    pub bonus: Fixed64,
    pub timing_score: Option<Fixed64>,
    pub heat: Option<HeatRecord>,
}

impl QualityContext {
    pub fn new(input_quality: QualityTier, batch_size: u32) -> Self {
        Self {
            input_quality,
            batch_size,
            bonus: Fixed64::ZERO,
            timing_score: None,
            heat: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityRule {
    Inherit,
    Fixed(QualityTier),
    /// Upgrade the input tier with probability `chance + bonus`.
    UpgradeChance { chance: Fixed64 },
    /// Ignore the input tier; start from `base` and maybe upgrade once.
    RollFromBase { base: QualityTier, chance: Fixed64 },
    /// Upgrade chance chosen by batch size. `steps` are checked in order.
    BatchSize {
        steps: Vec<BatchChance>,
        fallback: Fixed64,
    },
    /// Tier from the press score, never below the input tier.
    Timing { thresholds: ScoreThresholds },
    /// Tier from the time spent in each heat band.
    Heat(HeatQuality),
}

impl QualityRule {
    /// 40% above 6 units, 25% above 4, otherwise 10%.
    pub fn batch_size_default() -> Self {
        QualityRule::BatchSize {
            steps: vec![
                BatchChance {
                    above: 6,
                    chance: Fixed64::from_num(0.4),
                },
                BatchChance {
                    above: 4,
                    chance: Fixed64::from_num(0.25),
                },
            ],
            fallback: Fixed64::from_num(0.1),
        }
    }

    pub fn timing_default() -> Self {
        QualityRule::Timing {
            thresholds: ScoreThresholds::default(),
        }
    }

    pub fn derive(&self, ctx: &QualityContext, rng: &mut dyn RandomSource) -> QualityTier {
        let input = ctx.input_quality;
        match self {
            QualityRule::Inherit => input,
            QualityRule::Fixed(tier) => *tier,
            QualityRule::UpgradeChance { chance } => roll_upgrade(input, *chance + ctx.bonus, rng),
            QualityRule::RollFromBase { base, chance } => {
                roll_upgrade(*base, *chance + ctx.bonus, rng)
            }
            QualityRule::BatchSize { steps, fallback } => {
                let chance = steps
                    .iter()
                    .find(|step| ctx.batch_size > step.above)
                    .map_or(*fallback, |step| step.chance);
                roll_upgrade(input, chance + ctx.bonus, rng)
            }
            QualityRule::Timing { thresholds } => match ctx.timing_score {
                Some(score) => QualityTier::from_score(score, thresholds).max(input),
                None => input,
            },
            QualityRule::Heat(policy) => match ctx.heat {
                Some(record) => heat_quality(policy, input, &record, rng),
                None => input,
            },
        }
    }
}

fn roll_upgrade(tier: QualityTier, chance: Fixed64, rng: &mut dyn RandomSource) -> QualityTier {
    if tier == QualityTier::Legendary {
        return tier;
    }
    if rng.chance(chance) { tier.upgrade() } else { tier }
}

fn heat_quality(
    policy: &HeatQuality,
    input: QualityTier,
    record: &HeatRecord,
    rng: &mut dyn RandomSource,
) -> QualityTier {
    let optimal = record.optimal_share();
    if record.danger_share() > policy.danger_share_limit {
        input.downgrade()
    } else if optimal >= policy.legendary_share {
        if rng.chance(policy.legendary_chance) {
            QualityTier::Legendary
        } else {
            input.upgrade()
        }
    } else if optimal >= policy.upgrade_share {
        if rng.chance(policy.upgrade_chance) {
            input.upgrade()
        } else {
            input
        }
    } else {
        input
    }
}

// ---------------------------------------------------------------------------
// RecipeDefinition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDefinition {
    pub name: String,
    pub inputs: InputRule,
    pub activation: Activation,
    pub output_type: ItemTypeId,
    pub yield_rule: YieldRule,
    pub quality: QualityRule,
    pub dosage: Option<DosageProfile>,
    pub heat: Option<HeatProfile>,
    pub fuel: Option<FuelProfile>,
    /// Pressing stages carry a cosmetic design and colour.
    pub cosmetics: bool,
}

impl RecipeDefinition {
    /// An unattended recipe yielding one output per unit, inheriting quality.
    pub fn timed(name: &str, inputs: InputRule, duration: u32, output_type: ItemTypeId) -> Self {
        Self {
            name: name.to_string(),
            inputs,
            activation: Activation::Timed { duration },
            output_type,
            yield_rule: YieldRule::PerUnit(1),
            quality: QualityRule::Inherit,
            dosage: None,
            heat: None,
            fuel: None,
            cosmetics: false,
        }
    }

    /// A press recipe graded by timing.
    pub fn minigame(
        name: &str,
        inputs: InputRule,
        window: TimingWindow,
        output_type: ItemTypeId,
    ) -> Self {
        Self {
            activation: Activation::Minigame(window),
            quality: QualityRule::timing_default(),
            ..Self::timed(name, inputs, 0, output_type)
        }
    }

    pub fn with_yield(mut self, yield_rule: YieldRule) -> Self {
        self.yield_rule = yield_rule;
        self
    }

    pub fn with_quality(mut self, quality: QualityRule) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_dosage(mut self, profile: DosageProfile) -> Self {
        self.dosage = Some(profile);
        self
    }

    pub fn with_heat(mut self, profile: HeatProfile) -> Self {
        self.heat = Some(profile);
        self
    }

    pub fn with_fuel(mut self, profile: FuelProfile) -> Self {
        self.fuel = Some(profile);
        self
    }

    pub fn with_cosmetics(mut self) -> Self {
        self.cosmetics = true;
        self
    }

    /// Maximum primary units per batch.
    pub fn capacity(&self) -> u32 {
        match &self.inputs {
            InputRule::Single { .. } => 1,
            InputRule::Pooled { capacity, .. } => *capacity,
            InputRule::Ordered { slots } => slots.len() as u32,
        }
    }

    /// Processing ticks for timed recipes.
    pub fn duration(&self) -> Option<u32> {
        match self.activation {
            Activation::Timed { duration } => Some(duration),
            Activation::Minigame(_) => None,
        }
    }

    pub fn timing_window(&self) -> Option<&TimingWindow> {
        match &self.activation {
            Activation::Minigame(window) => Some(window),
            Activation::Timed { .. } => None,
        }
    }

    pub fn is_minigame(&self) -> bool {
        self.timing_window().is_some()
    }

    pub fn reagent(&self) -> Option<&Reagent> {
        match &self.inputs {
            InputRule::Pooled { reagent, .. } => reagent.as_ref(),
            _ => None,
        }
    }

    /// How a batch gets going. Single and ordered recipes start on the last add.
    pub fn batch_start(&self) -> BatchStart {
        match &self.inputs {
            InputRule::Pooled { start, .. } => *start,
            InputRule::Single { .. } | InputRule::Ordered { .. } => BatchStart::WhenFull,
        }
    }

    /// The accept entry matching `item` when `filled` primary units are loaded.
    pub fn accepts_at(&self, item: ItemTypeId, filled: u32) -> Option<AcceptedInput> {
        let list = match &self.inputs {
            InputRule::Single { accepts } | InputRule::Pooled { accepts, .. } => accepts.as_slice(),
            InputRule::Ordered { slots } => slots.get(filled as usize)?.as_slice(),
        };
        list.iter().copied().find(|a| a.item_type == item)
    }

    /// Whether `item` is a primary input in any position.
    pub fn accepts_anywhere(&self, item: ItemTypeId) -> bool {
        match &self.inputs {
            InputRule::Single { accepts } | InputRule::Pooled { accepts, .. } => {
                accepts.iter().any(|a| a.item_type == item)
            }
            InputRule::Ordered { slots } => slots.iter().flatten().any(|a| a.item_type == item),
        }
    }

    /// Every item type this recipe references.
    pub fn referenced_items(&self) -> Vec<ItemTypeId> {
        let mut items = vec![self.output_type];
        match &self.inputs {
            InputRule::Single { accepts } => items.extend(accepts.iter().map(|a| a.item_type)),
            InputRule::Pooled {
                accepts,
                start,
                reagent,
                ..
            } => {
                items.extend(accepts.iter().map(|a| a.item_type));
                if let BatchStart::Trigger(trigger) = start {
                    items.push(*trigger);
                }
                if let Some(r) = reagent {
                    items.push(r.item_type);
                }
            }
            InputRule::Ordered { slots } => {
                items.extend(slots.iter().flatten().map(|a| a.item_type));
            }
        }
        items
    }

    /// Units consumed by one batch given the loaded pools. A completed
    /// ordered set counts as one unit.
    pub fn batch_size(&self, input_count: u32, reagent_count: u32) -> u32 {
        if let InputRule::Ordered { .. } = self.inputs {
            return input_count.min(1);
        }
        match self.reagent() {
            Some(Reagent {
                usage: ReagentUsage::PerUnit,
                ..
            }) => input_count.min(reagent_count),
            _ => input_count,
        }
    }

    /// Whether the loaded pools make a startable batch.
    pub fn batch_ready(&self, input_count: u32, reagent_count: u32) -> bool {
        let reagent_ok = self.reagent().is_none() || reagent_count > 0;
        input_count > 0 && reagent_ok && self.batch_size(input_count, reagent_count) > 0
    }

    /// Output units for a batch of `size`.
    pub fn batch_yield(&self, size: u32, potency_ug: Option<u32>) -> u32 {
        match self.yield_rule {
            YieldRule::PerUnit(k) => size.saturating_mul(k),
            YieldRule::Fraction {
                numerator,
                denominator,
            } => {
                let units = size as u64 * numerator as u64 / denominator.max(1) as u64;
                (units as u32).max(1)
            }
            YieldRule::Charges => match (self.dosage, potency_ug) {
                (Some(profile), Some(p)) => size.saturating_mul(profile.charge_yield(p)),
                _ => size,
            },
        }
    }
}

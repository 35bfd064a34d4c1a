//! Serde data file structs for chain content.
//!
//! These structs define the on-disk format for items, recipes and
//! pipelines. They are deserialized from RON, JSON or TOML data files and
//! then resolved into core types by the loader. Every cross-reference is a
//! name; every tuning number is a plain `f64` or integer.
//!
//! Variant-bearing fields use an internal `kind` tag so the same shape
//! works in all three formats:
//!
//! ```ron
//! (
//!     name: "roaster",
//!     output: "roasted_beans",
//!     inputs: (kind: "pooled", accepts: ["green_beans"], capacity: 16,
//!              start: (kind: "trigger", item: "roast_start")),
//!     activation: (kind: "timed", duration: 600),
//!     quality: (kind: "upgrade_chance", chance: 0.2),
//! )
//! ```

use serde::Deserialize;

// ===========================================================================
// Items
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
}

// ===========================================================================
// Recipe inputs
// ===========================================================================

/// An accepted input: a bare item name, or a name with a quality bonus.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AcceptData {
    Plain(String),
    WithBonus { item: String, bonus: f64 },
}

impl AcceptData {
    pub fn item(&self) -> &str {
        match self {
            AcceptData::Plain(item) | AcceptData::WithBonus { item, .. } => item,
        }
    }

    pub fn bonus(&self) -> f64 {
        match self {
            AcceptData::Plain(_) => 0.0,
            AcceptData::WithBonus { bonus, .. } => *bonus,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StartData {
    #[default]
    OnFirstUnit,
    WhenFull,
    Manual,
    Trigger {
        item: String,
    },
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageData {
    #[default]
    PerUnit,
    PerBatch,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReagentData {
    pub item: String,
    pub capacity: u32,
    #[serde(default)]
    pub usage: UsageData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputData {
    Single {
        accepts: Vec<AcceptData>,
    },
    Pooled {
        accepts: Vec<AcceptData>,
        capacity: u32,
        #[serde(default)]
        start: StartData,
        #[serde(default)]
        reagent: Option<ReagentData>,
    },
    Ordered {
        slots: Vec<Vec<AcceptData>>,
    },
}

// ===========================================================================
// Activation, yield, quality
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowData {
    PillPress,
    Cooker,
    /// Explicit ranges, scored with the pill-press curve.
    Custom {
        cycle_length: u32,
        good_start: u32,
        good_end: u32,
        perfect_start: u32,
        perfect_end: u32,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivationData {
    Timed { duration: u32 },
    Minigame { window: WindowData },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum YieldData {
    /// One output per batch unit.
    #[default]
    Single,
    PerUnit {
        per_unit: u32,
    },
    Fraction {
        numerator: u32,
        denominator: u32,
    },
    Charges,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchChanceData {
    pub above: u32,
    pub chance: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QualityData {
    /// The recipe's preset: inherit for timed recipes, timing for presses.
    #[default]
    Preset,
    Inherit,
    Fixed {
        tier: String,
    },
    UpgradeChance {
        chance: f64,
    },
    RollFromBase {
        base: String,
        chance: f64,
    },
    /// Omitted steps use the stock 6 / 4 unit policy.
    BatchSize {
        #[serde(default)]
        steps: Option<Vec<BatchChanceData>>,
        #[serde(default)]
        fallback: Option<f64>,
    },
    Timing {
        #[serde(default = "default_good")]
        good: f64,
        #[serde(default = "default_very_good")]
        very_good: f64,
        #[serde(default = "default_legendary")]
        legendary: f64,
    },
    Heat,
}

fn default_good() -> f64 {
    0.5
}

fn default_very_good() -> f64 {
    0.7
}

fn default_legendary() -> f64 {
    0.9
}

// ===========================================================================
// Overlays
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DosageData {
    pub min_ug: u32,
    pub max_ug: u32,
    pub base_charges: u32,
    pub ug_per_charge: u32,
}

impl Default for DosageData {
    fn default() -> Self {
        Self {
            min_ug: 50,
            max_ug: 300,
            base_charges: 10,
            ug_per_charge: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeatData {
    pub ambient: f64,
    pub optimal_min: f64,
    pub optimal_max: f64,
    pub danger_max: f64,
    pub critical: f64,
    pub rise_per_tick: f64,
    pub fall_per_tick: f64,
    pub process_heat: f64,
    pub cooldown_after_batch: f64,
}

impl Default for HeatData {
    fn default() -> Self {
        Self {
            ambient: 20.0,
            optimal_min: 80.0,
            optimal_max: 120.0,
            danger_max: 150.0,
            critical: 151.0,
            rise_per_tick: 1.5,
            fall_per_tick: 0.8,
            process_heat: 0.3,
            cooldown_after_batch: 30.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FuelData {
    pub capacity: u32,
    pub ticks_per_unit: u32,
    pub price_per_unit: u64,
}

impl Default for FuelData {
    fn default() -> Self {
        Self {
            capacity: 100,
            ticks_per_unit: 20,
            price_per_unit: 5,
        }
    }
}

// ===========================================================================
// Recipes and pipelines
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    pub output: String,
    pub inputs: InputData,
    pub activation: ActivationData,
    #[serde(default, rename = "yield")]
    pub yield_rule: YieldData,
    #[serde(default)]
    pub quality: QualityData,
    #[serde(default)]
    pub dosage: Option<DosageData>,
    #[serde(default)]
    pub heat: Option<HeatData>,
    #[serde(default)]
    pub fuel: Option<FuelData>,
    #[serde(default)]
    pub cosmetics: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineData {
    pub name: String,
    pub stages: Vec<String>,
}

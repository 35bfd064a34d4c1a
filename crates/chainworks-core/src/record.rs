//! Persisted per-stage records.
//!
//! A [`StageRecord`] is a flat, format-agnostic key/value document. Every
//! field is optional and read leniently: a value of the wrong type reads as
//! absent, so an old or hand-edited save never fails to load. Loading then
//! repairs the values against the recipe, falling back to documented
//! defaults and logging each fallback:
//!
//! | field | default |
//! |---|---|
//! | counts, progress, fuel | `0`, clamped to the recipe's bounds |
//! | `inputQualityTag`, `outputQuality` | `STANDARD` |
//! | `dosageSlider` | `50`, clamped to `[0, 100]` |
//! | `selectedDesign` / `selectedColor` | `TESLA` / `PINK` |
//! | `temperature` | the recipe's ambient temperature |
//!
//! An output whose type name no longer resolves is dropped, and a session
//! that could not have been running is discarded.

use crate::cosmetic::{PillColor, PillDesign};
use crate::dosage::{DEFAULT_SLIDER, clamp_slider};
use crate::fixed::{Fixed64, clamp_unit, fixed64_to_f64, try_f64_to_fixed64};
use crate::id::ActorId;
use crate::item::ItemStack;
use crate::quality::QualityTier;
use crate::recipe::{Activation, RecipeDefinition};
use crate::registry::ItemCatalog;
use crate::stage::{ProcessingStage, StageState};
use crate::thermal::ThermalState;
use crate::timing::MinigameSession;
use serde::de::{Deserializer, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record is not a valid document: {0}")]
    Syntax(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Lenient field reading
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Value(Option<T>),
    Other(IgnoredAny),
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Value(v) => v,
        Lenient::Other(_) => None,
    })
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRecord {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub input_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub input_quality_tag: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub progress: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub output_quality: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub output_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub dosage_slider: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub selected_design: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub reagent_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub quality_bonus: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub session_actor: Option<u64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub session_tick: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub last_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub heating: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub optimal_ticks: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub danger_ticks: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub fuel: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub output_potency: Option<i64>,
}

impl StageRecord {
    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn count(value: Option<i64>, max: u32, field: &str) -> u32 {
    let raw = value.unwrap_or(0);
    let clamped = raw.clamp(0, max as i64) as u32;
    if raw != clamped as i64 {
        tracing::warn!(field, raw, clamped, "persisted count out of range, clamped");
    }
    clamped
}

fn tier(value: Option<&str>, field: &str) -> QualityTier {
    match value {
        None => QualityTier::Standard,
        Some(name) => QualityTier::parse(name).unwrap_or_else(|| {
            tracing::warn!(field, value = name, "unknown quality tier, using STANDARD");
            QualityTier::Standard
        }),
    }
}

fn fixed_field(value: Option<f64>, field: &str) -> Option<Fixed64> {
    let raw = value?;
    let converted = try_f64_to_fixed64(raw);
    if converted.is_none() {
        tracing::warn!(field, raw, "persisted number not representable, ignoring");
    }
    converted
}

fn fixed_or(value: Option<f64>, default: Fixed64, field: &str) -> Fixed64 {
    fixed_field(value, field).unwrap_or(default)
}

// ---------------------------------------------------------------------------
// Save / load
// ---------------------------------------------------------------------------

impl ProcessingStage {
    /// Capture the stage as a record. Item types are written by name.
    pub fn save(&self, catalog: &dyn ItemCatalog) -> StageRecord {
        let s = self.state();
        let output = s.output.as_ref();
        StageRecord {
            input_count: Some(s.input_count as i64),
            input_quality_tag: Some(s.input_quality.as_str().to_string()),
            progress: Some(s.progress as i64),
            output_type: output.and_then(|o| catalog.item_name(o.item_type).map(str::to_string)),
            output_quality: output.map(|o| o.quality.as_str().to_string()),
            output_count: Some(output.map_or(0, |o| o.quantity as i64)),
            active: Some(s.active),
            dosage_slider: s.dosage_slider.map(i64::from),
            selected_design: s.design.map(|d| d.as_str().to_string()),
            selected_color: s.color.map(|c| c.as_str().to_string()),
            reagent_count: Some(s.reagent_count as i64),
            quality_bonus: Some(fixed64_to_f64(s.quality_bonus)),
            session_actor: s.session.map(|session| session.actor.0),
            session_tick: s.session.map(|session| session.cycle_tick as i64),
            last_score: s.last_score.map(fixed64_to_f64),
            temperature: s.heat.map(|t| fixed64_to_f64(t.temperature)),
            heating: s.heat.map(|t| t.heating),
            optimal_ticks: s.heat.map(|t| t.optimal_ticks as i64),
            danger_ticks: s.heat.map(|t| t.danger_ticks as i64),
            fuel: s.fuel.map(i64::from),
            output_potency: output.and_then(|o| o.potency_ug).map(i64::from),
        }
    }

    /// Rebuild a stage from a record. Never fails; see the module docs for
    /// the defaults applied to missing or invalid values.
    pub fn load(
        recipe: Arc<RecipeDefinition>,
        record: &StageRecord,
        catalog: &dyn ItemCatalog,
    ) -> ProcessingStage {
        let mut state = StageState::empty(&recipe);

        state.input_count = count(record.input_count, recipe.capacity(), "inputCount");
        state.input_quality = tier(record.input_quality_tag.as_deref(), "inputQualityTag");
        let reagent_cap = recipe.reagent().map_or(0, |r| r.capacity);
        state.reagent_count = count(record.reagent_count, reagent_cap, "reagentCount");
        state.quality_bonus = clamp_unit(fixed_or(record.quality_bonus, Fixed64::ZERO, "qualityBonus"));
        state.output = load_output(record, catalog);

        let loaded = recipe.batch_ready(state.input_count, state.reagent_count);
        let idle_ok = state.output.is_none() && loaded;

        match &recipe.activation {
            Activation::Timed { duration } => {
                state.active = record.active.unwrap_or(false) && idle_ok;
                state.progress = if state.active {
                    count(record.progress, duration.saturating_sub(1), "progress")
                } else {
                    0
                };
            }
            Activation::Minigame(window) => {
                state.session = match record.session_actor {
                    Some(actor) if idle_ok => Some(MinigameSession {
                        actor: ActorId(actor),
                        cycle_tick: count(
                            record.session_tick,
                            window.cycle_length.saturating_sub(1),
                            "sessionTick",
                        ),
                    }),
                    Some(_) => {
                        tracing::warn!("discarding press session that could not be running");
                        None
                    }
                    None => None,
                };
                state.active = state.session.is_some();
                state.last_score = fixed_field(record.last_score, "lastScore").map(clamp_unit);
            }
        }

        if recipe.dosage.is_some() {
            state.dosage_slider = Some(match record.dosage_slider {
                Some(v) => clamp_slider(v),
                None => DEFAULT_SLIDER,
            });
        }

        if recipe.cosmetics {
            state.design = Some(match record.selected_design.as_deref() {
                Some(name) => PillDesign::parse(name).unwrap_or_else(|| {
                    tracing::warn!(value = name, "unknown design, using TESLA");
                    PillDesign::default()
                }),
                None => PillDesign::default(),
            });
            state.color = Some(match record.selected_color.as_deref() {
                Some(name) => PillColor::parse(name).unwrap_or_else(|| {
                    tracing::warn!(value = name, "unknown colour, using PINK");
                    PillColor::default()
                }),
                None => PillColor::default(),
            });
        }

        if let Some(profile) = recipe.heat {
            let mut thermal = ThermalState::ambient(&profile);
            let temperature = fixed_or(record.temperature, profile.ambient, "temperature");
            thermal.temperature = temperature.clamp(profile.ambient, profile.critical - Fixed64::DELTA);
            thermal.heating = record.heating.unwrap_or(false) && state.output.is_none();
            thermal.optimal_ticks = count(record.optimal_ticks, state.progress, "optimalTicks");
            thermal.danger_ticks = count(
                record.danger_ticks,
                state.progress - thermal.optimal_ticks,
                "dangerTicks",
            );
            state.heat = Some(thermal);
        }

        if let Some(profile) = recipe.fuel {
            state.fuel = Some(count(record.fuel, profile.capacity, "fuel"));
        }

        ProcessingStage::from_parts(recipe, state)
    }
}

fn load_output(record: &StageRecord, catalog: &dyn ItemCatalog) -> Option<ItemStack> {
    let quantity = record.output_count.unwrap_or(0);
    if quantity <= 0 {
        return None;
    }
    let Some(name) = record.output_type.as_deref() else {
        tracing::warn!(quantity, "output count without output type, dropping output");
        return None;
    };
    let Some(item_type) = catalog.resolve_item_type(name) else {
        tracing::warn!(value = name, "unknown output item type, dropping output");
        return None;
    };
    let quality = tier(record.output_quality.as_deref(), "outputQuality");
    let mut stack = ItemStack::new(item_type, quality, quantity.min(u32::MAX as i64) as u32);
    stack.potency_ug = record
        .output_potency
        .map(|p| p.clamp(0, u32::MAX as i64) as u32);
    Some(stack)
}

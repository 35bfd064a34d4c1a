//! The generic stage state machine.
//!
//! One [`ProcessingStage`] is one placed device. It owns its runtime
//! [`StageState`] and shares an immutable [`RecipeDefinition`] with every
//! other device of the same kind. All behaviour differences between product
//! chains come from the recipe; the code paths here are the same for every
//! stage.
//!
//! ```text
//! Idle -> Filling -> Processing ------------> Ready -> Idle
//!                \-> AwaitingPress (press) -/
//! ```
//!
//! Rejections are ordinary return values. [`ProcessingStage::tick`] never
//! fails, and a tick that finishes a batch clears the inputs, fills the
//! output buffer and deactivates the stage in the same call.

use crate::cosmetic::{PillColor, PillDesign};
use crate::dosage::{DEFAULT_SLIDER, DosageReading, clamp_slider};
use crate::fixed::{Fixed64, ratio};
use crate::fuel::{RefuelOutcome, Wallet};
use crate::id::ActorId;
use crate::item::{ItemStack, ItemUnit};
use crate::quality::QualityTier;
use crate::recipe::{Activation, BatchStart, QualityContext, RecipeDefinition};
use crate::rng::RandomSource;
use crate::thermal::{HeatStep, HeatZone, ThermalState};
use crate::timing::{MinigameSession, TimingZone};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of offering one unit to a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddInputOutcome {
    Accepted,
    RejectedWrongType,
    RejectedFull,
    RejectedOutputPending,
}

impl AddInputOutcome {
    pub fn is_accepted(self) -> bool {
        self == AddInputOutcome::Accepted
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickResult {
    /// The batch completed this tick; a copy of the buffered output.
    pub produced: Option<ItemStack>,
    /// Score of a press session that timed out this tick.
    pub session_score: Option<Fixed64>,
    /// The loaded batch was destroyed by heat.
    pub overheated: bool,
    pub state_changed: bool,
}

/// Observable lifecycle position, derived from the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Filling,
    Processing,
    AwaitingPress,
    Ready,
}

/// Read-only snapshot for presentation. Carries no display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageStatus {
    pub phase: Phase,
    pub is_active: bool,
    /// The edge-reported "drawing utilities" signal.
    pub consuming: bool,
    pub progress_fraction: Fixed64,
    pub input_count: u32,
    pub capacity: u32,
    pub reagent_count: u32,
    pub input_quality: QualityTier,
    pub has_output: bool,
    pub output_count: u32,
    pub output_quality: Option<QualityTier>,
    pub timing_zone: Option<TimingZone>,
    pub last_score: Option<Fixed64>,
    pub temperature: Option<Fixed64>,
    pub heat_zone: Option<HeatZone>,
    pub heating: bool,
    pub fuel: Option<u32>,
    pub dosage: Option<DosageReading>,
    pub design: Option<PillDesign>,
    pub color: Option<PillColor>,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Per-device runtime state. Overlay fields are `Some` exactly when the
/// recipe enables that overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageState {
    /// Primary units loaded. For ordered recipes also the next slot index.
    pub input_count: u32,
    /// Grade of the first unit of the current batch.
    pub input_quality: QualityTier,
    pub reagent_count: u32,
    /// Best upgrade bonus among the loaded units.
    pub quality_bonus: Fixed64,
    pub progress: u32,
    pub output: Option<ItemStack>,
    pub active: bool,
    pub dosage_slider: Option<u8>,
    pub design: Option<PillDesign>,
    pub color: Option<PillColor>,
    pub session: Option<MinigameSession>,
    pub last_score: Option<Fixed64>,
    pub heat: Option<ThermalState>,
    pub fuel: Option<u32>,
}

impl StageState {
    /// Freshly placed device.
    pub fn empty(recipe: &RecipeDefinition) -> Self {
        Self {
            input_count: 0,
            input_quality: QualityTier::Standard,
            reagent_count: 0,
            quality_bonus: Fixed64::ZERO,
            progress: 0,
            output: None,
            active: false,
            dosage_slider: recipe.dosage.map(|_| DEFAULT_SLIDER),
            design: recipe.cosmetics.then(PillDesign::default),
            color: recipe.cosmetics.then(PillColor::default),
            session: None,
            last_score: None,
            heat: recipe.heat.as_ref().map(ThermalState::ambient),
            fuel: recipe.fuel.map(|_| 0),
        }
    }

    fn clear_batch(&mut self) {
        self.input_count = 0;
        self.input_quality = QualityTier::Standard;
        self.reagent_count = 0;
        self.quality_bonus = Fixed64::ZERO;
        self.progress = 0;
        self.active = false;
    }
}

// ---------------------------------------------------------------------------
// ProcessingStage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingStage {
    recipe: Arc<RecipeDefinition>,
    state: StageState,
}

impl ProcessingStage {
    pub fn new(recipe: Arc<RecipeDefinition>) -> Self {
        let state = StageState::empty(&recipe);
        Self { recipe, state }
    }

    /// Rebuild a stage from previously validated state.
    pub(crate) fn from_parts(recipe: Arc<RecipeDefinition>, state: StageState) -> Self {
        Self { recipe, state }
    }

    pub fn recipe(&self) -> &RecipeDefinition {
        &self.recipe
    }

    pub fn recipe_arc(&self) -> &Arc<RecipeDefinition> {
        &self.recipe
    }

    pub fn state(&self) -> &StageState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn output(&self) -> Option<&ItemStack> {
        self.state.output.as_ref()
    }

    pub fn phase(&self) -> Phase {
        let s = &self.state;
        if s.output.is_some() {
            Phase::Ready
        } else if s.session.is_some() {
            Phase::AwaitingPress
        } else if s.active {
            Phase::Processing
        } else if s.input_count > 0 || s.reagent_count > 0 {
            Phase::Filling
        } else {
            Phase::Idle
        }
    }

    // -- Intake -------------------------------------------------------------

    /// Offer one unit. Nothing changes unless the result is `Accepted`.
    pub fn add_input(&mut self, unit: ItemUnit) -> AddInputOutcome {
        if self.state.output.is_some() {
            return AddInputOutcome::RejectedOutputPending;
        }
        if self.state.session.is_some() {
            return AddInputOutcome::RejectedFull;
        }

        let recipe = Arc::clone(&self.recipe);
        let start = recipe.batch_start();

        if start == BatchStart::Trigger(unit.item_type) {
            if self.state.active {
                return AddInputOutcome::RejectedFull;
            }
            if !recipe.batch_ready(self.state.input_count, self.state.reagent_count) {
                return AddInputOutcome::RejectedWrongType;
            }
            self.begin_batch();
            return AddInputOutcome::Accepted;
        }

        if let Some(reagent) = recipe.reagent().filter(|r| r.item_type == unit.item_type) {
            if self.state.active {
                return AddInputOutcome::RejectedFull;
            }
            if self.state.reagent_count >= reagent.capacity {
                return AddInputOutcome::RejectedFull;
            }
            self.state.reagent_count += 1;
            self.maybe_autostart();
            return AddInputOutcome::Accepted;
        }

        let sealed = self.state.active && start != BatchStart::OnFirstUnit;
        if sealed || self.state.input_count >= recipe.capacity() {
            return AddInputOutcome::RejectedFull;
        }
        let Some(accepted) = recipe.accepts_at(unit.item_type, self.state.input_count) else {
            return AddInputOutcome::RejectedWrongType;
        };

        if self.state.input_count == 0 {
            self.state.input_quality = unit.quality;
            self.state.quality_bonus = accepted.quality_bonus;
        } else {
            self.state.quality_bonus = self.state.quality_bonus.max(accepted.quality_bonus);
        }
        self.state.input_count += 1;
        self.maybe_autostart();
        AddInputOutcome::Accepted
    }

    fn maybe_autostart(&mut self) {
        if self.state.active || self.recipe.is_minigame() {
            return;
        }
        let s = &self.state;
        if !self.recipe.batch_ready(s.input_count, s.reagent_count) {
            return;
        }
        let go = match self.recipe.batch_start() {
            BatchStart::OnFirstUnit => true,
            BatchStart::WhenFull => s.input_count >= self.recipe.capacity(),
            BatchStart::Trigger(_) | BatchStart::Manual => false,
        };
        if go {
            self.begin_batch();
        }
    }

    fn begin_batch(&mut self) {
        self.state.active = true;
        self.state.progress = 0;
        if let Some(thermal) = self.state.heat.as_mut() {
            thermal.optimal_ticks = 0;
            thermal.danger_ticks = 0;
        }
        tracing::debug!(
            recipe = %self.recipe.name,
            units = self.state.input_count,
            "batch started"
        );
    }

    /// Operator start for manually started timed recipes.
    pub fn start_batch(&mut self) -> bool {
        let s = &self.state;
        let manual = self.recipe.batch_start() == BatchStart::Manual;
        if !manual || self.recipe.is_minigame() || s.active || s.output.is_some() {
            return false;
        }
        if !self.recipe.batch_ready(s.input_count, s.reagent_count) {
            return false;
        }
        self.begin_batch();
        true
    }

    // -- Tick ---------------------------------------------------------------

    /// Advance one scheduler step.
    ///
    /// Order: heat update, press-session clock, timed progress. Inactive
    /// stages without a heater are untouched.
    pub fn tick(&mut self, rng: &mut dyn RandomSource) -> TickResult {
        let mut result = TickResult::default();

        let mut warm = true;
        if let (Some(profile), Some(thermal)) = (self.recipe.heat, self.state.heat.as_mut()) {
            let cooking = self.state.active && thermal.temperature >= profile.optimal_min;
            match thermal.update(&profile, cooking, self.state.output.is_some()) {
                HeatStep::Overheated => {
                    self.overheat();
                    result.overheated = true;
                    result.state_changed = true;
                    return result;
                }
                HeatStep::Cold => warm = false,
                HeatStep::Working => {}
            }
        }

        if let Some(score) = self.tick_session(rng) {
            result.session_score = Some(score);
            result.produced = self.state.output.clone();
            result.state_changed = true;
            return result;
        }

        let Activation::Timed { duration } = self.recipe.activation else {
            return result;
        };
        if !self.state.active || !warm {
            return result;
        }
        if let Some(fuel) = self.state.fuel {
            if fuel == 0 {
                return result;
            }
        }

        self.state.progress += 1;
        if let (Some(profile), Some(thermal)) = (self.recipe.heat, self.state.heat.as_mut()) {
            thermal.record_progress_tick(&profile);
        }
        if let (Some(profile), Some(fuel)) = (self.recipe.fuel, self.state.fuel.as_mut()) {
            if profile.burns_at(self.state.progress) {
                *fuel = fuel.saturating_sub(1);
            }
        }

        if self.state.progress >= duration {
            self.complete(rng);
            result.produced = self.state.output.clone();
            result.state_changed = true;
        }
        result
    }

    /// Advance a running press session by one tick.
    ///
    /// Called from [`tick`](Self::tick). A session that reaches the end of
    /// the cycle resolves as a press on the final tick; the score is returned.
    pub fn tick_session(&mut self, rng: &mut dyn RandomSource) -> Option<Fixed64> {
        let window = *self.recipe.timing_window()?;
        let session = self.state.session.as_mut()?;
        if !session.advance(&window) {
            return None;
        }
        let score = window.score(session.cycle_tick);
        tracing::debug!(recipe = %self.recipe.name, %score, "press session timed out");
        self.resolve_session(score, rng);
        Some(score)
    }

    fn complete(&mut self, rng: &mut dyn RandomSource) {
        let recipe = Arc::clone(&self.recipe);
        let s = &self.state;
        let size = recipe.batch_size(s.input_count, s.reagent_count);
        let potency = recipe
            .dosage
            .map(|profile| profile.potency(s.dosage_slider.unwrap_or(DEFAULT_SLIDER)));
        let heat = s
            .heat
            .map(|thermal| thermal.record(recipe.duration().unwrap_or(0)));
        let ctx = QualityContext {
            input_quality: s.input_quality,
            batch_size: size,
            bonus: s.quality_bonus,
            timing_score: s.last_score,
            heat,
        };
        let quality = recipe.quality.derive(&ctx, rng);
        let quantity = recipe.batch_yield(size, potency);

        let mut output = ItemStack::new(recipe.output_type, quality, quantity);
        output.potency_ug = potency;
        tracing::debug!(
            recipe = %recipe.name,
            size,
            quantity,
            quality = quality.as_str(),
            "batch completed"
        );

        // Reagent leftovers go with the batch; the stage restarts empty.
        self.state.clear_batch();
        self.state.output = Some(output);
        if let (Some(profile), Some(thermal)) = (recipe.heat, self.state.heat.as_mut()) {
            thermal.finish_batch(&profile);
        }
    }

    fn overheat(&mut self) {
        tracing::info!(
            recipe = %self.recipe.name,
            lost_units = self.state.input_count,
            "stage overheated, batch destroyed"
        );
        self.state.clear_batch();
        if let (Some(profile), Some(thermal)) = (self.recipe.heat, self.state.heat.as_mut()) {
            *thermal = ThermalState::ambient(&profile);
        }
    }

    // -- Output -------------------------------------------------------------

    /// Take the buffered output. `None` leaves the stage untouched.
    pub fn extract_output(&mut self) -> Option<ItemStack> {
        let output = self.state.output.take()?;
        if let (Some(profile), Some(thermal)) = (self.recipe.heat, self.state.heat.as_mut()) {
            thermal.temperature = profile.ambient;
        }
        Some(output)
    }

    /// Take up to `max` units of the buffered output, leaving the rest
    /// buffered. Taking the last unit behaves like
    /// [`extract_output`](Self::extract_output).
    pub fn extract_units(&mut self, max: u32) -> Option<ItemStack> {
        let pending = self.state.output.as_mut()?;
        if max == 0 {
            return None;
        }
        if max >= pending.quantity {
            return self.extract_output();
        }
        pending.quantity -= max;
        let mut taken = pending.clone();
        taken.quantity = max;
        Some(taken)
    }

    // -- Press sessions -----------------------------------------------------

    /// Begin a press cycle. Requires loaded inputs, no pending output and no
    /// running session.
    pub fn start_session(&mut self, actor: ActorId) -> bool {
        let s = &self.state;
        if !self.recipe.is_minigame() || s.session.is_some() || s.output.is_some() {
            return false;
        }
        if !self.recipe.batch_ready(s.input_count, s.reagent_count) {
            return false;
        }
        self.state.session = Some(MinigameSession::new(actor));
        self.state.active = true;
        self.state.last_score = None;
        tracing::debug!(recipe = %self.recipe.name, actor = actor.0, "press session started");
        true
    }

    /// Press now. Returns the score, or `None` if no session is running.
    pub fn press_action(&mut self, rng: &mut dyn RandomSource) -> Option<Fixed64> {
        let window = *self.recipe.timing_window()?;
        let session = self.state.session?;
        let score = window.score(session.cycle_tick);
        tracing::debug!(
            recipe = %self.recipe.name,
            tick = session.cycle_tick,
            %score,
            "press"
        );
        self.resolve_session(score, rng);
        Some(score)
    }

    fn resolve_session(&mut self, score: Fixed64, rng: &mut dyn RandomSource) {
        self.state.session = None;
        self.state.last_score = Some(score);
        self.complete(rng);
    }

    /// Drop a running session without producing anything. Inputs stay loaded.
    pub fn cancel_session(&mut self) -> bool {
        if self.state.session.take().is_none() {
            return false;
        }
        self.state.active = false;
        tracing::debug!(recipe = %self.recipe.name, "press session cancelled");
        true
    }

    pub fn session(&self) -> Option<&MinigameSession> {
        self.state.session.as_ref()
    }

    // -- Operator settings --------------------------------------------------

    /// Move the dosage slider. Values are clamped; the slider is locked while
    /// a batch runs and absent on stages without a dosage profile.
    pub fn set_dosage(&mut self, value: i64) -> bool {
        if self.recipe.dosage.is_none() || self.state.active {
            return false;
        }
        self.state.dosage_slider = Some(clamp_slider(value));
        true
    }

    pub fn dosage(&self) -> Option<DosageReading> {
        let profile = self.recipe.dosage?;
        Some(profile.reading(self.state.dosage_slider.unwrap_or(DEFAULT_SLIDER)))
    }

    pub fn set_design(&mut self, design: PillDesign) -> bool {
        if !self.recipe.cosmetics {
            return false;
        }
        self.state.design = Some(design);
        true
    }

    pub fn cycle_design(&mut self) -> Option<PillDesign> {
        let next = self.state.design?.next();
        self.state.design = Some(next);
        Some(next)
    }

    pub fn set_color(&mut self, color: PillColor) -> bool {
        if !self.recipe.cosmetics {
            return false;
        }
        self.state.color = Some(color);
        true
    }

    pub fn cycle_color(&mut self) -> Option<PillColor> {
        let next = self.state.color?.next();
        self.state.color = Some(next);
        Some(next)
    }

    /// Switch the heater. Refused on stages without one, and switching on is
    /// refused while output waits for pickup.
    pub fn set_heating(&mut self, on: bool) -> bool {
        let output_pending = self.state.output.is_some();
        let Some(thermal) = self.state.heat.as_mut() else {
            return false;
        };
        if on && output_pending {
            return false;
        }
        thermal.heating = on;
        true
    }

    /// Buy up to `units` of fuel, limited by free tank space.
    pub fn refuel(&mut self, actor: ActorId, units: u32, wallet: &mut dyn Wallet) -> RefuelOutcome {
        let (Some(profile), Some(level)) = (self.recipe.fuel, self.state.fuel) else {
            return RefuelOutcome::NotFuelled;
        };
        let units = units.min(profile.capacity.saturating_sub(level));
        if units == 0 {
            return RefuelOutcome::TankFull;
        }
        let cost = units as u64 * profile.price_per_unit;
        if !wallet.withdraw_funds(actor, cost) {
            return RefuelOutcome::InsufficientFunds;
        }
        self.state.fuel = Some(level + units);
        RefuelOutcome::Refueled { units, cost }
    }

    // -- Reporting ----------------------------------------------------------

    /// Whether the device is drawing utilities right now.
    pub fn consuming(&self) -> bool {
        let s = &self.state;
        if self.recipe.is_minigame() {
            return s.session.is_some();
        }
        if let (Some(profile), Some(thermal)) = (self.recipe.heat, s.heat) {
            return thermal.heating || (s.active && thermal.temperature >= profile.optimal_min);
        }
        if let Some(fuel) = s.fuel {
            return s.active && fuel > 0;
        }
        s.active
    }

    pub fn progress_fraction(&self) -> Fixed64 {
        let s = &self.state;
        if s.output.is_some() {
            return Fixed64::from_num(1);
        }
        match (&self.recipe.activation, s.session) {
            (Activation::Timed { duration }, _) => ratio(s.progress as u64, *duration as u64),
            (Activation::Minigame(window), Some(session)) => {
                ratio(session.cycle_tick as u64, window.cycle_length as u64)
            }
            (Activation::Minigame(_), None) => Fixed64::ZERO,
        }
    }

    pub fn peek_status(&self) -> StageStatus {
        let s = &self.state;
        let heat_profile = self.recipe.heat;
        StageStatus {
            phase: self.phase(),
            is_active: s.active,
            consuming: self.consuming(),
            progress_fraction: self.progress_fraction(),
            input_count: s.input_count,
            capacity: self.recipe.capacity(),
            reagent_count: s.reagent_count,
            input_quality: s.input_quality,
            has_output: s.output.is_some(),
            output_count: s.output.as_ref().map_or(0, |o| o.quantity),
            output_quality: s.output.as_ref().map(|o| o.quality),
            timing_zone: self
                .recipe
                .timing_window()
                .zip(s.session)
                .map(|(w, session)| w.zone(session.cycle_tick)),
            last_score: s.last_score,
            temperature: s.heat.map(|t| t.temperature),
            heat_zone: heat_profile.zip(s.heat).map(|(p, t)| p.zone(t.temperature)),
            heating: s.heat.is_some_and(|t| t.heating),
            fuel: s.fuel,
            dosage: self.dosage(),
            design: s.design,
            color: s.color,
        }
    }

    /// Remove the device. A running session is cancelled; loaded inputs and
    /// progress are discarded. Returns whether a session was cancelled.
    pub fn teardown(mut self) -> bool {
        let cancelled = self.cancel_session();
        tracing::debug!(
            recipe = %self.recipe.name,
            lost_units = self.state.input_count,
            cancelled,
            "stage torn down"
        );
        cancelled
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn state_mut(&mut self) -> &mut StageState {
        &mut self.state
    }
}

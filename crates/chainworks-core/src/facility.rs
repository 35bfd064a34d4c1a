//! The facility driver: owns placed stages and steps them together.
//!
//! A [`Facility`] hosts any number of [`ProcessingStage`]s built from one
//! frozen [`Registry`]. Stages are keyed by [`StageId`] in a `SlotMap`, with
//! per-stage data in `SecondaryMap`s, so iteration is in slot order and a
//! removed id is never reused by accident.
//!
//! Each [`step`](Facility::step):
//! 1. ticks every live stage once, in slot order, with the facility's
//!    deterministic [`SimRng`];
//! 2. collects [`StageEvent`]s for completions, session timeouts and
//!    overheats;
//! 3. compares each stage's consuming flag with the last value reported and
//!    notifies the [`ActivitySink`] only when it changed;
//! 4. advances the tick counter.

use crate::event::{ActivitySink, StageEvent};
use crate::fixed::{Fixed64, Ticks};
use crate::id::{ActorId, PipelineId, RecipeId, StageId};
use crate::item::ItemUnit;
use crate::record::StageRecord;
use crate::registry::{ItemCatalog, Registry};
use crate::rng::SimRng;
use crate::stage::ProcessingStage;
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FacilityError {
    #[error("recipe {0:?} is not in the registry")]
    UnknownRecipe(RecipeId),
    #[error("pipeline {0:?} is not in the registry")]
    UnknownPipeline(PipelineId),
    #[error("no recipe named \"{0}\"")]
    UnknownRecipeName(String),
    #[error("stage {0:?} does not exist")]
    UnknownStage(StageId),
}

// ---------------------------------------------------------------------------
// Step report
// ---------------------------------------------------------------------------

/// Everything one [`Facility::step`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    /// The tick that was executed.
    pub tick: Ticks,
    pub events: Vec<StageEvent>,
}

impl StepReport {
    pub fn completions(&self) -> impl Iterator<Item = &StageEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, StageEvent::BatchCompleted { .. }))
    }
}

/// A stage record tagged with the recipe it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedRecord {
    pub recipe: String,
    pub record: StageRecord,
}

// ---------------------------------------------------------------------------
// Facility
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Facility {
    pub(crate) registry: Arc<Registry>,
    /// Live stage ids and the recipe each was placed from.
    pub(crate) slots: SlotMap<StageId, RecipeId>,
    pub(crate) stages: SecondaryMap<StageId, ProcessingStage>,
    /// Last consuming flag handed to the activity sink.
    pub(crate) reported: SecondaryMap<StageId, bool>,
    pub(crate) tick: Ticks,
    pub(crate) rng: SimRng,
}

impl Facility {
    pub fn new(registry: Arc<Registry>, seed: u64) -> Self {
        Self {
            registry,
            slots: SlotMap::with_key(),
            stages: SecondaryMap::new(),
            reported: SecondaryMap::new(),
            tick: 0,
            rng: SimRng::new(seed),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Ticks executed so far.
    pub fn tick(&self) -> Ticks {
        self.tick
    }

    pub fn rng(&self) -> &SimRng {
        &self.rng
    }

    // -- Placement ----------------------------------------------------------

    /// Place a fresh stage of the given recipe.
    pub fn place(&mut self, recipe: RecipeId) -> Result<StageId, FacilityError> {
        let def = self
            .registry
            .recipe(recipe)
            .ok_or(FacilityError::UnknownRecipe(recipe))?;
        let stage = ProcessingStage::new(Arc::clone(def));
        Ok(self.insert(recipe, stage))
    }

    /// Place one stage per pipeline step, in pipeline order.
    pub fn place_pipeline(&mut self, pipeline: PipelineId) -> Result<Vec<StageId>, FacilityError> {
        let def = self
            .registry
            .pipeline(pipeline)
            .ok_or(FacilityError::UnknownPipeline(pipeline))?;
        let recipes = def.stages.clone();
        recipes.into_iter().map(|recipe| self.place(recipe)).collect()
    }

    fn insert(&mut self, recipe: RecipeId, stage: ProcessingStage) -> StageId {
        let id = self.slots.insert(recipe);
        self.stages.insert(id, stage);
        self.reported.insert(id, false);
        id
    }

    /// Remove a stage with teardown semantics: a running session is
    /// cancelled and loaded inputs are lost. No activity report is sent.
    pub fn remove(&mut self, id: StageId) -> bool {
        if self.slots.remove(id).is_none() {
            return false;
        }
        self.reported.remove(id);
        if let Some(stage) = self.stages.remove(id) {
            stage.teardown();
        }
        true
    }

    // -- Access -------------------------------------------------------------

    pub fn stage(&self, id: StageId) -> Option<&ProcessingStage> {
        self.stages.get(id)
    }

    pub fn stage_mut(&mut self, id: StageId) -> Option<&mut ProcessingStage> {
        self.stages.get_mut(id)
    }

    pub fn recipe_of(&self, id: StageId) -> Option<RecipeId> {
        self.slots.get(id).copied()
    }

    /// Live stage ids in slot order.
    pub fn stage_ids(&self) -> impl Iterator<Item = StageId> + '_ {
        self.slots.keys()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // -- Operator actions that need the facility's random source -----------

    /// Press the running session on a stage. Returns the score.
    pub fn press(&mut self, id: StageId) -> Option<Fixed64> {
        let stage = self.stages.get_mut(id)?;
        stage.press_action(&mut self.rng)
    }

    pub fn start_session(&mut self, id: StageId, actor: ActorId) -> bool {
        self.stages
            .get_mut(id)
            .is_some_and(|stage| stage.start_session(actor))
    }

    /// Move as much of `from`'s buffered output into `to` as `to` accepts.
    /// Returns the number of units moved.
    pub fn transfer(&mut self, from: StageId, to: StageId) -> Result<u32, FacilityError> {
        if from == to {
            return Ok(0);
        }
        let (unit, available) = {
            let source = self
                .stages
                .get(from)
                .ok_or(FacilityError::UnknownStage(from))?;
            match source.output() {
                Some(output) => (output.unit(), output.quantity),
                None => return Ok(0),
            }
        };
        let target = self
            .stages
            .get_mut(to)
            .ok_or(FacilityError::UnknownStage(to))?;
        let moved = offer_units(target, unit, available);
        if moved > 0 {
            if let Some(source) = self.stages.get_mut(from) {
                source.extract_units(moved);
            }
        }
        Ok(moved)
    }

    // -- Step ---------------------------------------------------------------

    /// Advance every stage by one tick.
    pub fn step(&mut self, sink: &mut dyn ActivitySink) -> StepReport {
        let tick = self.tick;
        let mut events = Vec::new();
        let ids: Vec<StageId> = self.slots.keys().collect();

        for id in ids {
            let Some(stage) = self.stages.get_mut(id) else {
                continue;
            };
            let result = stage.tick(&mut self.rng);
            if result.overheated {
                events.push(StageEvent::Overheated { stage: id, tick });
            }
            if let Some(score) = result.session_score {
                events.push(StageEvent::SessionResolved {
                    stage: id,
                    score,
                    tick,
                });
            }
            if let Some(output) = result.produced {
                events.push(StageEvent::BatchCompleted {
                    stage: id,
                    output,
                    tick,
                });
            }
        }

        self.report_activity(sink, tick, &mut events);
        self.tick += 1;
        StepReport { tick, events }
    }

    /// Report every consuming flag that changed since the last report.
    ///
    /// `step` calls this after ticking. Hosts may also call it after
    /// operator actions to publish changes without waiting a tick.
    pub fn sync_activity(&mut self, sink: &mut dyn ActivitySink) -> Vec<StageEvent> {
        let mut events = Vec::new();
        let tick = self.tick;
        self.report_activity(sink, tick, &mut events);
        events
    }

    fn report_activity(
        &mut self,
        sink: &mut dyn ActivitySink,
        tick: Ticks,
        events: &mut Vec<StageEvent>,
    ) {
        for (id, stage) in &self.stages {
            let consuming = stage.consuming();
            let Some(last) = self.reported.get_mut(id) else {
                continue;
            };
            if *last == consuming {
                continue;
            }
            *last = consuming;
            sink.report_activity(id, consuming);
            events.push(StageEvent::ActivityChanged {
                stage: id,
                active: consuming,
                tick,
            });
        }
    }

    // -- Records ------------------------------------------------------------

    /// One tagged record per live stage, in slot order.
    pub fn save_records(&self, catalog: &dyn ItemCatalog) -> Vec<PlacedRecord> {
        self.slots
            .iter()
            .filter_map(|(id, recipe)| {
                let stage = self.stages.get(id)?;
                let def = self.registry.recipe(*recipe)?;
                Some(PlacedRecord {
                    recipe: def.name.clone(),
                    record: stage.save(catalog),
                })
            })
            .collect()
    }

    /// Place one stage per record. All recipe names are resolved before
    /// anything is placed, so an unknown name leaves the facility unchanged.
    pub fn load_records(
        &mut self,
        records: &[PlacedRecord],
        catalog: &dyn ItemCatalog,
    ) -> Result<Vec<StageId>, FacilityError> {
        let mut resolved = Vec::with_capacity(records.len());
        for placed in records {
            let recipe = self
                .registry
                .recipe_id(&placed.recipe)
                .ok_or_else(|| FacilityError::UnknownRecipeName(placed.recipe.clone()))?;
            let def = self
                .registry
                .recipe(recipe)
                .ok_or(FacilityError::UnknownRecipe(recipe))?;
            resolved.push((recipe, Arc::clone(def)));
        }

        let ids = resolved
            .into_iter()
            .zip(records)
            .map(|((recipe, def), placed)| {
                let stage = ProcessingStage::load(def, &placed.record, catalog);
                self.insert(recipe, stage)
            })
            .collect();
        Ok(ids)
    }
}

fn offer_units(target: &mut ProcessingStage, unit: ItemUnit, available: u32) -> u32 {
    let mut moved = 0;
    while moved < available && target.add_input(unit).is_accepted() {
        moved += 1;
    }
    moved
}

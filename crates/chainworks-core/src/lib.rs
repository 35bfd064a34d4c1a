//! Chainworks Core -- a staged production pipeline engine.
//!
//! A product chain is an ordered list of processing stages. Each stage
//! accepts input units, runs a batch (for a fixed time, or until an operator
//! presses inside a timing window), derives an output quality tier and
//! buffers the output until it is extracted. Every stage in every chain is
//! the same [`stage::ProcessingStage`] state machine driven by an immutable
//! [`recipe::RecipeDefinition`].
//!
//! # Stage Lifecycle
//!
//! 1. **Idle** -- empty, nothing buffered.
//! 2. **Filling** -- units loaded, batch not started yet.
//! 3. **Processing** / **AwaitingPress** -- the batch is running, or a
//!    press session is counting through its cycle.
//! 4. **Ready** -- output buffered; intake is refused until it is extracted.
//!
//! Completion is atomic: the tick that finishes a batch clears the inputs,
//! fills the output buffer and deactivates the stage together.
//!
//! # Overlays
//!
//! Recipes opt into extra behaviour with plain data: a timing minigame
//! ([`timing`]), a dosage slider ([`dosage`]), heat control ([`thermal`]),
//! a fuel tank ([`fuel`]) and cosmetic press settings ([`cosmetic`]).
//!
//! # Key Types
//!
//! - [`registry::Registry`] -- Immutable items, recipes and pipelines
//!   (frozen at startup).
//! - [`facility::Facility`] -- Owns placed stages, steps them in slot
//!   order and reports activity changes edge-triggered.
//! - [`record::StageRecord`] -- Lenient per-stage save document.
//! - [`serialize`] -- Versioned binary facility snapshots via bitcode.
//! - [`catalog`] -- The built-in product chains.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.

pub mod catalog;
pub mod cosmetic;
pub mod dosage;
pub mod event;
pub mod facility;
pub mod fixed;
pub mod fuel;
pub mod id;
pub mod item;
pub mod quality;
pub mod recipe;
pub mod record;
pub mod registry;
pub mod rng;
pub mod serialize;
pub mod stage;
pub mod thermal;
pub mod timing;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

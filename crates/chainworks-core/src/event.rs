//! Stage events and the edge-triggered activity sink.
//!
//! A [`Facility`](crate::facility::Facility) step collects one
//! [`StageEvent`] per notable transition. Activity changes also go to an
//! [`ActivitySink`], and only when a stage's consuming flag actually flips,
//! so notification volume follows transitions rather than ticks.

use crate::fixed::{Fixed64, Ticks};
use crate::id::StageId;
use crate::item::ItemStack;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageEvent {
    BatchCompleted {
        stage: StageId,
        output: ItemStack,
        tick: Ticks,
    },
    /// A press session resolved because its cycle ran out.
    SessionResolved {
        stage: StageId,
        score: Fixed64,
        tick: Ticks,
    },
    Overheated {
        stage: StageId,
        tick: Ticks,
    },
    ActivityChanged {
        stage: StageId,
        active: bool,
        tick: Ticks,
    },
}

impl StageEvent {
    pub fn stage(&self) -> StageId {
        match self {
            StageEvent::BatchCompleted { stage, .. }
            | StageEvent::SessionResolved { stage, .. }
            | StageEvent::Overheated { stage, .. }
            | StageEvent::ActivityChanged { stage, .. } => *stage,
        }
    }

    pub fn tick(&self) -> Ticks {
        match self {
            StageEvent::BatchCompleted { tick, .. }
            | StageEvent::SessionResolved { tick, .. }
            | StageEvent::Overheated { tick, .. }
            | StageEvent::ActivityChanged { tick, .. } => *tick,
        }
    }
}

// ---------------------------------------------------------------------------
// Activity sink
// ---------------------------------------------------------------------------

/// Host hook told when a device starts or stops drawing utilities.
pub trait ActivitySink {
    fn report_activity(&mut self, stage: StageId, active: bool);
}

/// Sink that drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ActivitySink for NullSink {
    fn report_activity(&mut self, _stage: StageId, _active: bool) {}
}

//! Binary facility snapshots.
//!
//! A snapshot is a `bitcode` image of every placed stage (with its slot id),
//! the last reported activity flags, the tick counter and the random state,
//! behind a versioned header. Recipes are not stored: restoring needs the
//! same [`Registry`] the facility was built with, and stages re-attach to
//! their shared recipe by [`RecipeId`].

use crate::facility::Facility;
use crate::fixed::Ticks;
use crate::id::{RecipeId, StageId};
use crate::registry::Registry;
use crate::rng::SimRng;
use crate::stage::{ProcessingStage, StageState};
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a facility snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xC4A1_0001;

/// Bumped whenever the encoded facility layout changes.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("could not encode facility: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("not a facility snapshot (header word 0x{0:08X})")]
    InvalidMagic(u32),
    #[error("snapshot layout {0} is no longer readable")]
    UnsupportedVersion(u32),
    #[error("snapshot layout {0} is newer than {FORMAT_VERSION}")]
    FutureVersion(u32),
    #[error("could not decode facility: {0}")]
    Decode(String),
    #[error("snapshot references recipe {0:?}, which the registry does not have")]
    UnknownRecipe(RecipeId),
    #[error("snapshot has no state for a placed stage")]
    MissingState,
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Facility tick when the snapshot was taken.
    pub tick: Ticks,
}

impl SnapshotHeader {
    pub fn new(tick: Ticks) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// Decode only far enough to return the header.
pub fn read_snapshot_header(data: &[u8]) -> Result<SnapshotHeader, DeserializeError> {
    let snapshot: FacilitySnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    Ok(snapshot.header)
}

// ---------------------------------------------------------------------------
// Snapshot payload
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct FacilitySnapshot {
    header: SnapshotHeader,
    slots: SlotMap<StageId, RecipeId>,
    states: SecondaryMap<StageId, StageState>,
    reported: SecondaryMap<StageId, bool>,
    rng: SimRng,
}

impl Facility {
    /// Serialize the facility to a versioned binary image.
    pub fn snapshot(&self) -> Result<Vec<u8>, SerializeError> {
        let mut states = SecondaryMap::new();
        for (id, stage) in &self.stages {
            states.insert(id, stage.state().clone());
        }
        let snapshot = FacilitySnapshot {
            header: SnapshotHeader::new(self.tick),
            slots: self.slots.clone(),
            states,
            reported: self.reported.clone(),
            rng: self.rng.clone(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Rebuild a facility from [`snapshot`](Self::snapshot) bytes. Stage ids
    /// from the original facility remain valid.
    pub fn restore(registry: Arc<Registry>, data: &[u8]) -> Result<Facility, DeserializeError> {
        let snapshot: FacilitySnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;

        let FacilitySnapshot {
            header,
            slots,
            mut states,
            reported,
            rng,
        } = snapshot;

        let mut stages = SecondaryMap::new();
        for (id, recipe) in &slots {
            let def = registry
                .recipe(*recipe)
                .ok_or(DeserializeError::UnknownRecipe(*recipe))?;
            let state = states.remove(id).ok_or(DeserializeError::MissingState)?;
            stages.insert(id, ProcessingStage::from_parts(Arc::clone(def), state));
        }

        tracing::info!(
            tick = header.tick,
            stages = slots.len(),
            "facility restored from snapshot"
        );
        Ok(Facility {
            registry,
            slots,
            stages,
            reported,
            tick: header.tick,
            rng,
        })
    }
}

//! Checkpoint timeline for display.
//!
//! Orders provider checkpoints newest first, derives a progress percentage
//! from the carrier phase, and splits the list into a visible head and a
//! "show more" remainder. Layout and animation are left to the caller.

use serde::Serialize;

use crate::part::{Checkpoint, TrackingPhase};

/// Default number of checkpoints shown before "show more".
pub const DEFAULT_VISIBLE_CHECKPOINTS: usize = 3;

/// Progress percentage for a carrier phase.
///
/// Increases monotonically along `Pending → InfoReceived → InTransit →
/// OutForDelivery → Delivered`. Off-path phases sit where the parcel most
/// likely is.
#[must_use]
pub fn progress_for(phase: Option<&TrackingPhase>) -> u8 {
    match phase {
        None | Some(TrackingPhase::Other(_) | TrackingPhase::Expired) => 0,
        Some(TrackingPhase::Pending) => 5,
        Some(TrackingPhase::InfoReceived) => 15,
        Some(TrackingPhase::InTransit | TrackingPhase::Exception) => 50,
        Some(TrackingPhase::AttemptFail) => 70,
        Some(TrackingPhase::AvailableForPickup) => 80,
        Some(TrackingPhase::OutForDelivery) => 85,
        Some(TrackingPhase::Delivered) => 100,
    }
}

/// Display model for a part's checkpoint history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeline {
    checkpoints: Vec<Checkpoint>,
    status: Option<TrackingPhase>,
    visible_limit: usize,
    expanded: bool,
}

impl Timeline {
    /// Build a timeline from checkpoints in any order.
    ///
    /// Checkpoints without a time sort after every dated one.
    #[must_use]
    pub fn new(
        checkpoints: &[Checkpoint],
        status: Option<&TrackingPhase>,
        visible_limit: usize,
    ) -> Self {
        let mut checkpoints = checkpoints.to_vec();
        // Option orders None first; reversing puts newest first and undated last.
        checkpoints.sort_by(|a, b| b.checkpoint_time.cmp(&a.checkpoint_time));
        Self {
            checkpoints,
            status: status.cloned(),
            visible_limit,
            expanded: false,
        }
    }

    /// All checkpoints, newest first.
    #[must_use]
    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Checkpoints currently shown.
    #[must_use]
    pub fn visible(&self) -> &[Checkpoint] {
        if self.expanded {
            &self.checkpoints
        } else {
            let end = self.visible_limit.min(self.checkpoints.len());
            &self.checkpoints[..end]
        }
    }

    /// Number of checkpoints hidden behind "show more".
    #[must_use]
    pub fn remaining_count(&self) -> usize {
        self.checkpoints.len() - self.visible().len()
    }

    /// Progress percentage for the carrier-reported status.
    #[must_use]
    pub fn progress(&self) -> u8 {
        progress_for(self.status.as_ref())
    }

    /// The carrier-reported status.
    #[must_use]
    pub fn status(&self) -> Option<&TrackingPhase> {
        self.status.as_ref()
    }

    /// Most recent checkpoint.
    #[must_use]
    pub fn latest(&self) -> Option<&Checkpoint> {
        self.checkpoints.first()
    }

    /// Whether every checkpoint is shown.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Show every checkpoint.
    pub fn expand(&mut self) {
        self.expanded = true;
    }

    /// Go back to showing only the first few checkpoints.
    pub fn collapse(&mut self) {
        self.expanded = false;
    }

    /// Whether there are no checkpoints at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }
}

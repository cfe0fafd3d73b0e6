//! Tracking sync client.
//!
//! Looks up a part's shipment through the external tracking API and turns the
//! answer into a [`TrackingSnapshot`] that can be merged into the part. At
//! most one lookup per part is outstanding at any time; a second request for
//! the same part while the first is running fails fast with
//! [`SyncError::AlreadyInFlight`] instead of hitting the network.

pub mod http;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::part::{Checkpoint, Part, PartId, TrackingPhase};
use crate::status::StatusLabel;

pub use http::HttpTrackingApi;
pub use wire::{TrackingEnvelope, TrackingPayload};

/// Tracking data returned by a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingSnapshot {
    /// Carrier-reported phase.
    pub status: Option<TrackingPhase>,
    /// Full checkpoint history.
    pub checkpoints: Vec<Checkpoint>,
    /// When the data was fetched.
    pub updated_at: DateTime<Utc>,
}

impl TrackingSnapshot {
    /// Merge into `part`, replacing every carrier-owned field.
    ///
    /// A delivered phase promotes the part to [`StatusLabel::Delivered`];
    /// nothing else changes the part's status. Returns `true` if the part was
    /// promoted.
    pub fn apply_to(self, part: &mut Part) -> bool {
        let delivered = self
            .status
            .as_ref()
            .is_some_and(TrackingPhase::is_delivered);

        part.tracking_status = self.status;
        part.tracking_checkpoints = self.checkpoints;
        part.tracking_updated_at = Some(self.updated_at);

        if delivered && !part.is_delivered() {
            info!(part_id = part.id, "Carrier reports delivery, marking part delivered");
            part.status = StatusLabel::Delivered;
            return true;
        }
        false
    }
}

/// The external carrier-tracking collaborator.
#[async_trait]
pub trait TrackingApi: Send + Sync {
    /// Look up the current tracking state of a part.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] describing why no snapshot is available.
    async fn fetch(&self, part_id: PartId) -> Result<TrackingSnapshot, SyncError>;
}

/// Single-flight wrapper around a [`TrackingApi`].
#[derive(Debug)]
pub struct TrackingSyncClient<A> {
    api: A,
    in_flight: Mutex<HashSet<PartId>>,
}

/// Removes a part from the in-flight set when the lookup ends.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<PartId>>,
    part_id: PartId,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(in_flight: &'a Mutex<HashSet<PartId>>, part_id: PartId) -> Option<Self> {
        let inserted = in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(part_id);
        inserted.then_some(Self { in_flight, part_id })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.part_id);
    }
}

impl<A: TrackingApi> TrackingSyncClient<A> {
    /// Wrap an API client.
    #[must_use]
    pub fn new(api: A) -> Self {
        Self {
            api,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// The wrapped API client.
    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Whether a lookup for the part is running.
    #[must_use]
    pub fn is_in_flight(&self, part_id: PartId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&part_id)
    }

    /// Look up a part's tracking.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AlreadyInFlight`] without calling the API if a
    /// lookup for the part is running, otherwise whatever the API reports.
    pub async fn refresh(&self, part_id: PartId) -> Result<TrackingSnapshot, SyncError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, part_id) else {
            debug!(part_id, "Refresh ignored, lookup already in flight");
            return Err(SyncError::AlreadyInFlight(part_id));
        };

        let result = self.api.fetch(part_id).await;
        match &result {
            Ok(snapshot) => debug!(
                part_id,
                status = ?snapshot.status,
                checkpoints = snapshot.checkpoints.len(),
                "Tracking refreshed"
            ),
            Err(SyncError::RateLimited(message)) => {
                warn!(part_id, %message, "Tracking lookup rate limited");
            }
            Err(err) => warn!(part_id, error = %err, "Tracking lookup failed"),
        }
        result
    }
}

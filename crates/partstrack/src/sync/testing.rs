//! In-process tracking API for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Notify;

use super::{TrackingApi, TrackingSnapshot};
use crate::error::SyncError;
use crate::part::{Checkpoint, PartId, TrackingPhase};

/// Build a snapshot with `count` checkpoints ending in `status`.
pub(crate) fn snapshot(status: TrackingPhase, count: usize) -> TrackingSnapshot {
    let now = Utc::now();
    let checkpoints = (0..count)
        .map(|i| Checkpoint {
            tag: status.clone(),
            subtag_message: Some(format!("checkpoint {i}")),
            location: None,
            checkpoint_time: Some(now - Duration::hours(i64::try_from(i).unwrap_or(0))),
        })
        .collect();
    TrackingSnapshot {
        status: Some(status),
        checkpoints,
        updated_at: now,
    }
}

/// Returns scripted responses per part, optionally held until a gate opens.
#[derive(Debug, Default)]
pub(crate) struct ScriptedApi {
    responses: Mutex<HashMap<PartId, Result<TrackingSnapshot, SyncError>>>,
    gates: Mutex<HashMap<PartId, Arc<Notify>>>,
    calls: AtomicUsize,
    requested: Mutex<Vec<PartId>>,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer lookups for `part_id` with `result`.
    pub(crate) fn respond(&self, part_id: PartId, result: Result<TrackingSnapshot, SyncError>) {
        self.responses.lock().unwrap().insert(part_id, result);
    }

    /// Hold the next lookup for `part_id` until the returned gate is notified.
    pub(crate) fn gate(&self, part_id: PartId) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(part_id, Arc::clone(&gate));
        gate
    }

    /// Number of lookups that reached the API.
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Part ids in the order they were looked up.
    pub(crate) fn requested(&self) -> Vec<PartId> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackingApi for ScriptedApi {
    async fn fetch(&self, part_id: PartId) -> Result<TrackingSnapshot, SyncError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(part_id);

        let gate = self.gates.lock().unwrap().remove(&part_id);
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.responses
            .lock()
            .unwrap()
            .get(&part_id)
            .cloned()
            .unwrap_or_else(|| Err(SyncError::provider("no scripted response")))
    }
}

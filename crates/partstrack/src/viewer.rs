//! Part viewer.
//!
//! Owns the "part in view" state: the [`ViewSession`], the currently loaded
//! [`Part`] and the last sync [`Notice`]. Lookups are tagged with the id of the
//! part they were issued for; when the answer arrives for a part that is no
//! longer in view it is dropped without touching the store or the view.
//!
//! Locks are never held across an `.await`. When both are needed the state
//! lock is taken before the store lock.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::part::{Part, PartId};
use crate::refresh::{RefreshPolicy, SkipReason, ViewSession};
use crate::status::{self, StatusChange, StatusLabel, TrackingPrompt, TransitionSource};
use crate::storage::PartStore;
use crate::sync::{TrackingApi, TrackingSyncClient};
use crate::timeline::{Timeline, DEFAULT_VISIBLE_CHECKPOINTS};

/// Severity of a sync notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Soft failure, cached data is still current enough to show.
    Warning,
    /// The lookup failed.
    Error,
}

/// Inline message shown next to the part after a failed sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text for the user.
    pub message: String,
}

impl Notice {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// What happened to a refresh request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New tracking data was stored.
    Applied {
        /// The carrier reported delivery and the part was marked delivered.
        promoted: bool,
    },
    /// The provider is throttling; cached data kept.
    RateLimited(String),
    /// The lookup failed; cached data kept.
    Failed(String),
    /// A lookup for the part was already running.
    AlreadyInFlight,
    /// The answer arrived after the viewer moved on and was dropped.
    Discarded,
    /// No lookup was made.
    Skipped(SkipReason),
}

impl RefreshOutcome {
    /// Whether new tracking data was stored.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

impl std::fmt::Display for RefreshOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applied { promoted: true } => write!(f, "tracking updated, part delivered"),
            Self::Applied { promoted: false } => write!(f, "tracking updated"),
            Self::RateLimited(message) => write!(f, "rate limited: {message}"),
            Self::Failed(message) => write!(f, "refresh failed: {message}"),
            Self::AlreadyInFlight => write!(f, "refresh already in progress"),
            Self::Discarded => write!(f, "response discarded"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
        }
    }
}

#[derive(Debug, Default)]
struct ViewState {
    session: ViewSession,
    current: Option<Part>,
    notice: Option<Notice>,
}

/// Shows one part at a time and keeps its tracking data in sync.
#[derive(Debug)]
pub struct PartViewer<S, A> {
    store: Mutex<S>,
    sync: TrackingSyncClient<A>,
    policy: RefreshPolicy,
    visible_checkpoints: usize,
    state: Mutex<ViewState>,
}

impl<S: PartStore, A: TrackingApi> PartViewer<S, A> {
    /// Create a viewer with the default policy and nothing in view.
    #[must_use]
    pub fn new(store: S, api: A) -> Self {
        Self {
            store: Mutex::new(store),
            sync: TrackingSyncClient::new(api),
            policy: RefreshPolicy::default(),
            visible_checkpoints: DEFAULT_VISIBLE_CHECKPOINTS,
            state: Mutex::new(ViewState::default()),
        }
    }

    /// Use a different automatic refresh policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Number of checkpoints the timeline shows before "show more".
    #[must_use]
    pub fn with_visible_checkpoints(mut self, count: usize) -> Self {
        self.visible_checkpoints = count;
        self
    }

    /// The sync client, for inspecting in-flight lookups.
    #[must_use]
    pub fn sync_client(&self) -> &TrackingSyncClient<A> {
        &self.sync
    }

    /// Bring a part into view and refresh it if the policy allows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartNotFound`] if the part doesn't exist, or a storage
    /// error. Sync failures are reported through the outcome and
    /// [`PartViewer::notice`].
    pub async fn open(&self, part_id: PartId) -> Result<RefreshOutcome> {
        let part = self.load(part_id)?;

        {
            let mut state = self.lock_state();
            if state.session.navigate_to(part_id) {
                state.notice = None;
            }

            match self.policy.evaluate(&part, &state.session, Utc::now()) {
                Ok(()) => {
                    state.session.mark_checked(part_id);
                    debug!(
                        part_id,
                        checked = state.session.checked_count(),
                        "Auto refresh scheduled"
                    );
                }
                Err(reason) => {
                    debug!(part_id, %reason, "Auto refresh skipped");
                    state.current = Some(part);
                    return Ok(RefreshOutcome::Skipped(reason));
                }
            }
            state.current = Some(part);
        }

        self.run_sync(part_id).await
    }

    /// Refresh the part in view regardless of staleness.
    ///
    /// Parts without trackable tracking text are still skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPartOpen`] if nothing is in view, or a storage error.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let part = self.current_or_err()?;

        if !part.has_tracking() {
            return Ok(RefreshOutcome::Skipped(SkipReason::NoTracking));
        }
        if !crate::carrier::classify(&part.tracking).trackable {
            return Ok(RefreshOutcome::Skipped(SkipReason::NotTrackable));
        }

        self.lock_state().session.mark_checked(part.id);
        self.run_sync(part.id).await
    }

    /// Close the viewer, forgetting the session.
    pub fn close(&self) {
        let mut state = self.lock_state();
        if let Some(part_id) = state.session.viewing() {
            debug!(part_id, "Viewer closed");
        }
        *state = ViewState::default();
    }

    /// Save a new tracking value for the part in view.
    ///
    /// A change to a new trackable value syncs once, ignoring the staleness
    /// window. Returns `None` when no lookup was made.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPartOpen`] if nothing is in view, or a storage error.
    pub async fn save_tracking(&self, tracking: &str) -> Result<Option<RefreshOutcome>> {
        let part_id = self.viewing_or_err()?;

        let (previous, updated) = {
            let mut state = self.lock_state();
            let mut store = self.lock_store();
            let mut part = store.get(part_id)?.ok_or(Error::PartNotFound(part_id))?;
            let previous = part.tracking.clone();
            if !part.set_tracking(tracking) {
                debug!(part_id, "Tracking unchanged");
                state.current = Some(part);
                return Ok(None);
            }
            store.update(&part)?;
            info!(part_id, tracking = %part.tracking, "Tracking updated");
            let updated = part.tracking.clone();
            state.current = Some(part);
            state.notice = None;
            (previous, updated)
        };

        if !RefreshPolicy::should_refresh_after_edit(&previous, &updated) {
            return Ok(None);
        }
        self.lock_state().session.mark_checked(part_id);
        self.run_sync(part_id).await.map(Some)
    }

    /// Change the status of the part in view.
    ///
    /// The capture prompt runs before anything is written. If it supplied a
    /// trackable number the part is synced afterwards and the outcome
    /// returned alongside the change.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPartOpen`] if nothing is in view, or a storage error.
    pub async fn set_status(
        &self,
        target: StatusLabel,
        source: TransitionSource,
        prompt: &mut dyn TrackingPrompt,
    ) -> Result<(StatusChange, Option<RefreshOutcome>)> {
        let mut draft = self.current_or_err()?;
        let change = status::transition(&mut draft, target, source, prompt);

        {
            let mut state = self.lock_state();
            if !state.session.is_viewing(draft.id) {
                return Err(Error::NoPartOpen);
            }
            let mut store = self.lock_store();
            let mut part = store.get(draft.id)?.ok_or(Error::PartNotFound(draft.id))?;
            if let Some(tracking) = &change.captured_tracking {
                part.set_tracking(tracking.as_str());
            }
            part.status = change.current;
            store.update(&part)?;
            info!(
                part_id = part.id,
                from = %change.previous,
                to = %change.current,
                "Status changed"
            );
            state.current = Some(part);
        }

        if !change.refresh_needed {
            return Ok((change, None));
        }
        self.lock_state().session.mark_checked(draft.id);
        let outcome = self.run_sync(draft.id).await?;
        Ok((change, Some(outcome)))
    }

    /// The part in view.
    #[must_use]
    pub fn current(&self) -> Option<Part> {
        self.lock_state().current.clone()
    }

    /// The last sync notice for the part in view.
    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        self.lock_state().notice.clone()
    }

    /// Checkpoint timeline of the part in view.
    #[must_use]
    pub fn timeline(&self) -> Option<Timeline> {
        self.lock_state().current.as_ref().map(|part| {
            Timeline::new(
                &part.tracking_checkpoints,
                part.tracking_status.as_ref(),
                self.visible_checkpoints,
            )
        })
    }

    /// Snapshot of the session, for callers that render it.
    #[must_use]
    pub fn session(&self) -> ViewSession {
        self.lock_state().session.clone()
    }

    async fn run_sync(&self, part_id: PartId) -> Result<RefreshOutcome> {
        let requested_tracking = self
            .lock_state()
            .current
            .as_ref()
            .map(|p| p.tracking.clone())
            .unwrap_or_default();

        let result = self.sync.refresh(part_id).await;

        let mut state = self.lock_state();
        if !state.session.is_viewing(part_id) {
            debug!(part_id, "Discarding tracking response, part no longer in view");
            return Ok(RefreshOutcome::Discarded);
        }

        match result {
            Ok(snapshot) => {
                let mut store = self.lock_store();
                let mut part = store.get(part_id)?.ok_or(Error::PartNotFound(part_id))?;
                if part.tracking != requested_tracking {
                    debug!(part_id, "Discarding tracking response for a replaced number");
                    return Ok(RefreshOutcome::Discarded);
                }
                let promoted = snapshot.apply_to(&mut part);
                store.update(&part)?;
                state.current = Some(part);
                state.notice = None;
                Ok(RefreshOutcome::Applied { promoted })
            }
            Err(err) if err.is_in_flight() => Ok(RefreshOutcome::AlreadyInFlight),
            Err(err) if err.is_warning() => {
                let message = err.to_string();
                state.notice = Some(Notice::warning(message.as_str()));
                Ok(RefreshOutcome::RateLimited(message))
            }
            Err(err) => {
                let message = err.to_string();
                state.notice = Some(Notice::error(message.as_str()));
                Ok(RefreshOutcome::Failed(message))
            }
        }
    }

    fn load(&self, part_id: PartId) -> Result<Part> {
        self.lock_store()
            .get(part_id)?
            .ok_or(Error::PartNotFound(part_id))
    }

    fn current_or_err(&self) -> Result<Part> {
        self.lock_state().current.clone().ok_or(Error::NoPartOpen)
    }

    fn viewing_or_err(&self) -> Result<PartId> {
        self.lock_state()
            .session
            .viewing()
            .ok_or(Error::NoPartOpen)
    }

    fn lock_state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_store(&self) -> MutexGuard<'_, S> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Duration;

    use super::*;
    use crate::error::SyncError;
    use crate::logging::init_test_logging;
    use crate::part::{Checkpoint, NewPart, TrackingPhase};
    use crate::status::PromptResponse;
    use crate::storage::MemoryStore;
    use crate::sync::testing::{snapshot, ScriptedApi};

    const UPS: &str = "1Z48537W0440715302";

    fn store_with(parts: &[(&str, &str, StatusLabel)]) -> MemoryStore {
        let mut store = MemoryStore::new();
        for (name, tracking, status) in parts {
            store
                .insert(&NewPart {
                    name: (*name).to_string(),
                    tracking: (*tracking).to_string(),
                    status: *status,
                })
                .unwrap();
        }
        store
    }

    fn cached(part: &mut Part, hours_ago: i64) {
        part.tracking_status = Some(TrackingPhase::InTransit);
        part.tracking_checkpoints = vec![Checkpoint {
            tag: TrackingPhase::InTransit,
            subtag_message: Some("Departed facility".to_string()),
            location: Some("Memphis, TN".to_string()),
            checkpoint_time: Some(Utc::now() - Duration::hours(hours_ago)),
        }];
        part.tracking_updated_at = Some(Utc::now() - Duration::hours(hours_ago));
    }

    fn stored(viewer: &PartViewer<MemoryStore, ScriptedApi>, id: PartId) -> Part {
        viewer.lock_store().get(id).unwrap().unwrap()
    }

    struct FixedPrompt {
        response: PromptResponse,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl TrackingPrompt for FixedPrompt {
        fn request_tracking(&mut self, _part: &Part) -> PromptResponse {
            self.log.lock().unwrap().push("prompt");
            self.response.clone()
        }
    }

    /// Records every write so ordering against the prompt can be checked.
    struct RecordingStore {
        inner: MemoryStore,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl PartStore for RecordingStore {
        fn insert(&mut self, part: &NewPart) -> Result<Part> {
            self.inner.insert(part)
        }

        fn get(&self, id: PartId) -> Result<Option<Part>> {
            self.inner.get(id)
        }

        fn update(&mut self, part: &Part) -> Result<()> {
            self.log.lock().unwrap().push("update");
            self.inner.update(part)
        }

        fn list(&self) -> Result<Vec<Part>> {
            self.inner.list()
        }
    }

    #[tokio::test]
    async fn test_open_missing_part() {
        let viewer = PartViewer::new(MemoryStore::new(), ScriptedApi::new());
        assert!(viewer.open(7).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_open_without_tracking_never_calls_api() {
        let viewer = PartViewer::new(
            store_with(&[("Bumper", "", StatusLabel::Purchased)]),
            ScriptedApi::new(),
        );

        let outcome = viewer.open(1).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Skipped(SkipReason::NoTracking));
        assert_eq!(viewer.sync_client().api().calls(), 0);
        assert_eq!(viewer.current().unwrap().name, "Bumper");
    }

    #[tokio::test]
    async fn test_open_stale_part_syncs_and_promotes_delivered() {
        init_test_logging();
        let api = ScriptedApi::new();
        api.respond(1, Ok(snapshot(TrackingPhase::Delivered, 4)));
        let viewer = PartViewer::new(store_with(&[("Grille", UPS, StatusLabel::Shipped)]), api);

        let outcome = viewer.open(1).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Applied { promoted: true });

        let part = stored(&viewer, 1);
        assert_eq!(part.status, StatusLabel::Delivered);
        assert_eq!(part.tracking_checkpoints.len(), 4);
        assert_eq!(viewer.current().unwrap(), part);
        assert!(viewer.notice().is_none());
        assert_eq!(viewer.timeline().unwrap().progress(), 100);
    }

    #[tokio::test]
    async fn test_reopen_same_part_checks_once() {
        let api = ScriptedApi::new();
        api.respond(1, Err(SyncError::rate_limited("Slow down")));
        let viewer = PartViewer::new(store_with(&[("Grille", UPS, StatusLabel::Shipped)]), api);

        viewer.open(1).await.unwrap();
        let again = viewer.open(1).await.unwrap();
        assert_eq!(again, RefreshOutcome::Skipped(SkipReason::AlreadyChecked));
        assert_eq!(viewer.sync_client().api().calls(), 1);
    }

    #[tokio::test]
    async fn test_navigating_away_and_back_rechecks() {
        let api = ScriptedApi::new();
        api.respond(1, Err(SyncError::network("offline")));
        let viewer = PartViewer::new(
            store_with(&[
                ("Grille", UPS, StatusLabel::Shipped),
                ("Hood", "", StatusLabel::Pending),
            ]),
            api,
        );

        viewer.open(1).await.unwrap();
        viewer.open(2).await.unwrap();
        assert!(!viewer.session().is_checked(1));
        viewer.open(1).await.unwrap();

        assert_eq!(viewer.sync_client().api().requested(), vec![1, 1]);
    }

    #[tokio::test]
    async fn test_close_clears_session() {
        let api = ScriptedApi::new();
        api.respond(1, Err(SyncError::network("offline")));
        let viewer = PartViewer::new(store_with(&[("Grille", UPS, StatusLabel::Shipped)]), api);

        viewer.open(1).await.unwrap();
        assert!(viewer.session().is_checked(1));

        viewer.close();
        assert_eq!(viewer.session(), ViewSession::new());
        assert!(viewer.current().is_none());
        assert!(matches!(viewer.refresh().await, Err(Error::NoPartOpen)));

        viewer.open(1).await.unwrap();
        assert_eq!(viewer.sync_client().api().calls(), 2);
    }

    #[tokio::test]
    async fn test_fresh_part_skipped_until_manual_refresh() {
        let api = ScriptedApi::new();
        api.respond(1, Ok(snapshot(TrackingPhase::OutForDelivery, 2)));
        let mut store = store_with(&[("Grille", UPS, StatusLabel::Shipped)]);
        let mut part = store.get(1).unwrap().unwrap();
        cached(&mut part, 2);
        store.update(&part).unwrap();
        let viewer = PartViewer::new(store, api);

        assert_eq!(
            viewer.open(1).await.unwrap(),
            RefreshOutcome::Skipped(SkipReason::Fresh)
        );
        assert_eq!(
            viewer.refresh().await.unwrap(),
            RefreshOutcome::Applied { promoted: false }
        );
        assert_eq!(
            stored(&viewer, 1).tracking_status,
            Some(TrackingPhase::OutForDelivery)
        );
    }

    #[tokio::test]
    async fn test_manual_refresh_skips_untrackable() {
        let viewer = PartViewer::new(
            store_with(&[("Seat covers", "https://www.amazon.com/gp/your-orders", StatusLabel::Shipped)]),
            ScriptedApi::new(),
        );

        viewer.open(1).await.unwrap();
        assert_eq!(
            viewer.refresh().await.unwrap(),
            RefreshOutcome::Skipped(SkipReason::NotTrackable)
        );
        assert_eq!(viewer.sync_client().api().calls(), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_keeps_cache_and_warns() {
        let api = ScriptedApi::new();
        api.respond(1, Err(SyncError::rate_limited("Try again in an hour")));
        let mut store = store_with(&[("Grille", UPS, StatusLabel::Shipped)]);
        let mut part = store.get(1).unwrap().unwrap();
        cached(&mut part, 30);
        store.update(&part).unwrap();
        let viewer = PartViewer::new(store, api);

        let outcome = viewer.open(1).await.unwrap();
        assert_eq!(
            outcome,
            RefreshOutcome::RateLimited("Try again in an hour".to_string())
        );
        assert_eq!(stored(&viewer, 1), part);
        assert_eq!(
            viewer.notice(),
            Some(Notice {
                level: NoticeLevel::Warning,
                message: "Try again in an hour".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_provider_error_keeps_data() {
        let api = ScriptedApi::new();
        api.respond(1, Err(SyncError::provider("invalid tracking number")));
        let mut store = store_with(&[("Grille", UPS, StatusLabel::Shipped)]);
        let mut part = store.get(1).unwrap().unwrap();
        cached(&mut part, 48);
        store.update(&part).unwrap();
        let viewer = PartViewer::new(store, api);

        let outcome = viewer.open(1).await.unwrap();
        assert!(matches!(outcome, RefreshOutcome::Failed(ref m) if m.contains("invalid tracking number")));
        assert_eq!(stored(&viewer, 1).tracking_checkpoints.len(), 1);
        assert_eq!(viewer.notice().unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_response_for_previous_part_is_discarded() {
        init_test_logging();
        let api = ScriptedApi::new();
        api.respond(1, Ok(snapshot(TrackingPhase::Delivered, 3)));
        let gate = api.gate(1);
        let viewer = PartViewer::new(
            store_with(&[
                ("Grille", UPS, StatusLabel::Shipped),
                ("Hood", "", StatusLabel::Pending),
            ]),
            api,
        );

        let (first, second) = tokio::join!(viewer.open(1), async {
            tokio::task::yield_now().await;
            let second = viewer.open(2).await;
            gate.notify_one();
            second
        });

        assert_eq!(first.unwrap(), RefreshOutcome::Discarded);
        assert_eq!(
            second.unwrap(),
            RefreshOutcome::Skipped(SkipReason::NoTracking)
        );

        let grille = stored(&viewer, 1);
        assert_eq!(grille.status, StatusLabel::Shipped);
        assert!(grille.tracking_checkpoints.is_empty());

        let current = viewer.current().unwrap();
        assert_eq!(current.id, 2);
        assert!(current.tracking_checkpoints.is_empty());
    }

    #[tokio::test]
    async fn test_double_manual_refresh_is_single_flight() {
        let api = ScriptedApi::new();
        api.respond(1, Ok(snapshot(TrackingPhase::InTransit, 1)));
        let viewer = PartViewer::new(store_with(&[("Grille", UPS, StatusLabel::Shipped)]), api)
            .with_policy(RefreshPolicy::default().with_enabled(false));
        viewer.open(1).await.unwrap();
        let gate = viewer.sync_client().api().gate(1);

        let (first, second) = tokio::join!(viewer.refresh(), async {
            tokio::task::yield_now().await;
            let second = viewer.refresh().await;
            gate.notify_one();
            second
        });

        assert!(first.unwrap().is_applied());
        assert_eq!(second.unwrap(), RefreshOutcome::AlreadyInFlight);
        assert_eq!(viewer.sync_client().api().calls(), 1);
    }

    #[tokio::test]
    async fn test_save_tracking_triggers_one_sync() {
        let api = ScriptedApi::new();
        api.respond(1, Ok(snapshot(TrackingPhase::InfoReceived, 1)));
        let viewer = PartViewer::new(store_with(&[("Radiator", "", StatusLabel::Purchased)]), api);
        viewer.open(1).await.unwrap();

        let outcome = viewer.save_tracking(UPS).await.unwrap();
        assert_eq!(outcome, Some(RefreshOutcome::Applied { promoted: false }));
        assert_eq!(stored(&viewer, 1).tracking, UPS);
        assert_eq!(viewer.sync_client().api().calls(), 1);

        // Same value again is not an edit
        assert_eq!(viewer.save_tracking(UPS).await.unwrap(), None);
        assert_eq!(viewer.sync_client().api().calls(), 1);
    }

    #[tokio::test]
    async fn test_save_untrackable_tracking_persists_without_sync() {
        let viewer = PartViewer::new(
            store_with(&[("Radiator", UPS, StatusLabel::Shipped)]),
            ScriptedApi::new(),
        )
        .with_policy(RefreshPolicy::default().with_enabled(false));
        viewer.open(1).await.unwrap();

        assert_eq!(viewer.save_tracking("Local pickup").await.unwrap(), None);
        let part = stored(&viewer, 1);
        assert_eq!(part.tracking, "Local pickup");
        assert!(part.tracking_status.is_none());
        assert_eq!(viewer.sync_client().api().calls(), 0);
    }

    #[tokio::test]
    async fn test_set_status_prompts_before_persisting() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let store = RecordingStore {
            inner: store_with(&[("Carburetor", "", StatusLabel::Purchased)]),
            log: Arc::clone(&log),
        };
        let api = ScriptedApi::new();
        api.respond(1, Ok(snapshot(TrackingPhase::InTransit, 2)));
        let viewer = PartViewer::new(store, api);
        viewer.open(1).await.unwrap();

        let mut prompt = FixedPrompt {
            response: PromptResponse::Provided(UPS.to_string()),
            log: Arc::clone(&log),
        };
        let (change, outcome) = viewer
            .set_status(StatusLabel::Shipped, TransitionSource::Dropdown, &mut prompt)
            .await
            .unwrap();

        assert_eq!(change.previous, StatusLabel::Purchased);
        assert_eq!(change.captured_tracking.as_deref(), Some(UPS));
        assert!(outcome.unwrap().is_applied());

        let log = log.lock().unwrap().clone();
        assert_eq!(log[..2], ["prompt", "update"]);

        let part = viewer.current().unwrap();
        assert_eq!(part.status, StatusLabel::Shipped);
        assert_eq!(part.tracking, UPS);
        assert_eq!(part.tracking_checkpoints.len(), 2);
    }

    #[tokio::test]
    async fn test_set_status_skip_prompt_still_ships() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let viewer = PartViewer::new(
            store_with(&[("Carburetor", "", StatusLabel::Purchased)]),
            ScriptedApi::new(),
        );
        viewer.open(1).await.unwrap();

        let mut prompt = FixedPrompt {
            response: PromptResponse::Skipped,
            log: Arc::clone(&log),
        };
        let (change, outcome) = viewer
            .set_status(StatusLabel::Shipped, TransitionSource::Dropdown, &mut prompt)
            .await
            .unwrap();

        assert_eq!(change.current, StatusLabel::Shipped);
        assert!(outcome.is_none());
        assert_eq!(*log.lock().unwrap(), vec!["prompt"]);
        assert_eq!(viewer.sync_client().api().calls(), 0);
        assert_eq!(
            viewer.lock_store().get(1).unwrap().unwrap().status,
            StatusLabel::Shipped
        );
    }

    #[tokio::test]
    async fn test_set_status_requires_open_part() {
        let viewer = PartViewer::new(MemoryStore::new(), ScriptedApi::new());
        let mut prompt = FixedPrompt {
            response: PromptResponse::Skipped,
            log: Arc::new(Mutex::new(Vec::new())),
        };
        let err = viewer
            .set_status(StatusLabel::Purchased, TransitionSource::Dropdown, &mut prompt)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoPartOpen));
    }

    #[tokio::test]
    async fn test_timeline_uses_visible_limit() {
        let api = ScriptedApi::new();
        api.respond(1, Ok(snapshot(TrackingPhase::InTransit, 5)));
        let viewer = PartViewer::new(store_with(&[("Grille", UPS, StatusLabel::Shipped)]), api)
            .with_visible_checkpoints(2);
        viewer.open(1).await.unwrap();

        let timeline = viewer.timeline().unwrap();
        assert_eq!(timeline.visible().len(), 2);
        assert_eq!(timeline.remaining_count(), 3);
    }
}

//! Automatic refresh policy.
//!
//! Decides whether viewing a part should trigger a lookup against the
//! carrier-tracking API. There is no background poller: the policy is
//! evaluated once each time a part comes into view.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::carrier;
use crate::part::{Part, PartId};

/// Default freshness window for cached tracking data.
pub const DEFAULT_STALENESS_HOURS: u32 = 24;

/// Parts already checked while one part viewer is open.
///
/// The set is cleared when the viewer closes or moves to a different part, so
/// coming back to a part later re-checks it once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSession {
    viewing: Option<PartId>,
    checked_ids: HashSet<PartId>,
}

impl ViewSession {
    /// Create an empty session with nothing in view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The part currently in view.
    #[must_use]
    pub fn viewing(&self) -> Option<PartId> {
        self.viewing
    }

    /// Whether `part_id` is the part currently in view.
    #[must_use]
    pub fn is_viewing(&self, part_id: PartId) -> bool {
        self.viewing == Some(part_id)
    }

    /// Bring `part_id` into view.
    ///
    /// Moving to a different part clears the checked set. Returns `true` if
    /// the viewed part changed.
    pub fn navigate_to(&mut self, part_id: PartId) -> bool {
        if self.viewing == Some(part_id) {
            return false;
        }
        self.checked_ids.clear();
        self.viewing = Some(part_id);
        true
    }

    /// Close the viewer and forget every checked part.
    pub fn close(&mut self) {
        self.viewing = None;
        self.checked_ids.clear();
    }

    /// Whether the part was already checked in this session.
    #[must_use]
    pub fn is_checked(&self, part_id: PartId) -> bool {
        self.checked_ids.contains(&part_id)
    }

    /// Record that the part was checked. Returns `false` if it already was.
    pub fn mark_checked(&mut self, part_id: PartId) -> bool {
        self.checked_ids.insert(part_id)
    }

    /// Number of parts checked in this session.
    #[must_use]
    pub fn checked_count(&self) -> usize {
        self.checked_ids.len()
    }
}

/// Why an automatic refresh was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Automatic refresh is turned off.
    Disabled,
    /// The part has no tracking text.
    NoTracking,
    /// The tracking text is not something the API can look up.
    NotTrackable,
    /// The part is already delivered.
    Delivered,
    /// The part was already checked in this session.
    AlreadyChecked,
    /// Cached data is younger than the staleness window.
    Fresh,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "auto refresh disabled"),
            Self::NoTracking => write!(f, "no tracking"),
            Self::NotTrackable => write!(f, "not trackable"),
            Self::Delivered => write!(f, "already delivered"),
            Self::AlreadyChecked => write!(f, "already checked this session"),
            Self::Fresh => write!(f, "tracking data is fresh"),
        }
    }
}

/// Decision rules for automatic refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    enabled: bool,
    staleness: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_STALENESS_HOURS)
    }
}

impl RefreshPolicy {
    /// Create a policy with the given staleness window in hours.
    #[must_use]
    pub fn new(staleness_hours: u32) -> Self {
        Self {
            enabled: true,
            staleness: Duration::hours(i64::from(staleness_hours)),
        }
    }

    /// Turn automatic refresh on or off.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The staleness window.
    #[must_use]
    pub fn staleness(&self) -> Duration {
        self.staleness
    }

    /// Check the skip rules without touching the session.
    ///
    /// # Errors
    ///
    /// Returns the first rule that blocks a refresh.
    pub fn evaluate(
        &self,
        part: &Part,
        session: &ViewSession,
        now: DateTime<Utc>,
    ) -> std::result::Result<(), SkipReason> {
        if !self.enabled {
            return Err(SkipReason::Disabled);
        }
        if !part.has_tracking() {
            return Err(SkipReason::NoTracking);
        }
        if !carrier::classify(&part.tracking).trackable {
            return Err(SkipReason::NotTrackable);
        }
        if part.is_delivered() {
            return Err(SkipReason::Delivered);
        }
        if session.is_checked(part.id) {
            return Err(SkipReason::AlreadyChecked);
        }
        if let Some(updated_at) = part.tracking_updated_at {
            if now - updated_at < self.staleness {
                return Err(SkipReason::Fresh);
            }
        }
        Ok(())
    }

    /// Decide whether viewing `part` should trigger a lookup.
    ///
    /// On `true` the part is marked as checked before returning, so a second
    /// evaluation during the same session cannot start another lookup.
    pub fn should_auto_refresh(
        &self,
        part: &Part,
        session: &mut ViewSession,
        now: DateTime<Utc>,
    ) -> bool {
        match self.evaluate(part, session, now) {
            Ok(()) => {
                session.mark_checked(part.id);
                debug!(part_id = part.id, "Auto refresh scheduled");
                true
            }
            Err(reason) => {
                debug!(part_id = part.id, %reason, "Auto refresh skipped");
                false
            }
        }
    }

    /// Decide whether saving a tracking edit should trigger a lookup.
    ///
    /// Edits bypass the staleness window but still require a new, trackable
    /// value.
    #[must_use]
    pub fn should_refresh_after_edit(previous: &str, updated: &str) -> bool {
        let updated = updated.trim();
        !updated.is_empty()
            && updated != previous.trim()
            && carrier::classify(updated).trackable
    }
}

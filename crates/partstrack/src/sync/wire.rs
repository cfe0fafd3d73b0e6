//! JSON envelope returned by the tracking endpoint.
//!
//! ```text
//! GET /tracking/{partId}
//! 200 -> { success: true, tracking: { tracking_status, tracking_checkpoints, tracking_updated_at },
//!          rateLimited?: bool, rateLimitMessage?: string }
//! 200/4xx -> { success: false, rateLimited?: bool, error?: string }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TrackingSnapshot;
use crate::error::SyncError;
use crate::part::{Checkpoint, TrackingPhase};

/// Message shown when the provider throttles without saying why.
pub const DEFAULT_RATE_LIMIT_MESSAGE: &str =
    "Tracking lookups are rate limited right now; showing the last known status.";

/// Top-level response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEnvelope {
    /// Whether the lookup succeeded.
    #[serde(default)]
    pub success: bool,

    /// Tracking data on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking: Option<TrackingPayload>,

    /// Whether the provider throttled the lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limited: Option<bool>,

    /// Explanation to show when throttled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_message: Option<String>,

    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Tracking fields of a successful response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingPayload {
    /// Carrier-reported phase.
    #[serde(default)]
    pub tracking_status: Option<TrackingPhase>,

    /// Full checkpoint history.
    #[serde(default)]
    pub tracking_checkpoints: Vec<Checkpoint>,

    /// When the provider last refreshed this shipment.
    #[serde(default)]
    pub tracking_updated_at: Option<DateTime<Utc>>,
}

impl TrackingEnvelope {
    /// Interpret the envelope.
    ///
    /// Rate limiting wins over everything else, so cached data that rides
    /// along with a throttled response is never applied.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::RateLimited`] when throttled and
    /// [`SyncError::Provider`] when the lookup failed or carried no data.
    pub fn into_snapshot(self, now: DateTime<Utc>) -> Result<TrackingSnapshot, SyncError> {
        if self.rate_limited.unwrap_or(false) {
            let message = self
                .rate_limit_message
                .or(self.error)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_RATE_LIMIT_MESSAGE.to_string());
            return Err(SyncError::RateLimited(message));
        }

        if !self.success {
            let message = self
                .error
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "tracking lookup failed".to_string());
            return Err(SyncError::Provider(message));
        }

        let payload = self
            .tracking
            .ok_or_else(|| SyncError::provider("response did not include tracking data"))?;

        Ok(TrackingSnapshot {
            status: payload.tracking_status,
            checkpoints: payload.tracking_checkpoints,
            updated_at: payload.tracking_updated_at.unwrap_or(now),
        })
    }
}

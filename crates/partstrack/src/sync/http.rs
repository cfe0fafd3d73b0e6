//! HTTP client for the carrier-tracking endpoint.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, StatusCode};
use tracing::{debug, warn};

use super::wire::{TrackingEnvelope, DEFAULT_RATE_LIMIT_MESSAGE};
use super::{TrackingApi, TrackingSnapshot};
use crate::config::TrackingConfig;
use crate::error::SyncError;
use crate::part::PartId;

/// Tracking API reached over HTTP with an optional bearer credential.
#[derive(Clone)]
pub struct HttpTrackingApi {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl std::fmt::Debug for HttpTrackingApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTrackingApi")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl HttpTrackingApi {
    /// Create a client for the API rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
        }
    }

    /// Create a client from the tracking configuration.
    #[must_use]
    pub fn from_config(config: &TrackingConfig) -> Self {
        let api = Self::new(config.api_base_url.clone());
        match &config.auth_token {
            Some(token) => api.with_auth_token(token.clone()),
            None => api,
        }
    }

    /// Send `token` as a bearer credential on every request.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Use a preconfigured reqwest client.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// URL of the tracking resource for a part.
    #[must_use]
    pub fn tracking_url(&self, part_id: PartId) -> String {
        format!("{}/tracking/{part_id}", self.base_url)
    }
}

#[async_trait]
impl TrackingApi for HttpTrackingApi {
    async fn fetch(&self, part_id: PartId) -> Result<TrackingSnapshot, SyncError> {
        let url = self.tracking_url(part_id);
        debug!(part_id, %url, "Fetching tracking");

        let mut request = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let throttled = status == StatusCode::TOO_MANY_REQUESTS;
        match serde_json::from_str::<TrackingEnvelope>(&body) {
            Ok(mut envelope) => {
                // A 429 is a rate limit whatever the body claims
                if throttled {
                    envelope.rate_limited = Some(true);
                }
                envelope.into_snapshot(Utc::now())
            }
            Err(err) if throttled => {
                debug!(part_id, error = %err, "Unparseable rate-limit body");
                Err(SyncError::rate_limited(DEFAULT_RATE_LIMIT_MESSAGE))
            }
            Err(err) if status.is_success() => {
                warn!(part_id, error = %err, "Malformed tracking response");
                Err(SyncError::provider(format!("malformed response: {err}")))
            }
            Err(_) => Err(SyncError::provider(format!("HTTP {}", status.as_u16()))),
        }
    }
}

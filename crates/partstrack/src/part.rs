//! Core part types for partstrack.
//!
//! This module defines the part record and the carrier-reported tracking data
//! attached to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::StatusLabel;

/// Identifier of a part record.
pub type PartId = i64;

/// Shipment phase as reported by the carrier-tracking provider.
///
/// Unknown phases are preserved verbatim in [`TrackingPhase::Other`] so that
/// nothing the provider says is lost on a round-trip through storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TrackingPhase {
    /// Label created, carrier has not seen the parcel yet.
    Pending,
    /// Carrier has received shipment information.
    InfoReceived,
    /// Parcel is moving through the carrier network.
    InTransit,
    /// Parcel is on the delivery vehicle.
    OutForDelivery,
    /// A delivery attempt failed.
    AttemptFail,
    /// Parcel is waiting at a pickup point.
    AvailableForPickup,
    /// Parcel was delivered.
    Delivered,
    /// Carrier reported a problem (held, returned, damaged).
    Exception,
    /// Tracking number expired without further updates.
    Expired,
    /// Any phase string the provider sends that we don't recognise.
    Other(String),
}

impl TrackingPhase {
    /// Parse a provider phase string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Pending" => Self::Pending,
            "InfoReceived" => Self::InfoReceived,
            "InTransit" => Self::InTransit,
            "OutForDelivery" => Self::OutForDelivery,
            "AttemptFail" => Self::AttemptFail,
            "AvailableForPickup" => Self::AvailableForPickup,
            "Delivered" => Self::Delivered,
            "Exception" => Self::Exception,
            "Expired" => Self::Expired,
            other => Self::Other(other.to_string()),
        }
    }

    /// The provider's wire name for this phase.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::InfoReceived => "InfoReceived",
            Self::InTransit => "InTransit",
            Self::OutForDelivery => "OutForDelivery",
            Self::AttemptFail => "AttemptFail",
            Self::AvailableForPickup => "AvailableForPickup",
            Self::Delivered => "Delivered",
            Self::Exception => "Exception",
            Self::Expired => "Expired",
            Self::Other(raw) => raw,
        }
    }

    /// Human-readable label for display.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::InfoReceived => "Info received",
            Self::InTransit => "In transit",
            Self::OutForDelivery => "Out for delivery",
            Self::AttemptFail => "Delivery attempt failed",
            Self::AvailableForPickup => "Available for pickup",
            Self::Delivered => "Delivered",
            Self::Exception => "Exception",
            Self::Expired => "Expired",
            Self::Other(raw) => raw,
        }
    }

    /// Whether the carrier considers the parcel delivered.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl From<String> for TrackingPhase {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<TrackingPhase> for String {
    fn from(phase: TrackingPhase) -> Self {
        phase.as_str().to_string()
    }
}

impl std::fmt::Display for TrackingPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped tracking event reported by the provider.
///
/// Checkpoints are never edited locally; a sync replaces the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Lifecycle phase at this checkpoint.
    pub tag: TrackingPhase,

    /// Human text describing the event.
    #[serde(default, alias = "subtagMessage", skip_serializing_if = "Option::is_none")]
    pub subtag_message: Option<String>,

    /// Where the event happened, if the carrier reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// When the event happened.
    #[serde(default, alias = "checkpointTime", skip_serializing_if = "Option::is_none")]
    pub checkpoint_time: Option<DateTime<Utc>>,
}

/// A purchased part and its shipment state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// Identifier assigned by the store.
    pub id: PartId,

    /// What the part is.
    pub name: String,

    /// Raw tracking text as the user typed it (may be empty).
    pub tracking: String,

    /// Order lifecycle status.
    pub status: StatusLabel,

    /// Last phase reported by the carrier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_status: Option<TrackingPhase>,

    /// Full checkpoint history from the last successful sync.
    #[serde(default)]
    pub tracking_checkpoints: Vec<Checkpoint>,

    /// When tracking data was last synced from the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_updated_at: Option<DateTime<Utc>>,
}

impl Part {
    /// Create a pending part with no tracking information.
    #[must_use]
    pub fn new(id: PartId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tracking: String::new(),
            status: StatusLabel::Pending,
            tracking_status: None,
            tracking_checkpoints: Vec::new(),
            tracking_updated_at: None,
        }
    }

    /// Whether the part has any tracking text.
    #[must_use]
    pub fn has_tracking(&self) -> bool {
        !self.tracking.trim().is_empty()
    }

    /// Whether the part has reached its terminal status.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.status == StatusLabel::Delivered
    }

    /// Replace the tracking text.
    ///
    /// When the value actually changes, the carrier-reported fields are reset
    /// since they described the previous shipment. Returns `true` if the value
    /// changed.
    pub fn set_tracking(&mut self, tracking: impl Into<String>) -> bool {
        let tracking = tracking.into().trim().to_string();
        if tracking == self.tracking {
            return false;
        }
        self.tracking = tracking;
        self.tracking_status = None;
        self.tracking_checkpoints.clear();
        self.tracking_updated_at = None;
        true
    }
}

/// Fields needed to create a new part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPart {
    /// What the part is.
    pub name: String,
    /// Initial tracking text.
    pub tracking: String,
    /// Initial status.
    pub status: StatusLabel,
}

impl NewPart {
    /// Create a pending part description with the given name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

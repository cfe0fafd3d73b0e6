//! `partstrack` - Shipment tracking for restoration parts
//!
//! This library classifies tracking numbers by carrier, keeps a part's order
//! status in step with its shipment, and syncs carrier checkpoints from an
//! external tracking API without ever losing cached data on failure.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod carrier;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod part;
pub mod refresh;
pub mod status;
pub mod storage;
pub mod sync;
pub mod timeline;
pub mod viewer;

pub use carrier::{classify, CarrierResolver, Classification};
pub use config::Config;
pub use error::{Error, Result, SyncError};
pub use logging::init_logging;
pub use part::{Checkpoint, NewPart, Part, PartId, TrackingPhase};
pub use refresh::{RefreshPolicy, ViewSession};
pub use status::{StatusLabel, TrackingPrompt, TransitionSource};
pub use storage::{MemoryStore, PartStore, Storage};
pub use sync::{HttpTrackingApi, TrackingApi, TrackingSnapshot, TrackingSyncClient};
pub use timeline::Timeline;
pub use viewer::{Notice, NoticeLevel, PartViewer, RefreshOutcome};

//! Order lifecycle status for parts.
//!
//! The authoritative representation is [`StatusLabel`]. The boolean triple in
//! [`StatusFlags`] only exists at the persistence edge, where legacy rows may
//! hold combinations the enum cannot express; [`derive_label`] normalizes
//! them on read and [`apply_label`] produces the canonical triple on write.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::carrier;
use crate::part::Part;

/// The four lifecycle states of a part, in lifecycle order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StatusLabel {
    /// Not yet ordered.
    #[default]
    Pending,
    /// Ordered and paid for.
    Purchased,
    /// Handed to a carrier.
    Shipped,
    /// Received.
    Delivered,
}

impl StatusLabel {
    /// All labels in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Purchased,
        Self::Shipped,
        Self::Delivered,
    ];

    /// The lowercase name of the label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Purchased => "purchased",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
        }
    }
}

impl std::fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StatusLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "purchased" => Ok(Self::Purchased),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            other => Err(format!(
                "unknown status '{other}' (expected pending, purchased, shipped or delivered)"
            )),
        }
    }
}

/// Legacy boolean encoding of a status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusFlags {
    /// Part was purchased.
    pub purchased: bool,
    /// Part was shipped.
    pub shipped: bool,
    /// Part was delivered.
    pub delivered: bool,
}

impl StatusFlags {
    /// Build flags from the three booleans.
    #[must_use]
    pub fn new(purchased: bool, shipped: bool, delivered: bool) -> Self {
        Self {
            purchased,
            shipped,
            delivered,
        }
    }

    /// Whether `delivered => shipped => purchased` holds.
    #[must_use]
    pub fn is_consistent(self) -> bool {
        (!self.delivered || self.shipped) && (!self.shipped || self.purchased)
    }
}

/// Derive the label from legacy flags.
///
/// Precedence is `delivered > shipped > purchased > pending`, so any flag
/// combination maps to exactly one label.
#[must_use]
pub fn derive_label(flags: StatusFlags) -> StatusLabel {
    if flags.delivered {
        StatusLabel::Delivered
    } else if flags.shipped {
        StatusLabel::Shipped
    } else if flags.purchased {
        StatusLabel::Purchased
    } else {
        StatusLabel::Pending
    }
}

/// Encode a label as legacy flags.
#[must_use]
pub fn apply_label(label: StatusLabel) -> StatusFlags {
    match label {
        StatusLabel::Delivered => StatusFlags::new(true, true, true),
        StatusLabel::Shipped => StatusFlags::new(true, true, false),
        StatusLabel::Purchased => StatusFlags::new(true, false, false),
        StatusLabel::Pending => StatusFlags::new(false, false, false),
    }
}

/// Where a status change originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionSource {
    /// The interactive status selector.
    Dropdown,
    /// A bulk import of part rows.
    BulkImport,
    /// A free-text edit of the status field.
    FieldEdit,
}

impl TransitionSource {
    /// Whether moving to `shipped` without tracking must ask for a number.
    #[must_use]
    pub fn requires_tracking_capture(self) -> bool {
        matches!(self, Self::Dropdown)
    }
}

/// Answer from a tracking capture prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResponse {
    /// The user supplied a tracking string.
    Provided(String),
    /// The user chose to continue without one.
    Skipped,
}

/// Collaborator that asks the user for a tracking number.
///
/// Invoked when a part without tracking is moved to `shipped`. The status
/// change is only committed after the prompt answers.
pub trait TrackingPrompt {
    /// Ask for a tracking number for `part`.
    fn request_tracking(&mut self, part: &Part) -> PromptResponse;
}

/// Result of a status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Status before the change.
    pub previous: StatusLabel,
    /// Status after the change.
    pub current: StatusLabel,
    /// Tracking string captured during the change, if any.
    pub captured_tracking: Option<String>,
    /// Whether the captured tracking should be synced right away.
    pub refresh_needed: bool,
}

/// Move `part` to `target`, capturing tracking first when required.
///
/// The part is only modified in memory; the caller persists it afterwards, so
/// the prompt always runs before any flags are written.
pub fn transition(
    part: &mut Part,
    target: StatusLabel,
    source: TransitionSource,
    prompt: &mut dyn TrackingPrompt,
) -> StatusChange {
    let previous = part.status;
    let mut captured_tracking = None;
    let mut refresh_needed = false;

    if target == StatusLabel::Shipped && !part.has_tracking() && source.requires_tracking_capture()
    {
        debug!(part_id = part.id, "Requesting tracking before marking shipped");
        match prompt.request_tracking(part) {
            PromptResponse::Provided(tracking) if !tracking.trim().is_empty() => {
                part.set_tracking(tracking);
                refresh_needed = carrier::classify(&part.tracking).trackable;
                captured_tracking = Some(part.tracking.clone());
            }
            PromptResponse::Provided(_) | PromptResponse::Skipped => {
                debug!(part_id = part.id, "Tracking capture skipped");
            }
        }
    }

    part.status = target;

    StatusChange {
        previous,
        current: target,
        captured_tracking,
        refresh_needed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedPrompt {
        response: PromptResponse,
        calls: usize,
    }

    impl ScriptedPrompt {
        fn new(response: PromptResponse) -> Self {
            Self { response, calls: 0 }
        }
    }

    impl TrackingPrompt for ScriptedPrompt {
        fn request_tracking(&mut self, _part: &Part) -> PromptResponse {
            self.calls += 1;
            self.response.clone()
        }
    }

    #[test]
    fn test_derive_label_precedence() {
        assert_eq!(
            derive_label(StatusFlags::new(true, true, true)),
            StatusLabel::Delivered
        );
        assert_eq!(
            derive_label(StatusFlags::new(true, false, false)),
            StatusLabel::Purchased
        );
        assert_eq!(
            derive_label(StatusFlags::new(true, true, false)),
            StatusLabel::Shipped
        );
        assert_eq!(
            derive_label(StatusFlags::default()),
            StatusLabel::Pending
        );
    }

    #[test]
    fn test_derive_label_tolerates_inconsistent_flags() {
        // delivered without purchased still reads as delivered
        assert_eq!(
            derive_label(StatusFlags::new(false, false, true)),
            StatusLabel::Delivered
        );
        assert_eq!(
            derive_label(StatusFlags::new(false, true, false)),
            StatusLabel::Shipped
        );
    }

    #[test]
    fn test_apply_label_table() {
        assert_eq!(
            apply_label(StatusLabel::Delivered),
            StatusFlags::new(true, true, true)
        );
        assert_eq!(
            apply_label(StatusLabel::Shipped),
            StatusFlags::new(true, true, false)
        );
        assert_eq!(
            apply_label(StatusLabel::Purchased),
            StatusFlags::new(true, false, false)
        );
        assert_eq!(
            apply_label(StatusLabel::Pending),
            StatusFlags::new(false, false, false)
        );
    }

    #[test]
    fn test_apply_then_derive_is_identity() {
        for label in StatusLabel::ALL {
            let flags = apply_label(label);
            assert!(flags.is_consistent());
            assert_eq!(derive_label(flags), label);
        }
    }

    #[test]
    fn test_flags_consistency() {
        assert!(!StatusFlags::new(false, false, true).is_consistent());
        assert!(!StatusFlags::new(false, true, false).is_consistent());
        assert!(StatusFlags::new(true, false, false).is_consistent());
    }

    #[test]
    fn test_label_ordering() {
        assert!(StatusLabel::Pending < StatusLabel::Purchased);
        assert!(StatusLabel::Purchased < StatusLabel::Shipped);
        assert!(StatusLabel::Shipped < StatusLabel::Delivered);
    }

    #[test]
    fn test_label_parse_and_display() {
        assert_eq!("Shipped".parse::<StatusLabel>(), Ok(StatusLabel::Shipped));
        assert_eq!(" delivered ".parse::<StatusLabel>(), Ok(StatusLabel::Delivered));
        assert!("lost".parse::<StatusLabel>().is_err());
        assert_eq!(StatusLabel::Purchased.to_string(), "purchased");
    }

    #[test]
    fn test_label_serde() {
        let json = serde_json::to_string(&StatusLabel::Shipped).unwrap();
        assert_eq!(json, "\"shipped\"");
    }

    #[test]
    fn test_shipped_without_tracking_prompts() {
        let mut part = Part::new(1, "Radiator");
        part.status = StatusLabel::Purchased;
        let mut prompt = ScriptedPrompt::new(PromptResponse::Provided(
            "1Z48537W0440715302".to_string(),
        ));

        let change = transition(
            &mut part,
            StatusLabel::Shipped,
            TransitionSource::Dropdown,
            &mut prompt,
        );

        assert_eq!(prompt.calls, 1);
        assert_eq!(change.previous, StatusLabel::Purchased);
        assert_eq!(change.current, StatusLabel::Shipped);
        assert_eq!(
            change.captured_tracking.as_deref(),
            Some("1Z48537W0440715302")
        );
        assert!(change.refresh_needed);
        assert_eq!(part.tracking, "1Z48537W0440715302");
        assert_eq!(part.status, StatusLabel::Shipped);
    }

    #[test]
    fn test_shipped_with_skipped_prompt_still_ships() {
        let mut part = Part::new(1, "Radiator");
        let mut prompt = ScriptedPrompt::new(PromptResponse::Skipped);

        let change = transition(
            &mut part,
            StatusLabel::Shipped,
            TransitionSource::Dropdown,
            &mut prompt,
        );

        assert_eq!(prompt.calls, 1);
        assert!(change.captured_tracking.is_none());
        assert!(!change.refresh_needed);
        assert_eq!(part.status, StatusLabel::Shipped);
        assert!(part.tracking.is_empty());
    }

    #[test]
    fn test_untrackable_capture_does_not_need_refresh() {
        let mut part = Part::new(1, "Seat covers");
        let mut prompt = ScriptedPrompt::new(PromptResponse::Provided("local pickup".to_string()));

        let change = transition(
            &mut part,
            StatusLabel::Shipped,
            TransitionSource::Dropdown,
            &mut prompt,
        );

        assert_eq!(change.captured_tracking.as_deref(), Some("local pickup"));
        assert!(!change.refresh_needed);
    }

    #[test]
    fn test_shipped_with_existing_tracking_skips_prompt() {
        let mut part = Part::new(1, "Radiator");
        part.tracking = "885304602390".to_string();
        let mut prompt = ScriptedPrompt::new(PromptResponse::Skipped);

        transition(
            &mut part,
            StatusLabel::Shipped,
            TransitionSource::Dropdown,
            &mut prompt,
        );

        assert_eq!(prompt.calls, 0);
    }

    #[test]
    fn test_bulk_import_does_not_prompt() {
        let mut part = Part::new(1, "Radiator");
        let mut prompt = ScriptedPrompt::new(PromptResponse::Skipped);

        transition(
            &mut part,
            StatusLabel::Shipped,
            TransitionSource::BulkImport,
            &mut prompt,
        );
        transition(
            &mut part,
            StatusLabel::Shipped,
            TransitionSource::FieldEdit,
            &mut prompt,
        );

        assert_eq!(prompt.calls, 0);
        assert_eq!(part.status, StatusLabel::Shipped);
    }

    #[test]
    fn test_other_targets_do_not_prompt() {
        let mut part = Part::new(1, "Radiator");
        let mut prompt = ScriptedPrompt::new(PromptResponse::Skipped);

        for target in [StatusLabel::Purchased, StatusLabel::Delivered, StatusLabel::Pending] {
            transition(&mut part, target, TransitionSource::Dropdown, &mut prompt);
        }

        assert_eq!(prompt.calls, 0);
    }
}

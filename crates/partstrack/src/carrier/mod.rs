//! Carrier resolution for tracking text.
//!
//! Turns whatever the user typed into the tracking field into a carrier name,
//! a link the user can follow, and a verdict on whether the external tracking
//! API can say anything useful about it.
//!
//! - **Ordered rules**: literal links, known prefixes (`EX`, `ECSDT`, `1Z`),
//!   digit-count patterns (FedEx, USPS, DHL), free-text carrier keywords, and
//!   finally the text itself as an opaque label.
//!
//! - **Trackability gate**: empty input, links, Amazon references and
//!   letters-only text are never trackable, whatever rule matched.
//!
//! Resolution never fails: unrecognised text degrades to an opaque,
//! non-trackable label.
//!
//! # Example
//!
//! ```
//! use partstrack::carrier::classify;
//!
//! let ups = classify("1Z48537W0440715302");
//! assert_eq!(ups.carrier.as_deref(), Some("UPS"));
//! assert!(ups.trackable);
//!
//! let note = classify("picked up at swap meet");
//! assert!(!note.trackable);
//! ```

mod rules;

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

pub use rules::{builtin_rules, carrier_for_link, keyword_in, CarrierRule, CARRIER_KEYWORDS};

/// What the resolver concluded about a tracking string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Classification {
    /// Carrier name, or the raw text as an opaque label.
    pub carrier: Option<String>,
    /// Link to the carrier's tracking page.
    pub url: Option<String>,
    /// Whether the external tracking API should be queried.
    pub trackable: bool,
}

impl Classification {
    /// Classification for a carrier whose tracking page is built from a template.
    #[must_use]
    pub fn linked(carrier: &str, template: &str, raw: &str) -> Self {
        Self {
            carrier: Some(carrier.to_string()),
            url: Some(template.replace("{}", raw)),
            trackable: true,
        }
    }
}

/// Ordered carrier rule chain.
#[derive(Debug)]
pub struct CarrierResolver {
    rules: Vec<CarrierRule>,
    letters_only: Regex,
}

impl Default for CarrierResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CarrierResolver {
    /// Create a resolver with the built-in rules.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rules(builtin_rules())
    }

    /// Create a resolver with a custom rule chain.
    ///
    /// # Panics
    ///
    /// Never in practice; the letters-only pattern is a fixed valid regex.
    #[must_use]
    pub fn with_rules(rules: Vec<CarrierRule>) -> Self {
        Self {
            rules,
            letters_only: Regex::new(r"^[\p{L}\s]+$").expect("Invalid letters-only regex"),
        }
    }

    /// Names of the rules in evaluation order.
    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.name)
    }

    /// Classify tracking text.
    #[must_use]
    pub fn classify(&self, raw: &str) -> Classification {
        let raw = raw.trim();
        if raw.is_empty() {
            return Classification::default();
        }

        let mut classification = self
            .rules
            .iter()
            .find(|rule| rule.matches(raw))
            .map(|rule| {
                trace!(rule = rule.name, "Carrier rule matched");
                rule.resolve(raw)
            })
            .unwrap_or_else(|| Classification {
                carrier: Some(raw.to_string()),
                url: None,
                trackable: false,
            });

        if classification.trackable && self.is_excluded(raw) {
            trace!("Tracking text excluded from external lookup");
            classification.trackable = false;
        }

        classification
    }

    /// Whether the text may never be sent to the tracking API.
    #[must_use]
    pub fn is_excluded(&self, raw: &str) -> bool {
        let raw = raw.trim();
        if raw.is_empty() {
            return true;
        }
        let lower = raw.to_ascii_lowercase();
        lower.starts_with("http")
            || lower.contains("amazon")
            || lower.contains("amzn")
            || self.letters_only.is_match(raw)
    }
}

/// Classify tracking text with the built-in rules.
#[must_use]
pub fn classify(raw: &str) -> Classification {
    static RESOLVER: OnceLock<CarrierResolver> = OnceLock::new();
    RESOLVER.get_or_init(CarrierResolver::new).classify(raw)
}

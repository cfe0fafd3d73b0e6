//! Built-in carrier rules.
//!
//! Each rule pairs a predicate over the tracking text with a resolver that
//! builds the [`Classification`]. Rules are evaluated strictly in list order
//! and the first predicate that matches wins.

use regex::Regex;

use super::Classification;

/// Keywords recognised in free-text carrier labels, checked in this order.
pub const CARRIER_KEYWORDS: &[&str] = &["UPS", "FEDEX", "USPS", "DHL", "ECMS", "LOCAL"];

type Predicate = Box<dyn Fn(&str) -> bool + Send + Sync>;
type Resolver = Box<dyn Fn(&str) -> Classification + Send + Sync>;

/// A single (predicate, resolver) pair in the carrier chain.
pub struct CarrierRule {
    /// Name of the rule for identification.
    pub name: &'static str,

    predicate: Predicate,
    resolver: Resolver,
}

impl std::fmt::Debug for CarrierRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarrierRule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl CarrierRule {
    /// Create a rule from a predicate and a resolver.
    pub fn new(
        name: &'static str,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
        resolver: impl Fn(&str) -> Classification + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            predicate: Box::new(predicate),
            resolver: Box::new(resolver),
        }
    }

    /// A rule matching a literal prefix and linking to a carrier URL.
    ///
    /// `template` must contain a single `{}` where the tracking text goes.
    #[must_use]
    pub fn prefix(
        name: &'static str,
        prefix: &'static str,
        carrier: &'static str,
        template: &'static str,
    ) -> Self {
        Self::new(
            name,
            move |raw| raw.starts_with(prefix),
            move |raw| Classification::linked(carrier, template, raw),
        )
    }

    /// A rule matching any of the given anchored regexes.
    ///
    /// # Panics
    ///
    /// Panics if a pattern is not a valid regex.
    #[must_use]
    pub fn pattern(
        name: &'static str,
        patterns: &[&str],
        carrier: &'static str,
        template: &'static str,
    ) -> Self {
        let regexes: Vec<Regex> = patterns
            .iter()
            .map(|p| Regex::new(p).expect("Invalid carrier regex"))
            .collect();
        Self::new(
            name,
            move |raw| regexes.iter().any(|r| r.is_match(raw)),
            move |raw| Classification::linked(carrier, template, raw),
        )
    }

    /// Check if the tracking text matches this rule.
    #[must_use]
    pub fn matches(&self, raw: &str) -> bool {
        (self.predicate)(raw)
    }

    /// Build the classification for tracking text this rule matched.
    #[must_use]
    pub fn resolve(&self, raw: &str) -> Classification {
        (self.resolver)(raw)
    }
}

/// Find the carrier keyword contained in a free-text label.
#[must_use]
pub fn keyword_in(raw: &str) -> Option<&'static str> {
    let upper = raw.to_uppercase();
    CARRIER_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| upper.contains(keyword))
}

/// Carrier named by a literal link, if recognisable.
#[must_use]
pub fn carrier_for_link(url: &str) -> Option<&'static str> {
    let lower = url.to_ascii_lowercase();
    if lower.contains("amazon.com") || lower.contains("amzn") {
        Some("Amazon")
    } else if lower.contains("fedex.com") {
        Some("FedEx")
    } else {
        None
    }
}

/// Get all built-in carrier rules in evaluation order.
#[must_use]
pub fn builtin_rules() -> Vec<CarrierRule> {
    vec![
        CarrierRule::new(
            "literal_link",
            |raw| raw.starts_with("http"),
            |raw| Classification {
                carrier: carrier_for_link(raw).map(String::from),
                url: Some(raw.to_string()),
                trackable: false,
            },
        ),
        CarrierRule::prefix(
            "orange_connex",
            "EX",
            "Orange Connex",
            "https://www.orangeconnex.com/tracking?language=en-US&trackingnumber={}",
        ),
        CarrierRule::prefix(
            "ecms",
            "ECSDT",
            "ECMS",
            "https://www.ecmsglobal.com/en-us/tracking.html?orderNumber={}",
        ),
        CarrierRule::prefix(
            "ups",
            "1Z",
            "UPS",
            "https://www.ups.com/track?tracknum={}&loc=en_US&requester=ST/trackdetails",
        ),
        CarrierRule::pattern(
            "fedex",
            &[r"^\d{12,14}$"],
            "FedEx",
            "https://www.fedex.com/fedextrack/?trknbr={}",
        ),
        CarrierRule::pattern(
            "usps",
            &[r"^\d{20,22}$", r"^(94|92|93)\d{20}$"],
            "USPS",
            "https://tools.usps.com/go/TrackConfirmAction?tLabels={}",
        ),
        CarrierRule::pattern(
            "dhl",
            &[r"^\d{10,11}$"],
            "DHL",
            "https://www.dhl.com/us-en/home/tracking/tracking-express.html?submit=1&tracking-id={}",
        ),
        CarrierRule::new(
            "carrier_keyword",
            |raw| keyword_in(raw).is_some(),
            |raw| Classification {
                carrier: keyword_in(raw).map(String::from),
                url: None,
                trackable: false,
            },
        ),
        CarrierRule::new(
            "opaque_label",
            |_| true,
            |raw| Classification {
                carrier: Some(raw.to_string()),
                url: None,
                trackable: false,
            },
        ),
    ]
}

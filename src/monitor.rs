//! Availability monitoring.
//!
//! Classification is fail-closed: a transport failure or an unmatched body
//! is never treated as evidence of availability. Sold-out indicators take
//! precedence over availability indicators regardless of ordering in the
//! body.

use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::drivers::Fetcher;

/// Default sold-out indicators, checked first
const SOLD_OUT_INDICATORS: &[&str] = &[
    "sold out",
    "out of stock",
    "not available",
    "\"availability\":\"sold_out\"",
    "\"in_stock\":false",
    "data-available=\"false\"",
];

/// Default availability indicators
const AVAILABILITY_INDICATORS: &[&str] = &[
    "tickets available",
    "buy now",
    "add to cart",
    "select seats",
    "ticket purchase",
    "\"availability\":\"available\"",
    "\"in_stock\":true",
    "data-available=\"true\"",
];

/// Ordered indicator-set classifier over raw page bodies.
///
/// Independent of any live page so it can be tested against fixture text.
#[derive(Debug, Clone)]
pub struct AvailabilityClassifier {
    sold_out: Vec<String>,
    available: Vec<String>,
    count_pattern: Regex,
}

impl Default for AvailabilityClassifier {
    fn default() -> Self {
        Self::new(
            SOLD_OUT_INDICATORS.iter().map(|s| s.to_string()),
            AVAILABILITY_INDICATORS.iter().map(|s| s.to_string()),
        )
    }
}

impl AvailabilityClassifier {
    pub fn new(
        sold_out: impl IntoIterator<Item = String>,
        available: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            sold_out: sold_out.into_iter().map(|s| s.to_lowercase()).collect(),
            available: available.into_iter().map(|s| s.to_lowercase()).collect(),
            count_pattern: Regex::new(r"(?i)(\d+)\s*tickets?\s*available")
                .expect("static pattern compiles"),
        }
    }

    /// Classify a page body. Order matters: sold-out indicators first (any
    /// match wins unconditionally), then the numeric "N tickets available"
    /// count, then the availability indicators. The count outranks the
    /// indicators because "0 tickets available" contains the "tickets
    /// available" indicator substring.
    pub fn classify(&self, body: &str) -> bool {
        let lower = body.to_lowercase();

        if let Some(hit) = self.sold_out.iter().find(|i| lower.contains(i.as_str())) {
            debug!(indicator = %hit, "Sold-out indicator matched");
            return false;
        }

        if let Some(caps) = self.count_pattern.captures(body) {
            let count: u64 = caps[1].parse().unwrap_or(0);
            debug!(count, "Ticket count pattern matched");
            return count > 0;
        }

        if let Some(hit) = self.available.iter().find(|i| lower.contains(i.as_str())) {
            debug!(indicator = %hit, "Availability indicator matched");
            return true;
        }

        false
    }
}

/// Polls the target page and classifies it as available or not
pub struct TicketMonitor {
    fetcher: Arc<dyn Fetcher>,
    classifier: AvailabilityClassifier,
}

impl TicketMonitor {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            classifier: AvailabilityClassifier::default(),
        }
    }

    pub fn with_classifier(fetcher: Arc<dyn Fetcher>, classifier: AvailabilityClassifier) -> Self {
        Self { fetcher, classifier }
    }

    /// One bounded-time fetch and classification through the given
    /// identity. Transport failures propagate so the caller can decide what
    /// to do with the identity that was used.
    pub async fn probe(&self, target: &str, identity: Option<&str>) -> crate::error::Result<bool> {
        info!(target, "Checking ticket availability");
        let body = self.fetcher.fetch(target, identity).await?;
        Ok(self.classifier.classify(&body))
    }

    /// One bounded-time availability check through the given identity.
    ///
    /// Transport failures yield `false`: a missed window is preferable to a
    /// wasted multi-account attempt.
    pub async fn check_availability(&self, target: &str, identity: Option<&str>) -> bool {
        match self.probe(target, identity).await {
            Ok(available) => available,
            Err(e) => {
                warn!("Monitoring error: {}", e);
                false
            }
        }
    }
}

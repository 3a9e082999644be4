//! Total orderings over [`CombinedMediaType`] candidates.
//!
//! Both orderings return `Ordering::Less` for the *better* candidate, so a
//! plain ascending `sort_by` puts the best candidate first. `slice::sort_by`
//! is stable, which keeps enumeration order among equal candidates.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::combined::CombinedMediaType;

/// Which ordering the method router uses to rank negotiation candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NegotiationOrder {
    /// Distance ascending, then `q * qs` descending.
    #[default]
    Distance,
    /// Combined-type specificity, then `q`, then `qs`, then distance.
    Specificity,
}

impl NegotiationOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "distance" => Some(NegotiationOrder::Distance),
            "specificity" => Some(NegotiationOrder::Specificity),
            _ => None,
        }
    }

    pub fn compare(self, a: &CombinedMediaType, b: &CombinedMediaType) -> Ordering {
        match self {
            NegotiationOrder::Distance => compare(a, b),
            NegotiationOrder::Specificity => compare_specificity_first(a, b),
        }
    }
}

/// Lower distance wins; on a tie the higher `q * qs` product wins.
pub fn compare(a: &CombinedMediaType, b: &CombinedMediaType) -> Ordering {
    a.distance()
        .cmp(&b.distance())
        .then_with(|| b.weight().cmp(&a.weight()))
}

/// More concrete combined type wins (`text/html` < `text/*` < `*/*`), then
/// higher `q`, then higher `qs`, then lower distance.
pub fn compare_specificity_first(a: &CombinedMediaType, b: &CombinedMediaType) -> Ordering {
    a.combined_type()
        .wildcard_rank()
        .cmp(&b.combined_type().wildcard_rank())
        .then_with(|| b.q().cmp(&a.q()))
        .then_with(|| b.qs().cmp(&a.qs()))
        .then_with(|| a.distance().cmp(&b.distance()))
}

/// Stable sort, best candidate first.
pub fn sort_candidates(candidates: &mut [CombinedMediaType], order: NegotiationOrder) {
    candidates.sort_by(|a, b| order.compare(a, b));
}

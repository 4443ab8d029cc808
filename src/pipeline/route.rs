//! Keyword intent routing.
//!
//! Routing operates on the canonical working language (English): online
//! paths translate the query first, offline paths assume it already is.
//! The Tamil keywords stay in the table because translation preserves
//! untranslatable market terms verbatim.
//!
//! The policy is data, not conditionals: an ordered list of
//! (keyword set → collection) rules, checked in order, with the general
//! knowledge collection always appended last.

use super::types::{Collection, Query, RoutingDecision};

/// One intent rule: any keyword matching (case-insensitive substring) routes
/// the query to `target` ahead of the default knowledge collection.
pub struct RoutingRule {
    pub keywords: &'static [&'static str],
    pub target: Collection,
}

const PRICE_KEYWORDS: &[&str] = &[
    "price", "rate", "market", "cost", "deal", "mandi", "விலை", "சந்தை",
];

/// Ordered rule table. Rule order is section order in the assembled context,
/// so live price data precedes static knowledge text.
pub const ROUTING_RULES: &[RoutingRule] = &[RoutingRule {
    keywords: PRICE_KEYWORDS,
    target: Collection::Price,
}];

/// Decide which collections to consult and whether to enrich with live data.
///
/// The knowledge collection is always included (an empty or whitespace-only
/// query still routes there); matched rule targets are placed ahead of it.
/// Enrichment is wanted whenever the request carries a location.
pub fn route(canonical_text: &str, query: &Query) -> RoutingDecision {
    let lower = canonical_text.to_lowercase();

    let mut collections = Vec::with_capacity(ROUTING_RULES.len() + 1);
    for rule in ROUTING_RULES {
        if rule.keywords.iter().any(|k| lower.contains(k)) {
            tracing::debug!(collection = %rule.target, "Intent keyword matched");
            collections.push(rule.target);
        }
    }
    collections.push(Collection::Knowledge);

    RoutingDecision {
        collections,
        needs_enrichment: query.location.is_some(),
    }
}

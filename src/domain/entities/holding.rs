use crate::domain::entities::cache_entry::CacheEntry;
use crate::domain::values::resolution_origin::ResolutionOrigin;
use serde::{Deserialize, Serialize};

/// One security a portfolio intends to hold, as produced by a screening
/// source. The same security may appear once per screen that selected it;
/// deduplication collapses those into one record per ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingRequest {
    pub ticker: String,
    #[serde(default)]
    pub isin: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub target_weight: f64,
}

/// A named screen with its holdings, in the order the screen produced them.
/// Screen order and within-screen order are significant for deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Screen {
    pub name: String,
    pub holdings: Vec<HoldingRequest>,
}

/// Per-run output: the holding plus the cache entry that settles it and a
/// flag for where that entry came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedHolding {
    #[serde(flatten)]
    pub request: HoldingRequest,
    pub resolution: CacheEntry,
    pub origin: ResolutionOrigin,
}

use crate::domain::entities::holding::HoldingRequest;
use crate::domain::values::search_method::SearchMethod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted resolution result for one `(isin, ticker)` key.
///
/// Entries are append-preferred: a fresh search inserts a new timestamped row
/// rather than overwriting the old one, so the table doubles as an audit
/// trail. The store always reads back the most recent non-expired row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub isin: Option<String>,
    pub ticker: String,
    pub name: String,
    pub currency: String,
    pub found: bool,
    pub broker_symbol: Option<String>,
    pub contract_id: Option<i64>,
    pub search_method: Option<SearchMethod>,
    pub search_timestamp: DateTime<Utc>,
    pub raw_details: Option<serde_json::Value>,
}

impl CacheEntry {
    /// A positive resolution carrying the broker contract.
    pub fn found(
        request: &HoldingRequest,
        method: SearchMethod,
        broker_symbol: String,
        contract_id: i64,
        raw_details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            isin: request.isin.clone(),
            ticker: request.ticker.clone(),
            name: request.name.clone(),
            currency: request.currency.clone(),
            found: true,
            broker_symbol: Some(broker_symbol),
            contract_id: Some(contract_id),
            search_method: Some(method),
            search_timestamp: Utc::now(),
            raw_details,
        }
    }

    /// A definitive "not found" after exhausting the strategy cascade, or a
    /// placeholder when no search was attempted (`method` = None).
    pub fn not_found(request: &HoldingRequest, method: Option<SearchMethod>) -> Self {
        Self {
            isin: request.isin.clone(),
            ticker: request.ticker.clone(),
            name: request.name.clone(),
            currency: request.currency.clone(),
            found: false,
            broker_symbol: None,
            contract_id: None,
            search_method: method,
            search_timestamp: Utc::now(),
            raw_details: None,
        }
    }

    /// Semantic validity, independent of age. A `found = true` row without a
    /// non-zero contract id is corrupt and must read as a miss; a
    /// `found = false` row is valid by presence alone.
    pub fn is_valid(&self) -> bool {
        if !self.found {
            return true;
        }
        matches!(self.contract_id, Some(id) if id != 0)
    }
}

use crate::domain::entities::cache_entry::CacheEntry;
use crate::domain::entities::holding::HoldingRequest;
use crate::domain::error::DomainError;
use chrono::Duration;
use serde::Serialize;

/// Aggregate counts over the cache table, for the `cache-stats` command.
#[derive(Debug, Serialize)]
pub struct CacheStats {
    pub total_rows: usize,
    pub found_rows: usize,
    pub not_found_rows: usize,
    pub distinct_keys: usize,
}

/// Persistent store of prior resolution results, keyed by `(isin, ticker)`
/// with timestamped history.
///
/// `lookup` never raises into the caller's critical path: storage errors
/// degrade to a miss so the run re-searches instead of aborting. `record`
/// failures are logged and swallowed by the caller; a lost write only costs
/// a future redundant search.
pub trait ResolutionCache: Send + Sync {
    /// Most recent entry for the key not older than `max_age`, passing the
    /// semantic validity check. "No data" and "invalid data" both read as
    /// `None`; the refresh path is the same either way.
    fn lookup(&self, isin: Option<&str>, ticker: &str, max_age: Duration) -> Option<CacheEntry>;

    /// Append a new row. Never mutates existing rows.
    fn record(&self, entry: &CacheEntry) -> Result<(), DomainError>;

    fn stats(&self) -> Result<CacheStats, DomainError>;

    /// Split requests into cache hits and misses, preserving input order in
    /// both halves.
    fn bulk_partition(
        &self,
        requests: &[HoldingRequest],
        max_age: Duration,
    ) -> (Vec<(HoldingRequest, CacheEntry)>, Vec<HoldingRequest>) {
        let mut hits = Vec::new();
        let mut misses = Vec::new();
        for request in requests {
            match self.lookup(request.isin.as_deref(), &request.ticker, max_age) {
                Some(entry) => hits.push((request.clone(), entry)),
                None => misses.push(request.clone()),
            }
        }
        (hits, misses)
    }
}

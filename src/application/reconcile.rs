use crate::application::deduplicate::deduplicate;
use crate::application::search::{SearchConfig, SearchDriver};
use crate::domain::entities::cache_entry::CacheEntry;
use crate::domain::entities::holding::{ResolvedHolding, Screen};
use crate::domain::ports::broker_search::BrokerSearch;
use crate::domain::ports::resolution_cache::ResolutionCache;
use crate::domain::values::resolution_origin::ResolutionOrigin;
use crate::domain::values::search_method::SearchMethod;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Knobs for one reconciliation run.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Cache entries older than this read as misses.
    pub cache_max_age: chrono::Duration,
    /// Optional wall-clock budget for the whole run. Once exceeded, remaining
    /// misses are emitted as not-found without searching.
    pub run_deadline: Option<Duration>,
    pub search: SearchConfig,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            cache_max_age: chrono::Duration::days(365),
            run_deadline: None,
            search: SearchConfig::default(),
        }
    }
}

/// Aggregate coverage for one run.
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub found_by_identifier: usize,
    pub found_by_ticker: usize,
    pub found_by_name: usize,
    pub not_found: usize,
    pub cache_hits: usize,
    pub live_searches: usize,
    pub unresolved: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ReconcileReport {
    pub run_id: String,
    pub resolved: Vec<ResolvedHolding>,
    pub stats: Statistics,
    pub errors: Vec<String>,
}

/// Coordinates one reconciliation run: dedup, cache partition, live search
/// for the misses, cache write-back, and the assembled output with stats.
pub struct ReconcileUseCase {
    cache: Arc<dyn ResolutionCache>,
    broker: Arc<dyn BrokerSearch>,
}

impl ReconcileUseCase {
    pub fn new(cache: Arc<dyn ResolutionCache>, broker: Arc<dyn BrokerSearch>) -> Self {
        Self { cache, broker }
    }

    /// Run the full pipeline. Never fails outright: every surviving holding
    /// appears exactly once in the output, tagged with how it was settled,
    /// and per-holding failures never block the rest of the run.
    pub async fn execute(&self, screens: &[Screen], config: &ReconcileConfig) -> ReconcileReport {
        let started = Instant::now();
        let deduped = deduplicate(screens);
        let (hits, misses) = self.cache.bulk_partition(&deduped, config.cache_max_age);
        info!(
            total = deduped.len(),
            cache_hits = hits.len(),
            misses = misses.len(),
            "cache partition complete"
        );

        let mut outcomes: HashMap<String, (CacheEntry, ResolutionOrigin)> = HashMap::new();
        for (request, entry) in hits {
            outcomes.insert(request.ticker, (entry, ResolutionOrigin::Cache));
        }

        let driver = SearchDriver::new(self.broker.clone(), config.search);
        let mut errors = Vec::new();
        let mut live_searches = 0usize;
        let mut connection_lost = false;

        for request in &misses {
            if connection_lost {
                outcomes.insert(
                    request.ticker.clone(),
                    (CacheEntry::not_found(request, None), ResolutionOrigin::Unresolved),
                );
                continue;
            }
            if let Some(budget) = config.run_deadline {
                if started.elapsed() >= budget {
                    // Skipped, not searched: no cache write, so the next run
                    // with time to spare picks these up.
                    warn!(ticker = %request.ticker, "run deadline exceeded, emitting as not found");
                    outcomes.insert(
                        request.ticker.clone(),
                        (CacheEntry::not_found(request, None), ResolutionOrigin::LiveSearch),
                    );
                    continue;
                }
            }

            match driver.resolve(request).await {
                Ok(entry) => {
                    live_searches += 1;
                    if let Err(e) = self.cache.record(&entry) {
                        warn!(ticker = %request.ticker, error = %e, "cache write failed");
                        errors.push(format!("cache write failed for {}: {e}", request.ticker));
                    }
                    outcomes.insert(request.ticker.clone(), (entry, ResolutionOrigin::LiveSearch));
                }
                Err(e) => {
                    warn!(ticker = %request.ticker, error = %e, "broker session lost, stopping searches");
                    errors.push(format!("connection lost while resolving {}: {e}", request.ticker));
                    connection_lost = true;
                    outcomes.insert(
                        request.ticker.clone(),
                        (CacheEntry::not_found(request, None), ResolutionOrigin::Unresolved),
                    );
                }
            }
        }

        let mut resolved = Vec::with_capacity(deduped.len());
        for request in deduped {
            if let Some((entry, origin)) = outcomes.remove(&request.ticker) {
                resolved.push(ResolvedHolding {
                    request,
                    resolution: entry,
                    origin,
                });
            }
        }

        let stats = compute_stats(&resolved, live_searches, started.elapsed());
        ReconcileReport {
            run_id: uuid::Uuid::new_v4().to_string(),
            resolved,
            stats,
            errors,
        }
    }
}

fn compute_stats(resolved: &[ResolvedHolding], live_searches: usize, elapsed: Duration) -> Statistics {
    let mut stats = Statistics {
        total: resolved.len(),
        found_by_identifier: 0,
        found_by_ticker: 0,
        found_by_name: 0,
        not_found: 0,
        cache_hits: 0,
        live_searches,
        unresolved: 0,
        elapsed_ms: elapsed.as_millis() as u64,
    };

    for holding in resolved {
        match holding.origin {
            ResolutionOrigin::Cache => stats.cache_hits += 1,
            ResolutionOrigin::LiveSearch => {}
            ResolutionOrigin::Unresolved => {
                stats.unresolved += 1;
                continue;
            }
        }
        if holding.resolution.found {
            match holding.resolution.search_method {
                Some(SearchMethod::Identifier) => stats.found_by_identifier += 1,
                Some(SearchMethod::Ticker) => stats.found_by_ticker += 1,
                Some(SearchMethod::Name) => stats.found_by_name += 1,
                None => {}
            }
        } else {
            stats.not_found += 1;
        }
    }
    stats
}

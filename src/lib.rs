pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

use crate::application::reconcile::{ReconcileConfig, ReconcileReport, ReconcileUseCase};
use crate::application::search::{SearchConfig, SearchDriver};
use crate::domain::entities::cache_entry::CacheEntry;
use crate::domain::entities::holding::{HoldingRequest, Screen};
use crate::domain::error::DomainError;
use crate::domain::ports::broker_search::BrokerSearch;
use crate::domain::ports::resolution_cache::{CacheStats, ResolutionCache};
use crate::infrastructure::broker::gateway::IbkrGateway;
use crate::infrastructure::sqlite::cache_repo::SqliteResolutionCache;
use crate::infrastructure::sqlite::migrations::run_migrations;
use rusqlite::Connection;
use std::sync::Arc;

pub struct BrokerMatch {
    cache: Arc<dyn ResolutionCache>,
    broker: Arc<dyn BrokerSearch>,
    reconcile_uc: ReconcileUseCase,
}

impl BrokerMatch {
    pub fn new(db_path: &str) -> Result<Self, DomainError> {
        let gateway_url = std::env::var("BROKERMATCH_GATEWAY_URL")
            .unwrap_or_else(|_| "https://localhost:5000".into());
        Self::with_providers(db_path, Arc::new(IbkrGateway::new(gateway_url)))
    }

    pub fn with_providers(
        db_path: &str,
        broker: Arc<dyn BrokerSearch>,
    ) -> Result<Self, DomainError> {
        let conn = Connection::open(db_path)
            .map_err(|e| DomainError::Database(format!("DB error: {e}")))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| DomainError::Database(format!("WAL error: {e}")))?;
        run_migrations(&conn)?;

        let cache: Arc<dyn ResolutionCache> = Arc::new(SqliteResolutionCache::new(conn));

        Ok(Self {
            cache: cache.clone(),
            broker: broker.clone(),
            reconcile_uc: ReconcileUseCase::new(cache, broker),
        })
    }

    /// Full reconciliation run: dedup, cache partition, live search, write
    /// back, assembled report.
    pub async fn reconcile(&self, screens: &[Screen], config: &ReconcileConfig) -> ReconcileReport {
        self.reconcile_uc.execute(screens, config).await
    }

    /// Live-search one holding, bypassing the cache read but recording the
    /// result like a normal run would.
    pub async fn resolve_one(
        &self,
        request: &HoldingRequest,
        config: SearchConfig,
    ) -> Result<CacheEntry, DomainError> {
        let driver = SearchDriver::new(self.broker.clone(), config);
        let entry = driver
            .resolve(request)
            .await
            .map_err(|e| DomainError::Broker(e.to_string()))?;
        if let Err(e) = self.cache.record(&entry) {
            tracing::warn!(ticker = %request.ticker, error = %e, "cache write failed");
        }
        Ok(entry)
    }

    pub fn cache_lookup(
        &self,
        isin: Option<&str>,
        ticker: &str,
        max_age: chrono::Duration,
    ) -> Option<CacheEntry> {
        self.cache.lookup(isin, ticker, max_age)
    }

    pub fn cache_stats(&self) -> Result<CacheStats, DomainError> {
        self.cache.stats()
    }
}

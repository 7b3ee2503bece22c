use crate::domain::entities::cache_entry::CacheEntry;
use crate::domain::error::DomainError;
use crate::domain::ports::resolution_cache::{CacheStats, ResolutionCache};
use crate::domain::values::search_method::SearchMethod;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Mutex;
use tracing::warn;

/// Append-only SQLite cache of resolution results.
///
/// Reads degrade to a miss on any storage error so a broken cache never
/// blocks a reconciliation run; the worst case is a redundant live search.
pub struct SqliteResolutionCache {
    conn: Mutex<Connection>,
}

impl SqliteResolutionCache {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn row_to_entry(row: &rusqlite::Row) -> Result<CacheEntry, rusqlite::Error> {
        let isin: String = row.get(0)?;
        let method_str: Option<String> = row.get(7)?;
        let ts_str: String = row.get(8)?;
        let raw_str: Option<String> = row.get(9)?;

        Ok(CacheEntry {
            isin: if isin.is_empty() { None } else { Some(isin) },
            ticker: row.get(1)?,
            name: row.get(2)?,
            currency: row.get(3)?,
            found: row.get::<_, i64>(4)? != 0,
            broker_symbol: row.get(5)?,
            contract_id: row.get(6)?,
            search_method: method_str.and_then(|s| s.parse::<SearchMethod>().ok()),
            search_timestamp: DateTime::parse_from_rfc3339(&ts_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            raw_details: raw_str.and_then(|s| serde_json::from_str(&s).ok()),
        })
    }

    fn lookup_inner(
        &self,
        isin: Option<&str>,
        ticker: &str,
        max_age: Duration,
    ) -> Result<Option<CacheEntry>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let cutoff = (Utc::now() - max_age).to_rfc3339();
        let mut stmt = conn
            .prepare(
                "SELECT isin, ticker, name, currency, found, broker_symbol, contract_id,
                        search_method, search_timestamp, raw_details
                 FROM instrument_cache
                 WHERE isin = ?1 AND ticker = ?2 AND search_timestamp >= ?3
                 ORDER BY search_timestamp DESC
                 LIMIT 1",
            )
            .map_err(|e| DomainError::Database(e.to_string()))?;
        stmt.query_row(
            params![isin.unwrap_or(""), ticker, cutoff],
            Self::row_to_entry,
        )
        .optional()
        .map_err(|e| DomainError::Database(e.to_string()))
    }
}

impl ResolutionCache for SqliteResolutionCache {
    fn lookup(&self, isin: Option<&str>, ticker: &str, max_age: Duration) -> Option<CacheEntry> {
        let entry = match self.lookup_inner(isin, ticker, max_age) {
            Ok(entry) => entry?,
            Err(e) => {
                warn!(ticker, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };
        // A found row without a usable contract id is corrupt; read it as a
        // miss so the caller re-searches. Live searches always stamp a method
        // on found entries, so a method-less found row is corrupt too.
        if !entry.is_valid() {
            warn!(ticker, "corrupt cache entry (found without contract id), treating as miss");
            return None;
        }
        if entry.found && entry.search_method.is_none() {
            warn!(ticker, "corrupt cache entry (found without search method), treating as miss");
            return None;
        }
        Some(entry)
    }

    fn record(&self, entry: &CacheEntry) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO instrument_cache
                 (id, isin, ticker, name, currency, found, broker_symbol, contract_id,
                  search_method, search_timestamp, raw_details)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                uuid::Uuid::new_v4().to_string(),
                entry.isin.as_deref().unwrap_or(""),
                entry.ticker,
                entry.name,
                entry.currency,
                entry.found as i64,
                entry.broker_symbol,
                entry.contract_id,
                entry.search_method.map(|m| m.to_string()),
                entry.search_timestamp.to_rfc3339(),
                entry
                    .raw_details
                    .as_ref()
                    .map(|v| v.to_string()),
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to record cache entry: {e}")))?;
        Ok(())
    }

    fn stats(&self) -> Result<CacheStats, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let (total_rows, found_rows): (i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(found), 0) FROM instrument_cache",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let distinct_keys: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM (SELECT DISTINCT isin, ticker FROM instrument_cache)",
                [],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(CacheStats {
            total_rows: total_rows as usize,
            found_rows: found_rows as usize,
            not_found_rows: (total_rows - found_rows) as usize,
            distinct_keys: distinct_keys as usize,
        })
    }
}

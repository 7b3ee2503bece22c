use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS instrument_cache (
            id TEXT PRIMARY KEY,
            isin TEXT NOT NULL DEFAULT '',
            ticker TEXT NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            currency TEXT NOT NULL DEFAULT '',
            found INTEGER NOT NULL,
            broker_symbol TEXT,
            contract_id INTEGER,
            search_method TEXT,
            search_timestamp TEXT NOT NULL,
            raw_details TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_cache_key ON instrument_cache(isin, ticker);
        CREATE INDEX IF NOT EXISTS idx_cache_timestamp ON instrument_cache(search_timestamp);
        "
    ).map_err(|e| format!("Migration failed: {e}"))
}

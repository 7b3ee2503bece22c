use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "brokermatch",
    about = "Reconcile target holdings against a broker's tradable-instrument catalog"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile a screens file against the broker catalog
    Reconcile {
        /// Path to a screens JSON file (screen name -> holdings, or a list of
        /// {name, holdings} objects when screen order matters)
        screens: String,
        /// Cache entries older than this count as misses
        #[arg(long, default_value = "365")]
        max_age_days: i64,
        /// Optional wall-clock budget for the whole run, in seconds
        #[arg(long)]
        deadline_secs: Option<u64>,
        /// Per external call timeout, in seconds
        #[arg(long, default_value = "4")]
        call_timeout_secs: u64,
        /// Whole-sweep timeout per holding, in seconds
        #[arg(long, default_value = "18")]
        sweep_timeout_secs: u64,
    },
    /// Live-search a single holding (JSON with ticker, isin, name, currency)
    Resolve {
        json: String,
        #[arg(long, default_value = "4")]
        call_timeout_secs: u64,
        #[arg(long, default_value = "18")]
        sweep_timeout_secs: u64,
    },
    /// Show the freshest valid cache entry for a key
    CacheLookup {
        ticker: String,
        #[arg(long)]
        isin: Option<String>,
        #[arg(long, default_value = "365")]
        max_age_days: i64,
    },
    /// Show cache table statistics
    CacheStats,
}

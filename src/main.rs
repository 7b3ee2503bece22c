use brokermatch::application::reconcile::ReconcileConfig;
use brokermatch::application::search::SearchConfig;
use brokermatch::cli::commands::{Cli, Commands};
use brokermatch::domain::entities::holding::{HoldingRequest, Screen};
use brokermatch::BrokerMatch;
use clap::Parser;
use std::collections::BTreeMap;
use std::time::Duration;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let db_path = std::env::var("BROKERMATCH_DB").unwrap_or_else(|_| "./brokermatch.db".into());

    let bm = match BrokerMatch::new(&db_path) {
        Ok(bm) => bm,
        Err(e) => {
            eprintln!("Error initializing brokermatch: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_command(bm, cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_command(bm: BrokerMatch, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Reconcile {
            screens,
            max_age_days,
            deadline_secs,
            call_timeout_secs,
            sweep_timeout_secs,
        } => {
            let text = std::fs::read_to_string(&screens)?;
            let screens = parse_screens(&text)?;
            let config = ReconcileConfig {
                cache_max_age: chrono::Duration::days(max_age_days),
                run_deadline: deadline_secs.map(Duration::from_secs),
                search: SearchConfig {
                    per_call_timeout: Duration::from_secs(call_timeout_secs),
                    overall_timeout: Duration::from_secs(sweep_timeout_secs),
                },
            };
            let report = bm.reconcile(&screens, &config).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Resolve {
            json,
            call_timeout_secs,
            sweep_timeout_secs,
        } => {
            let request: HoldingRequest = serde_json::from_str(&json)?;
            let config = SearchConfig {
                per_call_timeout: Duration::from_secs(call_timeout_secs),
                overall_timeout: Duration::from_secs(sweep_timeout_secs),
            };
            let entry = bm.resolve_one(&request, config).await?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        Commands::CacheLookup {
            ticker,
            isin,
            max_age_days,
        } => match bm.cache_lookup(isin.as_deref(), &ticker, chrono::Duration::days(max_age_days)) {
            Some(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
            None => println!("null"),
        },
        Commands::CacheStats => {
            let stats = bm.cache_stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}

/// Screens arrive either as an ordered list of {name, holdings} objects or as
/// a plain name -> holdings map. JSON objects carry no reliable key order
/// through serde, so the map form is sorted by screen name to keep dedup
/// deterministic.
fn parse_screens(text: &str) -> Result<Vec<Screen>, serde_json::Error> {
    if let Ok(ordered) = serde_json::from_str::<Vec<Screen>>(text) {
        return Ok(ordered);
    }
    let map: BTreeMap<String, Vec<HoldingRequest>> = serde_json::from_str(text)?;
    Ok(map
        .into_iter()
        .map(|(name, holdings)| Screen { name, holdings })
        .collect())
}

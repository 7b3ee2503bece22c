//! Fallback cascade behavior: strategy ordering, candidate sweep, timeouts.

mod common;

use brokermatch::application::search::{SearchConfig, SearchDriver};
use brokermatch::domain::values::search_method::SearchMethod;
use common::{candidate, holding, Call, ScriptedBroker};
use std::sync::Arc;
use std::time::Duration;

fn driver(broker: Arc<ScriptedBroker>) -> SearchDriver {
    SearchDriver::new(broker, SearchConfig::default())
}

#[tokio::test]
async fn test_identifier_hit_makes_exactly_one_call() {
    let broker = Arc::new(
        ScriptedBroker::new()
            .with_identifier("US0378331005", vec![candidate("AAPL", "USD", "NASDAQ", 265598)]),
    );
    let request = holding("AAPL", Some("US0378331005"), "USD", 10.0);

    let entry = driver(broker.clone()).resolve(&request).await.unwrap();

    assert!(entry.found);
    assert_eq!(entry.search_method, Some(SearchMethod::Identifier));
    assert_eq!(entry.contract_id, Some(265598));
    assert_eq!(broker.call_count(), 1);
    assert_eq!(broker.calls()[0], Call::Identifier("US0378331005".into()));
}

#[tokio::test]
async fn test_share_class_ticker_found_on_fourth_candidate() {
    // ROCKA/DKK, no isin: first three variants miss, the smart-routed
    // hyphenated spelling hits.
    let broker = Arc::new(
        ScriptedBroker::new().with_symbol(
            "ROCK-A",
            "DKK",
            "SMART",
            vec![candidate("ROCK-A", "DKK", "CPH", 98765)],
        ),
    );
    let request = holding("ROCKA", None, "DKK", 3.0);

    let entry = driver(broker.clone()).resolve(&request).await.unwrap();

    assert!(entry.found);
    assert_eq!(entry.search_method, Some(SearchMethod::Ticker));
    assert_eq!(entry.contract_id, Some(98765));
    assert_eq!(broker.call_count(), 4);
    assert_eq!(
        broker.calls()[3],
        Call::Symbol {
            ticker: "ROCK-A".into(),
            currency: "DKK".into(),
            exchange: "SMART".into(),
        }
    );
}

#[tokio::test]
async fn test_name_strategy_is_the_last_resort() {
    let broker = Arc::new(
        ScriptedBroker::new().with_name("NOVO Co", vec![candidate("NOVO-B", "DKK", "CPH", 1111)]),
    );
    let request = holding("NOVO", None, "DKK", 1.0);

    let entry = driver(broker.clone()).resolve(&request).await.unwrap();

    assert!(entry.found);
    assert_eq!(entry.search_method, Some(SearchMethod::Name));
    let calls = broker.calls();
    assert_eq!(calls.last(), Some(&Call::Name("NOVO Co".into())));
    assert!(calls[..calls.len() - 1]
        .iter()
        .all(|c| matches!(c, Call::Symbol { .. })));
}

#[tokio::test]
async fn test_exhausted_search_returns_not_found_with_last_method() {
    let broker = Arc::new(ScriptedBroker::new());
    let request = holding("ZZZZ", Some("US0000000009"), "USD", 1.0);

    let entry = driver(broker.clone()).resolve(&request).await.unwrap();

    assert!(!entry.found);
    assert!(entry.contract_id.is_none());
    assert_eq!(entry.search_method, Some(SearchMethod::Name));
    // identifier, every ticker variant, then name.
    assert!(broker.call_count() >= 3);
}

#[tokio::test]
async fn test_currency_match_breaks_multi_match_ties() {
    let broker = Arc::new(ScriptedBroker::new().with_symbol(
        "SHEL",
        "GBP",
        "LSE",
        vec![
            candidate("SHEL", "USD", "NYSE", 100),
            candidate("SHEL", "GBP", "LSE", 200),
        ],
    ));
    let request = holding("SHEL", None, "GBP", 2.0);

    let entry = driver(broker).resolve(&request).await.unwrap();
    assert_eq!(entry.contract_id, Some(200));
}

#[tokio::test]
async fn test_timed_out_candidate_is_skipped_not_retried() {
    let broker = Arc::new(
        ScriptedBroker::new()
            .with_slow_symbol("SLOW", Duration::from_millis(200))
            .with_symbol("SLOW", "USD", "SMART", vec![candidate("SLOW", "USD", "NYSE", 42)]),
    );
    let config = SearchConfig {
        per_call_timeout: Duration::from_millis(20),
        overall_timeout: Duration::from_secs(5),
    };
    let request = holding("SLOW", None, "USD", 1.0);

    // The NYSE attempt for SLOW times out; the SMART attempt would hit, but
    // it is the same slow ticker, so it times out too and the driver falls
    // through to name with no scripted match.
    let entry = SearchDriver::new(broker.clone(), config)
        .resolve(&request)
        .await
        .unwrap();

    assert!(!entry.found);
    let slow_calls = broker
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::Symbol { ticker, .. } if ticker == "SLOW"))
        .count();
    assert_eq!(slow_calls, 2, "each candidate tried once, never retried");
}

#[tokio::test]
async fn test_connection_loss_propagates_as_error() {
    let broker = Arc::new(ScriptedBroker::new().failing_from_call(0));
    let request = holding("AAPL", Some("US0378331005"), "USD", 1.0);

    let result = driver(broker).resolve(&request).await;
    assert!(result.is_err());
    assert!(result.unwrap_err().is_fatal());
}

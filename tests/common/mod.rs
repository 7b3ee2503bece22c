//! Shared test helpers: a scripted broker double and entity builders.
#![allow(dead_code)]

use async_trait::async_trait;
use brokermatch::domain::entities::holding::{HoldingRequest, Screen};
use brokermatch::domain::ports::broker_search::{BrokerError, BrokerSearch, MatchCandidate};
use brokermatch::BrokerMatch;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded external call, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Identifier(String),
    Symbol {
        ticker: String,
        currency: String,
        exchange: String,
    },
    Name(String),
}

/// Broker double with scripted responses and a call log. Unscripted queries
/// return an empty match list.
#[derive(Default)]
pub struct ScriptedBroker {
    identifier_results: HashMap<String, Vec<MatchCandidate>>,
    symbol_results: HashMap<(String, String, String), Vec<MatchCandidate>>,
    name_results: HashMap<String, Vec<MatchCandidate>>,
    /// Symbol queries for these tickers sleep before answering.
    slow_symbols: HashMap<String, Duration>,
    /// Calls at or past this zero-based index report a lost connection.
    fail_from: Option<usize>,
    calls: Mutex<Vec<Call>>,
    call_count: AtomicUsize,
}

impl ScriptedBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identifier(mut self, isin: &str, matches: Vec<MatchCandidate>) -> Self {
        self.identifier_results.insert(isin.to_string(), matches);
        self
    }

    pub fn with_symbol(
        mut self,
        ticker: &str,
        currency: &str,
        exchange: &str,
        matches: Vec<MatchCandidate>,
    ) -> Self {
        self.symbol_results.insert(
            (ticker.to_string(), currency.to_string(), exchange.to_string()),
            matches,
        );
        self
    }

    pub fn with_name(mut self, name: &str, matches: Vec<MatchCandidate>) -> Self {
        self.name_results.insert(name.to_string(), matches);
        self
    }

    pub fn with_slow_symbol(mut self, ticker: &str, delay: Duration) -> Self {
        self.slow_symbols.insert(ticker.to_string(), delay);
        self
    }

    pub fn failing_from_call(mut self, index: usize) -> Self {
        self.fail_from = Some(index);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn register(&self, call: Call) -> Result<(), BrokerError> {
        let index = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(call);
        if let Some(fail_from) = self.fail_from {
            if index >= fail_from {
                return Err(BrokerError::ConnectionLost("scripted drop".into()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BrokerSearch for ScriptedBroker {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search_by_identifier(&self, isin: &str) -> Result<Vec<MatchCandidate>, BrokerError> {
        self.register(Call::Identifier(isin.to_string()))?;
        Ok(self.identifier_results.get(isin).cloned().unwrap_or_default())
    }

    async fn search_by_symbol(
        &self,
        ticker: &str,
        currency: &str,
        exchange: &str,
    ) -> Result<Vec<MatchCandidate>, BrokerError> {
        self.register(Call::Symbol {
            ticker: ticker.to_string(),
            currency: currency.to_string(),
            exchange: exchange.to_string(),
        })?;
        if let Some(delay) = self.slow_symbols.get(ticker) {
            tokio::time::sleep(*delay).await;
        }
        Ok(self
            .symbol_results
            .get(&(ticker.to_string(), currency.to_string(), exchange.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn search_by_name(&self, name: &str) -> Result<Vec<MatchCandidate>, BrokerError> {
        self.register(Call::Name(name.to_string()))?;
        Ok(self.name_results.get(name).cloned().unwrap_or_default())
    }
}

pub fn setup(broker: Arc<ScriptedBroker>) -> BrokerMatch {
    BrokerMatch::with_providers(":memory:", broker).unwrap()
}

pub fn candidate(symbol: &str, currency: &str, exchange: &str, contract_id: i64) -> MatchCandidate {
    MatchCandidate {
        symbol: symbol.to_string(),
        long_name: format!("{symbol} Inc"),
        currency: currency.to_string(),
        exchange: exchange.to_string(),
        contract_id,
    }
}

pub fn holding(ticker: &str, isin: Option<&str>, currency: &str, quantity: f64) -> HoldingRequest {
    HoldingRequest {
        ticker: ticker.to_string(),
        isin: isin.map(String::from),
        name: format!("{ticker} Co"),
        currency: currency.to_string(),
        sector: None,
        country: None,
        quantity,
        target_weight: 0.01,
    }
}

pub fn screen(name: &str, holdings: Vec<HoldingRequest>) -> Screen {
    Screen {
        name: name.to_string(),
        holdings,
    }
}

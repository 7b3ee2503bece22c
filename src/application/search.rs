use crate::domain::entities::cache_entry::CacheEntry;
use crate::domain::entities::holding::HoldingRequest;
use crate::domain::ports::broker_search::{BrokerError, BrokerSearch, MatchCandidate};
use crate::domain::values::search_method::SearchMethod;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Timeouts bounding the fallback cascade. The per-call timeout covers one
/// external lookup; the overall timeout bounds the whole multi-variant sweep
/// for one holding.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub per_call_timeout: Duration,
    pub overall_timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            per_call_timeout: Duration::from_secs(4),
            overall_timeout: Duration::from_secs(18),
        }
    }
}

/// One ticker-variant lookup to try against the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolQuery {
    pub ticker: String,
    pub currency: String,
    pub exchange: String,
}

/// Drives the ordered lookup cascade for one unresolved holding:
/// identifier, then ticker variants across venues, then company name.
///
/// Ticker formats diverge across data providers and exchanges (share-class
/// separators, country suffixes, currency-implied venues), so a single direct
/// lookup has a high false-negative rate. The cascade is deterministic: every
/// resolution is attributable to exactly one (strategy, candidate) pair.
pub struct SearchDriver {
    broker: Arc<dyn BrokerSearch>,
    config: SearchConfig,
}

impl SearchDriver {
    pub fn new(broker: Arc<dyn BrokerSearch>, config: SearchConfig) -> Self {
        Self { broker, config }
    }

    /// Resolve one holding. Both found and exhausted-not-found outcomes are
    /// `Ok`; only a fatal connection loss propagates as `Err`. Transient
    /// failures (timeout, connectivity) advance the cascade.
    pub async fn resolve(&self, request: &HoldingRequest) -> Result<CacheEntry, BrokerError> {
        let deadline = Instant::now() + self.config.overall_timeout;
        let mut last_method = None;

        if let Some(isin) = request.isin.as_deref().filter(|s| !s.is_empty()) {
            last_method = Some(SearchMethod::Identifier);
            match self.timed(self.broker.search_by_identifier(isin)).await {
                Ok(matches) if !matches.is_empty() => {
                    let best = pick_match(&matches, &request.currency);
                    return Ok(self.entry_from(
                        request,
                        SearchMethod::Identifier,
                        best,
                        serde_json::json!({ "isin": isin, "matches": matches.len() }),
                    ));
                }
                Ok(_) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => debug!(ticker = %request.ticker, error = %e, "identifier search failed"),
            }
        }

        for query in symbol_candidates(&request.ticker, &request.currency) {
            // A blown sweep budget skips the remaining variants; the name
            // strategy below still gets its one attempt.
            if Instant::now() >= deadline {
                debug!(ticker = %request.ticker, "sweep deadline hit, skipping remaining variants");
                break;
            }
            last_method = Some(SearchMethod::Ticker);
            match self
                .timed(self.broker.search_by_symbol(&query.ticker, &query.currency, &query.exchange))
                .await
            {
                Ok(matches) if !matches.is_empty() => {
                    let best = pick_match(&matches, &request.currency);
                    return Ok(self.entry_from(
                        request,
                        SearchMethod::Ticker,
                        best,
                        serde_json::json!({
                            "query": {
                                "ticker": query.ticker,
                                "currency": query.currency,
                                "exchange": query.exchange,
                            },
                            "matches": matches.len(),
                        }),
                    ));
                }
                Ok(_) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    debug!(ticker = %query.ticker, exchange = %query.exchange, error = %e, "symbol search failed")
                }
            }
        }

        if !request.name.trim().is_empty() {
            last_method = Some(SearchMethod::Name);
            match self.timed(self.broker.search_by_name(&request.name)).await {
                Ok(matches) if !matches.is_empty() => {
                    let best = pick_match(&matches, &request.currency);
                    return Ok(self.entry_from(
                        request,
                        SearchMethod::Name,
                        best,
                        serde_json::json!({ "name": request.name, "matches": matches.len() }),
                    ));
                }
                Ok(_) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => debug!(ticker = %request.ticker, error = %e, "name search failed"),
            }
        }

        Ok(CacheEntry::not_found(request, last_method))
    }

    async fn timed(
        &self,
        call: impl Future<Output = Result<Vec<MatchCandidate>, BrokerError>>,
    ) -> Result<Vec<MatchCandidate>, BrokerError> {
        match tokio::time::timeout(self.config.per_call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(BrokerError::Timeout),
        }
    }

    fn entry_from(
        &self,
        request: &HoldingRequest,
        method: SearchMethod,
        candidate: &MatchCandidate,
        query_details: serde_json::Value,
    ) -> CacheEntry {
        CacheEntry::found(
            request,
            method,
            candidate.symbol.clone(),
            candidate.contract_id,
            Some(serde_json::json!({
                "strategy": method.to_string(),
                "query": query_details,
                "match": {
                    "symbol": candidate.symbol,
                    "long_name": candidate.long_name,
                    "currency": candidate.currency,
                    "exchange": candidate.exchange,
                    "contract_id": candidate.contract_id,
                },
            })),
        )
    }
}

/// Tie-break among one candidate's matches: exact currency match first, else
/// the first result the broker returned.
fn pick_match<'a>(matches: &'a [MatchCandidate], currency: &str) -> &'a MatchCandidate {
    matches
        .iter()
        .find(|m| m.currency.eq_ignore_ascii_case(currency))
        .unwrap_or(&matches[0])
}

/// Ticker-variant candidate list, venue-major: every symbol alternate on the
/// currency's home exchange first, then every alternate on SMART routing.
pub fn symbol_candidates(ticker: &str, currency: &str) -> Vec<SymbolQuery> {
    let alternates = symbol_alternates(ticker);
    let mut venues: Vec<&str> = Vec::new();
    if let Some(home) = home_exchange(currency) {
        venues.push(home);
    }
    venues.push("SMART");

    let mut candidates = Vec::new();
    for venue in venues {
        for alt in &alternates {
            candidates.push(SymbolQuery {
                ticker: alt.clone(),
                currency: currency.to_string(),
                exchange: venue.to_string(),
            });
        }
    }
    candidates
}

/// Symbol spelling alternates, most-literal first: the ticker verbatim, the
/// dot/hyphen share-class separator swapped, a hyphen inserted before a
/// trailing one-letter share class, and any country suffix stripped.
fn symbol_alternates(ticker: &str) -> Vec<String> {
    let ticker = ticker.trim();
    let mut alternates = vec![ticker.to_string()];

    if ticker.contains('.') {
        alternates.push(ticker.replace('.', "-"));
    } else if ticker.contains('-') {
        alternates.push(ticker.replace('-', "."));
    }

    // "ROCKA" style: trailing share-class letter glued onto the stem.
    if !ticker.contains(['.', '-', ' ']) && ticker.len() >= 3 {
        if let Some(class) = ticker.chars().last().filter(|c| matches!(c, 'A' | 'B')) {
            alternates.push(format!("{}-{}", &ticker[..ticker.len() - 1], class));
        }
    }

    // "NOVO-B.CO" style: drop a short country suffix after the last dot.
    if let Some((stem, suffix)) = ticker.rsplit_once('.') {
        if !stem.is_empty() && (1..=3).contains(&suffix.len()) && suffix.chars().all(|c| c.is_ascii_alphabetic()) {
            alternates.push(stem.to_string());
        }
    }

    let mut seen = Vec::new();
    for alt in alternates {
        if !alt.is_empty() && !seen.contains(&alt) {
            seen.push(alt);
        }
    }
    seen
}

/// Primary listing venue implied by the trading currency. Unknown currencies
/// fall back to SMART routing only.
fn home_exchange(currency: &str) -> Option<&'static str> {
    match currency.to_ascii_uppercase().as_str() {
        "USD" => Some("NYSE"),
        "CAD" => Some("TSE"),
        "GBP" => Some("LSE"),
        "EUR" => Some("IBIS"),
        "CHF" => Some("EBS"),
        "SEK" => Some("SFB"),
        "NOK" => Some("OSE"),
        "DKK" => Some("CPH"),
        "JPY" => Some("TSEJ"),
        "HKD" => Some("SEHK"),
        "AUD" => Some("ASX"),
        _ => None,
    }
}

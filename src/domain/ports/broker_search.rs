use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One instrument returned by a broker catalog lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub symbol: String,
    pub long_name: String,
    pub currency: String,
    pub exchange: String,
    pub contract_id: i64,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum BrokerError {
    /// The session itself dropped. Fatal for the run: the orchestrator stops
    /// issuing searches and marks remaining holdings unresolved.
    #[error("broker connection lost: {0}")]
    ConnectionLost(String),

    /// One call timed out. Transient: the driver advances to the next
    /// candidate instead of retrying.
    #[error("broker call timed out")]
    Timeout,

    /// Recoverable connectivity or server error on one call.
    #[error("broker transport error: {0}")]
    Transport(String),

    /// The broker answered but the response could not be decoded.
    #[error("broker response parse error: {0}")]
    Parse(String),
}

impl BrokerError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, BrokerError::ConnectionLost(_))
    }
}

/// Pluggable broker catalog search.
///
/// Implementations wrap one stateful session (one connection, sequential
/// request/response); at most one call is in flight per session. Non-fatal
/// info notices from the broker must be filtered by the implementation, not
/// surfaced as errors.
#[async_trait]
pub trait BrokerSearch: Send + Sync {
    /// Name of this broker adapter (e.g., "ibkr-gateway").
    fn name(&self) -> &str;

    /// Look up by identifier (ISIN).
    async fn search_by_identifier(&self, isin: &str) -> Result<Vec<MatchCandidate>, BrokerError>;

    /// Look up by ticker symbol on a specific venue and currency.
    async fn search_by_symbol(
        &self,
        ticker: &str,
        currency: &str,
        exchange: &str,
    ) -> Result<Vec<MatchCandidate>, BrokerError>;

    /// Full-text company-name lookup.
    async fn search_by_name(&self, name: &str) -> Result<Vec<MatchCandidate>, BrokerError>;
}

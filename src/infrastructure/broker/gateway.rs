use crate::domain::ports::broker_search::{BrokerError, BrokerSearch, MatchCandidate};
use async_trait::async_trait;
use serde::Deserialize;

/// `BrokerSearch` adapter for an IBKR Client Portal gateway.
///
/// Talks to the local gateway's `/iserver/secdef/search` endpoint. The
/// gateway mixes real matches and informational notices in one response
/// array; notices (rows without a contract id) are filtered here, never
/// surfaced as errors.
pub struct IbkrGateway {
    base_url: String,
    client: reqwest::Client,
}

impl IbkrGateway {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .danger_accept_invalid_certs(true) // gateway serves a self-signed cert
                .build()
                .unwrap_or_default(),
        }
    }

    async fn secdef_search(
        &self,
        symbol: &str,
        by_name: bool,
    ) -> Result<Vec<MatchCandidate>, BrokerError> {
        let url = format!("{}/v1/api/iserver/secdef/search", self.base_url);
        let body = serde_json::json!({
            "symbol": symbol,
            "name": by_name,
            "secType": "STK",
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    BrokerError::ConnectionLost(e.to_string())
                } else {
                    BrokerError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(BrokerError::Transport(format!(
                "gateway returned {status} for '{symbol}'"
            )));
        }
        if !status.is_success() {
            // 4xx means "no such instrument" on this endpoint, not a failure.
            return Ok(vec![]);
        }

        let rows: Vec<SecDefRow> = resp
            .json()
            .await
            .map_err(|e| BrokerError::Parse(e.to_string()))?;

        Ok(rows.into_iter().filter_map(row_to_candidate).collect())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecDefRow {
    #[serde(default)]
    conid: Option<serde_json::Value>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    company_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    currency: Option<String>,
}

/// The gateway reports conids as both numbers and strings depending on the
/// endpoint version; informational rows carry no conid at all and are
/// dropped here.
fn row_to_candidate(row: SecDefRow) -> Option<MatchCandidate> {
    let contract_id = match row.conid? {
        serde_json::Value::Number(n) => n.as_i64()?,
        serde_json::Value::String(s) => s.parse().ok()?,
        _ => return None,
    };
    if contract_id == 0 {
        return None;
    }
    Some(MatchCandidate {
        symbol: row.symbol.unwrap_or_default(),
        long_name: row.company_name.unwrap_or_default(),
        currency: row.currency.unwrap_or_default(),
        exchange: row.description.unwrap_or_default(),
        contract_id,
    })
}

#[async_trait]
impl BrokerSearch for IbkrGateway {
    fn name(&self) -> &str {
        "ibkr-gateway"
    }

    async fn search_by_identifier(&self, isin: &str) -> Result<Vec<MatchCandidate>, BrokerError> {
        self.secdef_search(isin, false).await
    }

    async fn search_by_symbol(
        &self,
        ticker: &str,
        currency: &str,
        exchange: &str,
    ) -> Result<Vec<MatchCandidate>, BrokerError> {
        let matches = self.secdef_search(ticker, false).await?;
        // The endpoint has no venue parameter; narrow to the requested venue
        // and currency here, keeping SMART as accept-anything.
        Ok(matches
            .into_iter()
            .filter(|m| {
                let venue_ok = exchange == "SMART"
                    || m.exchange.eq_ignore_ascii_case(exchange)
                    || m.exchange.is_empty();
                let currency_ok =
                    m.currency.is_empty() || m.currency.eq_ignore_ascii_case(currency);
                venue_ok && currency_ok
            })
            .collect())
    }

    async fn search_by_name(&self, name: &str) -> Result<Vec<MatchCandidate>, BrokerError> {
        self.secdef_search(name, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_string_conids_both_parse() {
        let num: SecDefRow = serde_json::from_str(r#"{"conid": 265598, "symbol": "AAPL"}"#).unwrap();
        let s: SecDefRow = serde_json::from_str(r#"{"conid": "265598", "symbol": "AAPL"}"#).unwrap();
        assert_eq!(row_to_candidate(num).unwrap().contract_id, 265598);
        assert_eq!(row_to_candidate(s).unwrap().contract_id, 265598);
    }

    #[test]
    fn test_info_rows_without_conid_are_filtered() {
        let row: SecDefRow =
            serde_json::from_str(r#"{"symbol": null, "companyName": "no results"}"#).unwrap();
        assert!(row_to_candidate(row).is_none());
    }
}

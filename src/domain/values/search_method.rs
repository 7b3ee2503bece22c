use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which lookup strategy produced (or last attempted) a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    Identifier,
    Ticker,
    Name,
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMethod::Identifier => write!(f, "identifier"),
            SearchMethod::Ticker => write!(f, "ticker"),
            SearchMethod::Name => write!(f, "name"),
        }
    }
}

impl FromStr for SearchMethod {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "identifier" => Ok(SearchMethod::Identifier),
            "ticker" => Ok(SearchMethod::Ticker),
            "name" => Ok(SearchMethod::Name),
            _ => Err(format!("Unknown search method: {s}")),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a holding's resolution came from in this run.
///
/// `Unresolved` is distinct from a not-found resolution: it marks holdings the
/// run could not attempt because the broker session dropped mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOrigin {
    Cache,
    LiveSearch,
    Unresolved,
}

impl fmt::Display for ResolutionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionOrigin::Cache => write!(f, "cache"),
            ResolutionOrigin::LiveSearch => write!(f, "live_search"),
            ResolutionOrigin::Unresolved => write!(f, "unresolved"),
        }
    }
}

impl FromStr for ResolutionOrigin {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cache" => Ok(ResolutionOrigin::Cache),
            "live_search" => Ok(ResolutionOrigin::LiveSearch),
            "unresolved" => Ok(ResolutionOrigin::Unresolved),
            _ => Err(format!("Unknown resolution origin: {s}")),
        }
    }
}

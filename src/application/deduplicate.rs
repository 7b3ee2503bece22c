use crate::domain::entities::holding::{HoldingRequest, Screen};
use std::collections::HashMap;

/// Collapse per-screen holding records into one canonical record per ticker.
///
/// Screens are walked in the supplied order, holdings within each screen in
/// supplied order. When two records share a ticker the better one survives:
/// strictly greater quantity wins, then strictly greater target weight, then
/// the first-encountered record (stable). Records without a ticker cannot be
/// resolved and are dropped, as is anything with non-positive quantity after
/// the merge.
///
/// Output preserves first-encounter order of the surviving tickers; nothing
/// here depends on hash iteration order, so repeated runs over identical
/// input are byte-identical.
pub fn deduplicate(screens: &[Screen]) -> Vec<HoldingRequest> {
    let mut best: Vec<HoldingRequest> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for screen in screens {
        for holding in &screen.holdings {
            let ticker = holding.ticker.trim();
            if ticker.is_empty() {
                continue;
            }
            // Key and store the trimmed spelling so "X" and "X " merge.
            let mut holding = holding.clone();
            holding.ticker = ticker.to_string();
            match index.get(&holding.ticker) {
                Some(&i) => {
                    if beats(&holding, &best[i]) {
                        best[i] = holding;
                    }
                }
                None => {
                    index.insert(holding.ticker.clone(), best.len());
                    best.push(holding);
                }
            }
        }
    }

    best.retain(|h| h.quantity > 0.0);
    best
}

/// Tie-break total order: does `challenger` replace the `incumbent`?
/// Equal on both criteria keeps the incumbent (first encountered).
fn beats(challenger: &HoldingRequest, incumbent: &HoldingRequest) -> bool {
    if challenger.quantity != incumbent.quantity {
        return challenger.quantity > incumbent.quantity;
    }
    challenger.target_weight > incumbent.target_weight
}

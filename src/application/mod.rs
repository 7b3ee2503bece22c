pub mod deduplicate;
pub mod reconcile;
pub mod search;

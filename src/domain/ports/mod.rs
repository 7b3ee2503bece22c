pub mod broker_search;
pub mod resolution_cache;

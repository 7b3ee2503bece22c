pub mod cache_entry;
pub mod holding;

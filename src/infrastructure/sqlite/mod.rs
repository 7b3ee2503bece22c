pub mod cache_repo;
pub mod migrations;

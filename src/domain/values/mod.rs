pub mod resolution_origin;
pub mod search_method;

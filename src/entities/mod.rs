pub mod prelude;

pub mod duplicate_relationships;
pub mod search_cache;
pub mod search_requests;
pub mod search_results;

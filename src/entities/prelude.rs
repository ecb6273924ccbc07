pub use super::duplicate_relationships::Entity as DuplicateRelationships;
pub use super::search_cache::Entity as SearchCache;
pub use super::search_requests::Entity as SearchRequests;
pub use super::search_results::Entity as SearchResults;

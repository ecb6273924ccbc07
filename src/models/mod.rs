pub mod request;
pub mod result;

pub use request::{DeduplicationOptions, RequestStatus, SearchFilters, SearchRequest};
pub use result::{
    DuplicateMethod, DuplicateRelationship, ProcessingResult, RawResult, ResultKind, SearchResult,
};

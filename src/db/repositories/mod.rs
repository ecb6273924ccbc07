pub mod cache;
pub mod request;
pub mod result;

//! Request-level result caching.

pub mod request;


pub use request::RequestCache;

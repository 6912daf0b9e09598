//! Retry with classified-error exponential backoff.

pub mod controller;
pub mod policy;


pub use controller::{RetryController, RetryOutcome, UnitState};
pub use policy::{DEFAULT_BASE_DELAY, DEFAULT_MAX_JITTER, RATE_LIMIT_MULTIPLIER, RetryPolicy};

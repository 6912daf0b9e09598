//! Request, token and cost accounting.

pub mod aggregator;
pub mod estimate;
pub mod pricing;
pub mod types;


pub use aggregator::UsageAggregator;
pub use estimate::{CostEstimate, estimate_tokens};
pub use pricing::{ModelPricing, cost_for};
pub use types::UsageStats;

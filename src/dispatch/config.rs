use crate::constants::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_WORKERS};
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq)]
/// Knobs for one [`Dispatcher`](super::Dispatcher).
pub struct DispatcherConfig {
    /// Maximum units in flight at once.
    pub workers: usize,
    pub cache_enabled: bool,
    /// Entry bound for the request cache; `None` keeps every entry.
    pub cache_capacity: Option<u64>,
    /// Model id used when the dispatcher builds its own transport.
    pub model: String,
    /// Reply budget passed to the `genai` transport.
    pub max_tokens: u32,
    pub policy: RetryPolicy,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            cache_enabled: true,
            cache_capacity: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            policy: RetryPolicy::default(),
        }
    }
}

impl DispatcherConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.policy.max_attempts = max_attempts;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Worker count, never below one.
    #[inline]
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }

    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts
    }
}

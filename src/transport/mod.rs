//! The remote scoring call.
//!
//! [`Transport`] is the only seam between the scoring engine and the network. The
//! engine hands it a finished prompt and gets back raw text plus token counts, or a
//! classifiable [`TransportError`].

pub mod error;
pub mod llm;
#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use error::{ErrorClass, TransportError, TransportResult};
pub use llm::GenaiTransport;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;

use async_trait::async_trait;

/// Raw output of one successful scoring call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TransportResponse {
    pub fn new(text: impl Into<String>, input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            text: text.into(),
            input_tokens,
            output_tokens,
        }
    }
}

#[async_trait]
/// Performs a single remote scoring call.
pub trait Transport: Send + Sync {
    /// Sends `prompt` to the model and returns its reply.
    async fn send(&self, prompt: &str) -> TransportResult<TransportResponse>;

    /// Model identifier used for cache keys and pricing.
    fn model(&self) -> &str;
}

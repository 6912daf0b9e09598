//! Production transport backed by the `genai` multi-provider client.
//!
//! Provider API keys are read by `genai` from the usual environment variables
//! (`ANTHROPIC_API_KEY`, `OPENAI_API_KEY`, ...). The model name selects the provider.

use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use tracing::{debug, error};

use super::error::{TransportError, TransportResult};
use super::{Transport, TransportResponse};
use crate::constants::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};

pub struct GenaiTransport {
    client: Client,
    model: String,
    options: ChatOptions,
}

impl GenaiTransport {
    /// Creates a transport for `model` with default sampling options.
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_client(Client::default(), model)
    }

    /// Creates a transport around an existing client.
    pub fn with_client(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            options: ChatOptions::default()
                .with_max_tokens(DEFAULT_MAX_TOKENS)
                .with_temperature(DEFAULT_TEMPERATURE),
        }
    }

    /// Overrides the completion budget.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.options = self.options.with_max_tokens(max_tokens);
        self
    }
}

impl std::fmt::Debug for GenaiTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiTransport")
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl Transport for GenaiTransport {
    async fn send(&self, prompt: &str) -> TransportResult<TransportResponse> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]);

        let response = self
            .client
            .exec_chat(&self.model, request, Some(&self.options))
            .await
            .map_err(|e| {
                let message = e.to_string();
                error!(model = %self.model, "Provider error: {}", message);
                TransportError::classify_message(&message)
            })?;

        let text = response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| TransportError::MalformedResponse("response has no text".into()))?;

        let input_tokens = token_count(response.usage.prompt_tokens);
        let output_tokens = token_count(response.usage.completion_tokens);

        debug!(
            model = %self.model,
            input_tokens,
            output_tokens,
            response_len = text.len(),
            "Provider call succeeded"
        );

        Ok(TransportResponse {
            text,
            input_tokens,
            output_tokens,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn token_count(reported: Option<i32>) -> u64 {
    reported.map(|n| n.max(0) as u64).unwrap_or(0)
}

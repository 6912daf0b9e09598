//! Pre-flight token and cost estimate for a batch.
//!
//! Token counts are approximated from character length; real counts depend on
//! the provider's tokenizer.

use serde::Serialize;

use super::pricing::ModelPricing;
use crate::constants::{CHARS_PER_TOKEN, ESTIMATED_REPLY_TOKENS};
use crate::scoring::build_prompt;
use crate::transcript::Chunk;

/// Approximate token count of `text`, rounded up.
pub fn estimate_tokens(text: &str) -> u64 {
    text.chars().count().div_ceil(CHARS_PER_TOKEN) as u64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    pub model: String,
    pub total_blocks: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    /// USD; 0 for models missing from the price table.
    pub total_cost: f64,
}

impl CostEstimate {
    /// Estimates one scoring call per chunk with the prompt it would send.
    pub fn for_batch(model: &str, chunks: &[Chunk], criterion: &str) -> Self {
        let total_input_tokens: u64 = chunks
            .iter()
            .map(|chunk| estimate_tokens(&build_prompt(chunk, criterion)))
            .sum();
        let total_output_tokens = ESTIMATED_REPLY_TOKENS * chunks.len() as u64;
        let total_cost =
            ModelPricing::for_model(model).cost(total_input_tokens, total_output_tokens);

        Self {
            model: model.to_string(),
            total_blocks: chunks.len(),
            total_input_tokens,
            total_output_tokens,
            total_cost,
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens + self.total_output_tokens
    }

    pub fn average_input_tokens(&self) -> u64 {
        self.total_input_tokens / self.total_blocks.max(1) as u64
    }
}

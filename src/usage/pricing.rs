//! Static per-model price table (USD per 1,000 tokens).
//!
//! Unknown models price at zero rather than failing the batch.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    /// USD per 1K prompt tokens.
    pub input_per_1k: f64,
    /// USD per 1K completion tokens.
    pub output_per_1k: f64,
}

impl ModelPricing {
    pub const FREE: Self = Self {
        input_per_1k: 0.0,
        output_per_1k: 0.0,
    };

    const fn new(input_per_1k: f64, output_per_1k: f64) -> Self {
        Self {
            input_per_1k,
            output_per_1k,
        }
    }

    /// Looks up `model` in the price table.
    pub fn lookup(model: &str) -> Option<Self> {
        PRICE_TABLE
            .iter()
            .find(|(name, _)| *name == model)
            .map(|(_, pricing)| *pricing)
    }

    /// Looks up `model`, falling back to [`ModelPricing::FREE`].
    pub fn for_model(model: &str) -> Self {
        Self::lookup(model).unwrap_or(Self::FREE)
    }

    /// Every priced model, in table order.
    pub fn table() -> impl Iterator<Item = (&'static str, ModelPricing)> {
        PRICE_TABLE.iter().copied()
    }

    /// USD cost of a call with the given token counts.
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 / 1000.0) * self.input_per_1k
            + (output_tokens as f64 / 1000.0) * self.output_per_1k
    }
}

/// USD cost of a call to `model`; 0 for unknown models.
pub fn cost_for(model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
    ModelPricing::for_model(model).cost(input_tokens, output_tokens)
}

const PRICE_TABLE: &[(&str, ModelPricing)] = &[
    ("claude-3-haiku-20240307", ModelPricing::new(0.000_25, 0.001_25)),
    ("claude-3-5-haiku-20241022", ModelPricing::new(0.000_8, 0.004)),
    ("claude-3-5-sonnet-20240620", ModelPricing::new(0.003, 0.015)),
    ("claude-3-5-sonnet-20241022", ModelPricing::new(0.003, 0.015)),
    ("claude-3-7-sonnet-20250219", ModelPricing::new(0.003, 0.015)),
    ("claude-sonnet-4-20250514", ModelPricing::new(0.003, 0.015)),
    ("claude-3-opus-20240229", ModelPricing::new(0.015, 0.075)),
    ("claude-opus-4-20250514", ModelPricing::new(0.015, 0.075)),
    ("gpt-4o", ModelPricing::new(0.002_5, 0.01)),
    ("gpt-4o-mini", ModelPricing::new(0.000_15, 0.000_6)),
];

use crate::calculator::Calculator;
use crate::data_structures::ModelPricing;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::fs;
use std::path::Path;

/// Per-model prices, kept in the order they were added so reports list
/// models predictably.
#[derive(Debug, Clone)]
pub struct PricingProvider {
    pricing_table: IndexMap<String, ModelPricing>,
}

impl PricingProvider {
    pub fn new() -> Self {
        let mut pricing_table = IndexMap::new();

        // USD per 1M tokens: (input, output)
        pricing_table.insert("openai_gpt_5_2".to_string(), ModelPricing::new(1.75, 14.00));
        pricing_table.insert("openai_gpt_5_2_pro".to_string(), ModelPricing::new(21.00, 168.00));
        pricing_table.insert(
            "anthropic_claude_sonnet_4_6".to_string(),
            ModelPricing::new(3.00, 15.00),
        );
        pricing_table.insert(
            "anthropic_claude_opus_4_6".to_string(),
            ModelPricing::new(5.00, 25.00),
        );
        pricing_table.insert(
            "google_gemini_3_pro_preview".to_string(),
            ModelPricing::new(2.00, 12.00),
        );

        Self { pricing_table }
    }

    /// Reads a JSON object of `{"model": {"input": 1.0, "output": 2.0}}`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read pricing file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid pricing file: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let pricing_table: IndexMap<String, ModelPricing> =
            serde_json::from_str(content).context("Failed to parse pricing table")?;
        if pricing_table.is_empty() {
            return Err(anyhow::anyhow!("Pricing table has no models"));
        }
        Ok(Self { pricing_table })
    }

    pub fn get_pricing(&self, model: &str) -> Option<&ModelPricing> {
        self.pricing_table.get(model)
    }

    pub fn calculate_cost(&self, model: &str, input_tokens: u64, output_tokens: u64) -> Option<f64> {
        let calculator = Calculator::new();
        self.pricing_table.get(model).map(|pricing| {
            calculator.cost_for_tokens(input_tokens as f64, pricing.input())
                + calculator.cost_for_tokens(output_tokens as f64, pricing.output())
        })
    }

    pub fn models(&self) -> impl Iterator<Item = (&str, &ModelPricing)> {
        self.pricing_table
            .iter()
            .map(|(model, pricing)| (model.as_str(), pricing))
    }

    pub fn supported_models(&self) -> Vec<&String> {
        self.pricing_table.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.pricing_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pricing_table.is_empty()
    }
}

impl Default for PricingProvider {
    fn default() -> Self {
        Self::new()
    }
}

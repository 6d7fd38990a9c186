use crate::data_structures::{CostEstimate, ModelPricing, MonthKey, MonthlyUsage, UsageStatistics};
use std::collections::BTreeMap;

pub const TOKENS_PER_PRICE_UNIT: f64 = 1_000_000.0;

pub struct Calculator;

impl Calculator {
    pub fn new() -> Self {
        Self
    }

    /// USD for `tokens` at a per-million-token price.
    pub fn cost_for_tokens(&self, tokens: f64, price_per_million: f64) -> f64 {
        tokens * price_per_million / TOKENS_PER_PRICE_UNIT
    }

    /// `None` when there are no month buckets to summarize.
    pub fn calculate_statistics(
        &self,
        months: &BTreeMap<MonthKey, MonthlyUsage>,
    ) -> Option<UsageStatistics> {
        if months.is_empty() {
            return None;
        }

        let inputs = months.values().map(MonthlyUsage::input_tokens);
        let outputs = months.values().map(MonthlyUsage::output_tokens);

        Some(UsageStatistics::new(
            months.len(),
            inputs.clone().sum(),
            outputs.clone().sum(),
            inputs.clone().max().unwrap_or(0),
            outputs.clone().max().unwrap_or(0),
            inputs.min().unwrap_or(0),
            outputs.min().unwrap_or(0),
        ))
    }

    pub fn estimate_cost(
        &self,
        model: &str,
        pricing: &ModelPricing,
        stats: &UsageStatistics,
    ) -> CostEstimate {
        let input = |tokens: f64| self.cost_for_tokens(tokens, pricing.input());
        let output = |tokens: f64| self.cost_for_tokens(tokens, pricing.output());

        CostEstimate::new(
            model.to_string(),
            input(stats.max_input_tokens() as f64),
            output(stats.max_output_tokens() as f64),
            input(stats.average_input_tokens()),
            output(stats.average_output_tokens()),
            input(stats.min_input_tokens() as f64),
            output(stats.min_output_tokens() as f64),
            input(stats.total_input_tokens() as f64) + output(stats.total_output_tokens() as f64),
        )
    }

    pub fn calculate_total_tokens(&self, months: &BTreeMap<MonthKey, MonthlyUsage>) -> u64 {
        months.values().map(MonthlyUsage::total_tokens).sum()
    }

    pub fn calculate_conversation_count(&self, months: &BTreeMap<MonthKey, MonthlyUsage>) -> usize {
        months.values().map(MonthlyUsage::conversation_count).sum()
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

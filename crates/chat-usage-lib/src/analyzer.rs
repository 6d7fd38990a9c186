use crate::aggregator::MonthlyAggregator;
use crate::calculator::Calculator;
use crate::data_structures::{Conversation, CostEstimate, MonthKey, MonthlyUsage, UsageStatistics};
use crate::linearizer::Linearizer;
use crate::loader::ConversationLoader;
use crate::pricing::PricingProvider;
use crate::tokenizer::Tokenizer;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Loads an export and keeps the month buckets built from it. The tokenizer
/// and pricing table are supplied by the caller.
pub struct UsageAnalyzer {
    months: BTreeMap<MonthKey, MonthlyUsage>,
    tokenizer: Box<dyn Tokenizer>,
    pricing_provider: PricingProvider,
    linearizer: Linearizer,
    calculator: Calculator,
    loader: ConversationLoader,
}

impl UsageAnalyzer {
    pub fn new(tokenizer: Box<dyn Tokenizer>, pricing_provider: PricingProvider) -> Self {
        Self {
            months: BTreeMap::new(),
            tokenizer,
            pricing_provider,
            linearizer: Linearizer::new(),
            calculator: Calculator::new(),
            loader: ConversationLoader::new(),
        }
    }

    pub fn with_linearizer(mut self, linearizer: Linearizer) -> Self {
        self.linearizer = linearizer;
        self
    }

    /// Replaces any previously loaded data with the contents of `path`.
    pub fn load_export<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let conversations = self
            .loader
            .load_from_file(path)
            .with_context(|| format!("Failed to load export: {}", path.display()))?;
        info!(count = conversations.len(), "Conversations loaded");

        self.months.clear();
        self.ingest(&conversations);
        Ok(conversations.len())
    }

    pub fn ingest(&mut self, conversations: &[Conversation]) {
        let aggregator = MonthlyAggregator::new(self.tokenizer.as_ref(), &self.linearizer);
        for (key, usage) in aggregator.aggregate(conversations) {
            self.months.entry(key).or_default().merge(usage);
        }
    }

    pub fn months(&self) -> &BTreeMap<MonthKey, MonthlyUsage> {
        &self.months
    }

    pub fn month(&self, key: &MonthKey) -> Option<&MonthlyUsage> {
        self.months.get(key)
    }

    pub fn statistics(&self) -> Option<UsageStatistics> {
        self.calculator.calculate_statistics(&self.months)
    }

    /// One estimate per pricing model, in pricing-table order. Empty when
    /// nothing has been loaded.
    pub fn cost_estimates(&self) -> Vec<CostEstimate> {
        let Some(stats) = self.statistics() else {
            return Vec::new();
        };

        self.pricing_provider
            .models()
            .map(|(model, pricing)| self.calculator.estimate_cost(model, pricing, &stats))
            .collect()
    }

    pub fn count_tokens(&self, text: &str) -> usize {
        self.tokenizer.count_tokens(text)
    }

    pub fn pricing_provider(&self) -> &PricingProvider {
        &self.pricing_provider
    }

    pub fn linearizer(&self) -> &Linearizer {
        &self.linearizer
    }

    pub fn total_tokens(&self) -> u64 {
        self.calculator.calculate_total_tokens(&self.months)
    }

    pub fn conversation_count(&self) -> usize {
        self.calculator.calculate_conversation_count(&self.months)
    }

    pub fn month_count(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn clear_data(&mut self) {
        self.months.clear();
    }
}

pub mod aggregator;
pub mod analyzer;
pub mod calculator;
pub mod content;
pub mod data_structures;
pub mod linearizer;
pub mod loader;
pub mod pricing;
pub mod tokenizer;

pub use aggregator::{month_key, MonthlyAggregator};
pub use analyzer::UsageAnalyzer;
pub use calculator::Calculator;
pub use content::{extract_text, Content, ContentPart};
pub use data_structures::{
    Conversation, ConversationUsage, CostEstimate, LinearMessage, ModelPricing, MonthKey,
    MonthlyUsage, Node, Role, UsageStatistics,
};
pub use linearizer::{Linearizer, StartNodeRule};
pub use loader::{ConversationLoader, LoadError};
pub use pricing::PricingProvider;
pub use tokenizer::{BpeTokenizer, CharEstimateTokenizer, Tokenizer, TokenizerKind};

pub use anyhow::Result;
pub use chrono::{DateTime, Utc};

pub mod prelude {
    pub use crate::analyzer::UsageAnalyzer;
    pub use crate::data_structures::{CostEstimate, LinearMessage, MonthKey, Role, UsageStatistics};
    pub use crate::linearizer::{Linearizer, StartNodeRule};
    pub use crate::pricing::PricingProvider;
    pub use crate::tokenizer::{Tokenizer, TokenizerKind};
    pub use anyhow::Result;
    pub use chrono::{DateTime, Utc};
}

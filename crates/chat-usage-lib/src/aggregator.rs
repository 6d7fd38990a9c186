use crate::data_structures::{
    epoch_to_utc, Conversation, ConversationUsage, LinearMessage, MonthKey, MonthlyUsage, Role,
};
use crate::linearizer::Linearizer;
use crate::tokenizer::Tokenizer;
use std::collections::BTreeMap;
use tracing::warn;

/// Buckets conversations by the month they were created in. User messages
/// count as input tokens and assistant messages as output tokens.
pub struct MonthlyAggregator<'a> {
    tokenizer: &'a dyn Tokenizer,
    linearizer: &'a Linearizer,
}

impl<'a> MonthlyAggregator<'a> {
    pub fn new(tokenizer: &'a dyn Tokenizer, linearizer: &'a Linearizer) -> Self {
        Self {
            tokenizer,
            linearizer,
        }
    }

    pub fn aggregate(&self, conversations: &[Conversation]) -> BTreeMap<MonthKey, MonthlyUsage> {
        let mut months: BTreeMap<MonthKey, MonthlyUsage> = BTreeMap::new();
        for conversation in conversations {
            let usage = self.summarize(conversation);
            months
                .entry(month_key(conversation.create_time()))
                .or_default()
                .add_conversation(usage);
        }
        months
    }

    pub fn summarize(&self, conversation: &Conversation) -> ConversationUsage {
        let messages = self.linearizer.linearize(conversation);
        let input_tokens = self.tokens_for_role(&messages, &Role::User);
        let output_tokens = self.tokens_for_role(&messages, &Role::Assistant);

        ConversationUsage::new(
            conversation.id().to_string(),
            conversation.title().to_string(),
            conversation.create_time().and_then(epoch_to_utc),
            messages,
            input_tokens,
            output_tokens,
        )
    }

    fn tokens_for_role(&self, messages: &[LinearMessage], role: &Role) -> u64 {
        messages
            .iter()
            .filter(|message| message.role() == role)
            .map(|message| self.tokenizer.count_tokens(message.text()) as u64)
            .sum()
    }
}

/// A missing timestamp is silently `Unknown`; one that is present but cannot
/// be turned into a date is logged first.
pub fn month_key(create_time: Option<f64>) -> MonthKey {
    let Some(seconds) = create_time else {
        return MonthKey::Unknown;
    };

    match epoch_to_utc(seconds) {
        Some(timestamp) => MonthKey::from_datetime(timestamp),
        None => {
            warn!(create_time = seconds, "Invalid conversation timestamp, bucketing as unknown");
            MonthKey::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    /// One token per whitespace-separated word.
    struct WordTokenizer;

    impl Tokenizer for WordTokenizer {
        fn count_tokens(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    fn words(n: usize) -> String {
        vec!["tok"; n].join(" ")
    }

    fn conversation(id: &str, create_time: Value, user_words: usize, assistant_words: usize) -> Conversation {
        serde_json::from_value(json!({
            "id": id,
            "title": format!("conversation {}", id),
            "create_time": create_time,
            "mapping": {
                "sys": {"message": {"author": {"role": "system"}, "content": words(7)}, "parent": null},
                "u": {"message": {"author": {"role": "user"}, "content": {"parts": [words(user_words)]}}, "parent": "sys"},
                "a": {"message": {"author": {"role": "assistant"}, "content": {"parts": [words(assistant_words)]}}, "parent": "u"},
                "t": {"message": {"author": {"role": "tool"}, "content": words(5)}, "parent": "a"}
            },
            "current_node": "t"
        }))
        .unwrap()
    }

    #[test]
    fn test_summarize_counts_by_role() {
        let linearizer = Linearizer::new();
        let aggregator = MonthlyAggregator::new(&WordTokenizer, &linearizer);

        let usage = aggregator.summarize(&conversation("c1", json!(1700000000.0), 12, 30));
        assert_eq!(usage.id(), "c1");
        assert_eq!(usage.messages().len(), 4);
        assert_eq!(usage.input_tokens(), 12);
        assert_eq!(usage.output_tokens(), 30);
    }

    #[test]
    fn test_same_month_is_merged() {
        let linearizer = Linearizer::new();
        let aggregator = MonthlyAggregator::new(&WordTokenizer, &linearizer);

        let months = aggregator.aggregate(&[
            conversation("c1", json!(1700000000.0), 10, 1),
            conversation("c2", json!(1700500000.0), 20, 2),
        ]);

        assert_eq!(months.len(), 1);
        let november = &months[&MonthKey::Month { year: 2023, month: 11 }];
        assert_eq!(november.input_tokens(), 30);
        assert_eq!(november.output_tokens(), 3);
        assert_eq!(november.conversation_count(), 2);
    }

    #[test]
    fn test_months_are_chronological_with_unknown_last() {
        let linearizer = Linearizer::new();
        let aggregator = MonthlyAggregator::new(&WordTokenizer, &linearizer);

        let months = aggregator.aggregate(&[
            conversation("late", json!(1706000000.0), 1, 1),
            conversation("none", json!(null), 1, 1),
            conversation("early", json!(1690000000.0), 1, 1),
        ]);

        let keys: Vec<String> = months.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["2023-07", "2024-01", "unknown"]);
    }

    #[test]
    fn test_month_key() {
        assert_eq!(month_key(None), MonthKey::Unknown);
        assert_eq!(month_key(Some(f64::NAN)), MonthKey::Unknown);
        assert_eq!(
            month_key(Some(1_700_000_000.0)),
            MonthKey::Month { year: 2023, month: 11 }
        );
    }
}

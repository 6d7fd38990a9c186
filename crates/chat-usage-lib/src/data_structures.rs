use crate::content::Content;
use chrono::{DateTime, Datelike, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
    Other(String),
}

impl Role {
    /// Returns `None` for an empty tag, which the linearizer treats as "no role".
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "" => None,
            "system" => Some(Role::System),
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "tool" => Some(Role::Tool),
            other => Some(Role::Other(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
            Role::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Author {
    #[serde(default)]
    role: Option<String>,
}

impl Author {
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(Role::parse)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    author: Option<Author>,
    #[serde(default)]
    content: Content,
    #[serde(default)]
    create_time: Option<f64>,
}

impl Message {
    pub fn role(&self) -> Option<Role> {
        self.author.as_ref().and_then(Author::role)
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn create_time(&self) -> Option<f64> {
        self.create_time
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Node {
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    children: Vec<String>,
}

impl Node {
    /// An empty parent id ends a walk just like a missing one.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref().filter(|id| !id.is_empty())
    }

    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    pub fn children(&self) -> &[String] {
        &self.children
    }
}

/// One exported chat session. The mapping keeps the order the nodes appear in
/// the export document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    create_time: Option<f64>,
    #[serde(default)]
    mapping: IndexMap<String, Node>,
    #[serde(default)]
    current_node: Option<String>,
}

impl Conversation {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("No Title")
    }

    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or("No ID")
    }

    pub fn create_time(&self) -> Option<f64> {
        self.create_time
    }

    pub fn mapping(&self) -> &IndexMap<String, Node> {
        &self.mapping
    }

    pub fn current_node(&self) -> Option<&str> {
        self.current_node.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearMessage {
    node_id: String,
    role: Role,
    text: String,
    create_time: Option<DateTime<Utc>>,
}

impl LinearMessage {
    pub fn new(
        node_id: String,
        role: Role,
        text: String,
        create_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            node_id,
            role,
            text,
            create_time,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn create_time(&self) -> Option<DateTime<Utc>> {
        self.create_time
    }

    pub fn create_time_iso(&self) -> Option<String> {
        self.create_time.map(to_iso8601)
    }
}

/// Converts fractional epoch seconds to a UTC instant, rounded to the
/// microsecond. Non-finite or out-of-range values yield `None`.
pub fn epoch_to_utc(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let micros = (seconds * 1_000_000.0).round();
    if micros < i64::MIN as f64 || micros > i64::MAX as f64 {
        return None;
    }
    let micros = micros as i64;
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(secs, nanos)
}

/// `YYYY-MM-DDTHH:MM:SS+00:00`, with six fractional digits only when the
/// instant has a sub-second part.
pub fn to_iso8601(timestamp: DateTime<Utc>) -> String {
    if timestamp.timestamp_subsec_micros() == 0 {
        timestamp.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
    } else {
        timestamp.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
    }
}

#[derive(Debug, Clone)]
pub struct ConversationUsage {
    id: String,
    title: String,
    created: Option<DateTime<Utc>>,
    messages: Vec<LinearMessage>,
    input_tokens: u64,
    output_tokens: u64,
}

impl ConversationUsage {
    pub fn new(
        id: String,
        title: String,
        created: Option<DateTime<Utc>>,
        messages: Vec<LinearMessage>,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Self {
        Self {
            id,
            title,
            created,
            messages,
            input_tokens,
            output_tokens,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    pub fn messages(&self) -> &[LinearMessage] {
        &self.messages
    }

    pub fn input_tokens(&self) -> u64 {
        self.input_tokens
    }

    pub fn output_tokens(&self) -> u64 {
        self.output_tokens
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Calendar bucket for a conversation. Derived ordering puts every real month
/// before `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MonthKey {
    Month { year: i32, month: u32 },
    Unknown,
}

impl MonthKey {
    pub fn from_datetime(timestamp: DateTime<Utc>) -> Self {
        MonthKey::Month {
            year: timestamp.year(),
            month: timestamp.month(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, MonthKey::Unknown)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthKey::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            MonthKey::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MonthlyUsage {
    conversations: Vec<ConversationUsage>,
    input_tokens: u64,
    output_tokens: u64,
}

impl MonthlyUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_conversation(&mut self, conversation: ConversationUsage) {
        self.input_tokens += conversation.input_tokens;
        self.output_tokens += conversation.output_tokens;
        self.conversations.push(conversation);
    }

    pub fn merge(&mut self, other: MonthlyUsage) {
        for conversation in other.conversations {
            self.add_conversation(conversation);
        }
    }

    pub fn conversations(&self) -> &[ConversationUsage] {
        &self.conversations
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }

    pub fn input_tokens(&self) -> u64 {
        self.input_tokens
    }

    pub fn output_tokens(&self) -> u64 {
        self.output_tokens
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageStatistics {
    month_count: usize,
    total_input_tokens: u64,
    total_output_tokens: u64,
    max_input_tokens: u64,
    max_output_tokens: u64,
    min_input_tokens: u64,
    min_output_tokens: u64,
}

impl UsageStatistics {
    pub fn new(
        month_count: usize,
        total_input_tokens: u64,
        total_output_tokens: u64,
        max_input_tokens: u64,
        max_output_tokens: u64,
        min_input_tokens: u64,
        min_output_tokens: u64,
    ) -> Self {
        Self {
            month_count,
            total_input_tokens,
            total_output_tokens,
            max_input_tokens,
            max_output_tokens,
            min_input_tokens,
            min_output_tokens,
        }
    }

    pub fn month_count(&self) -> usize {
        self.month_count
    }

    pub fn total_input_tokens(&self) -> u64 {
        self.total_input_tokens
    }

    pub fn total_output_tokens(&self) -> u64 {
        self.total_output_tokens
    }

    pub fn max_input_tokens(&self) -> u64 {
        self.max_input_tokens
    }

    pub fn max_output_tokens(&self) -> u64 {
        self.max_output_tokens
    }

    pub fn min_input_tokens(&self) -> u64 {
        self.min_input_tokens
    }

    pub fn min_output_tokens(&self) -> u64 {
        self.min_output_tokens
    }

    pub fn average_input_tokens(&self) -> f64 {
        if self.month_count == 0 {
            return 0.0;
        }
        self.total_input_tokens as f64 / self.month_count as f64
    }

    pub fn average_output_tokens(&self) -> f64 {
        if self.month_count == 0 {
            return 0.0;
        }
        self.total_output_tokens as f64 / self.month_count as f64
    }
}

/// Prices in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    input: f64,
    output: f64,
}

impl ModelPricing {
    pub fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }

    pub fn input(&self) -> f64 {
        self.input
    }

    pub fn output(&self) -> f64 {
        self.output
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostEstimate {
    model: String,
    max_input_cost: f64,
    max_output_cost: f64,
    average_input_cost: f64,
    average_output_cost: f64,
    min_input_cost: f64,
    min_output_cost: f64,
    total_cost: f64,
}

impl CostEstimate {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model: String,
        max_input_cost: f64,
        max_output_cost: f64,
        average_input_cost: f64,
        average_output_cost: f64,
        min_input_cost: f64,
        min_output_cost: f64,
        total_cost: f64,
    ) -> Self {
        Self {
            model,
            max_input_cost,
            max_output_cost,
            average_input_cost,
            average_output_cost,
            min_input_cost,
            min_output_cost,
            total_cost,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_input_cost(&self) -> f64 {
        self.max_input_cost
    }

    pub fn max_output_cost(&self) -> f64 {
        self.max_output_cost
    }

    pub fn average_input_cost(&self) -> f64 {
        self.average_input_cost
    }

    pub fn average_output_cost(&self) -> f64 {
        self.average_output_cost
    }

    pub fn min_input_cost(&self) -> f64 {
        self.min_input_cost
    }

    pub fn min_output_cost(&self) -> f64 {
        self.min_output_cost
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn average_monthly_cost(&self) -> f64 {
        self.average_input_cost + self.average_output_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("assistant"), Some(Role::Assistant));
        assert_eq!(Role::parse("critic"), Some(Role::Other("critic".to_string())));
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_epoch_to_utc_whole_seconds() {
        let ts = epoch_to_utc(1_700_000_000.0).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap());
        assert_eq!(to_iso8601(ts), "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn test_iso8601_keeps_microseconds() {
        let ts = epoch_to_utc(1_700_000_000.25).unwrap();
        assert_eq!(to_iso8601(ts), "2023-11-14T22:13:20.250000+00:00");
    }

    #[test]
    fn test_epoch_to_utc_rejects_non_finite() {
        assert!(epoch_to_utc(f64::NAN).is_none());
        assert!(epoch_to_utc(f64::INFINITY).is_none());
        assert!(epoch_to_utc(1e300).is_none());
    }

    #[test]
    fn test_month_key_ordering_and_display() {
        let early = MonthKey::Month { year: 2023, month: 11 };
        let late = MonthKey::Month { year: 2024, month: 2 };
        assert!(early < late);
        assert!(late < MonthKey::Unknown);
        assert_eq!(early.to_string(), "2023-11");
        assert_eq!(MonthKey::Unknown.to_string(), "unknown");
        assert!(MonthKey::Unknown.is_unknown());
        assert!(!early.is_unknown());
    }

    #[test]
    fn test_monthly_usage_accumulates() {
        let mut usage = MonthlyUsage::new();
        usage.add_conversation(ConversationUsage::new(
            "a".to_string(),
            "first".to_string(),
            None,
            Vec::new(),
            10,
            4,
        ));
        usage.add_conversation(ConversationUsage::new(
            "b".to_string(),
            "second".to_string(),
            None,
            Vec::new(),
            20,
            6,
        ));
        assert_eq!(usage.input_tokens(), 30);
        assert_eq!(usage.output_tokens(), 10);
        assert_eq!(usage.conversation_count(), 2);
    }

    #[test]
    fn test_conversation_defaults() {
        let conversation: Conversation = serde_json::from_str("{}").unwrap();
        assert_eq!(conversation.title(), "No Title");
        assert_eq!(conversation.id(), "No ID");
        assert!(conversation.mapping().is_empty());
        assert!(conversation.current_node().is_none());
    }

    #[test]
    fn test_node_empty_parent_is_root() {
        let node: Node = serde_json::from_str(r#"{"parent": "", "message": null}"#).unwrap();
        assert!(node.parent().is_none());
        assert!(node.message().is_none());
    }
}

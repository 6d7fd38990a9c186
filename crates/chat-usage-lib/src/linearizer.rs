use crate::content::extract_text;
use crate::data_structures::{epoch_to_utc, Conversation, LinearMessage, Node};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::str::FromStr;
use tracing::warn;

/// Which node a walk starts from when the conversation has no `current_node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartNodeRule {
    /// The leaf (a node nobody points at as parent) with the newest message.
    /// Ties go to the leaf that appears later in the mapping.
    #[default]
    LatestLeaf,
    /// The last key of the mapping in document order.
    LastInMapping,
}

impl StartNodeRule {
    pub fn name(&self) -> &'static str {
        match self {
            StartNodeRule::LatestLeaf => "latest-leaf",
            StartNodeRule::LastInMapping => "last-in-mapping",
        }
    }
}

impl FromStr for StartNodeRule {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest-leaf" => Ok(StartNodeRule::LatestLeaf),
            "last-in-mapping" => Ok(StartNodeRule::LastInMapping),
            other => Err(anyhow::anyhow!(
                "Unknown start node rule '{}' (expected latest-leaf or last-in-mapping)",
                other
            )),
        }
    }
}

/// Rebuilds the thread a user actually saw from a conversation's node tree.
#[derive(Debug, Clone, Default)]
pub struct Linearizer {
    start_rule: StartNodeRule,
}

impl Linearizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_rule(start_rule: StartNodeRule) -> Self {
        Self { start_rule }
    }

    pub fn start_rule(&self) -> StartNodeRule {
        self.start_rule
    }

    /// Messages on the path from the root to the current node, oldest first.
    /// Nodes without a message or without a role are left out.
    pub fn linearize(&self, conversation: &Conversation) -> Vec<LinearMessage> {
        let mapping = conversation.mapping();
        let Some(start) = self.start_node(conversation) else {
            return Vec::new();
        };

        self.walk_to_root(mapping, start)
            .into_iter()
            .filter_map(|node_id| {
                let node = mapping.get(node_id)?;
                self.resolve(node_id, node)
            })
            .collect()
    }

    fn start_node<'a>(&self, conversation: &'a Conversation) -> Option<&'a str> {
        if let Some(current) = conversation.current_node() {
            return Some(current);
        }

        let mapping = conversation.mapping();
        match self.start_rule {
            StartNodeRule::LastInMapping => mapping.keys().last().map(String::as_str),
            StartNodeRule::LatestLeaf => {
                Self::latest_leaf(mapping).or_else(|| mapping.keys().last().map(String::as_str))
            }
        }
    }

    fn latest_leaf(mapping: &IndexMap<String, Node>) -> Option<&str> {
        let parents: HashSet<&str> = mapping.values().filter_map(Node::parent).collect();

        let mut best: Option<(&str, f64)> = None;
        for (node_id, node) in mapping {
            if parents.contains(node_id.as_str()) || !node.children().is_empty() {
                continue;
            }
            let created = node
                .message()
                .and_then(|message| message.create_time())
                .filter(|t| t.is_finite())
                .unwrap_or(f64::NEG_INFINITY);
            match best {
                Some((_, best_time)) if created < best_time => {}
                _ => best = Some((node_id.as_str(), created)),
            }
        }

        best.map(|(node_id, _)| node_id)
    }

    /// Identifiers from `start` up to the root, returned root first. A parent
    /// that is missing from the mapping ends the walk; so does a repeated id.
    fn walk_to_root<'a>(&self, mapping: &'a IndexMap<String, Node>, start: &'a str) -> Vec<&'a str> {
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        let mut cursor = Some(start);

        while let Some(node_id) = cursor {
            if !visited.insert(node_id) {
                warn!(node_id, "Parent chain loops back on itself, stopping walk");
                break;
            }
            path.push(node_id);
            cursor = mapping.get(node_id).and_then(Node::parent);
        }

        path.reverse();
        path
    }

    fn resolve(&self, node_id: &str, node: &Node) -> Option<LinearMessage> {
        let message = node.message()?;
        let role = message.role()?;
        let text = extract_text(message.content()).trim().to_string();
        let create_time = message.create_time().and_then(epoch_to_utc);

        Some(LinearMessage::new(node_id.to_string(), role, text, create_time))
    }
}

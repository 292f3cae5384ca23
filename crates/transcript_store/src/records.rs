use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author of one persisted turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "system" => Self::System,
            "user" => Self::User,
            "assistant" => Self::Assistant,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Structured metadata attached to an assistant turn. Persisted as JSON text
/// columns; the usage and cost values round-trip untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnMetadata {
    pub citations: Vec<String>,
    pub usage: Value,
    pub cost: Value,
}

impl TurnMetadata {
    #[must_use]
    pub fn new(citations: Vec<String>, usage: Value, cost: Value) -> Self {
        Self {
            citations,
            usage,
            cost,
        }
    }
}

/// One committed exchange unit. Immutable once persisted, except that the
/// most recently appended turn of a conversation may be rolled back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: i64,
    pub role: Role,
    pub content: String,
    pub timestamp: String,
    pub metadata: Option<TurnMetadata>,
}

/// Fully materialized conversation with its turns in append order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub name: String,
    pub model: String,
    pub created_at: String,
    pub updated_at: String,
    pub turns: Vec<Turn>,
    pub total_cost: f64,
    pub total_tokens: i64,
}

/// List-view projection with a derived turn count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: i64,
    pub name: String,
    pub model: String,
    pub created_at: String,
    pub updated_at: String,
    pub turn_count: i64,
    pub total_cost: f64,
    pub total_tokens: i64,
}

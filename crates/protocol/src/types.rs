use crate::order_key::OrderKey;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Opaque per-tenant capability selecting the schema every core call runs
/// against. Always passed explicitly; never ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tenant(String);

impl Tenant {
    pub fn new(schema: impl Into<String>) -> Self {
        Self(schema.into())
    }

    pub fn schema(&self) -> &str {
        &self.0
    }
}

impl Default for Tenant {
    fn default() -> Self {
        Self("public".to_string())
    }
}

/// A node in the hierarchical topic namespace. `id` is stable and immutable;
/// `path` mutates on rename, which is why turns reference topics by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicPath {
    pub id: i64,
    pub path: String,
    pub group_id: i64,
    #[serde(rename = "index")]
    pub sibling_index: i64,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthorKind {
    Human,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    Regular,
    Comment,
}

/// A single message or comment in a topic's ordered history. Content is
/// immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: i64,
    pub topic_id: i64,
    pub author_kind: AuthorKind,
    pub turn_index: OrderKey,
    pub content_text: String,
    pub content_vector: Option<Vec<f32>>,
    pub turn_kind: TurnKind,
    pub created_at: DateTime<Utc>,
}

/// Lightweight reference to a turn, enough to rank and hydrate later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRef {
    pub turn_id: i64,
    pub topic_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A cross-topic neighbor produced by similarity search. Higher score means
/// more similar regardless of the configured metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedTurn {
    pub turn: TurnRef,
    pub score: f32,
}

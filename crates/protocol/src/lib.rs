use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod labels;
pub mod order_key;
pub mod types;

pub use labels::{validate_label, validate_path, PathSyntaxError, PATH_SEPARATOR};
pub use order_key::{OrderKey, OrderKeyExhausted};
pub use types::{AuthorKind, RelatedTurn, Tenant, TopicPath, Turn, TurnKind, TurnRef};

use std::time::{Duration, Instant};

/// Stable machine-readable error codes surfaced to clients. Raw store errors
/// are logged server-side and mapped onto one of these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Validation,
    Duplicate,
    NotFound,
    Conflict,
    IndexExhausted,
    Timeout,
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::Duplicate => "DUPLICATE",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::IndexExhausted => "INDEX_EXHAUSTED",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Cancellation/timeout context threaded through every store call. Stores
/// check it at entry and inside scan loops and surface `TIMEOUT` instead of
/// blocking past it.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn within(timeout: Duration) -> Self {
        Self(Some(Instant::now() + timeout))
    }

    pub fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    pub fn expired(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}

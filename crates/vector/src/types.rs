use serde::{Deserialize, Serialize};

/// JSON object stored alongside a vector.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// One point to upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorPoint {
    /// UUID string.
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

/// Keyword equality on one payload field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadFilter {
    pub key: String,
    pub value: String,
}

impl PayloadFilter {
    #[must_use]
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

/// A similarity-search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPayload {
    pub id: String,
    pub score: f32,
    pub payload: Payload,
}

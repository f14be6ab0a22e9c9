use serde::{Deserialize, Serialize};

/// Inbound body of `POST /api/v1/query`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Natural-language question. Missing or blank is a malformed request.
    #[serde(default)]
    pub query: Option<String>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
        }
    }

    /// Trimmed query text, or `None` when missing/blank.
    pub fn text(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

/// Answer returned for every well-formed query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The question as submitted.
    pub query: String,
    /// Generated answer text.
    pub answer: String,
}

//! Natural-language classification of cluster questions.
//!
//! A [`Classifier`] turns query text into a raw proposal: text that should
//! encode `{"intent": ..., "parameters": {...}}` but is never trusted. The
//! [`ClassifierAdapter`] parses that proposal and fails closed to
//! `Intent::Unknown`.
//!
//! Tiers:
//! - **Rule-based** (local): keyword and regex rules, no network.
//! - **OpenAI** (cloud): any OpenAI-compatible chat-completions endpoint.
//! - **Bedrock** (cloud): AWS Bedrock Converse API.

pub mod adapter;
pub mod bedrock;
pub mod mock;
pub mod openai;
pub mod prompt;
pub mod rules;
pub mod tiered;

use async_trait::async_trait;

/// Raw classifier output plus the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierReply {
    pub text: String,
    pub tier: String,
}

impl ClassifierReply {
    pub fn new(text: impl Into<String>, tier: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tier: tier.into(),
        }
    }
}

/// Why a classifier produced no proposal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifierError {
    #[error("no rule matched the query")]
    NoMatch,

    #[error("classifier timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("classifier transport error: {0}")]
    Transport(String),

    #[error("classifier rejected credentials: {0}")]
    Auth(String),

    #[error("classifier rate limited")]
    RateLimited,

    #[error("classifier returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("classifier response unreadable: {0}")]
    BadResponse(String),
}

impl ClassifierError {
    /// Short reason code for logs and `ClassificationResult::degraded`.
    pub fn reason_code(&self) -> &'static str {
        match self {
            ClassifierError::NoMatch => "no_match",
            ClassifierError::Timeout { .. } => "timeout",
            ClassifierError::Transport(_) => "transport",
            ClassifierError::Auth(_) => "auth",
            ClassifierError::RateLimited => "rate_limited",
            ClassifierError::Status { .. } => "status",
            ClassifierError::BadResponse(_) => "bad_response",
        }
    }
}

pub type ClassifierResult<T> = Result<T, ClassifierError>;

/// Capability that proposes an intent for free text.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Propose an intent for `text`. The returned text is untrusted.
    async fn classify(&self, text: &str) -> ClassifierResult<ClassifierReply>;

    /// Name of this classifier tier (for logging/audit).
    fn tier_name(&self) -> &str;
}

pub use adapter::ClassifierAdapter;
pub use bedrock::{BedrockClassifier, BedrockConfig};
pub use mock::{FailingClassifier, StaticClassifier};
pub use openai::{OpenAiClassifier, OpenAiConfig};
pub use rules::RuleBasedClassifier;
pub use tiered::TieredClassifier;

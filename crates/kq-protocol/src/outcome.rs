//! Request-scoped results flowing between pipeline stages.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::intent::{Intent, ParameterBag};

/// Kinds of things a lookup can fail to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Namespace,
    Pod,
    Deployment,
    Service,
    Node,
    Secret,
    ResourceQuota,
    Component,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Namespace => "namespace",
            ResourceKind::Pod => "pod",
            ResourceKind::Deployment => "deployment",
            ResourceKind::Service => "service",
            ResourceKind::Node => "node",
            ResourceKind::Secret => "secret",
            ResourceKind::ResourceQuota => "resource quota",
            ResourceKind::Component => "component",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the classifier adapter. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub intent: Intent,
    pub params: ParameterBag,
    /// Classifier tier that produced the proposal (e.g. "local", "openai").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    /// Why the result was forced to `Unknown`, when it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

impl ClassificationResult {
    pub fn new(intent: Intent, params: ParameterBag) -> Self {
        Self {
            intent,
            params,
            tier: None,
            degraded: None,
        }
    }

    /// `Unknown` with an empty bag, recording why.
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            intent: Intent::Unknown,
            params: ParameterBag::new(),
            tier: None,
            degraded: Some(reason.into()),
        }
    }

    pub fn with_tier(mut self, tier: impl Into<String>) -> Self {
        self.tier = Some(tier.into());
        self
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Result of dispatching one intent. Exactly one variant per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// A complete answer sentence.
    Success { answer: String },
    /// The named object does not exist.
    NotFound { kind: ResourceKind, name: String },
    /// Parameters failed a domain rule; `message` is user-facing.
    ValidationFailed { message: String },
    /// The cluster could not be read. `reason` is a short code, `cause`
    /// is operator-only detail and must never reach the user.
    UpstreamFailure { reason: String, cause: String },
}

impl QueryOutcome {
    pub fn success(answer: impl Into<String>) -> Self {
        QueryOutcome::Success {
            answer: answer.into(),
        }
    }

    pub fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        QueryOutcome::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        QueryOutcome::ValidationFailed {
            message: message.into(),
        }
    }

    pub fn upstream_failure(reason: impl Into<String>, cause: impl Into<String>) -> Self {
        QueryOutcome::UpstreamFailure {
            reason: reason.into(),
            cause: cause.into(),
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            QueryOutcome::Success { .. } => "success",
            QueryOutcome::NotFound { .. } => "not_found",
            QueryOutcome::ValidationFailed { .. } => "validation_failed",
            QueryOutcome::UpstreamFailure { .. } => "upstream_failure",
        }
    }
}

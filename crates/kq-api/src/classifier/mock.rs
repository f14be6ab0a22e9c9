//! Stub classifiers for tests and local development.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{Classifier, ClassifierError, ClassifierReply, ClassifierResult};

/// Always replies with the same proposal text.
pub struct StaticClassifier {
    text: String,
    tier: &'static str,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticClassifier {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tier: "static",
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Reply with `{"intent": <intent>, "parameters": <parameters>}`.
    pub fn proposing(intent: &str, parameters: serde_json::Value) -> Self {
        Self::new(
            serde_json::json!({ "intent": intent, "parameters": parameters }).to_string(),
        )
    }

    pub fn with_tier(mut self, tier: &'static str) -> Self {
        self.tier = tier;
        self
    }

    /// Sleep before replying (for timeout tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `classify` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for StaticClassifier {
    async fn classify(&self, _text: &str) -> ClassifierResult<ClassifierReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(ClassifierReply::new(self.text.clone(), self.tier))
    }

    fn tier_name(&self) -> &str {
        self.tier
    }
}

/// Always fails with the same error.
pub struct FailingClassifier {
    error: ClassifierError,
    tier: &'static str,
    calls: AtomicUsize,
}

impl FailingClassifier {
    pub fn new(error: ClassifierError) -> Self {
        Self {
            error,
            tier: "failing",
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_tier(mut self, tier: &'static str) -> Self {
        self.tier = tier;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for FailingClassifier {
    async fn classify(&self, _text: &str) -> ClassifierResult<ClassifierReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }

    fn tier_name(&self) -> &str {
        self.tier
    }
}

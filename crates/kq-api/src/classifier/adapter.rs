//! Turns untrusted classifier output into a `ClassificationResult`.
//!
//! Fails closed: any classifier error, timeout, unparseable text,
//! out-of-vocabulary intent or malformed parameter object yields
//! `Intent::Unknown` with an empty bag. Parameter keys outside the closed
//! key set and non-string values are dropped.

use std::sync::Arc;
use std::time::Duration;

use kq_protocol::{ClassificationResult, Intent, ParamKey, ParameterBag};
use serde_json::Value;

use super::Classifier;

/// Why a proposal was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProposalError {
    #[error("proposal is not valid JSON: {0}")]
    NotJson(String),

    #[error("proposal is not a JSON object")]
    NotObject,

    #[error("proposal has no intent name")]
    MissingIntent,

    #[error("intent '{0}' is not in the closed set")]
    UnknownIntent(String),

    #[error("proposal parameters are not an object")]
    BadParameters,
}

impl ProposalError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            ProposalError::NotJson(_) => "unparseable",
            ProposalError::NotObject => "not_object",
            ProposalError::MissingIntent => "missing_intent",
            ProposalError::UnknownIntent(_) => "out_of_vocabulary",
            ProposalError::BadParameters => "bad_parameters",
        }
    }
}

/// Wraps a [`Classifier`] with a timeout and defensive parsing.
#[derive(Clone)]
pub struct ClassifierAdapter {
    classifier: Arc<dyn Classifier>,
    timeout: Duration,
}

impl ClassifierAdapter {
    pub fn new(classifier: Arc<dyn Classifier>, timeout: Duration) -> Self {
        Self {
            classifier,
            timeout,
        }
    }

    /// Classify `text`. Never fails; degradation is recorded in the result.
    pub async fn classify(&self, text: &str) -> ClassificationResult {
        let tier = self.classifier.tier_name().to_string();

        let reply = match tokio::time::timeout(self.timeout, self.classifier.classify(text)).await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                tracing::warn!(
                    tier = %tier,
                    reason = e.reason_code(),
                    error = %e,
                    "classifier failed, answering as Unknown"
                );
                return ClassificationResult::unknown(e.reason_code()).with_tier(tier);
            }
            Err(_) => {
                tracing::warn!(
                    tier = %tier,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "classifier timed out, answering as Unknown"
                );
                return ClassificationResult::unknown("timeout").with_tier(tier);
            }
        };

        match parse_proposal(&reply.text) {
            Ok((intent, params)) => {
                tracing::debug!(tier = %reply.tier, intent = %intent, "classified query");
                ClassificationResult::new(intent, params).with_tier(reply.tier)
            }
            Err(e) => {
                tracing::warn!(
                    tier = %reply.tier,
                    reason = e.reason_code(),
                    error = %e,
                    raw = %reply.text,
                    "classifier proposal rejected, answering as Unknown"
                );
                ClassificationResult::unknown(e.reason_code()).with_tier(reply.tier)
            }
        }
    }
}

/// Parse proposal text into an intent and a filtered parameter bag.
pub fn parse_proposal(text: &str) -> Result<(Intent, ParameterBag), ProposalError> {
    let value: Value =
        serde_json::from_str(extract_json(text)).map_err(|e| ProposalError::NotJson(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(ProposalError::NotObject);
    };

    let name = map
        .get("intent")
        .and_then(Value::as_str)
        .ok_or(ProposalError::MissingIntent)?;
    let intent: Intent = name
        .trim()
        .parse()
        .map_err(|_| ProposalError::UnknownIntent(name.to_string()))?;

    if intent == Intent::Unknown {
        return Ok((intent, ParameterBag::new()));
    }

    let params = match map.get("parameters") {
        None | Some(Value::Null) => ParameterBag::new(),
        Some(Value::Object(obj)) => obj
            .iter()
            .filter_map(|(key, value)| Some((ParamKey::parse(key)?, value.as_str()?.to_string())))
            .collect(),
        Some(_) => return Err(ProposalError::BadParameters),
    };

    Ok((intent, params))
}

/// Extract JSON from LLM output that may be wrapped in markdown code blocks.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    // Try ```json ... ``` first
    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }

    // Try ``` ... ```
    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }

    // Prose around a bare object
    if !trimmed.starts_with('{')
        && let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && start < end
    {
        return &trimmed[start..=end];
    }

    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifierError, FailingClassifier, StaticClassifier};
    use serde_json::json;

    fn adapter(classifier: impl Classifier + 'static) -> ClassifierAdapter {
        ClassifierAdapter::new(Arc::new(classifier), Duration::from_millis(200))
    }

    // ── extract_json ─────────────────────────────────────────────

    #[test]
    fn extract_json_raw() {
        let input = r#"{"intent": "ListPods", "parameters": {}}"#;
        assert_eq!(extract_json(input), input);
    }

    #[test]
    fn extract_json_markdown_json_block() {
        let input = "```json\n{\"intent\": \"ListNodes\"}\n```";
        assert_eq!(extract_json(input), "{\"intent\": \"ListNodes\"}");
    }

    #[test]
    fn extract_json_markdown_plain_block() {
        let input = "```\n{\"intent\": \"ListNodes\"}\n```";
        assert_eq!(extract_json(input), "{\"intent\": \"ListNodes\"}");
    }

    #[test]
    fn extract_json_with_surrounding_prose() {
        let input = "Sure! {\"intent\": \"ListNodes\"} Hope that helps.";
        assert_eq!(extract_json(input), "{\"intent\": \"ListNodes\"}");
    }

    // ── parse_proposal ───────────────────────────────────────────

    #[test]
    fn parses_intent_and_known_string_params() {
        let text = json!({
            "intent": "GetContainerPort",
            "parameters": {"component": "harbor-core", "namespace": "harbor"}
        })
        .to_string();
        let (intent, params) = parse_proposal(&text).unwrap();
        assert_eq!(intent, Intent::GetContainerPort);
        assert_eq!(params.get(ParamKey::Component), Some("harbor-core"));
        assert_eq!(params.get(ParamKey::Namespace), Some("harbor"));
    }

    #[test]
    fn drops_unknown_keys_and_non_string_values() {
        let text = json!({
            "intent": "ListPods",
            "parameters": {"namespace": 7, "label": "app=web", "; rm -rf": "x"}
        })
        .to_string();
        let (_, params) = parse_proposal(&text).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get(ParamKey::Label), Some("app=web"));
    }

    #[test]
    fn missing_parameters_is_empty_bag() {
        let (intent, params) = parse_proposal(r#"{"intent": "ListNodes"}"#).unwrap();
        assert_eq!(intent, Intent::ListNodes);
        assert!(params.is_empty());
    }

    #[test]
    fn rejects_malformed_proposals() {
        let cases = [
            ("not json at all", "unparseable"),
            ("[1, 2, 3]", "not_object"),
            (r#"{"parameters": {}}"#, "missing_intent"),
            (r#"{"intent": 42}"#, "missing_intent"),
            (r#"{"intent": "DeleteEverything"}"#, "out_of_vocabulary"),
            (r#"{"intent": "listpods"}"#, "out_of_vocabulary"),
            (r#"{"intent": "ListPods", "parameters": ["all"]}"#, "bad_parameters"),
        ];
        for (text, reason) in cases {
            let err = parse_proposal(text).unwrap_err();
            assert_eq!(err.reason_code(), reason, "input: {text}");
        }
    }

    // ── ClassifierAdapter ────────────────────────────────────────

    #[tokio::test]
    async fn valid_proposal_is_passed_through() {
        let adapter = adapter(
            StaticClassifier::proposing("ListPods", json!({"namespace": "all"})).with_tier("openai"),
        );
        let result = adapter.classify("how many pods?").await;
        assert_eq!(result.intent, Intent::ListPods);
        assert_eq!(result.params.get(ParamKey::Namespace), Some("all"));
        assert_eq!(result.tier.as_deref(), Some("openai"));
        assert!(!result.is_degraded());
    }

    #[tokio::test]
    async fn garbage_degrades_to_unknown() {
        let result = adapter(StaticClassifier::new("I think you mean pods?"))
            .classify("pods")
            .await;
        assert_eq!(result.intent, Intent::Unknown);
        assert!(result.params.is_empty());
        assert_eq!(result.degraded.as_deref(), Some("unparseable"));
    }

    #[tokio::test]
    async fn classifier_errors_degrade_to_unknown() {
        for error in [
            ClassifierError::Auth("bad key".into()),
            ClassifierError::RateLimited,
            ClassifierError::Transport("connection refused".into()),
            ClassifierError::Timeout { timeout_ms: 5000 },
        ] {
            let code = error.reason_code();
            let result = adapter(FailingClassifier::new(error)).classify("pods").await;
            assert_eq!(result.intent, Intent::Unknown);
            assert_eq!(result.degraded.as_deref(), Some(code));
        }
    }

    #[tokio::test]
    async fn slow_classifier_times_out_to_unknown() {
        let slow = StaticClassifier::proposing("ListPods", json!({}))
            .with_delay(Duration::from_secs(5));
        let result = adapter(slow).classify("pods").await;
        assert_eq!(result.intent, Intent::Unknown);
        assert_eq!(result.degraded.as_deref(), Some("timeout"));
    }
}

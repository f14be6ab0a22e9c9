//! AWS Bedrock classifier via the Converse API.
//!
//! Model-agnostic (Nova Lite, Claude, Llama...). Credentials come from the
//! standard AWS provider chain via `aws-config`.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_bedrockruntime::Client as BedrockClient;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, ConverseOutput, Message, SystemContentBlock,
};
use serde::Deserialize;
use tokio::time::timeout;

use super::prompt::system_prompt;
use super::{Classifier, ClassifierError, ClassifierReply, ClassifierResult};

/// Configuration for the Bedrock classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct BedrockConfig {
    /// Bedrock model ID (e.g., "us.amazon.nova-lite-v1:0").
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model_id() -> String {
    "us.amazon.nova-lite-v1:0".into()
}

fn default_timeout_secs() -> u64 {
    5
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Bedrock Converse API classifier.
pub struct BedrockClassifier {
    client: BedrockClient,
    config: BedrockConfig,
    prompt: String,
}

impl BedrockClassifier {
    /// Create a classifier with a pre-built Bedrock client.
    pub fn new(client: BedrockClient, config: BedrockConfig) -> Self {
        Self {
            client,
            config,
            prompt: system_prompt(),
        }
    }

    /// Build a client from the ambient AWS configuration.
    pub async fn from_env(config: BedrockConfig) -> Self {
        let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(BedrockClient::new(&aws), config)
    }

    /// Call the Converse API and return the first text block.
    async fn call_converse(&self, text: &str) -> ClassifierResult<String> {
        let user_message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(text.to_string()))
            .build()
            .map_err(|e| ClassifierError::BadResponse(format!("failed to build message: {e}")))?;

        let response = self
            .client
            .converse()
            .model_id(&self.config.model_id)
            .system(SystemContentBlock::Text(self.prompt.clone()))
            .messages(user_message)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e.to_string()))?;

        let output = response
            .output()
            .ok_or_else(|| ClassifierError::BadResponse("no output in bedrock response".into()))?;

        let text_content = match output {
            ConverseOutput::Message(msg) => msg.content().iter().find_map(|block| {
                if let ContentBlock::Text(t) = block {
                    Some(t.clone())
                } else {
                    None
                }
            }),
            _ => None,
        };

        text_content.ok_or_else(|| ClassifierError::BadResponse("no text block".into()))
    }
}

/// Map an SDK error message onto the classifier taxonomy.
fn classify_sdk_error(message: &str) -> ClassifierError {
    let lower = message.to_lowercase();
    if lower.contains("throttl") || lower.contains("too many requests") {
        ClassifierError::RateLimited
    } else if lower.contains("accessdenied")
        || lower.contains("access denied")
        || lower.contains("unrecognizedclient")
        || lower.contains("security token")
    {
        ClassifierError::Auth(message.to_string())
    } else {
        ClassifierError::Transport(message.to_string())
    }
}

#[async_trait]
impl Classifier for BedrockClassifier {
    async fn classify(&self, text: &str) -> ClassifierResult<ClassifierReply> {
        let limit = Duration::from_secs(self.config.timeout_secs);
        match timeout(limit, self.call_converse(text)).await {
            Ok(Ok(raw)) => Ok(ClassifierReply::new(raw, "bedrock")),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ClassifierError::Timeout {
                timeout_ms: limit.as_millis() as u64,
            }),
        }
    }

    fn tier_name(&self) -> &str {
        "bedrock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttling_is_rate_limited() {
        assert_eq!(
            classify_sdk_error("ThrottlingException: Too many requests"),
            ClassifierError::RateLimited
        );
    }

    #[test]
    fn access_denied_is_auth() {
        let err = classify_sdk_error("AccessDeniedException: not authorized to invoke model");
        assert_eq!(err.reason_code(), "auth");
    }

    #[test]
    fn other_errors_are_transport() {
        let err = classify_sdk_error("dispatch failure: connection reset");
        assert_eq!(err.reason_code(), "transport");
    }

    #[test]
    fn config_defaults() {
        let config = BedrockConfig::default();
        assert_eq!(config.model_id, "us.amazon.nova-lite-v1:0");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn config_from_toml() {
        let config: BedrockConfig =
            toml::from_str(r#"model_id = "anthropic.claude-3-haiku-20240307-v1:0""#).unwrap();
        assert_eq!(config.model_id, "anthropic.claude-3-haiku-20240307-v1:0");
        assert_eq!(config.timeout_secs, 5);
    }
}

//! OpenAI-compatible chat-completions classifier.
//!
//! Works against api.openai.com or any server exposing the same
//! `/chat/completions` shape (vLLM, LiteLLM, Ollama's OpenAI endpoint).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::prompt::system_prompt;
use super::{Classifier, ClassifierError, ClassifierReply, ClassifierResult};

/// Settings for the OpenAI-compatible endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    /// API base URL, without the `/chat/completions` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Bearer token. Required when this provider is selected.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_timeout_secs() -> u64 {
    8
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Chat-completions request body.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat-completions response (only fields we need).
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Classifier backed by an OpenAI-compatible endpoint.
pub struct OpenAiClassifier {
    client: reqwest::Client,
    config: OpenAiConfig,
    prompt: String,
}

impl OpenAiClassifier {
    pub fn new(config: OpenAiConfig) -> ClassifierResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            config,
            prompt: system_prompt(),
        })
    }

    fn map_transport(&self, e: reqwest::Error) -> ClassifierError {
        if e.is_timeout() {
            ClassifierError::Timeout {
                timeout_ms: self.config.timeout_secs * 1000,
            }
        } else if e.is_decode() {
            ClassifierError::BadResponse(e.to_string())
        } else {
            ClassifierError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl Classifier for OpenAiClassifier {
    async fn classify(&self, text: &str) -> ClassifierResult<ClassifierReply> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.0,
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            let message: String = message.chars().take(200).collect();
            return Err(match status.as_u16() {
                401 | 403 => ClassifierError::Auth(message),
                429 => ClassifierError::RateLimited,
                code => ClassifierError::Status {
                    status: code,
                    message,
                },
            });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| self.map_transport(e))?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ClassifierError::BadResponse("no message content".into()))?;

        tracing::debug!(model = %self.config.model, "openai classification received");
        Ok(ClassifierReply::new(content, "openai"))
    }

    fn tier_name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Helper: build a chat-completions response body.
    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        })
    }

    fn classifier_for(server: &MockServer) -> OpenAiClassifier {
        OpenAiClassifier::new(OpenAiConfig {
            base_url: format!("{}/v1", server.uri()),
            model: "gpt-4o-mini".into(),
            api_key: Some("sk-test".into()),
            timeout_secs: 1,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn returns_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                r#"{"intent": "ListNodes", "parameters": {}}"#,
            )))
            .mount(&server)
            .await;

        let reply = classifier_for(&server).classify("how many nodes?").await.unwrap();
        assert_eq!(reply.tier, "openai");
        assert!(reply.text.contains("ListNodes"));
    }

    #[tokio::test]
    async fn unauthorized_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = classifier_for(&server).classify("pods").await.unwrap_err();
        assert_eq!(err.reason_code(), "auth");
    }

    #[tokio::test]
    async fn too_many_requests_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = classifier_for(&server).classify("pods").await.unwrap_err();
        assert_eq!(err, ClassifierError::RateLimited);
    }

    #[tokio::test]
    async fn server_error_is_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = classifier_for(&server).classify("pods").await.unwrap_err();
        assert!(matches!(err, ClassifierError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("{}"))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        // Client timeout is 1s, mock delays 5s → timeout
        let err = classifier_for(&server).classify("pods").await.unwrap_err();
        assert_eq!(err.reason_code(), "timeout");
    }

    #[tokio::test]
    async fn empty_choices_is_bad_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let err = classifier_for(&server).classify("pods").await.unwrap_err();
        assert_eq!(err.reason_code(), "bad_response");
    }

    #[test]
    fn config_defaults() {
        let config = OpenAiConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.model, "gpt-4o-mini");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn config_from_toml() {
        let config: OpenAiConfig = toml::from_str(
            r#"
base_url = "http://localhost:11434/v1"
model = "llama3.1"
api_key = "ollama"
"#,
        )
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:11434/v1");
        assert_eq!(config.model, "llama3.1");
        assert_eq!(config.timeout_secs, 8);
    }
}

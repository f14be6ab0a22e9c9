//! Server configuration, loadable from TOML and environment.

use anyhow::Context;
use kq_cluster::ClusterConfig;
use serde::Deserialize;

use crate::classifier::{BedrockConfig, OpenAiConfig};

/// Top-level API server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Listen address (e.g., "0.0.0.0").
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on one classification, in seconds.
    #[serde(default = "default_classify_timeout")]
    pub classify_timeout_secs: u64,
    /// Upper bound on one dispatch (all cluster reads for a query), in seconds.
    #[serde(default = "default_cluster_timeout")]
    pub cluster_timeout_secs: u64,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_classify_timeout() -> u64 {
    10
}

fn default_cluster_timeout() -> u64 {
    15
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            classify_timeout_secs: default_classify_timeout(),
            cluster_timeout_secs: default_cluster_timeout(),
            classifier: ClassifierConfig::default(),
            cluster: ClusterConfig::default(),
        }
    }
}

/// Which classifier answers `Classify(text)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierProvider {
    /// Deterministic keyword rules only.
    #[default]
    Rules,
    OpenAi,
    Bedrock,
}

impl std::str::FromStr for ClassifierProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rules" | "local" => Ok(Self::Rules),
            "openai" => Ok(Self::OpenAi),
            "bedrock" => Ok(Self::Bedrock),
            other => anyhow::bail!("unknown classifier provider '{other}'"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub provider: ClassifierProvider,
    /// Try the rule-based classifier before an LLM provider.
    #[serde(default = "default_local_first")]
    pub local_first: bool,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub bedrock: BedrockConfig,
}

fn default_local_first() -> bool {
    true
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: ClassifierProvider::default(),
            local_first: default_local_first(),
            openai: OpenAiConfig::default(),
            bedrock: BedrockConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
        let config: Self =
            toml::from_str(&contents).with_context(|| format!("parsing config {path}"))?;
        Ok(config)
    }

    /// File named by `KQ_CONFIG` (if any), then environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var("KQ_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_vars(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay environment-style variables from `var`.
    pub fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(host) = var("KQ_HOST") {
            self.host = host;
        }
        if let Some(port) = var("KQ_PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("KQ_PORT is not a port number: {port}"))?;
        }
        if let Some(provider) = var("KQ_CLASSIFIER") {
            self.classifier.provider = provider.parse()?;
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            self.classifier.openai.api_key = Some(key);
        }
        if let Some(url) = var("OPENAI_BASE_URL") {
            self.classifier.openai.base_url = url;
        }
        if let Some(model) = var("OPENAI_MODEL") {
            self.classifier.openai.model = model;
        }
        if let Some(model) = var("BEDROCK_MODEL_ID") {
            self.classifier.bedrock.model_id = model;
        }
        self.cluster.apply_vars(&var)?;
        Ok(())
    }
}

//! Shared application state for the Axum server.
//!
//! Supports two cluster modes:
//! - **Live**: `HttpClusterReader` against the API server (production).
//! - **Sample**: seeded `MockClusterReader` (tests and development).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use kq_cluster::{ClusterConfig, ClusterMode, ClusterReader, HttpClusterReader, MockClusterReader};

use crate::classifier::{
    BedrockClassifier, Classifier, ClassifierAdapter, OpenAiClassifier, RuleBasedClassifier,
    TieredClassifier,
};
use crate::config::{ApiConfig, ClassifierConfig, ClassifierProvider};
use crate::dispatch::Dispatcher;
use crate::pipeline::QueryPipeline;

/// Shared application state, wrapped in `Arc` for Axum handler sharing.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<QueryPipeline>,
}

impl AppState {
    pub fn new(pipeline: QueryPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// Wire a classifier and a cluster reader with the configured timeouts.
    pub fn from_parts(
        classifier: Arc<dyn Classifier>,
        reader: Arc<dyn ClusterReader>,
        config: &ApiConfig,
    ) -> Self {
        let adapter = ClassifierAdapter::new(
            classifier,
            Duration::from_secs(config.classify_timeout_secs),
        );
        Self::new(QueryPipeline::new(
            adapter,
            Dispatcher::new(reader),
            Duration::from_secs(config.cluster_timeout_secs),
        ))
    }

    /// Rule-based classifier over the seeded sample cluster.
    pub fn with_sample_data() -> Self {
        Self::from_parts(
            Arc::new(RuleBasedClassifier::new()),
            Arc::new(MockClusterReader::with_sample_cluster()),
            &ApiConfig::default(),
        )
    }
}

/// Build the cluster reader. In live mode the API server must answer
/// `GET /version` or startup fails.
pub async fn build_cluster_reader(config: &ClusterConfig) -> anyhow::Result<Arc<dyn ClusterReader>> {
    match config.mode {
        ClusterMode::Sample => {
            tracing::warn!("cluster mode is sample, answering from seeded in-memory data");
            Ok(Arc::new(MockClusterReader::with_sample_cluster()))
        }
        ClusterMode::Live => {
            let reader = HttpClusterReader::connect(config)
                .await
                .context("cluster API server unavailable")?;
            Ok(Arc::new(reader))
        }
    }
}

/// Build the configured classifier, wrapping LLM providers behind the local
/// rules when `local_first` is set.
pub async fn build_classifier(config: &ClassifierConfig) -> anyhow::Result<Arc<dyn Classifier>> {
    let cloud: Box<dyn Classifier> = match config.provider {
        ClassifierProvider::Rules => return Ok(Arc::new(RuleBasedClassifier::new())),
        ClassifierProvider::OpenAi => {
            anyhow::ensure!(
                config.openai.api_key.as_deref().is_some_and(|k| !k.is_empty()),
                "classifier provider is openai but no API key is configured (set OPENAI_API_KEY)"
            );
            Box::new(
                OpenAiClassifier::new(config.openai.clone())
                    .context("failed to build OpenAI classifier")?,
            )
        }
        ClassifierProvider::Bedrock => {
            Box::new(BedrockClassifier::from_env(config.bedrock.clone()).await)
        }
    };

    tracing::info!(
        provider = cloud.tier_name(),
        local_first = config.local_first,
        "classifier configured"
    );
    Ok(if config.local_first {
        Arc::new(TieredClassifier::new(
            Box::new(RuleBasedClassifier::new()),
            cloud,
        ))
    } else {
        Arc::from(cloud)
    })
}

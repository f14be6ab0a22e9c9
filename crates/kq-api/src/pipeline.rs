//! The query pipeline: classify → normalize → validate → dispatch → render.

use std::time::Duration;

use kq_protocol::{ClassificationResult, ParameterBag, QueryOutcome};

use crate::classifier::ClassifierAdapter;
use crate::dispatch::Dispatcher;
use crate::format;
use crate::validate;

/// Everything the pipeline decided for one query.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub classification: ClassificationResult,
    /// Parameters after normalization.
    pub params: ParameterBag,
    pub outcome: QueryOutcome,
    pub answer: String,
}

pub struct QueryPipeline {
    adapter: ClassifierAdapter,
    dispatcher: Dispatcher,
    cluster_timeout: Duration,
}

impl QueryPipeline {
    pub fn new(adapter: ClassifierAdapter, dispatcher: Dispatcher, cluster_timeout: Duration) -> Self {
        Self {
            adapter,
            dispatcher,
            cluster_timeout,
        }
    }

    /// Answer text for `text`. Never fails.
    pub async fn answer(&self, text: &str) -> String {
        self.run(text).await.answer
    }

    pub async fn run(&self, text: &str) -> PipelineReport {
        let classification = self.adapter.classify(text).await;
        let intent = classification.intent;
        let params = validate::normalize(intent, classification.params.clone());

        let outcome = match validate::validate(intent, &params) {
            Err(e) => {
                tracing::info!(intent = %intent, error = %e, "parameters rejected");
                QueryOutcome::validation_failed(e.to_string())
            }
            Ok(()) => self.dispatch_bounded(intent, &params).await,
        };

        let answer = format::render(&outcome);
        tracing::info!(
            intent = %intent,
            tier = classification.tier.as_deref().unwrap_or("none"),
            degraded = classification.degraded.as_deref(),
            outcome = outcome.label(),
            "query answered"
        );

        PipelineReport {
            classification,
            params,
            outcome,
            answer,
        }
    }

    async fn dispatch_bounded(
        &self,
        intent: kq_protocol::Intent,
        params: &ParameterBag,
    ) -> QueryOutcome {
        match tokio::time::timeout(self.cluster_timeout, self.dispatcher.dispatch(intent, params))
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                let timeout_ms = self.cluster_timeout.as_millis() as u64;
                tracing::warn!(intent = %intent, timeout_ms, "cluster read timed out");
                QueryOutcome::upstream_failure(
                    "timeout",
                    format!("dispatch exceeded {timeout_ms}ms"),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::classifier::{
        ClassifierError, FailingClassifier, RuleBasedClassifier, StaticClassifier,
    };
    use crate::dispatch::UNKNOWN_ANSWER;
    use crate::format::UPSTREAM_APOLOGY;
    use kq_cluster::{ClusterError, MockClusterReader};
    use kq_protocol::{Intent, ParamKey};
    use serde_json::json;

    fn pipeline(
        classifier: impl crate::classifier::Classifier + 'static,
        mock: Arc<MockClusterReader>,
    ) -> QueryPipeline {
        QueryPipeline::new(
            ClassifierAdapter::new(Arc::new(classifier), Duration::from_secs(2)),
            Dispatcher::new(mock),
            Duration::from_secs(2),
        )
    }

    #[tokio::test]
    async fn prefixed_component_answers() {
        let mock = Arc::new(MockClusterReader::with_sample_cluster());
        let p = pipeline(
            StaticClassifier::proposing("GetContainerPort", json!({"component": "harbor-core"})),
            mock,
        );
        let report = p.run("what port does harbor-core use?").await;
        assert_eq!(report.params.get(ParamKey::Component), Some("core"));
        assert_eq!(report.answer, "The container port for 'core' is 8080/TCP.");
    }

    #[tokio::test]
    async fn validation_failure_skips_cluster() {
        let mock = Arc::new(MockClusterReader::with_sample_cluster());
        let p = pipeline(
            StaticClassifier::proposing("GetContainerPort", json!({"component": "frobnicator"})),
            mock.clone(),
        );
        let report = p.run("port of frobnicator").await;
        assert_eq!(report.outcome.label(), "validation_failed");
        assert!(report.answer.contains("core, database, jobservice"));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn classifier_failure_is_unknown() {
        let mock = Arc::new(MockClusterReader::with_sample_cluster());
        let p = pipeline(
            FailingClassifier::new(ClassifierError::Transport("connection refused".into())),
            mock.clone(),
        );
        let report = p.run("how many pods?").await;
        assert_eq!(report.classification.intent, Intent::Unknown);
        assert_eq!(report.answer, UNKNOWN_ANSWER);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn cluster_failure_renders_apology() {
        let mut mock = MockClusterReader::with_sample_cluster();
        mock.fail_on(
            "list_nodes",
            ClusterError::Unauthorized("token rejected: eyJhbGciOi".into()),
        );
        let p = pipeline(StaticClassifier::proposing("ListNodes", json!({})), Arc::new(mock));

        let report = p.run("how many nodes?").await;
        assert_eq!(report.answer, UPSTREAM_APOLOGY);
        assert!(!report.answer.contains("eyJ"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_cluster_times_out() {
        let mock = MockClusterReader::with_sample_cluster().with_delay(Duration::from_secs(30));
        let p = pipeline(StaticClassifier::proposing("ListNodes", json!({})), Arc::new(mock));

        let report = p.run("how many nodes?").await;
        match report.outcome {
            QueryOutcome::UpstreamFailure { reason, .. } => assert_eq!(reason, "timeout"),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rules_end_to_end() {
        let mock = Arc::new(MockClusterReader::with_sample_cluster());
        let p = pipeline(RuleBasedClassifier::new(), mock);
        let answer = p.answer("What is the readiness probe path for the harbor core?").await;
        assert_eq!(answer, "The readiness probe path for 'core' is: /api/v2.0/ping.");
    }
}

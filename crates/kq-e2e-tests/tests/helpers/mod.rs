//! Shared test harness for E2E integration tests.
//!
//! Wires a classifier and a `MockClusterReader` into the real router, so
//! every request crosses the protocol, classifier, dispatch and HTTP layers.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use kq_api::classifier::{Classifier, RuleBasedClassifier, StaticClassifier};
use kq_api::config::ApiConfig;
use kq_api::routes::build_router;
use kq_api::state::AppState;
use kq_cluster::MockClusterReader;

/// End-to-end harness around one router instance.
pub struct TestHarness {
    /// Axum router for HTTP requests via `tower::oneshot`.
    pub router: Router,
    /// The cluster the dispatcher reads; inspect `calls()` after a request.
    pub cluster: Arc<MockClusterReader>,
}

impl TestHarness {
    /// Build a harness from any classifier and cluster with default timeouts.
    pub fn new(classifier: Arc<dyn Classifier>, cluster: MockClusterReader) -> Self {
        Self::with_config(classifier, cluster, &ApiConfig::default())
    }

    pub fn with_config(
        classifier: Arc<dyn Classifier>,
        cluster: MockClusterReader,
        config: &ApiConfig,
    ) -> Self {
        let cluster = Arc::new(cluster);
        let state = AppState::from_parts(classifier, cluster.clone(), config);
        Self {
            router: build_router(state),
            cluster,
        }
    }

    /// Rule-based classifier over the seeded Harbor sample cluster.
    pub fn with_sample_data() -> Self {
        Self::new(
            Arc::new(RuleBasedClassifier::new()),
            MockClusterReader::with_sample_cluster(),
        )
    }

    /// Classifier stub that always proposes `intent` with `parameters`.
    pub fn proposing(
        intent: &str,
        parameters: serde_json::Value,
        cluster: MockClusterReader,
    ) -> Self {
        Self::new(
            Arc::new(StaticClassifier::proposing(intent, parameters)),
            cluster,
        )
    }

    /// Ask a question via POST /api/v1/query.
    /// Returns (HTTP status code, response JSON body).
    pub async fn ask(&self, query: &str) -> (StatusCode, serde_json::Value) {
        let body = serde_json::json!({ "query": query });
        self.post_query(Body::from(serde_json::to_vec(&body).unwrap()))
            .await
    }

    /// Answer text for `query`, asserting a 200.
    pub async fn answer(&self, query: &str) -> String {
        let (status, json) = self.ask(query).await;
        assert_eq!(status, StatusCode::OK, "query '{query}' returned {json}");
        json["answer"].as_str().unwrap().to_string()
    }

    /// POST an arbitrary JSON-typed body to /api/v1/query.
    pub async fn post_query(&self, body: Body) -> (StatusCode, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::post("/api/v1/query")
                    .header("content-type", "application/json")
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }

    /// GET a path and decode the JSON body.
    pub async fn get(&self, path: &str) -> (StatusCode, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }
}

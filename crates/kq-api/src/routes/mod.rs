//! API route definitions and router builder.

pub mod health;
pub mod intents;
pub mod query;

use axum::Router;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/query", post(query::answer_query))
        .route("/intents", get(intents::list_intents));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(AppState::with_sample_data())
    }

    async fn post_raw(body: &'static str) -> (StatusCode, serde_json::Value) {
        let response = app()
            .oneshot(
                Request::post("/api/v1/query")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["version"].is_string());
    }

    #[tokio::test]
    async fn query_answers() {
        let (status, json) =
            post_raw(r#"{"query": "What is the container port for harbor-core?"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["query"], "What is the container port for harbor-core?");
        assert_eq!(json["answer"], "The container port for 'core' is 8080/TCP.");
    }

    #[tokio::test]
    async fn unknown_question_is_still_200() {
        let (status, json) = post_raw(r#"{"query": "what is the meaning of life?"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["answer"].as_str().unwrap().contains("couldn't understand"));
    }

    #[tokio::test]
    async fn query_is_echoed_as_submitted() {
        let (status, json) = post_raw("{\"query\": \"\\tHow many nodes are there? \\n\"}").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["query"], "\tHow many nodes are there? \n");
        assert!(json["answer"].as_str().unwrap().contains("3 nodes"));
    }

    #[tokio::test]
    async fn missing_query_is_400() {
        for body in [r#"{}"#, r#"{"query": "   "}"#, r#"{"query": null}"#, "not json"] {
            let (status, json) = post_raw(body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(json["error"], "No query provided.");
            assert_eq!(json["status"], 400);
        }
    }

    #[tokio::test]
    async fn missing_content_type_is_400() {
        let response = app()
            .oneshot(
                Request::post("/api/v1/query")
                    .body(Body::from(r#"{"query": "how many pods?"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn intents_catalog() {
        let response = app()
            .oneshot(Request::get("/api/v1/intents").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["intents"].as_array().unwrap().len(), 19);
        assert_eq!(json["components"].as_array().unwrap().len(), 7);

        let logs = json["intents"]
            .as_array()
            .unwrap()
            .iter()
            .find(|i| i["intent"] == "GetPodLogs")
            .unwrap();
        assert_eq!(logs["required"], serde_json::json!(["pod_name"]));
        assert_eq!(logs["namespace"], "defaulted");
    }
}

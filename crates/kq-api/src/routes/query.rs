//! Natural-language query endpoint.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use kq_protocol::{QueryRequest, QueryResponse};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::format;
use crate::state::AppState;

/// POST /api/v1/query - answer one question about the cluster.
///
/// A body that is not JSON, or has no non-blank `query`, is rejected with
/// 400 before any pipeline stage runs.
pub async fn answer_query(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<QueryResponse>)> {
    let Json(request) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "unreadable query body");
        ApiError::MalformedRequest
    })?;
    let text = request.text().ok_or(ApiError::MalformedRequest)?.to_string();

    let request_id = Uuid::now_v7();
    let span = tracing::info_span!("query", %request_id);
    let report = state.pipeline.run(&text).instrument(span).await;

    // Echo the question as submitted; only classification sees the trimmed text.
    Ok((
        format::http_status(&report.outcome),
        Json(QueryResponse {
            query: request.query.unwrap_or_default(),
            answer: report.answer,
        }),
    ))
}

use axum::{Form, Json, extract::State, http::StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub q: String,
}

/// POST /db — runs the ingestion pipeline for the `q` search query.
pub async fn trigger_ingest(
    State(state): State<Arc<AppState>>,
    Form(body): Form<IngestRequest>,
) -> Result<(StatusCode, Json<ApiResponse<String>>), ApiError> {
    if body.q.is_empty() {
        return Err(ApiError::validation(
            "Invalid key has been passed in request body.",
        ));
    }

    let summary = state.ingest_service().ingest(&body.q).await?;
    info!(
        query = %body.q,
        created = summary.created,
        updated = summary.updated,
        "ingestion run complete"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(format!("Success: q={}", body.q))),
    ))
}

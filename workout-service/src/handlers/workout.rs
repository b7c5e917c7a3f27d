use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{ErrorResponse, GenerateWorkoutRequest, GenerateWorkoutResponse};
use crate::services::providers::ProviderError;
use crate::startup::AppState;

/// Everything that can go wrong while serving a generation request.
///
/// Every variant renders the same way: 500 with `{"error": <message>}`.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{0}")]
    InvalidBody(#[from] JsonRejection),

    #[error("{0}")]
    InvalidPrompt(#[from] serde_json::Error),

    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl IntoResponse for GenerationError {
    fn into_response(self) -> Response {
        let mut error = self.to_string();
        if error.trim().is_empty() {
            error = "Request failed".to_string();
        }

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { error }),
        )
            .into_response()
    }
}

#[tracing::instrument(skip(state, payload))]
pub async fn generate_workout(
    State(state): State<AppState>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<GenerateWorkoutResponse>, GenerationError> {
    // Only JSON objects are accepted; arrays must not fill fields positionally.
    let request = payload
        .map_err(GenerationError::from)
        .and_then(|Json(body)| {
            GenerateWorkoutRequest::deserialize(Value::Object(body)).map_err(GenerationError::from)
        })
        .map_err(|e| {
            tracing::warn!(error = %e, "Rejected workout request body");
            e
        })?;

    let result = state
        .provider
        .generate(&request.prompt)
        .await
        .map_err(|e| {
            tracing::error!(
                model = %state.provider.model(),
                error = %e,
                "Workout generation failed"
            );
            e
        })?;

    tracing::info!(
        model = %state.provider.model(),
        prompt_len = request.prompt.len(),
        result_len = result.len(),
        "Workout generated"
    );

    Ok(Json(GenerateWorkoutResponse { result }))
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not found".to_string(),
        }),
    )
}

//! Prediction handler

use axum::{extract::{rejection::JsonRejection, State}, Json};
use serde::Serialize;
use serde_json::Value;

use crate::{AppState, AppError, AppResult};
use crate::models::Feedback;
use crate::prediction;

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: i64,
    pub label: String,
    pub feedback_stored: bool,
}

/// Classify one candidate and record the user's label when one is given
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<PredictResponse>> {
    let model = state.model.as_deref().ok_or(AppError::ModelUnavailable)?;

    let Json(body) = body?;
    tracing::debug!("Received input: {}", body);

    let payload = body
        .as_object()
        .ok_or_else(|| AppError::InvalidPayload("Request body must be a JSON object".to_string()))?;

    let known_disposition = prediction::known_disposition(payload)?;
    let (result, features) = prediction::predict(model, payload)?;

    let feedback_stored = match known_disposition {
        Some(user_label) => {
            Feedback::store(&state.pool, &features.raw, result.prediction, &result.label, &user_label).await
        }
        None => false,
    };

    Ok(Json(PredictResponse {
        prediction: result.prediction,
        label: result.label,
        feedback_stored,
    }))
}

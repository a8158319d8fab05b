//! Feedback handlers

use axum::{extract::State, Json};

use crate::{AppState, AppResult};
use crate::models::{Feedback, FeedbackExport, FeedbackStats};

/// Statistics about collected feedback
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<FeedbackStats>> {
    let stats = Feedback::stats(&state.pool).await?;
    Ok(Json(stats))
}

/// All feedback, for retraining
pub async fn export(State(state): State<AppState>) -> AppResult<Json<FeedbackExport>> {
    let export = Feedback::export(&state.pool).await?;
    tracing::info!("Exported {} feedback records", export.count);
    Ok(Json(export))
}

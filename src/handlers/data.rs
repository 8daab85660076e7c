// src/handlers/data.rs

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::{data::DataHandle, error::AppError};

/// The whole question bank, as the quiz page loads it.
pub async fn list_questions(State(data): State<Arc<DataHandle>>) -> Result<impl IntoResponse, AppError> {
    let bank = data.questions().await?;
    Ok(Json(bank.questions().to_vec()))
}

/// Re-reads both data files; the retry action after a failed load.
///
/// * Fails only when the question bank cannot be loaded.
/// * A catalog failure is returned alongside the reloaded counts.
pub async fn reload(State(data): State<Arc<DataHandle>>) -> Result<impl IntoResponse, AppError> {
    let outcome = data.reload().await?;

    match &outcome.catalog_error {
        None => tracing::info!(
            "Data reloaded: {} questions, {} catalog years",
            outcome.questions,
            outcome.catalog_years.unwrap_or(0)
        ),
        Some(e) => tracing::warn!("Questions reloaded ({}), catalog failed: {}", outcome.questions, e),
    }

    Ok(Json(outcome))
}

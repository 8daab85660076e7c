// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    browser::{self, AdminQuery, QuestionRow},
    error::AppError,
    models::question::QuestionDetail,
    reminders,
    state::AppState,
    utils::html::render_question_detail,
};

const DEFAULT_TOP_INCORRECT: usize = 3;

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub limit: Option<usize>,
}

/// DTO for the reminder form.
#[derive(Debug, Deserialize, Validate)]
pub struct RemindRequest {
    #[validate(length(min = 1, message = "送信先が選択されていません。"))]
    pub names: Vec<String>,
    #[validate(length(max = 500, message = "Message must be at most 500 characters."))]
    pub message: Option<String>,
}

/// Lists questions matching the search box and dropdowns.
pub async fn list_questions(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<impl IntoResponse, AppError> {
    let bank = state.data.questions().await?;
    let rows: Vec<QuestionRow> = browser::search(&bank, &query)
        .into_iter()
        .map(QuestionRow::from)
        .collect();

    Ok(Json(serde_json::json!({
        "total": bank.len(),
        "matched": rows.len(),
        "questions": rows,
    })))
}

/// Every field of one question, correct choices marked.
pub async fn question_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bank = state.data.questions().await?;
    let question = bank
        .get(&id)
        .ok_or(AppError::NotFound(format!("Question {} not found", id)))?;

    Ok(Json(QuestionDetail::from(question)))
}

/// Same as `question_detail`, rendered as the modal's HTML fragment.
pub async fn question_detail_html(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bank = state.data.questions().await?;
    let question = bank
        .get(&id)
        .ok_or(AppError::NotFound(format!("Question {} not found", id)))?;

    Ok(Html(render_question_detail(&QuestionDetail::from(question))))
}

/// Question counts, per-category averages and the most missed questions.
pub async fn stats(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> Result<impl IntoResponse, AppError> {
    let bank = state.data.questions().await?;
    let limit = params.limit.unwrap_or(DEFAULT_TOP_INCORRECT);
    let top_incorrect = browser::top_incorrect(state.store.as_ref(), &bank, limit).await?;
    let categories = browser::category_stats(state.store.as_ref(), &bank).await?;

    Ok(Json(serde_json::json!({
        "questions": browser::question_stats(&bank),
        "categories": categories,
        "top_incorrect": top_incorrect,
    })))
}

/// Learners found in storage with their per-category completion.
pub async fn list_learners(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let bank = state.data.questions().await?;
    let learners = browser::learner_overview(state.store.as_ref(), &bank).await?;

    Ok(Json(learners))
}

/// Learners who still have a category they have not started.
pub async fn list_reminder_candidates(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let bank = state.data.questions().await?;
    let candidates = reminders::reminder_candidates(state.store.as_ref(), &bank).await?;

    Ok(Json(candidates))
}

/// Records a reminder for each selected learner.
///
/// * At least one non-blank name is required.
/// * Returns the log entries created.
pub async fn send_reminders(
    State(state): State<AppState>,
    Json(req): Json<RemindRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let sent = reminders::send_reminders(state.store.as_ref(), &req.names, req.message.as_deref()).await?;

    Ok((StatusCode::CREATED, Json(sent)))
}

/// Sent reminders, newest first.
pub async fn list_notification_logs(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let logs = reminders::notification_logs(state.store.as_ref()).await?;

    Ok(Json(logs))
}

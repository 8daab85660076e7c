// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::question::Language,
    runner::{
        QuizFilter, QuizSession, Selector,
        deeplink::{DeepLink, DeepLinkError, DeepLinkParams},
        filter::theme_options,
        session::SessionView,
    },
    state::AppState,
};

/// DTO for opening a quiz session.
#[derive(Debug, Default, Deserialize)]
pub struct OpenSessionRequest {
    #[serde(default)]
    pub filter: QuizFilter,
    #[serde(default)]
    pub language: Language,
}

/// DTO for answering the current question.
#[derive(Debug, Deserialize, Validate)]
pub struct AnswerRequest {
    #[validate(range(max = 63, message = "selected_index is out of range."))]
    pub selected_index: usize,
}

/// DTO for the language toggle. Without `language` the current one flips.
#[derive(Debug, Default, Deserialize)]
pub struct LanguageRequest {
    pub language: Option<Language>,
}

/// DTO for switching the learner inside a session.
#[derive(Debug, Deserialize, Validate)]
pub struct SwitchUserRequest {
    #[validate(length(max = 64, message = "User name must be at most 64 characters."))]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ThemeParams {
    pub year: Option<String>,
    pub category: Option<String>,
}

fn session_not_found() -> AppError {
    AppError::NotFound("Quiz session not found".to_string())
}

fn invalid_link(err: DeepLinkError, config: &Config) -> AppError {
    AppError::InvalidLink {
        message: err.user_message(),
        redirect_to: "/".to_string(),
        delay_ms: config.redirect_delay_ms,
    }
}

async fn open_session(
    state: &AppState,
    filter: QuizFilter,
    language: Language,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let bank = state.data.questions().await?;
    let mut rng = StdRng::from_entropy();

    let mut session = QuizSession::open(bank, state.store.as_ref(), filter, &mut rng).await?;
    session.set_language(language);
    let view = session.view();
    state.sessions.insert(session).await;

    tracing::info!("Quiz session {} opened ({} questions)", view.id, view.progress.total);
    Ok((StatusCode::CREATED, Json(view)))
}

/// Opens a quiz session from explicit filter selectors.
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<OpenSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    open_session(&state, req.filter, req.language).await
}

/// Opens a quiz session from `?year=..&track=..&theme=..`.
///
/// * Without all three parameters every question is shown.
/// * Invalid parameters or an unmatched theme answer with a redirect home.
pub async fn open_deep_link(
    State(state): State<AppState>,
    Query(params): Query<DeepLinkParams>,
) -> Result<impl IntoResponse, AppError> {
    let Some(link) = DeepLink::from_params(&params) else {
        return open_session(&state, QuizFilter::default(), Language::default()).await;
    };

    link.validate().map_err(|e| invalid_link(e, &state.config))?;

    let bank = state.data.questions().await?;
    let filter = link.resolve(&bank).map_err(|e| invalid_link(e, &state.config))?;

    open_session(&state, filter, Language::default()).await
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let sessions = state.sessions.lock().await;
    let session = sessions.get(&id).ok_or_else(session_not_found)?;

    Ok(Json(session.view()))
}

pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !state.sessions.remove(&id).await {
        return Err(session_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Re-applies the filter dropdowns; random mode reshuffles.
pub async fn update_filter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(filter): Json<QuizFilter>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = state.sessions.lock().await;
    let session = sessions.get_mut(&id).ok_or_else(session_not_found)?;

    let mut rng = StdRng::from_entropy();
    session.apply_filter(state.store.as_ref(), filter, &mut rng).await?;

    Ok(Json(session.view()))
}

pub async fn set_language(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<LanguageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = state.sessions.lock().await;
    let session = sessions.get_mut(&id).ok_or_else(session_not_found)?;

    match req.language {
        Some(language) => session.set_language(language),
        None => {
            session.toggle_language();
        }
    }

    Ok(Json(session.view()))
}

/// Answers the current question.
///
/// * Rejects questions that already have a stored answer (409).
/// * Persists the progress record under the current user's key.
pub async fn answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let mut sessions = state.sessions.lock().await;
    let session = sessions.get_mut(&id).ok_or_else(session_not_found)?;

    let result = session.select(state.store.as_ref(), req.selected_index).await?;

    Ok(Json(serde_json::json!({
        "result": result,
        "question": session.current(),
        "progress": session.summary(),
    })))
}

/// Moves to the next question, wrapping to the first.
pub async fn next_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = state.sessions.lock().await;
    let session = sessions.get_mut(&id).ok_or_else(session_not_found)?;

    session.next(state.store.as_ref()).await?;

    Ok(Json(session.view()))
}

pub async fn progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let sessions = state.sessions.lock().await;
    let session = sessions.get(&id).ok_or_else(session_not_found)?;

    Ok(Json(serde_json::json!({
        "user_name": session.user_name(),
        "summary": session.summary(),
        "incorrect_answers": session.incorrect_answers(),
        "record": session.progress(),
    })))
}

pub async fn switch_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SwitchUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let mut sessions = state.sessions.lock().await;
    let session = sessions.get_mut(&id).ok_or_else(session_not_found)?;

    session.switch_user(state.store.as_ref(), &req.name).await?;

    Ok(Json(session.view()))
}

/// Clears the session user's progress and all remembered positions.
pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = state.sessions.lock().await;
    let session = sessions.get_mut(&id).ok_or_else(session_not_found)?;

    session.reset(state.store.as_ref()).await?;

    Ok(Json(session.view()))
}

/// Theme dropdown options for a year/category pair.
pub async fn list_themes(
    State(state): State<AppState>,
    Query(params): Query<ThemeParams>,
) -> Result<impl IntoResponse, AppError> {
    let bank = state.data.questions().await?;
    let year = Selector::from(params.year);
    let category = Selector::from(params.category);

    Ok(Json(theme_options(&bank, &year, &category)))
}

// src/handlers/topics.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::AppError,
    runner::persistence,
    selector::{Selection, ThemeSelection},
    state::AppState,
};

/// Optional pre-selected card.
#[derive(Debug, Deserialize)]
pub struct CatalogParams {
    pub year: Option<String>,
    pub category: Option<String>,
    pub theme: Option<String>,
}

/// DTO for the start button.
#[derive(Debug, Deserialize, Validate)]
pub struct StartQuizRequest {
    #[validate(length(min = 1, message = "Year is required."))]
    pub year: String,
    #[validate(length(min = 1, message = "Category is required."))]
    pub category: String,
    #[validate(length(min = 1, message = "Theme is required."))]
    pub theme: String,
    #[validate(length(max = 64, message = "User name must be at most 64 characters."))]
    pub user_name: Option<String>,
}

/// Renders the catalog as year blocks, category sections and theme cards.
pub async fn get_catalog(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> Result<impl IntoResponse, AppError> {
    let catalog = state.data.topics().await?;
    let mut selection = ThemeSelection::new();

    if let (Some(year), Some(category), Some(theme)) = (params.year, params.category, params.theme) {
        selection.select(&catalog, Selection { year, category, theme })?;
    }

    Ok(Json(selection.render(&catalog)))
}

/// Validates the selection, remembers the user name and returns the quiz URL.
pub async fn start_quiz(
    State(state): State<AppState>,
    Json(req): Json<StartQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let catalog = state.data.topics().await?;
    let mut selection = ThemeSelection::new();
    selection.select(
        &catalog,
        Selection {
            year: req.year,
            category: req.category,
            theme: req.theme,
        },
    )?;

    let plan = selection.start(req.user_name.as_deref())?;
    if let Some(name) = &plan.user_name {
        persistence::set_current_user_name(state.store.as_ref(), name).await?;
    }

    tracing::info!("Starting quiz at {}", plan.location);
    Ok(Json(plan))
}

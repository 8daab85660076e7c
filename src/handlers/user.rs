// src/handlers/user.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use validator::Validate;

use crate::{error::AppError, runner::persistence, state::SharedStore};

/// DTO for the user name box. A blank name forgets the current user.
#[derive(Debug, Deserialize, Validate)]
pub struct UserNameRequest {
    #[validate(length(max = 64, message = "User name must be at most 64 characters."))]
    pub name: String,
}

pub async fn get_user(State(store): State<SharedStore>) -> Result<impl IntoResponse, AppError> {
    let name = persistence::current_user_name(store.as_ref()).await?;
    Ok(Json(serde_json::json!({ "name": name })))
}

pub async fn set_user(
    State(store): State<SharedStore>,
    Json(req): Json<UserNameRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let name = persistence::set_current_user_name(store.as_ref(), &req.name).await?;
    Ok(Json(serde_json::json!({ "name": name })))
}

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Router,
};
use tracing::instrument;

use crate::{
    auth::{dto::UpdatePasswordRequest, extractors::AuthUser},
    error::AppError,
    extract::Json,
    response::ApiResponse,
    state::AppState,
    users::dto::UserResponse,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/me", get(get_me))
        .route("/user/password", put(update_password))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let profile = state.users.current_user(&user).await?;
    Ok(ApiResponse::of(
        StatusCode::OK,
        "User details retrieved successfully",
        profile,
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<ApiResponse<()>, AppError> {
    payload.validate()?;
    state
        .users
        .update_password(&user, &payload.current_password, &payload.new_password)
        .await?;
    Ok(ApiResponse::message(
        StatusCode::OK,
        "Password updated successfully",
    ))
}

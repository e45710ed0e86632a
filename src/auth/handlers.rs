use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::{info, instrument};

use crate::{
    auth::dto::{EmailRequest, LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest, TokenQuery},
    error::AppError,
    extract::{Json, Query},
    response::ApiResponse,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/verify", get(verify_email))
        .route("/auth/resend-verification", post(resend_verification))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<ApiResponse<()>, AppError> {
    payload.validate()?;
    state.auth.register(payload).await?;
    Ok(ApiResponse::message(
        StatusCode::CREATED,
        "User registered successfully. Please check your email to verify your account.",
    ))
}

#[instrument(skip(state, query))]
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<ApiResponse<()>, AppError> {
    if query.token.trim().is_empty() {
        return Err(AppError::InvalidToken);
    }
    state.auth.verify_email_token(query.token.trim()).await?;
    Ok(ApiResponse::message(
        StatusCode::OK,
        "Email verified successfully. You can now log in.",
    ))
}

/// Unknown addresses get the same answer as known ones.
#[instrument(skip(state, payload))]
pub async fn resend_verification(
    State(state): State<AppState>,
    Json(mut payload): Json<EmailRequest>,
) -> Result<ApiResponse<()>, AppError> {
    payload.validate()?;
    match state.auth.resend_verification(&payload.email).await {
        Ok(()) | Err(AppError::UserNotFound) => {}
        Err(e) => return Err(e),
    }
    Ok(ApiResponse::message(
        StatusCode::OK,
        "If the account exists and is not yet verified, a new verification email has been sent.",
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>, AppError> {
    payload.validate()?;
    let session = state.auth.login(&payload.email, &payload.password).await?;
    Ok(ApiResponse::of(StatusCode::OK, "Login successful", session))
}

/// Unknown addresses get the same answer as known ones.
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(mut payload): Json<EmailRequest>,
) -> Result<ApiResponse<()>, AppError> {
    payload.validate()?;
    match state.auth.send_password_reset_token(&payload.email).await {
        Ok(()) => {}
        Err(AppError::UserNotFound) => info!("password reset for unknown email answered generically"),
        Err(e) => return Err(e),
    }
    Ok(ApiResponse::message(
        StatusCode::OK,
        "If an account with that email exists, a password reset link has been sent.",
    ))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<ApiResponse<()>, AppError> {
    payload.validate()?;
    state
        .auth
        .reset_password(payload.token.trim(), &payload.new_password)
        .await?;
    Ok(ApiResponse::message(
        StatusCode::OK,
        "Password has been reset successfully.",
    ))
}

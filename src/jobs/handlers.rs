use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    extract::{Json, Path, Query},
    jobs::{
        dto::{JobFilterRequest, JobRequest, PageParams},
        repo_types::{JobApplication, Page},
    },
    response::ApiResponse,
    state::AppState,
};

pub fn jobs_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/filter", post(filter_jobs))
        .route("/jobs/:id", get(get_job).put(update_job).delete(delete_job))
}

#[instrument(skip(state, payload))]
pub async fn create_job(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<JobRequest>,
) -> Result<ApiResponse<JobApplication>, AppError> {
    let job = state.jobs.create_job(&user, payload).await?;
    Ok(ApiResponse::of(StatusCode::CREATED, "Job created successfully", job))
}

#[instrument(skip(state))]
pub async fn list_jobs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<ApiResponse<Page<JobApplication>>, AppError> {
    let page = state.jobs.list_jobs(&user, params.to_request()?).await?;
    Ok(ApiResponse::of(StatusCode::OK, "Jobs retrieved successfully", page))
}

#[instrument(skip(state))]
pub async fn get_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<JobApplication>, AppError> {
    let job = state.jobs.get_job(&user, id).await?;
    Ok(ApiResponse::of(StatusCode::OK, "Job retrieved successfully", job))
}

#[instrument(skip(state, payload))]
pub async fn update_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<JobRequest>,
) -> Result<ApiResponse<JobApplication>, AppError> {
    let job = state.jobs.update_job(&user, id, payload).await?;
    Ok(ApiResponse::of(StatusCode::OK, "Job updated successfully", job))
}

#[instrument(skip(state))]
pub async fn delete_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, AppError> {
    state.jobs.delete_job(&user, id).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Job deleted successfully"))
}

#[instrument(skip(state, filter))]
pub async fn filter_jobs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PageParams>,
    Json(filter): Json<JobFilterRequest>,
) -> Result<ApiResponse<Page<JobApplication>>, AppError> {
    let page = state
        .jobs
        .filter_jobs(&user, &filter, params.to_request()?)
        .await?;
    Ok(ApiResponse::of(StatusCode::OK, "Filtered jobs retrieved successfully", page))
}

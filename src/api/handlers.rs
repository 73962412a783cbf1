//! Admin API request handlers

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState};
use crate::models::{Competition, CreateCompetitionRequest, RegistrationRequest, RequestStatus};
use crate::services::{NotifyReport, NotifyRequest};
use crate::utils::errors::RegistrationDeskError;

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<RequestStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApproveBody {
    pub reviewer: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectBody {
    pub reviewer: Option<i64>,
    pub reason: Option<String>,
}

/// Empty bodies mean "all defaults"
fn optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> ApiResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError(RegistrationDeskError::InvalidInput(format!("invalid JSON body: {e}"))))
}

/// GET /health
pub async fn health(State(state): State<ApiState>) -> Response {
    let health = state.services.health_check().await;
    let status = if health.is_healthy() { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let body = HealthResponse {
        status: if health.is_healthy() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: health.database_healthy,
    };
    (status, Json(body)).into_response()
}

/// GET /api/registration-requests?status=pending
pub async fn list_requests(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<RegistrationRequest>>> {
    Ok(Json(state.services.review.list(query.status).await?))
}

/// POST /api/registration-requests/{id}/approve
pub async fn approve_request(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> ApiResult<Json<RegistrationRequest>> {
    let body: ApproveBody = optional_body(&body)?;
    Ok(Json(state.services.review.approve(id, body.reviewer).await?))
}

/// POST /api/registration-requests/{id}/reject
pub async fn reject_request(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> ApiResult<Json<RegistrationRequest>> {
    let body: RejectBody = optional_body(&body)?;
    Ok(Json(state.services.review.reject(id, body.reviewer, body.reason).await?))
}

/// POST /api/notify
pub async fn notify(State(state): State<ApiState>, body: Bytes) -> ApiResult<Json<NotifyReport>> {
    let request: NotifyRequest = optional_body(&body)?;
    Ok(Json(state.services.broadcast.notify(request).await?))
}

/// GET /api/competitions: those open for registration
pub async fn list_competitions(State(state): State<ApiState>) -> ApiResult<Json<Vec<Competition>>> {
    Ok(Json(state.services.stores().competitions.list_open_competitions().await?))
}

/// POST /api/competitions
pub async fn create_competition(
    State(state): State<ApiState>,
    Json(request): Json<CreateCompetitionRequest>,
) -> ApiResult<(StatusCode, Json<Competition>)> {
    if request.name.trim().is_empty() {
        return Err(RegistrationDeskError::InvalidInput("name required".to_string()).into());
    }
    let competition = state.services.stores().competitions.create_competition(request).await?;
    Ok((StatusCode::CREATED, Json(competition)))
}

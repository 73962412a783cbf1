//! Admin REST surface built on axum
//!
//! Routes:
//! - `GET  /health`
//! - `GET  /api/registration-requests?status=`
//! - `POST /api/registration-requests/{id}/approve`
//! - `POST /api/registration-requests/{id}/reject`
//! - `POST /api/notify`
//! - `GET  /api/competitions`, `POST /api/competitions`

pub mod handlers;

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

use crate::config::ApiConfig;
use crate::services::ServiceFactory;
use crate::utils::errors::{RegistrationDeskError, Result};

/// Shared state for request handlers
#[derive(Clone, Debug)]
pub struct ApiState {
    pub services: ServiceFactory,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wraps domain errors so handlers can use `?`
#[derive(Debug)]
pub struct ApiError(pub RegistrationDeskError);

impl From<RegistrationDeskError> for ApiError {
    fn from(err: RegistrationDeskError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            RegistrationDeskError::Review(_) | RegistrationDeskError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RegistrationDeskError::RegistrationRequestNotFound { .. }
            | RegistrationDeskError::CompetitionNotFound { .. }
            | RegistrationDeskError::UserNotFound { .. } => StatusCode::NOT_FOUND,
            RegistrationDeskError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "Admin API request failed");
            "internal error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/registration-requests", get(handlers::list_requests))
        .route("/api/registration-requests/{id}/approve", post(handlers::approve_request))
        .route("/api/registration-requests/{id}/reject", post(handlers::reject_request))
        .route("/api/notify", post(handlers::notify))
        .route("/api/competitions", get(handlers::list_competitions).post(handlers::create_competition))
        .with_state(state)
}

/// Serve the admin API until `shutdown` flips to `true`
pub async fn serve(config: &ApiConfig, state: ApiState, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| RegistrationDeskError::Config(format!("invalid api address: {e}")))?;

    let listener = TcpListener::bind(&addr).await?;
    info!("Admin API listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            while shutdown.changed().await.is_ok() {
                if *shutdown.borrow() {
                    break;
                }
            }
        })
        .await?;

    info!("Admin API stopped");
    Ok(())
}

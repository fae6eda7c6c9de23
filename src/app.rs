use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde::Serialize;

use crate::assets;
use crate::config;
use crate::error::{FieldError, ServeError, ServiceError};
use crate::state;
use crate::store::Store;

mod push;
mod tasks;

pub fn app(config: config::AppConfig, store: Arc<Store>) -> Result<Router, ServeError> {
    let state = state::AppState::new(config, store)?;
    Ok(Router::new()
        .route("/api/push/public-key", get(push::push_public_key))
        .route("/api/push/subscribe", post(push::push_subscribe))
        .route("/api/push/unsubscribe", post(push::push_unsubscribe))
        .route("/api/push/notify", post(push::push_notify))
        .route("/api/tasks", get(tasks::task_list).post(tasks::task_create))
        .route("/api/tasks/stats", get(tasks::task_stats))
        .route(
            "/api/tasks/{id}",
            get(tasks::task_get)
                .patch(tasks::task_update)
                .delete(tasks::task_delete),
        )
        .route("/api/tasks/{id}/complete", post(tasks::task_complete))
        .route(
            "/api/debug/push/subscriptions",
            get(push::push_subscriptions_debug),
        )
        .route("/api/debug/push/reminders", get(push::push_reminders_debug))
        .route("/manifest.json", get(assets::manifest))
        .route("/sw.js", get(assets::service_worker))
        .route("/icons/icon-192x192.png", get(assets::icon_192))
        .route("/icons/icon-512x512.png", get(assets::icon_512))
        .route("/health", get(health))
        .with_state(state))
}

pub(crate) async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) fields: Vec<FieldError>,
}

impl ErrorResponse {
    pub(crate) fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fields: Vec::new(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct SuccessResponse {
    pub(crate) success: bool,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(err: ServiceError) -> ApiError {
    match err {
        ServiceError::Validation(errors) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Validation failed".to_string(),
                fields: errors.0,
            }),
        ),
        err @ ServiceError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::message(err.to_string())),
        ),
        err @ (ServiceError::Compose(_) | ServiceError::MissingEndpoint) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::message(err.to_string())),
        ),
        ServiceError::Store(err) => {
            tracing::error!(error = %err, "store write failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::message("Failed to save changes.")),
            )
        }
    }
}

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{ApiError, ErrorResponse, SuccessResponse, api_error};
use crate::push::PendingReminder;
use crate::state;
use crate::types::push::{DispatchReport, NotificationRequest, Subscription, SubscriptionRequest};

#[derive(Serialize)]
pub(crate) struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub(crate) public_key: String,
}

pub(crate) async fn push_public_key(
    State(state): State<state::AppState>,
) -> Result<Json<PublicKeyResponse>, ApiError> {
    match state.public_key {
        Some(public_key) => Ok(Json(PublicKeyResponse { public_key })),
        None => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::message("Push notifications are not configured.")),
        )),
    }
}

pub(crate) async fn push_subscribe(
    State(state): State<state::AppState>,
    Json(request): Json<SubscriptionRequest>,
) -> Result<(StatusCode, Json<Subscription>), ApiError> {
    let subscription = state.service.subscribe(request).map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UnsubscribeRequest {
    #[serde(default)]
    pub(crate) endpoint: Option<String>,
}

pub(crate) async fn push_unsubscribe(
    State(state): State<state::AppState>,
    Json(request): Json<UnsubscribeRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .service
        .unsubscribe(request.endpoint.as_deref())
        .map_err(api_error)?;
    Ok(Json(SuccessResponse { success: true }))
}

pub(crate) async fn push_notify(
    State(state): State<state::AppState>,
    Json(request): Json<NotificationRequest>,
) -> Result<Json<DispatchReport>, ApiError> {
    let report = state.service.notify(request).await.map_err(api_error)?;
    Ok(Json(report))
}

/// Subscription view without the encryption keys.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubscriptionEntry {
    pub(crate) endpoint: String,
    pub(crate) active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) user_agent: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) last_used: OffsetDateTime,
}

impl From<Subscription> for SubscriptionEntry {
    fn from(subscription: Subscription) -> Self {
        Self {
            endpoint: subscription.endpoint,
            active: subscription.active,
            user_agent: subscription.user_agent,
            created_at: subscription.created_at,
            last_used: subscription.last_used,
        }
    }
}

pub(crate) async fn push_subscriptions_debug(
    State(state): State<state::AppState>,
) -> Json<Vec<SubscriptionEntry>> {
    let subscriptions = state.service.store().subscriptions().list();
    Json(subscriptions.into_iter().map(SubscriptionEntry::from).collect())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RemindersDebugResponse {
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) server_time: OffsetDateTime,
    pub(crate) push_enabled: bool,
    pub(crate) reminders: Vec<PendingReminder>,
}

pub(crate) async fn push_reminders_debug(
    State(state): State<state::AppState>,
) -> Json<RemindersDebugResponse> {
    Json(RemindersDebugResponse {
        server_time: OffsetDateTime::now_utc(),
        push_enabled: state.service.push_enabled(),
        reminders: state.service.pending_reminders(),
    })
}

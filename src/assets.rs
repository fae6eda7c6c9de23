use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

fn asset(content_type: &'static str, cache_control: &'static str, body: Body) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, cache_control),
        ],
        body,
    )
        .into_response()
}

pub(crate) async fn manifest(State(state): State<AppState>) -> Response {
    asset(
        "application/manifest+json",
        "public, max-age=3600",
        Body::from(state.manifest.to_string()),
    )
}

pub(crate) async fn service_worker(State(state): State<AppState>) -> Response {
    asset(
        "application/javascript",
        "no-cache",
        Body::from(state.service_worker.to_string()),
    )
}

fn icon(bytes: Option<Arc<[u8]>>) -> Response {
    match bytes {
        Some(bytes) => asset("image/png", "public, max-age=86400", Body::from(bytes.to_vec())),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub(crate) async fn icon_192(State(state): State<AppState>) -> Response {
    icon(state.icon_192)
}

pub(crate) async fn icon_512(State(state): State<AppState>) -> Response {
    icon(state.icon_512)
}

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::backend::SnapshotBackend;
use super::service::{CaptureRequest, SnapshotService};
use super::store::SnapshotError;

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DiffQuery {
    pub a: String,
    pub b: String,
}

/// Router for capturing, curating, exchanging and comparing snapshots.
pub fn snapshot_router<B>(service: Arc<SnapshotService<B>>) -> Router
where
    B: SnapshotBackend + 'static,
{
    Router::new()
        .route(
            "/api/v1/snapshots",
            get(list_handler::<B>).post(capture_handler::<B>),
        )
        .route("/api/v1/snapshots/export", get(export_handler::<B>))
        .route("/api/v1/snapshots/import", post(import_handler::<B>))
        .route("/api/v1/snapshots/diff", get(diff_handler::<B>))
        .route(
            "/api/v1/snapshots/:id",
            patch(rename_handler::<B>).delete(delete_handler::<B>),
        )
        .route(
            "/api/v1/snapshots/:id/duplicate",
            post(duplicate_handler::<B>),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<B>(State(service): State<Arc<SnapshotService<B>>>) -> Response
where
    B: SnapshotBackend + 'static,
{
    match service.store().list() {
        Ok(items) => (StatusCode::OK, Json(json!({ "items": items }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn capture_handler<B>(
    State(service): State<Arc<SnapshotService<B>>>,
    Json(request): Json<CaptureRequest>,
) -> Response
where
    B: SnapshotBackend + 'static,
{
    match service.capture(request) {
        Ok(snapshot) => (StatusCode::CREATED, Json(snapshot)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn rename_handler<B>(
    State(service): State<Arc<SnapshotService<B>>>,
    Path(id): Path<String>,
    Json(request): Json<RenameRequest>,
) -> Response
where
    B: SnapshotBackend + 'static,
{
    match service.store().rename(&id, &request.name) {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<B>(
    State(service): State<Arc<SnapshotService<B>>>,
    Path(id): Path<String>,
) -> Response
where
    B: SnapshotBackend + 'static,
{
    match service.store().delete(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn duplicate_handler<B>(
    State(service): State<Arc<SnapshotService<B>>>,
    Path(id): Path<String>,
) -> Response
where
    B: SnapshotBackend + 'static,
{
    match service.store().duplicate(&id) {
        Ok(snapshot) => (StatusCode::CREATED, Json(snapshot)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn export_handler<B>(State(service): State<Arc<SnapshotService<B>>>) -> Response
where
    B: SnapshotBackend + 'static,
{
    match service.store().export_all() {
        Ok(document) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            document,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn import_handler<B>(
    State(service): State<Arc<SnapshotService<B>>>,
    body: String,
) -> Response
where
    B: SnapshotBackend + 'static,
{
    match service.store().import_all(&body) {
        Ok(imported) => (StatusCode::OK, Json(json!({ "imported": imported }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn diff_handler<B>(
    State(service): State<Arc<SnapshotService<B>>>,
    Query(query): Query<DiffQuery>,
) -> Response
where
    B: SnapshotBackend + 'static,
{
    match service.store().diff(&query.a, &query.b) {
        Ok(delta) => (StatusCode::OK, Json(delta)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: SnapshotError) -> Response {
    let status = match err {
        SnapshotError::NotFound { .. } => StatusCode::NOT_FOUND,
        SnapshotError::UnknownScenario(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SnapshotError::UnsupportedVersion(_)
        | SnapshotError::InvalidDocument(_)
        | SnapshotError::Malformed(_) => StatusCode::BAD_REQUEST,
        SnapshotError::Backend(_) | SnapshotError::Poisoned => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}

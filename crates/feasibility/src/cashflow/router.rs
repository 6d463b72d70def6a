use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::FeasibilityInputs;
use super::repository::CashflowRepository;
use super::service::{FeasibilityService, FeasibilityServiceError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    #[serde(default)]
    pub version_label: Option<String>,
    pub inputs: FeasibilityInputs,
}

#[derive(Debug, Default, Deserialize)]
pub struct GridQuery {
    #[serde(default)]
    pub version: Option<String>,
}

/// Router exposing grid preview, publish and read-back endpoints.
pub fn cashflow_router<R>(service: Arc<FeasibilityService<R>>) -> Router
where
    R: CashflowRepository + 'static,
{
    Router::new()
        .route("/api/v1/feasibility/grid", post(preview_handler::<R>))
        .route(
            "/api/v1/projects/:project_id/grid",
            put(publish_handler::<R>).get(load_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn preview_handler<R>(
    State(service): State<Arc<FeasibilityService<R>>>,
    Json(inputs): Json<FeasibilityInputs>,
) -> Response
where
    R: CashflowRepository + 'static,
{
    let report = service.preview(&inputs, "preview");
    (StatusCode::OK, Json(report)).into_response()
}

pub(crate) async fn publish_handler<R>(
    State(service): State<Arc<FeasibilityService<R>>>,
    Path(project_id): Path<String>,
    Json(request): Json<PublishRequest>,
) -> Response
where
    R: CashflowRepository + 'static,
{
    match service.publish(&project_id, &request.inputs, request.version_label) {
        Ok(report) => (StatusCode::CREATED, Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn load_handler<R>(
    State(service): State<Arc<FeasibilityService<R>>>,
    Path(project_id): Path<String>,
    Query(query): Query<GridQuery>,
) -> Response
where
    R: CashflowRepository + 'static,
{
    match service.load(&project_id, query.version.as_deref()) {
        Ok(grid) => (StatusCode::OK, Json(grid)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: FeasibilityServiceError) -> Response {
    let status = match err {
        FeasibilityServiceError::GridNotFound { .. } => StatusCode::NOT_FOUND,
        FeasibilityServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}

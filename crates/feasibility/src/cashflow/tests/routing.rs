use super::common::*;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::cashflow::repository::InMemoryCashflowRepository;
use crate::cashflow::router::{load_handler, GridQuery};
use crate::cashflow::{cashflow_router, FeasibilityService, ScenarioBuilder};

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
        .expect("request builds")
}

#[tokio::test]
async fn preview_route_returns_grid_and_summaries() {
    let (service, repository) = build_service();
    let router = cashflow_router(Arc::new(service));

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/feasibility/grid",
            tower_inputs_json(),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["grid"]["versionLabel"], "preview");
    assert_eq!(
        payload["grid"]["scenarios"]["base"]
            .as_array()
            .map(Vec::len),
        Some(24)
    );
    let margin = payload["summaries"]["base"]["profitMargin"]
        .as_f64()
        .expect("margin present");
    assert_close(margin, 4_040_000.0 / 15_000_000.0 * 100.0, 1e-6);
    assert_eq!(repository.row_count(), 0);
}

#[tokio::test]
async fn preview_route_accepts_string_numbers() {
    let (service, _) = build_service();
    let router = cashflow_router(Arc::new(service));

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/feasibility/grid",
            json!({
                "projectStart": "2025-01-01",
                "projectCompletion": "2025-12-01",
                "constructionCost": "1200000",
                "totalGfa": "abc",
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["summaries"]["base"]["totalRevenue"], 0.0);
    assert_eq!(payload["grid"]["scenarios"]["base"][0]["constructionCost"], 100000.0);
}

#[tokio::test]
async fn publish_then_load_round_trips() {
    let (service, _) = build_service();
    let router = cashflow_router(Arc::new(service));

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/v1/projects/tower-a/grid",
            json!({ "versionLabel": "v1", "inputs": tower_inputs_json() }),
        ))
        .await
        .expect("publish executes");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .oneshot(
            Request::get("/api/v1/projects/tower-a/grid?version=v1")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("load executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["versionLabel"], "v1");
    assert_eq!(
        payload["scenarios"]
            .as_object()
            .map(|scenarios| scenarios.len()),
        Some(4)
    );
}

#[tokio::test]
async fn load_handler_returns_not_found_for_unknown_projects() {
    let service = Arc::new(FeasibilityService::new(
        Arc::new(InMemoryCashflowRepository::default()),
        ScenarioBuilder::default(),
    ));

    let response = load_handler::<InMemoryCashflowRepository>(
        State(service),
        Path("nowhere".to_string()),
        Query(GridQuery::default()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .is_some_and(|message| message.contains("nowhere")));
}

#[tokio::test]
async fn load_handler_returns_internal_error_on_outage() {
    let service = Arc::new(FeasibilityService::new(
        Arc::new(UnavailableRepository),
        ScenarioBuilder::default(),
    ));

    let response = load_handler::<UnavailableRepository>(
        State(service),
        Path("tower-a".to_string()),
        Query(GridQuery::default()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

fn tower_inputs_json() -> serde_json::Value {
    json!({
        "projectStart": "2025-01-01",
        "projectCompletion": "2026-12-01",
        "constructionCost": 10_000_000.0,
        "totalGfa": 5_000.0,
        "avgSalePrice": 3_000.0,
        "loan": {
            "principal": 6_000_000.0,
            "interestRatePct": 8.0,
            "termMonths": 24,
            "repaymentStyle": "bullet",
            "gracePeriodMonths": 2
        }
    })
}

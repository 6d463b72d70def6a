use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::cashflow::{FeasibilityInputs, LoanTerms};
use crate::snapshots::backend::{SnapshotBackend, SnapshotBackendError};
use crate::snapshots::{
    MemorySnapshotBackend, ScenarioSnapshotStore, SnapshotDraft, SnapshotSummary, SnapshotTraces,
};

pub(super) fn inputs() -> FeasibilityInputs {
    let mut inputs =
        FeasibilityInputs::starting(NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"));
    inputs.project_completion = NaiveDate::from_ymd_opt(2026, 12, 1);
    inputs.construction_cost = 10_000_000.0;
    inputs.total_gfa = 5_000.0;
    inputs.avg_sale_price = 3_000.0;
    inputs.loan = LoanTerms {
        principal: 6_000_000.0,
        interest_rate_pct: 8.0,
        term_months: 24,
        ..LoanTerms::default()
    };
    inputs
}

/// Draft with short, exactly representable figures.
pub(super) fn draft(name: &str, irr: Option<f64>, calls: Vec<f64>) -> SnapshotDraft {
    SnapshotDraft {
        name: name.to_string(),
        inputs: Some(inputs()),
        summary: SnapshotSummary {
            irr_annual: irr,
            tvpi: 1.5,
            dpi: 1.25,
            rvpi: 0.25,
            moic: 1.75,
            gp_clawback_last: None,
        },
        traces: SnapshotTraces {
            period_count: calls.len() as u32,
            dists_total: vec![0.5; calls.len()],
            gp_promote: vec![0.0; calls.len()],
            gp_clawback: vec![0.0; calls.len()],
            calls_total: calls,
        },
        note: Some("board pack".to_string()),
    }
}

pub(super) fn memory_store() -> (
    ScenarioSnapshotStore<MemorySnapshotBackend>,
    Arc<MemorySnapshotBackend>,
) {
    let backend = Arc::new(MemorySnapshotBackend::default());
    let store = ScenarioSnapshotStore::open(backend.clone()).expect("store opens");
    (store, backend)
}

/// Loads fine but refuses every write.
#[derive(Default)]
pub(super) struct ReadOnlyBackend;

impl SnapshotBackend for ReadOnlyBackend {
    fn load(&self, _namespace: &str) -> Result<Option<String>, SnapshotBackendError> {
        Ok(None)
    }

    fn save(&self, _namespace: &str, _blob: &str) -> Result<(), SnapshotBackendError> {
        Err(SnapshotBackendError::Unavailable("read-only".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

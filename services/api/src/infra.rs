use chrono::NaiveDate;
use feasibility_engine::cashflow::{FeasibilityInputs, ScenarioBuilder};
use feasibility_engine::error::AppError;
use feasibility_engine::snapshots::{FileSnapshotBackend, ScenarioSnapshotStore, SnapshotService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Reads a JSON inputs document from disk.
pub(crate) fn load_inputs(path: &Path) -> Result<FeasibilityInputs, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub(crate) fn file_snapshot_service(
    directory: &Path,
    builder: ScenarioBuilder,
) -> Result<SnapshotService<FileSnapshotBackend>, AppError> {
    let backend = Arc::new(FileSnapshotBackend::new(directory));
    let store = ScenarioSnapshotStore::open(backend)?;
    Ok(SnapshotService::new(store, builder))
}

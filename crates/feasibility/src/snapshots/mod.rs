//! Named, timestamped captures of scenario results and the deltas between
//! them.

pub mod backend;
mod capture;
pub mod codec;
pub mod diff;
pub mod domain;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use backend::{
    FileSnapshotBackend, MemorySnapshotBackend, SnapshotBackend, SnapshotBackendError,
};
pub use capture::capture_scenario;
pub use codec::{export_all, import_all};
pub use diff::{diff, KpiDelta, SeriesDelta, SnapshotDiff};
pub use domain::{
    ScenarioSnapshot, SnapshotDraft, SnapshotState, SnapshotSummary, SnapshotTraces,
    SNAPSHOT_NAMESPACE, SNAPSHOT_VERSION, UNTITLED_SNAPSHOT,
};
pub use router::snapshot_router;
pub use service::{CaptureRequest, SnapshotService};
pub use store::{ScenarioSnapshotStore, SnapshotError};

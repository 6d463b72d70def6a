use chrono::Utc;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

use super::backend::{SnapshotBackend, SnapshotBackendError};
use super::codec::{export_all, import_all};
use super::diff::{diff, SnapshotDiff};
use super::domain::{
    ScenarioSnapshot, SnapshotDraft, SnapshotState, SNAPSHOT_NAMESPACE, UNTITLED_SNAPSHOT,
};

impl SnapshotState {
    pub fn find(&self, id: &str) -> Option<&ScenarioSnapshot> {
        self.items.iter().find(|snapshot| snapshot.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut ScenarioSnapshot, SnapshotError> {
        self.items
            .iter_mut()
            .find(|snapshot| snapshot.id == id)
            .ok_or_else(|| SnapshotError::NotFound { id: id.to_string() })
    }

    /// Appends a snapshot with a fresh id and the current timestamp.
    pub fn add(&mut self, draft: SnapshotDraft) -> ScenarioSnapshot {
        let mut traces = draft.traces;
        traces.fill_period_count();
        let snapshot = ScenarioSnapshot {
            id: Uuid::new_v4().to_string(),
            name: display_name(draft.name),
            created_at: Utc::now(),
            inputs: draft.inputs,
            summary: draft.summary,
            traces,
            note: draft.note,
        };
        self.items.push(snapshot.clone());
        snapshot
    }

    pub fn rename(&mut self, id: &str, name: &str) -> Result<ScenarioSnapshot, SnapshotError> {
        let snapshot = self.find_mut(id)?;
        snapshot.name = display_name(name.to_string());
        Ok(snapshot.clone())
    }

    /// Copies the payload of `id` under a new identity and timestamp.
    pub fn duplicate(&mut self, id: &str) -> Result<ScenarioSnapshot, SnapshotError> {
        let mut copy = self
            .find(id)
            .cloned()
            .ok_or_else(|| SnapshotError::NotFound { id: id.to_string() })?;
        copy.id = Uuid::new_v4().to_string();
        copy.created_at = Utc::now();
        self.items.push(copy.clone());
        Ok(copy)
    }

    pub fn delete(&mut self, id: &str) -> Result<ScenarioSnapshot, SnapshotError> {
        let position = self
            .items
            .iter()
            .position(|snapshot| snapshot.id == id)
            .ok_or_else(|| SnapshotError::NotFound { id: id.to_string() })?;
        Ok(self.items.remove(position))
    }

    pub fn diff(&self, a: &str, b: &str) -> Result<SnapshotDiff, SnapshotError> {
        let from = self
            .find(a)
            .ok_or_else(|| SnapshotError::NotFound { id: a.to_string() })?;
        let to = self
            .find(b)
            .ok_or_else(|| SnapshotError::NotFound { id: b.to_string() })?;
        Ok(diff(from, to))
    }
}

pub(crate) fn display_name(name: String) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        UNTITLED_SNAPSHOT.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Snapshot state kept in memory and written through to a backend.
///
/// Every mutation works on a copy, persists it, and only then replaces the
/// in-memory state, so a failed save leaves both sides unchanged.
pub struct ScenarioSnapshotStore<B> {
    backend: Arc<B>,
    namespace: String,
    state: Mutex<SnapshotState>,
}

impl<B> ScenarioSnapshotStore<B>
where
    B: SnapshotBackend + 'static,
{
    /// Opens the default namespace, loading any state already persisted.
    pub fn open(backend: Arc<B>) -> Result<Self, SnapshotError> {
        Self::open_namespace(backend, SNAPSHOT_NAMESPACE)
    }

    pub fn open_namespace(backend: Arc<B>, namespace: &str) -> Result<Self, SnapshotError> {
        let state = match backend.load(namespace)? {
            Some(blob) => import_all(&blob)?,
            None => SnapshotState::default(),
        };
        debug!(namespace, snapshots = state.items.len(), "opened snapshot store");

        Ok(Self {
            backend,
            namespace: namespace.to_string(),
            state: Mutex::new(state),
        })
    }

    pub fn list(&self) -> Result<Vec<ScenarioSnapshot>, SnapshotError> {
        self.read(|state| state.items.clone())
    }

    pub fn get(&self, id: &str) -> Result<ScenarioSnapshot, SnapshotError> {
        self.read(|state| state.find(id).cloned())?
            .ok_or_else(|| SnapshotError::NotFound { id: id.to_string() })
    }

    pub fn add(&self, draft: SnapshotDraft) -> Result<ScenarioSnapshot, SnapshotError> {
        let snapshot = self.mutate(|state| Ok(state.add(draft)))?;
        info!(id = %snapshot.id, name = %snapshot.name, "saved scenario snapshot");
        Ok(snapshot)
    }

    pub fn rename(&self, id: &str, name: &str) -> Result<ScenarioSnapshot, SnapshotError> {
        self.mutate(|state| state.rename(id, name))
    }

    pub fn duplicate(&self, id: &str) -> Result<ScenarioSnapshot, SnapshotError> {
        self.mutate(|state| state.duplicate(id))
    }

    pub fn delete(&self, id: &str) -> Result<(), SnapshotError> {
        let removed = self.mutate(|state| state.delete(id))?;
        info!(id = %removed.id, "deleted scenario snapshot");
        Ok(())
    }

    pub fn export_all(&self) -> Result<String, SnapshotError> {
        let state = self.read(|state| state.clone())?;
        export_all(&state)
    }

    /// Replaces the stored state with an imported document.
    pub fn import_all(&self, serialized: &str) -> Result<usize, SnapshotError> {
        let imported = import_all(serialized)?;
        let count = imported.items.len();
        self.mutate(move |state| {
            *state = imported;
            Ok(())
        })?;
        info!(count, "imported scenario snapshots");
        Ok(count)
    }

    pub fn diff(&self, a: &str, b: &str) -> Result<SnapshotDiff, SnapshotError> {
        self.read(|state| state.diff(a, b))?
    }

    fn read<T>(&self, view: impl FnOnce(&SnapshotState) -> T) -> Result<T, SnapshotError> {
        let guard = self.state.lock().map_err(|_| SnapshotError::Poisoned)?;
        Ok(view(&guard))
    }

    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut SnapshotState) -> Result<T, SnapshotError>,
    ) -> Result<T, SnapshotError> {
        let mut guard = self.state.lock().map_err(|_| SnapshotError::Poisoned)?;
        let mut next = guard.clone();
        let outcome = change(&mut next)?;
        self.backend.save(&self.namespace, &export_all(&next)?)?;
        *guard = next;
        Ok(outcome)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot {id} not found")]
    NotFound { id: String },
    #[error("unsupported snapshot document version {0}")]
    UnsupportedVersion(String),
    #[error("unknown scenario {0}")]
    UnknownScenario(String),
    #[error("invalid snapshot document: {0}")]
    InvalidDocument(String),
    #[error("malformed snapshot json: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Backend(#[from] SnapshotBackendError),
    #[error("snapshot state lock poisoned")]
    Poisoned,
}

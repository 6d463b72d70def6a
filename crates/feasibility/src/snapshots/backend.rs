use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key-value blob storage for snapshot state, one blob per namespace.
pub trait SnapshotBackend: Send + Sync {
    /// The stored blob, or `None` when the namespace has never been written.
    fn load(&self, namespace: &str) -> Result<Option<String>, SnapshotBackendError>;
    fn save(&self, namespace: &str, blob: &str) -> Result<(), SnapshotBackendError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotBackendError {
    #[error("snapshot storage io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Default)]
pub struct MemorySnapshotBackend {
    blobs: Mutex<HashMap<String, String>>,
}

impl SnapshotBackend for MemorySnapshotBackend {
    fn load(&self, namespace: &str) -> Result<Option<String>, SnapshotBackendError> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| SnapshotBackendError::Unavailable("blob map poisoned".to_string()))?;
        Ok(blobs.get(namespace).cloned())
    }

    fn save(&self, namespace: &str, blob: &str) -> Result<(), SnapshotBackendError> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| SnapshotBackendError::Unavailable("blob map poisoned".to_string()))?;
        blobs.insert(namespace.to_string(), blob.to_string());
        Ok(())
    }
}

/// Stores each namespace as `<root>/<namespace>.json`.
#[derive(Debug, Clone)]
pub struct FileSnapshotBackend {
    root: PathBuf,
}

impl FileSnapshotBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, namespace: &str) -> PathBuf {
        self.root.join(format!("{namespace}.json"))
    }
}

impl SnapshotBackend for FileSnapshotBackend {
    fn load(&self, namespace: &str) -> Result<Option<String>, SnapshotBackendError> {
        match fs::read_to_string(self.path_for(namespace)) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, namespace: &str, blob: &str) -> Result<(), SnapshotBackendError> {
        fs::create_dir_all(&self.root)?;
        let target = self.path_for(namespace);
        let staging = target.with_extension("json.tmp");
        fs::write(&staging, blob)?;
        fs::rename(&staging, &target)?;
        Ok(())
    }
}

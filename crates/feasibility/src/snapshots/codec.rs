//! JSON export and lenient import of the whole snapshot state.

use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use super::domain::{ScenarioSnapshot, SnapshotState, SNAPSHOT_VERSION};
use super::store::{display_name, SnapshotError};

/// Pretty-printed `{ "version": 1, "items": [...] }`.
pub fn export_all(state: &SnapshotState) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// Parses an exported document.
///
/// Unknown version tags and malformed JSON are rejected. Individual items
/// are repaired where possible: numbers coerce to zero (optional KPIs to
/// null), missing ids are regenerated and blank names become
/// `Untitled snapshot`. Items that are not objects are skipped.
pub fn import_all(serialized: &str) -> Result<SnapshotState, SnapshotError> {
    let document: Value = serde_json::from_str(serialized)?;
    let Value::Object(root) = document else {
        return Err(SnapshotError::InvalidDocument(
            "expected a JSON object".to_string(),
        ));
    };

    let version = root.get("version").cloned().unwrap_or(Value::Null);
    if !is_supported_version(&version) {
        return Err(SnapshotError::UnsupportedVersion(version.to_string()));
    }

    let items = match root.get("items") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => {
            return Err(SnapshotError::InvalidDocument(format!(
                "items must be an array, found {}",
                kind_of(other)
            )))
        }
    };

    let mut state = SnapshotState::default();
    for (position, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            warn!(position, kind = kind_of(&item), "skipping non-object snapshot item");
            continue;
        }
        match serde_json::from_value::<ScenarioSnapshot>(item) {
            Ok(snapshot) => state.items.push(repair(snapshot)),
            Err(err) => warn!(position, %err, "skipping unreadable snapshot item"),
        }
    }

    Ok(state)
}
/// The integer tag, or the same digits as text.
fn is_supported_version(version: &Value) -> bool {
    match version {
        Value::Number(number) => number.as_u64() == Some(u64::from(SNAPSHOT_VERSION)),
        Value::String(raw) => raw.trim() == SNAPSHOT_VERSION.to_string(),
        _ => false,
    }
}

fn repair(mut snapshot: ScenarioSnapshot) -> ScenarioSnapshot {
    if snapshot.id.trim().is_empty() {
        snapshot.id = Uuid::new_v4().to_string();
    }
    snapshot.name = display_name(snapshot.name);
    snapshot.traces.fill_period_count();
    snapshot
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

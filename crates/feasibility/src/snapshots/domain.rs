use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::cashflow::FeasibilityInputs;
use crate::lenient;

/// Key under which the whole snapshot state is persisted.
pub const SNAPSHOT_NAMESPACE: &str = "feasibility.scenario-snapshots";
pub const SNAPSHOT_VERSION: u32 = 1;
pub const UNTITLED_SNAPSHOT: &str = "Untitled snapshot";

/// Headline KPIs captured with a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub irr_annual: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub tvpi: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub dpi: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub rvpi: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub moic: f64,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub gp_clawback_last: Option<f64>,
}

/// Per-period series kept for charting and diffing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotTraces {
    #[serde(default, deserialize_with = "lenient::count")]
    pub period_count: u32,
    #[serde(default, deserialize_with = "lenient::series")]
    pub calls_total: Vec<f64>,
    #[serde(default, deserialize_with = "lenient::series")]
    pub dists_total: Vec<f64>,
    #[serde(default, deserialize_with = "lenient::series")]
    pub gp_promote: Vec<f64>,
    #[serde(default, deserialize_with = "lenient::series")]
    pub gp_clawback: Vec<f64>,
}

impl SnapshotTraces {
    pub fn longest_series(&self) -> usize {
        [
            self.calls_total.len(),
            self.dists_total.len(),
            self.gp_promote.len(),
            self.gp_clawback.len(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// A zero `period_count` is taken from the longest series.
    pub(crate) fn fill_period_count(&mut self) {
        if self.period_count == 0 {
            self.period_count = u32::try_from(self.longest_series()).unwrap_or(u32::MAX);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSnapshot {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "Utc::now", deserialize_with = "lenient::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "tolerant_inputs")]
    pub inputs: Option<FeasibilityInputs>,
    #[serde(default)]
    pub summary: SnapshotSummary,
    #[serde(default)]
    pub traces: SnapshotTraces,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Payload for a new snapshot; the store assigns identity and timestamp.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "tolerant_inputs")]
    pub inputs: Option<FeasibilityInputs>,
    #[serde(default)]
    pub summary: SnapshotSummary,
    #[serde(default)]
    pub traces: SnapshotTraces,
    #[serde(default)]
    pub note: Option<String>,
}

/// Everything persisted under [`SNAPSHOT_NAMESPACE`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotState {
    pub version: u32,
    pub items: Vec<ScenarioSnapshot>,
}

impl Default for SnapshotState {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            items: Vec::new(),
        }
    }
}

fn tolerant_inputs<'de, D>(deserializer: D) -> Result<Option<FeasibilityInputs>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(inputs) => Ok(Some(inputs)),
        Err(err) => {
            warn!(%err, "dropping unreadable snapshot inputs");
            Ok(None)
        }
    }
}

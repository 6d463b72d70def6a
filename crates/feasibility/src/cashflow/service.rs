use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};
use uuid::Uuid;

use super::builder::ScenarioBuilder;
use super::compliance::{project_escrow_releases, EscrowRelease};
use super::domain::{CashflowGrid, FeasibilityInputs};
use super::repository::{grid_from_rows, rows_from_grid, CashflowRepository, RepositoryError};
use super::scenario::ScenarioTable;
use super::summary::{summarize_grid, ScenarioSummary};

/// A built grid together with each scenario's KPIs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridReport {
    pub grid: CashflowGrid,
    pub summaries: BTreeMap<String, ScenarioSummary>,
    /// Checkpoint release plan per scenario; empty unless escrow is on.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub escrow_releases: BTreeMap<String, Vec<EscrowRelease>>,
}

/// Service composing the scenario builder with the record store.
///
/// Publishes are serialized so that two callers never interleave their
/// supersede and insert steps.
pub struct FeasibilityService<R> {
    repository: Arc<R>,
    builder: ScenarioBuilder,
    publish_lock: Mutex<()>,
}

impl<R> FeasibilityService<R>
where
    R: CashflowRepository + 'static,
{
    pub fn new(repository: Arc<R>, builder: ScenarioBuilder) -> Self {
        Self {
            repository,
            builder,
            publish_lock: Mutex::new(()),
        }
    }

    pub fn builder(&self) -> &ScenarioBuilder {
        &self.builder
    }

    /// Builds every standard scenario without touching the record store.
    pub fn preview(&self, inputs: &FeasibilityInputs, version_label: &str) -> GridReport {
        let table = ScenarioTable::standard(inputs.custom_multipliers);
        let grid = self.builder.build_grid(inputs, &table, version_label);
        let summaries = summarize_grid(&grid, &table);
        let escrow_releases = if inputs.escrow.enabled {
            grid.scenarios
                .iter()
                .map(|(name, series)| {
                    let reserve: f64 = series.iter().map(|row| row.escrow_reserved).sum();
                    let plan =
                        project_escrow_releases(reserve, series.len(), inputs.escrow.release_trigger);
                    (name.clone(), plan)
                })
                .collect()
        } else {
            BTreeMap::new()
        };
        GridReport {
            grid,
            summaries,
            escrow_releases,
        }
    }

    /// Builds and stores a new grid version, superseding earlier versions.
    ///
    /// Re-using a label replaces the rows stored under it. Scenarios are
    /// inserted one at a time; a failure part-way leaves the earlier
    /// scenarios stored and the caller must publish the whole grid again.
    pub fn publish(
        &self,
        project_id: &str,
        inputs: &FeasibilityInputs,
        version_label: Option<String>,
    ) -> Result<GridReport, FeasibilityServiceError> {
        let version_label = version_label.unwrap_or_else(default_version_label);
        let report = self.preview(inputs, &version_label);

        let _publishing = self
            .publish_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let replaced = self.repository.remove_version(project_id, &version_label)?;
        let superseded = self.repository.supersede(project_id)?;
        let rows = rows_from_grid(project_id, &report.grid);
        for scenario in report.grid.scenario_names() {
            let scenario_rows: Vec<_> = rows
                .iter()
                .filter(|row| row.scenario == scenario)
                .cloned()
                .collect();
            if let Err(err) = self.repository.insert(scenario_rows) {
                warn!(project_id, scenario, %err, "grid publish interrupted; re-issue the full grid");
                return Err(err.into());
            }
        }

        info!(
            project_id,
            version = %version_label,
            replaced,
            superseded,
            rows = rows.len(),
            "published cashflow grid"
        );
        Ok(report)
    }

    /// Reads the latest grid, or a labelled version when one is given.
    pub fn load(
        &self,
        project_id: &str,
        version_label: Option<&str>,
    ) -> Result<CashflowGrid, FeasibilityServiceError> {
        let rows = match version_label {
            Some(label) => self.repository.version(project_id, label)?,
            None => self.repository.latest(project_id)?,
        };

        grid_from_rows(&rows)?.ok_or_else(|| FeasibilityServiceError::GridNotFound {
            project_id: project_id.to_string(),
        })
    }
}

/// `v<yyyymmddHHMMSSmmm>-<8 hex>`; the suffix keeps same-millisecond
/// publishes apart.
fn default_version_label() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "v{}-{}",
        Utc::now().format("%Y%m%d%H%M%S%3f"),
        &suffix[..8]
    )
}

#[derive(Debug, thiserror::Error)]
pub enum FeasibilityServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("no cashflow grid stored for project {project_id}")]
    GridNotFound { project_id: String },
}

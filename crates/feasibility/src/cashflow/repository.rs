use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use super::domain::{CashflowGrid, MonthlyCashflow, SegmentRevenue};

/// One `(project, scenario, period)` row with every cashflow field flattened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowRow {
    pub project_id: String,
    pub scenario: String,
    pub period: NaiveDate,
    pub period_index: usize,
    pub construction_cost: f64,
    pub land_cost: f64,
    pub soft_costs: f64,
    pub loan_drawn: f64,
    pub loan_interest: f64,
    pub loan_repayment: f64,
    pub equity_injected: f64,
    pub revenue: f64,
    pub revenue_residential: Option<f64>,
    pub revenue_retail: Option<f64>,
    pub revenue_office: Option<f64>,
    pub profit: f64,
    pub net_cashflow: f64,
    pub cash_balance: f64,
    pub zakat_due: f64,
    pub vat_on_costs: f64,
    pub vat_recoverable: f64,
    pub escrow_reserved: f64,
    pub escrow_released: f64,
    pub version_label: String,
    pub is_latest: bool,
}

impl CashflowRow {
    pub fn from_cashflow(
        project_id: &str,
        scenario: &str,
        version_label: &str,
        row: &MonthlyCashflow,
    ) -> Self {
        let segments = row.revenue_by_segment;
        Self {
            project_id: project_id.to_string(),
            scenario: scenario.to_string(),
            period: row.period,
            period_index: row.period_index,
            construction_cost: row.construction_cost,
            land_cost: row.land_cost,
            soft_costs: row.soft_costs,
            loan_drawn: row.loan_drawn,
            loan_interest: row.loan_interest,
            loan_repayment: row.loan_repayment,
            equity_injected: row.equity_injected,
            revenue: row.revenue,
            revenue_residential: segments.map(|split| split.residential),
            revenue_retail: segments.map(|split| split.retail),
            revenue_office: segments.map(|split| split.office),
            profit: row.profit,
            net_cashflow: row.net_cashflow,
            cash_balance: row.cash_balance,
            zakat_due: row.zakat_due,
            vat_on_costs: row.vat_on_costs,
            vat_recoverable: row.vat_recoverable,
            escrow_reserved: row.escrow_reserved,
            escrow_released: row.escrow_released,
            version_label: version_label.to_string(),
            is_latest: true,
        }
    }

    pub fn to_cashflow(&self) -> MonthlyCashflow {
        let revenue_by_segment = match (
            self.revenue_residential,
            self.revenue_retail,
            self.revenue_office,
        ) {
            (None, None, None) => None,
            (residential, retail, office) => Some(SegmentRevenue {
                residential: residential.unwrap_or(0.0),
                retail: retail.unwrap_or(0.0),
                office: office.unwrap_or(0.0),
            }),
        };

        MonthlyCashflow {
            period: self.period,
            period_index: self.period_index,
            construction_cost: self.construction_cost,
            land_cost: self.land_cost,
            soft_costs: self.soft_costs,
            loan_drawn: self.loan_drawn,
            loan_interest: self.loan_interest,
            loan_repayment: self.loan_repayment,
            equity_injected: self.equity_injected,
            revenue: self.revenue,
            revenue_by_segment,
            profit: self.profit,
            net_cashflow: self.net_cashflow,
            cash_balance: self.cash_balance,
            zakat_due: self.zakat_due,
            vat_on_costs: self.vat_on_costs,
            vat_recoverable: self.vat_recoverable,
            escrow_reserved: self.escrow_reserved,
            escrow_released: self.escrow_released,
        }
    }
}

/// Flattens every scenario of `grid` into latest-tagged rows.
pub fn rows_from_grid(project_id: &str, grid: &CashflowGrid) -> Vec<CashflowRow> {
    grid.scenarios
        .iter()
        .flat_map(|(scenario, series)| {
            series.iter().map(move |row| {
                CashflowRow::from_cashflow(project_id, scenario, &grid.version_label, row)
            })
        })
        .collect()
}

/// Reassembles a grid from rows of a single version. `None` when empty.
///
/// Rows spanning several version labels, or repeating a
/// `(scenario, period_index)` pair, are rejected as inconsistent.
pub fn grid_from_rows(rows: &[CashflowRow]) -> Result<Option<CashflowGrid>, RepositoryError> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };
    let version_label = first.version_label.clone();

    let mut seen = BTreeSet::new();
    let mut scenarios: BTreeMap<String, Vec<MonthlyCashflow>> = BTreeMap::new();
    for row in rows {
        if row.version_label != version_label {
            return Err(RepositoryError::Inconsistent(format!(
                "rows mix versions {version_label} and {}",
                row.version_label
            )));
        }
        if !seen.insert((row.scenario.as_str(), row.period_index)) {
            return Err(RepositoryError::Inconsistent(format!(
                "scenario {} repeats period {} in version {version_label}",
                row.scenario, row.period_index
            )));
        }
        scenarios
            .entry(row.scenario.clone())
            .or_default()
            .push(row.to_cashflow());
    }
    for series in scenarios.values_mut() {
        series.sort_by_key(|row| row.period_index);
    }

    Ok(Some(CashflowGrid {
        version_label,
        scenarios,
    }))
}

/// Record store for published grids.
///
/// Publishing drops any rows already stored under the same label, then flips
/// every earlier row for the project to `is_latest = false` before inserting
/// the new rows, so readers never see two latest versions.
pub trait CashflowRepository: Send + Sync {
    /// Deletes every row of `project_id` carrying `version_label`, returning
    /// how many were removed.
    fn remove_version(
        &self,
        project_id: &str,
        version_label: &str,
    ) -> Result<usize, RepositoryError>;
    /// Marks every existing row of `project_id` as superseded, returning how
    /// many rows changed.
    fn supersede(&self, project_id: &str) -> Result<usize, RepositoryError>;
    fn insert(&self, rows: Vec<CashflowRow>) -> Result<(), RepositoryError>;
    /// Rows flagged latest, ordered by scenario then period.
    fn latest(&self, project_id: &str) -> Result<Vec<CashflowRow>, RepositoryError>;
    fn version(
        &self,
        project_id: &str,
        version_label: &str,
    ) -> Result<Vec<CashflowRow>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("stored rows are inconsistent: {0}")]
    Inconsistent(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Process-local record store used by the CLI, the demo server and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCashflowRepository {
    rows: Arc<Mutex<Vec<CashflowRow>>>,
}

impl InMemoryCashflowRepository {
    fn with_rows<T>(
        &self,
        action: impl FnOnce(&mut Vec<CashflowRow>) -> T,
    ) -> Result<T, RepositoryError> {
        let mut guard = self
            .rows
            .lock()
            .map_err(|_| RepositoryError::Unavailable("row store mutex poisoned".to_string()))?;
        Ok(action(&mut guard))
    }

    pub fn row_count(&self) -> usize {
        self.with_rows(|rows| rows.len()).unwrap_or(0)
    }
}

impl CashflowRepository for InMemoryCashflowRepository {
    fn remove_version(
        &self,
        project_id: &str,
        version_label: &str,
    ) -> Result<usize, RepositoryError> {
        self.with_rows(|rows| {
            let before = rows.len();
            rows.retain(|row| {
                !(row.project_id == project_id && row.version_label == version_label)
            });
            before - rows.len()
        })
    }

    fn supersede(&self, project_id: &str) -> Result<usize, RepositoryError> {
        self.with_rows(|rows| {
            let mut changed = 0;
            for row in rows
                .iter_mut()
                .filter(|row| row.project_id == project_id && row.is_latest)
            {
                row.is_latest = false;
                changed += 1;
            }
            changed
        })
    }

    fn insert(&self, rows: Vec<CashflowRow>) -> Result<(), RepositoryError> {
        self.with_rows(|stored| stored.extend(rows))
    }

    fn latest(&self, project_id: &str) -> Result<Vec<CashflowRow>, RepositoryError> {
        self.with_rows(|rows| {
            select_sorted(rows, |row| row.project_id == project_id && row.is_latest)
        })
    }

    fn version(
        &self,
        project_id: &str,
        version_label: &str,
    ) -> Result<Vec<CashflowRow>, RepositoryError> {
        self.with_rows(|rows| {
            select_sorted(rows, |row| {
                row.project_id == project_id && row.version_label == version_label
            })
        })
    }
}

fn select_sorted(rows: &[CashflowRow], keep: impl Fn(&CashflowRow) -> bool) -> Vec<CashflowRow> {
    let mut selected: Vec<CashflowRow> = rows.iter().filter(|row| keep(row)).cloned().collect();
    selected.sort_by(|a, b| {
        a.scenario
            .cmp(&b.scenario)
            .then(a.period_index.cmp(&b.period_index))
    });
    selected
}

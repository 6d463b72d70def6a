use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::cashflow::domain::{FeasibilityInputs, LoanTerms, MonthlyCashflow, RepaymentStyle};
use crate::cashflow::repository::{
    CashflowRepository, CashflowRow, InMemoryCashflowRepository, RepositoryError,
};
use crate::cashflow::{FeasibilityService, ScenarioBuilder};

pub(super) const TOLERANCE: f64 = 1e-6;

pub(super) fn date(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("valid date")
}

/// Two-year tower: 10M build cost, 5,000 sqm sold at 3,000, 6M bullet loan.
pub(super) fn tower_inputs() -> FeasibilityInputs {
    let mut inputs = FeasibilityInputs::starting(date(2025, 1));
    inputs.project_completion = Some(date(2026, 12));
    inputs.construction_cost = 10_000_000.0;
    inputs.total_gfa = 5_000.0;
    inputs.avg_sale_price = 3_000.0;
    inputs.loan = LoanTerms {
        principal: 6_000_000.0,
        interest_rate_pct: 8.0,
        term_months: 24,
        repayment_style: RepaymentStyle::Bullet,
        grace_period_months: 2,
    };
    inputs
}

pub(super) fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}

pub(super) fn column(series: &[MonthlyCashflow], pick: impl Fn(&MonthlyCashflow) -> f64) -> Vec<f64> {
    series.iter().map(pick).collect()
}

pub(super) fn total(series: &[MonthlyCashflow], pick: impl Fn(&MonthlyCashflow) -> f64) -> f64 {
    series.iter().map(pick).sum()
}

pub(super) fn build_service() -> (
    FeasibilityService<InMemoryCashflowRepository>,
    Arc<InMemoryCashflowRepository>,
) {
    let repository = Arc::new(InMemoryCashflowRepository::default());
    let service = FeasibilityService::new(repository.clone(), ScenarioBuilder::default());
    (service, repository)
}

/// Accepts `allowed` inserts and fails every one after.
pub(super) struct FlakyRepository {
    inner: InMemoryCashflowRepository,
    allowed: usize,
    inserts: AtomicUsize,
}

impl FlakyRepository {
    pub(super) fn allowing(allowed: usize) -> Self {
        Self {
            inner: InMemoryCashflowRepository::default(),
            allowed,
            inserts: AtomicUsize::new(0),
        }
    }

    pub(super) fn stored_rows(&self) -> usize {
        self.inner.row_count()
    }
}

impl CashflowRepository for FlakyRepository {
    fn remove_version(
        &self,
        project_id: &str,
        version_label: &str,
    ) -> Result<usize, RepositoryError> {
        self.inner.remove_version(project_id, version_label)
    }

    fn supersede(&self, project_id: &str) -> Result<usize, RepositoryError> {
        self.inner.supersede(project_id)
    }

    fn insert(&self, rows: Vec<CashflowRow>) -> Result<(), RepositoryError> {
        if self.inserts.fetch_add(1, Ordering::SeqCst) >= self.allowed {
            return Err(RepositoryError::Unavailable("write timeout".to_string()));
        }
        self.inner.insert(rows)
    }

    fn latest(&self, project_id: &str) -> Result<Vec<CashflowRow>, RepositoryError> {
        self.inner.latest(project_id)
    }

    fn version(
        &self,
        project_id: &str,
        version_label: &str,
    ) -> Result<Vec<CashflowRow>, RepositoryError> {
        self.inner.version(project_id, version_label)
    }
}

pub(super) struct UnavailableRepository;

impl CashflowRepository for UnavailableRepository {
    fn remove_version(
        &self,
        _project_id: &str,
        _version_label: &str,
    ) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn supersede(&self, _project_id: &str) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn insert(&self, _rows: Vec<CashflowRow>) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn latest(&self, _project_id: &str) -> Result<Vec<CashflowRow>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn version(
        &self,
        _project_id: &str,
        _version_label: &str,
    ) -> Result<Vec<CashflowRow>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4 * 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

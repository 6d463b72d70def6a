use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::compliance::EscrowTrigger;
use super::scenario::ScenarioMultipliers;
use crate::lenient;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepaymentStyle {
    #[default]
    Bullet,
    EqualInstallment,
    InterestOnly,
}

impl RepaymentStyle {
    pub const fn ordered() -> [Self; 3] {
        [Self::Bullet, Self::EqualInstallment, Self::InterestOnly]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Bullet => "Bullet",
            Self::EqualInstallment => "Equal Installment",
            Self::InterestOnly => "Interest Only",
        }
    }
}

/// A named slice of the build programme with its share of the cost total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::index")]
    pub start_period: usize,
    #[serde(default, deserialize_with = "lenient::index")]
    pub duration_periods: usize,
    #[serde(default, deserialize_with = "lenient::number")]
    pub cost_percent_of_total: f64,
}

/// Percentage split of gross sales across product segments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueMix {
    #[serde(default, deserialize_with = "lenient::number")]
    pub residential: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub retail: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub office: f64,
}

impl RevenueMix {
    pub fn split(&self, revenue: f64) -> SegmentRevenue {
        SegmentRevenue {
            residential: revenue * self.residential / 100.0,
            retail: revenue * self.retail / 100.0,
            office: revenue * self.office / 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRevenue {
    pub residential: f64,
    pub retail: f64,
    pub office: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTerms {
    #[serde(default, deserialize_with = "lenient::number")]
    pub principal: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub interest_rate_pct: f64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub term_months: u32,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub repayment_style: RepaymentStyle,
    #[serde(default, deserialize_with = "lenient::count")]
    pub grace_period_months: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowTerms {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, deserialize_with = "lenient::number")]
    pub percent: f64,
    /// Checkpoint basis for the reporting release plan only.
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub release_trigger: EscrowTrigger,
}

/// Percentage levy that only applies when switched on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevyToggle {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, deserialize_with = "lenient::number")]
    pub rate_pct: f64,
}

impl LevyToggle {
    pub fn active_rate(&self) -> Option<f64> {
        self.enabled.then_some(self.rate_pct)
    }
}

/// Project assumptions feeding every scenario build.
///
/// Only the start date is mandatory. Every numeric field falls back to zero
/// when absent or unreadable, and an unreadable completion date counts as
/// absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeasibilityInputs {
    pub project_start: NaiveDate,
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub project_completion: Option<NaiveDate>,
    #[serde(default)]
    pub phasing_enabled: bool,
    #[serde(default)]
    pub construction_phases: Vec<Phase>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub construction_cost: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub land_cost: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub soft_costs: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_gfa: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub avg_sale_price: f64,
    #[serde(default)]
    pub revenue_mix: Option<RevenueMix>,
    #[serde(default)]
    pub loan: LoanTerms,
    #[serde(default)]
    pub escrow: EscrowTerms,
    #[serde(default)]
    pub zakat: LevyToggle,
    #[serde(default)]
    pub vat: LevyToggle,
    #[serde(default)]
    pub custom_multipliers: Option<ScenarioMultipliers>,
}

impl FeasibilityInputs {
    /// Minimal inputs anchored on a start date; everything else zeroed.
    pub fn starting(project_start: NaiveDate) -> Self {
        Self {
            project_start,
            project_completion: None,
            phasing_enabled: false,
            construction_phases: Vec::new(),
            construction_cost: 0.0,
            land_cost: 0.0,
            soft_costs: 0.0,
            total_gfa: 0.0,
            avg_sale_price: 0.0,
            revenue_mix: None,
            loan: LoanTerms::default(),
            escrow: EscrowTerms::default(),
            zakat: LevyToggle::default(),
            vat: LevyToggle::default(),
            custom_multipliers: None,
        }
    }
}

/// One period of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCashflow {
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_by_segment: Option<SegmentRevenue>,
    pub profit: f64,
    pub net_cashflow: f64,
    pub cash_balance: f64,
    pub zakat_due: f64,
    pub vat_on_costs: f64,
    pub vat_recoverable: f64,
    pub escrow_reserved: f64,
    pub escrow_released: f64,
}

impl MonthlyCashflow {
    pub fn period_label(&self) -> String {
        self.period.format("%Y-%m").to_string()
    }

    pub fn development_costs(&self) -> f64 {
        self.construction_cost + self.land_cost + self.soft_costs
    }

    pub fn cash_in(&self) -> f64 {
        self.loan_drawn
            + self.equity_injected
            + self.revenue
            + self.vat_recoverable
            + self.escrow_released
    }

    pub fn cash_out(&self) -> f64 {
        self.development_costs()
            + self.loan_interest
            + self.loan_repayment
            + self.zakat_due
            + self.vat_on_costs
            + self.escrow_reserved
    }
}

/// Every scenario's series for one set of inputs, sharing a single timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowGrid {
    pub version_label: String,
    pub scenarios: BTreeMap<String, Vec<MonthlyCashflow>>,
}

impl CashflowGrid {
    pub fn scenario(&self, name: &str) -> Option<&[MonthlyCashflow]> {
        self.scenarios.get(name).map(Vec::as_slice)
    }

    pub fn period_count(&self) -> usize {
        self.scenarios.values().map(Vec::len).max().unwrap_or(0)
    }

    pub fn scenario_names(&self) -> impl Iterator<Item = &str> {
        self.scenarios.keys().map(String::as_str)
    }
}

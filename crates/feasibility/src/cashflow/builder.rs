use std::collections::BTreeMap;

use tracing::debug;

use super::allocation::{allocate_delayed, allocate_equity_phased, allocate_even, allocate_phased};
use super::compliance::{ComplianceOverlay, OverlayBasis};
use super::domain::{CashflowGrid, FeasibilityInputs, MonthlyCashflow, Phase};
use super::loan::{LoanFacility, LoanSchedule};
use super::phasing::PhaseBlueprint;
use super::scenario::{ScenarioMultipliers, ScenarioTable};
use super::timeline::{Timeline, DEFAULT_FALLBACK_HORIZON_MONTHS};

/// Tunables for the build pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSettings {
    pub fallback_horizon_months: u32,
    /// Even mode sells out over this many periods ending at completion.
    pub revenue_window_periods: usize,
    /// Phasing only kicks in for timelines longer than this.
    pub phasing_min_periods: usize,
    pub phased_revenue_start_fraction: f64,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            fallback_horizon_months: DEFAULT_FALLBACK_HORIZON_MONTHS,
            revenue_window_periods: 6,
            phasing_min_periods: 6,
            phased_revenue_start_fraction: 0.75,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationMode {
    Even,
    Phased,
}

/// Cost and revenue lines before financing and levies.
#[derive(Debug, Clone, Default)]
struct DevelopmentLines {
    construction: Vec<f64>,
    land: Vec<f64>,
    soft: Vec<f64>,
    revenue: Vec<f64>,
}

impl DevelopmentLines {
    fn cost_at(&self, index: usize) -> f64 {
        self.construction[index] + self.land[index] + self.soft[index]
    }

    fn costs_per_period(&self) -> Vec<f64> {
        (0..self.construction.len())
            .map(|index| self.cost_at(index))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioBuilder {
    settings: BuildSettings,
}

impl ScenarioBuilder {
    pub fn new(settings: BuildSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    pub fn timeline(&self, inputs: &FeasibilityInputs) -> Timeline {
        Timeline::monthly(
            inputs.project_start,
            inputs.project_completion,
            self.settings.fallback_horizon_months,
        )
    }

    pub fn allocation_mode(&self, inputs: &FeasibilityInputs, periods: usize) -> AllocationMode {
        if inputs.phasing_enabled && periods > self.settings.phasing_min_periods {
            AllocationMode::Phased
        } else {
            AllocationMode::Even
        }
    }

    pub fn build(
        &self,
        inputs: &FeasibilityInputs,
        multipliers: &ScenarioMultipliers,
    ) -> Vec<MonthlyCashflow> {
        let timeline = self.timeline(inputs);
        self.build_on(&timeline, inputs, multipliers)
    }

    /// Runs every scenario in `table` over one shared timeline.
    pub fn build_grid(
        &self,
        inputs: &FeasibilityInputs,
        table: &ScenarioTable,
        version_label: impl Into<String>,
    ) -> CashflowGrid {
        let timeline = self.timeline(inputs);
        let scenarios: BTreeMap<String, Vec<MonthlyCashflow>> = table
            .entries()
            .iter()
            .map(|entry| {
                (
                    entry.name.clone(),
                    self.build_on(&timeline, inputs, &entry.multipliers),
                )
            })
            .collect();

        CashflowGrid {
            version_label: version_label.into(),
            scenarios,
        }
    }

    fn build_on(
        &self,
        timeline: &Timeline,
        inputs: &FeasibilityInputs,
        multipliers: &ScenarioMultipliers,
    ) -> Vec<MonthlyCashflow> {
        let periods = timeline.len();
        let mode = self.allocation_mode(inputs, periods);

        let construction_total = inputs.construction_cost * multipliers.construction_cost_multiplier;
        let sale_price = inputs.avg_sale_price * multipliers.sale_price_multiplier;
        let revenue_total = inputs.total_gfa * sale_price;
        let land_total = inputs.land_cost;
        let soft_total = inputs.soft_costs;
        let total_cost = construction_total + land_total + soft_total;

        debug!(
            periods,
            ?mode,
            construction_total,
            revenue_total,
            "building scenario cashflow"
        );

        let lines = self.development_lines(
            inputs,
            mode,
            periods,
            construction_total,
            land_total,
            soft_total,
            revenue_total,
        );

        let facility = LoanFacility::from_terms(&inputs.loan, periods);
        let loan = facility.schedule();

        let equity_needed = (total_cost - facility.principal).max(0.0);
        let equity = match mode {
            AllocationMode::Phased => allocate_equity_phased(equity_needed, &lines.costs_per_period()),
            AllocationMode::Even => allocate_even(equity_needed, periods),
        };

        let overlay = ComplianceOverlay::from_inputs(inputs).apply(
            OverlayBasis {
                construction: &lines.construction,
                land: &lines.land,
                soft: &lines.soft,
                revenue: &lines.revenue,
            },
            periods,
        );

        let mut cash_balance = 0.0;
        timeline
            .periods()
            .map(|period| {
                let index = period.index;
                let revenue = lines.revenue[index];
                let mut row = MonthlyCashflow {
                    period: period.month,
                    period_index: index,
                    construction_cost: lines.construction[index],
                    land_cost: lines.land[index],
                    soft_costs: lines.soft[index],
                    loan_drawn: LoanSchedule::at(&loan.drawn, index),
                    loan_interest: LoanSchedule::at(&loan.interest, index),
                    loan_repayment: LoanSchedule::at(&loan.repayment, index),
                    equity_injected: equity[index],
                    revenue,
                    revenue_by_segment: inputs.revenue_mix.map(|mix| mix.split(revenue)),
                    profit: revenue - lines.cost_at(index),
                    net_cashflow: 0.0,
                    cash_balance: 0.0,
                    zakat_due: overlay.zakat_due[index],
                    vat_on_costs: overlay.vat_on_costs[index],
                    vat_recoverable: overlay.vat_recoverable[index],
                    escrow_reserved: overlay.escrow_reserved[index],
                    escrow_released: overlay.escrow_released[index],
                };
                row.net_cashflow = row.cash_in() - row.cash_out();
                cash_balance += row.net_cashflow;
                row.cash_balance = cash_balance;
                row
            })
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn development_lines(
        &self,
        inputs: &FeasibilityInputs,
        mode: AllocationMode,
        periods: usize,
        construction_total: f64,
        land_total: f64,
        soft_total: f64,
        revenue_total: f64,
    ) -> DevelopmentLines {
        let mut land = vec![0.0; periods];
        if let Some(first) = land.first_mut() {
            *first = land_total;
        }

        match mode {
            AllocationMode::Phased => {
                let revenue_start = ((periods as f64 * self.settings.phased_revenue_start_fraction)
                    .floor() as usize)
                    .min(periods.saturating_sub(1));
                let phases = self.construction_phases(inputs, revenue_start.max(1));

                DevelopmentLines {
                    construction: allocate_phased(construction_total, &phases, periods),
                    land,
                    soft: allocate_phased(soft_total, &phases, periods),
                    revenue: allocate_delayed(
                        revenue_total,
                        periods,
                        revenue_start,
                        periods - revenue_start,
                    ),
                }
            }
            AllocationMode::Even => {
                let window = self.settings.revenue_window_periods;
                DevelopmentLines {
                    construction: allocate_even(construction_total, periods),
                    land,
                    soft: allocate_even(soft_total, periods),
                    revenue: allocate_delayed(
                        revenue_total,
                        periods,
                        periods.saturating_sub(window),
                        window,
                    ),
                }
            }
        }
    }

    fn construction_phases(&self, inputs: &FeasibilityInputs, build_periods: usize) -> Vec<Phase> {
        if inputs.construction_phases.is_empty() {
            PhaseBlueprint::standard().resolve(build_periods)
        } else {
            inputs.construction_phases.clone()
        }
    }
}

/// Builds one scenario with default settings.
pub fn build(inputs: &FeasibilityInputs, multipliers: &ScenarioMultipliers) -> Vec<MonthlyCashflow> {
    ScenarioBuilder::default().build(inputs, multipliers)
}

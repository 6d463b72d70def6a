use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::domain::{CashflowGrid, MonthlyCashflow};
use super::scenario::{ScenarioMultipliers, ScenarioTable};

const IRR_MAX_ITERATIONS: usize = 100;
const IRR_TOLERANCE: f64 = 1e-10;
const IRR_RATE_FLOOR: f64 = -0.99;
const IRR_RATE_CEILING: f64 = 10.0;

/// Investment KPIs for one scenario series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    pub total_revenue: f64,
    pub total_costs: f64,
    pub net_profit: f64,
    pub profit_margin: f64,
    pub final_cash_balance: f64,
    /// Ratio-based approximation kept for compatibility; see [`approximate_irr`].
    pub irr: f64,
    /// Annualized root of the monthly NPV, when one exists.
    pub irr_solved: Option<f64>,
    pub roi: f64,
    pub payback_period: usize,
    pub peak_funding: f64,
    pub total_equity: f64,
}

pub fn summarize(series: &[MonthlyCashflow]) -> ScenarioSummary {
    summarize_with(series, &ScenarioMultipliers::IDENTITY)
}

/// Summary with the scenario's IRR multiplier applied to the approximation.
pub fn summarize_with(
    series: &[MonthlyCashflow],
    multipliers: &ScenarioMultipliers,
) -> ScenarioSummary {
    let total_revenue: f64 = series.iter().map(|row| row.revenue).sum();
    let total_costs: f64 = series
        .iter()
        .map(|row| {
            row.development_costs() + row.loan_interest + row.zakat_due + row.vat_on_costs
                - row.vat_recoverable
        })
        .sum();
    let total_equity: f64 = series.iter().map(|row| row.equity_injected).sum();
    let net_profit = total_revenue - total_costs;
    let net_flows: Vec<f64> = series.iter().map(|row| row.net_cashflow).collect();

    let peak_funding = series
        .iter()
        .map(|row| row.cash_balance)
        .fold(0.0_f64, f64::min)
        .abs();

    ScenarioSummary {
        total_revenue,
        total_costs,
        net_profit,
        profit_margin: ratio_pct(net_profit, total_revenue),
        final_cash_balance: net_flows.iter().sum(),
        irr: approximate_irr(&net_flows) * multipliers.irr_multiplier,
        irr_solved: solve_irr(&net_flows),
        roi: ratio_pct(net_profit, total_equity),
        payback_period: payback_period(&net_flows),
        peak_funding,
        total_equity,
    }
}

/// Summaries for every scenario in `grid`, using the multipliers from `table`.
pub fn summarize_grid(
    grid: &CashflowGrid,
    table: &ScenarioTable,
) -> BTreeMap<String, ScenarioSummary> {
    grid.scenarios
        .iter()
        .map(|(name, series)| {
            let multipliers = table.get(name).unwrap_or_default();
            (name.clone(), summarize_with(series, &multipliers))
        })
        .collect()
}

/// Legacy closed-form IRR stand-in, not a discounted-cashflow root:
/// `((Σ positive / Σ |negative|) − 1) / (periods / 12) × 100`.
pub fn approximate_irr(net_flows: &[f64]) -> f64 {
    let inflow: f64 = net_flows.iter().filter(|flow| **flow > 0.0).sum();
    let outflow: f64 = net_flows
        .iter()
        .filter(|flow| **flow < 0.0)
        .map(|flow| flow.abs())
        .sum();
    if net_flows.is_empty() || outflow == 0.0 {
        return 0.0;
    }

    let years = net_flows.len() as f64 / 12.0;
    (inflow / outflow - 1.0) / years * 100.0
}

/// 1-based period at which cumulative net cashflow first turns non-negative.
/// Series that never break even report their full length.
pub fn payback_period(net_flows: &[f64]) -> usize {
    let mut cumulative = 0.0;
    for (index, flow) in net_flows.iter().enumerate() {
        cumulative += flow;
        if cumulative >= 0.0 {
            return index + 1;
        }
    }
    net_flows.len()
}

/// Monthly IRR by Newton-Raphson with a bisection fallback, annualized and
/// expressed as a percentage. `None` without a sign change.
pub fn solve_irr(net_flows: &[f64]) -> Option<f64> {
    let has_inflow = net_flows.iter().any(|flow| *flow > 0.0);
    let has_outflow = net_flows.iter().any(|flow| *flow < 0.0);
    if !has_inflow || !has_outflow {
        return None;
    }

    let monthly = newton_raphson(net_flows).or_else(|| bisection(net_flows))?;
    Some(((1.0 + monthly).powi(12) - 1.0) * 100.0)
}

fn newton_raphson(net_flows: &[f64]) -> Option<f64> {
    let mut rate = 0.01;
    for _ in 0..IRR_MAX_ITERATIONS {
        let (npv, derivative) = npv_and_derivative(net_flows, rate);
        if derivative.abs() < 1e-12 {
            return None;
        }

        let next = (rate - npv / derivative).clamp(IRR_RATE_FLOOR, IRR_RATE_CEILING);
        if (next - rate).abs() < IRR_TOLERANCE {
            return next.is_finite().then_some(next);
        }
        rate = next;
    }
    None
}

fn bisection(net_flows: &[f64]) -> Option<f64> {
    let mut low = IRR_RATE_FLOOR;
    let mut high = IRR_RATE_CEILING;
    let mut npv_low = npv_and_derivative(net_flows, low).0;
    let npv_high = npv_and_derivative(net_flows, high).0;
    if npv_low.signum() == npv_high.signum() {
        return None;
    }

    for _ in 0..200 {
        let mid = (low + high) / 2.0;
        let npv_mid = npv_and_derivative(net_flows, mid).0;
        if npv_mid.abs() < 1e-7 || (high - low) / 2.0 < IRR_TOLERANCE {
            return Some(mid);
        }
        if npv_mid.signum() == npv_low.signum() {
            low = mid;
            npv_low = npv_mid;
        } else {
            high = mid;
        }
    }
    Some((low + high) / 2.0)
}

/// NPV(r) = Σ CF_t / (1+r)^t and dNPV/dr.
fn npv_and_derivative(net_flows: &[f64], rate: f64) -> (f64, f64) {
    let one_plus_rate = 1.0 + rate;
    let mut npv = 0.0;
    let mut derivative = 0.0;
    let mut discount = 1.0;

    for (period, flow) in net_flows.iter().enumerate() {
        npv += flow * discount;
        if period > 0 {
            derivative -= period as f64 * flow * discount / one_plus_rate;
        }
        discount /= one_plus_rate;
    }

    (npv, derivative)
}

fn ratio_pct(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}

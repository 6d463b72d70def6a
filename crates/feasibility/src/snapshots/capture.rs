use crate::cashflow::summary::solve_irr;
use crate::cashflow::{FeasibilityInputs, MonthlyCashflow};

use super::domain::{SnapshotDraft, SnapshotSummary, SnapshotTraces};

/// Derives a snapshot payload from one built scenario.
///
/// Equity injections are the capital calls and positive net cashflow the
/// distributions; the closing cash balance stands in for residual value. No
/// GP waterfall is modelled, so promote and clawback traces are zero.
pub fn capture_scenario(
    name: impl Into<String>,
    inputs: &FeasibilityInputs,
    series: &[MonthlyCashflow],
) -> SnapshotDraft {
    let calls: Vec<f64> = series.iter().map(|row| row.equity_injected).collect();
    let dists: Vec<f64> = series.iter().map(|row| row.net_cashflow.max(0.0)).collect();
    let net_flows: Vec<f64> = series.iter().map(|row| row.net_cashflow).collect();

    let called: f64 = calls.iter().sum();
    let distributed: f64 = dists.iter().sum();
    let invested: f64 = net_flows
        .iter()
        .filter(|flow| **flow < 0.0)
        .map(|flow| flow.abs())
        .sum();
    let residual = series
        .last()
        .map(|row| row.cash_balance)
        .unwrap_or(0.0)
        .max(0.0);

    let dpi = ratio(distributed, called);
    let rvpi = ratio(residual, called);
    let periods = series.len();

    SnapshotDraft {
        name: name.into(),
        inputs: Some(inputs.clone()),
        summary: SnapshotSummary {
            irr_annual: solve_irr(&net_flows),
            tvpi: dpi + rvpi,
            dpi,
            rvpi,
            moic: ratio(distributed + residual, invested),
            gp_clawback_last: None,
        },
        traces: SnapshotTraces {
            period_count: u32::try_from(periods).unwrap_or(u32::MAX),
            calls_total: calls,
            dists_total: dists,
            gp_promote: vec![0.0; periods],
            gp_clawback: vec![0.0; periods],
        },
        note: None,
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

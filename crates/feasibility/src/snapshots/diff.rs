use serde::Serialize;

use super::domain::ScenarioSnapshot;

/// KPI changes from `a` to `b`; optional KPIs are `None` unless both sides
/// carry a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiDelta {
    pub irr: Option<f64>,
    pub tvpi: f64,
    pub dpi: f64,
    pub rvpi: f64,
    pub moic: f64,
    pub gp_clawback_last: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesDelta {
    pub period_count: usize,
    pub calls_total: Vec<f64>,
    pub dists_total: Vec<f64>,
    pub gp_promote: Vec<f64>,
    pub gp_clawback: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDiff {
    pub from_id: String,
    pub to_id: String,
    pub kpi: KpiDelta,
    pub series: SeriesDelta,
}

/// `b − a` for every KPI and trace.
pub fn diff(a: &ScenarioSnapshot, b: &ScenarioSnapshot) -> SnapshotDiff {
    let (from, to) = (&a.summary, &b.summary);
    let (before, after) = (&a.traces, &b.traces);

    let period_count = [
        before.period_count as usize,
        after.period_count as usize,
        before.longest_series(),
        after.longest_series(),
    ]
    .into_iter()
    .max()
    .unwrap_or(0);

    SnapshotDiff {
        from_id: a.id.clone(),
        to_id: b.id.clone(),
        kpi: KpiDelta {
            irr: optional_delta(from.irr_annual, to.irr_annual),
            tvpi: to.tvpi - from.tvpi,
            dpi: to.dpi - from.dpi,
            rvpi: to.rvpi - from.rvpi,
            moic: to.moic - from.moic,
            gp_clawback_last: optional_delta(from.gp_clawback_last, to.gp_clawback_last),
        },
        series: SeriesDelta {
            period_count,
            calls_total: padded_delta(&before.calls_total, &after.calls_total),
            dists_total: padded_delta(&before.dists_total, &after.dists_total),
            gp_promote: padded_delta(&before.gp_promote, &after.gp_promote),
            gp_clawback: padded_delta(&before.gp_clawback, &after.gp_clawback),
        },
    }
}

/// Right-pads the shorter series with zeros, then subtracts `a` from `b`.
pub fn padded_delta(a: &[f64], b: &[f64]) -> Vec<f64> {
    let length = a.len().max(b.len());
    (0..length)
        .map(|index| {
            let before = a.get(index).copied().unwrap_or(0.0);
            let after = b.get(index).copied().unwrap_or(0.0);
            after - before
        })
        .collect()
}

fn optional_delta(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(b? - a?)
}

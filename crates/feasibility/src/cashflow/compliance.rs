//! VAT, Zakat and escrow levies, each switched on independently.
//!
//! Escrow comes in two unreconciled flavours: the cashflow overlay reserves
//! in the first period and releases in the last, while the reporting
//! projection releases against 25/50/75/100% checkpoints.

use serde::{Deserialize, Serialize};

use super::domain::FeasibilityInputs;

/// VAT charged on development costs.
pub fn vat_on_costs(rate_pct: f64, construction: f64, land: f64, soft: f64) -> f64 {
    rate_pct / 100.0 * (construction + land + soft)
}

/// Input VAT is treated as fully recoverable.
pub fn vat_recoverable(vat_paid: f64) -> f64 {
    vat_paid
}

/// Zakat on positive profit only.
pub fn zakat_due(rate_pct: f64, profit: f64) -> f64 {
    rate_pct / 100.0 * profit.max(0.0)
}

/// Reserve in period 0, release in the final period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowFlows {
    pub reserved: Vec<f64>,
    pub released: Vec<f64>,
}

pub fn escrow_reserve_and_release(
    percent: f64,
    total_project_cost: f64,
    periods: usize,
) -> EscrowFlows {
    let mut flows = EscrowFlows {
        reserved: vec![0.0; periods],
        released: vec![0.0; periods],
    };
    if periods == 0 {
        return flows;
    }

    let amount = percent / 100.0 * total_project_cost;
    flows.reserved[0] = amount;
    flows.released[periods - 1] = amount;
    flows
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EscrowTrigger {
    #[default]
    ConstructionProgress,
    Milestone,
    Monthly,
}

impl EscrowTrigger {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ConstructionProgress => "Construction Progress",
            Self::Milestone => "Milestone",
            Self::Monthly => "Elapsed Months",
        }
    }

    fn checkpoint_label(self, fraction: f64, period_index: usize) -> String {
        match self {
            Self::ConstructionProgress => {
                format!("{:.0}% construction complete", fraction * 100.0)
            }
            Self::Milestone => MILESTONES
                .iter()
                .find(|(checkpoint, _)| (*checkpoint - fraction).abs() < f64::EPSILON)
                .map(|(_, name)| name.to_string())
                .unwrap_or_else(|| format!("{:.0}% milestone", fraction * 100.0)),
            Self::Monthly => format!("Month {}", period_index + 1),
        }
    }
}

const CHECKPOINTS: [f64; 4] = [0.25, 0.50, 0.75, 1.0];

const MILESTONES: [(f64, &str); 4] = [
    (0.25, "Foundations complete"),
    (0.50, "Structure topped out"),
    (0.75, "Envelope & MEP complete"),
    (1.0, "Practical completion"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowRelease {
    pub period_index: usize,
    pub fraction: f64,
    pub amount: f64,
    pub label: String,
}

/// Forward-looking escrow release plan for reporting.
pub fn project_escrow_releases(
    reserve: f64,
    duration_periods: usize,
    trigger: EscrowTrigger,
) -> Vec<EscrowRelease> {
    if duration_periods == 0 {
        return Vec::new();
    }

    let mut released_fraction = 0.0;
    CHECKPOINTS
        .iter()
        .map(|fraction| {
            let period_index = ((duration_periods as f64 * fraction).ceil() as usize)
                .max(1)
                .min(duration_periods)
                - 1;
            let share = fraction - released_fraction;
            released_fraction = *fraction;
            EscrowRelease {
                period_index,
                fraction: *fraction,
                amount: reserve * share,
                label: trigger.checkpoint_label(*fraction, period_index),
            }
        })
        .collect()
}

/// The switched-on levies for one build.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComplianceOverlay {
    pub vat_rate_pct: Option<f64>,
    pub zakat_rate_pct: Option<f64>,
    pub escrow_percent: Option<f64>,
}

/// Per-period levy lines produced by the overlay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayLines {
    pub vat_on_costs: Vec<f64>,
    pub vat_recoverable: Vec<f64>,
    pub zakat_due: Vec<f64>,
    pub escrow_reserved: Vec<f64>,
    pub escrow_released: Vec<f64>,
}

/// Cost and revenue lines the overlay reads from.
#[derive(Debug, Clone, Copy)]
pub struct OverlayBasis<'a> {
    pub construction: &'a [f64],
    pub land: &'a [f64],
    pub soft: &'a [f64],
    pub revenue: &'a [f64],
}

impl ComplianceOverlay {
    pub fn from_inputs(inputs: &FeasibilityInputs) -> Self {
        Self {
            vat_rate_pct: inputs.vat.active_rate(),
            zakat_rate_pct: inputs.zakat.active_rate(),
            escrow_percent: inputs.escrow.enabled.then_some(inputs.escrow.percent),
        }
    }

    pub fn apply(&self, basis: OverlayBasis<'_>, periods: usize) -> OverlayLines {
        let mut lines = OverlayLines {
            vat_on_costs: vec![0.0; periods],
            vat_recoverable: vec![0.0; periods],
            zakat_due: vec![0.0; periods],
            escrow_reserved: vec![0.0; periods],
            escrow_released: vec![0.0; periods],
        };

        let mut total_project_cost = 0.0;
        for index in 0..periods {
            let construction = line_at(basis.construction, index);
            let land = line_at(basis.land, index);
            let soft = line_at(basis.soft, index);
            let revenue = line_at(basis.revenue, index);
            total_project_cost += construction + land + soft;

            if let Some(rate) = self.vat_rate_pct {
                let vat = vat_on_costs(rate, construction, land, soft);
                lines.vat_on_costs[index] = vat;
                lines.vat_recoverable[index] = vat_recoverable(vat);
            }
            if let Some(rate) = self.zakat_rate_pct {
                lines.zakat_due[index] = zakat_due(rate, revenue - (construction + land + soft));
            }
        }

        if let Some(percent) = self.escrow_percent {
            let flows = escrow_reserve_and_release(percent, total_project_cost, periods);
            lines.escrow_reserved = flows.reserved;
            lines.escrow_released = flows.released;
        }

        lines
    }
}

fn line_at(series: &[f64], index: usize) -> f64 {
    series.get(index).copied().unwrap_or(0.0)
}

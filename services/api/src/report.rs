use crate::infra::{file_snapshot_service, load_inputs};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use feasibility_engine::cashflow::export::write_rows_csv_path;
use feasibility_engine::cashflow::repository::rows_from_grid;
use feasibility_engine::cashflow::{
    summarize_grid, CashflowGrid, FeasibilityInputs, ScenarioBuilder, ScenarioSummary,
    ScenarioTable,
};
use feasibility_engine::config::AppConfig;
use feasibility_engine::error::AppError;
use feasibility_engine::snapshots::{CaptureRequest, ScenarioSnapshot, SnapshotDiff};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct GridArgs {
    /// JSON inputs document (camelCase fields)
    #[arg(long)]
    pub(crate) inputs: PathBuf,
    /// Override the project start month (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Override the completion month (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) completion: Option<NaiveDate>,
    /// Write every scenario's monthly rows to this CSV file
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Project identifier stamped on exported rows
    #[arg(long, default_value = "project")]
    pub(crate) project: String,
    /// Version label stamped on exported rows
    #[arg(long, default_value = "cli")]
    pub(crate) version: String,
}

#[derive(Args, Debug, Default)]
pub(crate) struct StoreArgs {
    /// Snapshot directory (defaults to FEASIBILITY_SNAPSHOT_DIR)
    #[arg(long)]
    pub(crate) dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum SnapshotCommand {
    /// Build one scenario from an inputs file and save its snapshot
    Save {
        #[arg(long)]
        inputs: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "base")]
        scenario: String,
        #[arg(long)]
        note: Option<String>,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// List saved snapshots
    List {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Show KPI and series changes from snapshot A to snapshot B
    Diff {
        a: String,
        b: String,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Print or write the full snapshot document
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Replace saved snapshots with an exported document
    Import {
        file: PathBuf,
        #[command(flatten)]
        store: StoreArgs,
    },
}

pub(crate) fn run_grid(args: GridArgs) -> Result<(), AppError> {
    let GridArgs {
        inputs,
        start,
        completion,
        csv,
        project,
        version,
    } = args;

    let config = AppConfig::load()?;
    let mut inputs = load_inputs(&inputs)?;
    if let Some(start) = start {
        inputs.project_start = start;
    }
    if completion.is_some() {
        inputs.project_completion = completion;
    }

    let builder = ScenarioBuilder::new(config.engine.build_settings());
    let table = ScenarioTable::standard(inputs.custom_multipliers);
    let grid = builder.build_grid(&inputs, &table, version);
    let summaries = summarize_grid(&grid, &table);

    for line in render_grid_report(&inputs, &grid, &summaries) {
        println!("{line}");
    }

    if let Some(path) = csv {
        let rows = rows_from_grid(&project, &grid);
        write_rows_csv_path(&path, &rows)?;
        println!("Wrote {} rows to {}", rows.len(), path.display());
    }

    Ok(())
}

pub(crate) fn run_snapshot(command: SnapshotCommand) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let builder = ScenarioBuilder::new(config.engine.build_settings());
    let directory = |store: StoreArgs| store.dir.unwrap_or_else(|| config.snapshots.directory.clone());

    match command {
        SnapshotCommand::Save {
            inputs,
            name,
            scenario,
            note,
            store,
        } => {
            let service = file_snapshot_service(&directory(store), builder)?;
            let snapshot = service.capture(CaptureRequest {
                name,
                scenario,
                note,
                inputs: load_inputs(&inputs)?,
            })?;
            println!("Saved snapshot {} ({})", snapshot.id, snapshot.name);
        }
        SnapshotCommand::List { store } => {
            let service = file_snapshot_service(&directory(store), builder)?;
            let snapshots = service.store().list()?;
            if snapshots.is_empty() {
                println!("No snapshots saved");
            }
            for snapshot in &snapshots {
                println!("{}", render_snapshot_line(snapshot));
            }
        }
        SnapshotCommand::Diff { a, b, store } => {
            let service = file_snapshot_service(&directory(store), builder)?;
            let delta = service.store().diff(&a, &b)?;
            for line in render_diff(&delta) {
                println!("{line}");
            }
        }
        SnapshotCommand::Export { out, store } => {
            let service = file_snapshot_service(&directory(store), builder)?;
            let document = service.store().export_all()?;
            match out {
                Some(path) => {
                    std::fs::write(&path, document)?;
                    println!("Exported snapshots to {}", path.display());
                }
                None => println!("{document}"),
            }
        }
        SnapshotCommand::Import { file, store } => {
            let service = file_snapshot_service(&directory(store), builder)?;
            let document = std::fs::read_to_string(&file)?;
            let imported = service.store().import_all(&document)?;
            println!("Imported {imported} snapshots from {}", file.display());
        }
    }

    Ok(())
}

pub(crate) fn render_grid_report(
    inputs: &FeasibilityInputs,
    grid: &CashflowGrid,
    summaries: &BTreeMap<String, ScenarioSummary>,
) -> Vec<String> {
    let mut lines = Vec::new();
    let periods = grid.period_count();
    let last = grid
        .scenarios
        .values()
        .next()
        .and_then(|series| series.last())
        .map(|row| row.period_label())
        .unwrap_or_else(|| "-".to_string());

    lines.push(format!(
        "Feasibility grid {} | {} -> {} ({} periods)",
        grid.version_label,
        inputs.project_start.format("%Y-%m"),
        last,
        periods
    ));
    for (name, summary) in summaries {
        lines.push(format_summary_line(name, summary));
    }
    lines
}

pub(crate) fn format_summary_line(name: &str, summary: &ScenarioSummary) -> String {
    let solved = summary
        .irr_solved
        .map(|irr| format!("{irr:.1}%"))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "- {name}: revenue {:.0} | costs {:.0} | profit {:.0} ({:.1}% margin) | IRR {:.1}% (solved {solved}) | ROI {:.1}% | payback {} | peak funding {:.0}",
        summary.total_revenue,
        summary.total_costs,
        summary.net_profit,
        summary.profit_margin,
        summary.irr,
        summary.roi,
        summary.payback_period,
        summary.peak_funding,
    )
}

fn render_snapshot_line(snapshot: &ScenarioSnapshot) -> String {
    let irr = snapshot
        .summary
        .irr_annual
        .map(|irr| format!("{irr:.1}%"))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "{} | {} | {} | IRR {} | TVPI {:.2}x | {} periods",
        snapshot.id,
        snapshot.created_at.format("%Y-%m-%d %H:%M"),
        snapshot.name,
        irr,
        snapshot.summary.tvpi,
        snapshot.traces.period_count
    )
}

pub(crate) fn render_diff(delta: &SnapshotDiff) -> Vec<String> {
    let signed = |value: f64| format!("{value:+.2}");
    let irr = delta
        .kpi
        .irr
        .map(signed)
        .unwrap_or_else(|| "n/a".to_string());

    let mut lines = vec![
        format!("Snapshot diff {} -> {}", delta.from_id, delta.to_id),
        format!(
            "- IRR {irr} | TVPI {} | DPI {} | RVPI {} | MOIC {}",
            signed(delta.kpi.tvpi),
            signed(delta.kpi.dpi),
            signed(delta.kpi.rvpi),
            signed(delta.kpi.moic)
        ),
    ];
    let calls: f64 = delta.series.calls_total.iter().sum();
    let dists: f64 = delta.series.dists_total.iter().sum();
    lines.push(format!(
        "- {} periods | calls {} | distributions {}",
        delta.series.period_count,
        signed(calls),
        signed(dists)
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use feasibility_engine::snapshots::{KpiDelta, SeriesDelta};

    fn inputs() -> FeasibilityInputs {
        serde_json::from_str(
            r#"{
                "projectStart": "2025-01-01",
                "projectCompletion": "2025-12-01",
                "constructionCost": 1200000,
                "totalGfa": 1000,
                "avgSalePrice": 1500
            }"#,
        )
        .expect("inputs parse")
    }

    #[test]
    fn grid_report_lists_every_scenario() {
        let inputs = inputs();
        let table = ScenarioTable::standard(None);
        let grid = ScenarioBuilder::default().build_grid(&inputs, &table, "v1");
        let summaries = summarize_grid(&grid, &table);

        let lines = render_grid_report(&inputs, &grid, &summaries);
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[0],
            "Feasibility grid v1 | 2025-01 -> 2025-12 (12 periods)"
        );
        assert!(lines[1].starts_with("- base: revenue 1500000 | costs 1200000"));
        assert!(lines.iter().any(|line| line.starts_with("- pessimistic:")));
    }

    #[test]
    fn diff_rendering_marks_missing_irr() {
        let delta = SnapshotDiff {
            from_id: "a".to_string(),
            to_id: "b".to_string(),
            kpi: KpiDelta {
                irr: None,
                tvpi: 0.25,
                dpi: -0.5,
                rvpi: 0.75,
                moic: 0.0,
                gp_clawback_last: None,
            },
            series: SeriesDelta {
                period_count: 2,
                calls_total: vec![1.0, 2.0],
                dists_total: vec![-1.0, 0.0],
                gp_promote: vec![0.0, 0.0],
                gp_clawback: vec![0.0, 0.0],
            },
        };

        let lines = render_diff(&delta);
        assert_eq!(lines[0], "Snapshot diff a -> b");
        assert_eq!(
            lines[1],
            "- IRR n/a | TVPI +0.25 | DPI -0.50 | RVPI +0.75 | MOIC +0.00"
        );
        assert_eq!(lines[2], "- 2 periods | calls +3.00 | distributions -1.00");
    }
}

use crate::report::{run_grid, run_snapshot, GridArgs, SnapshotCommand};
use crate::server;
use clap::{Args, Parser, Subcommand};
use feasibility_engine::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Feasibility Engine",
    about = "Build development cashflow scenarios and compare saved snapshots",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Build every scenario from an inputs file and print the KPIs
    Grid(GridArgs),
    /// Save, list, compare and exchange scenario snapshots
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommand,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Grid(args) => run_grid(args),
        Command::Snapshot { command } => run_snapshot(command),
    }
}

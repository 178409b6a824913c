mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "caravel",
    version,
    about = "Import issues, labels and pages from third-party tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an import job from a job file
    Run {
        /// Path to job YAML file
        job: PathBuf,
    },
    /// List supported connectors and their step tables
    Connectors,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    match cli.command {
        Commands::Run { job } => commands::run::execute(&job).await,
        Commands::Connectors => commands::connectors::execute(),
    }
}

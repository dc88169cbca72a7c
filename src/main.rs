use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use expense_tracker::config::AppConfig;
use expense_tracker::server::{AppContext, ServerBuilder};

#[derive(Parser)]
#[command(
    name = "expense-tracker",
    version,
    about = "Personal expense tracker with recurring expenses",
    long_about = "Serves a JSON API and web front-end for tracking expenses. Recurring \
                  expense rules are applied once a day by a built-in scheduler, and the \
                  expense table can be exported to and restored from CSV snapshots."
)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "EXPENSES_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server and the daily scheduler (default)
    Serve,

    /// Apply due recurring expenses once and exit
    Apply,

    /// Write a CSV snapshot of all expenses
    Export,

    /// Replace all expenses with the rows of a CSV snapshot
    Restore {
        /// Snapshot file; defaults to the newest one in the exports directory
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("expense_tracker=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => ServerBuilder::new(config).serve().await?,
        Commands::Apply => {
            let ctx = context(config).await?;
            let report = ctx.engine.apply_due_now().await?;
            println!("Applied {} recurring expense(s)", report.applied);
        }
        Commands::Export => {
            let ctx = context(config).await?;
            let snapshot = ctx.backup.export().await?;
            println!("Data exported to: {}", snapshot.path.display());
        }
        Commands::Restore { file } => {
            let ctx = context(config).await?;
            let path = match file {
                Some(path) => path,
                None => ctx
                    .backup
                    .latest()
                    .await?
                    .map(|snapshot| snapshot.path)
                    .ok_or_else(|| anyhow::anyhow!("No snapshots found"))?,
            };
            let restored = ctx.backup.restore(&path).await?;
            println!("Restored {} expense(s) from {}", restored, path.display());
        }
    }

    Ok(())
}

async fn context(config: AppConfig) -> Result<AppContext> {
    ServerBuilder::new(config).build_context().await
}

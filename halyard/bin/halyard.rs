use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing::info;

use halyard::Controller;
use halyard_common::{Signal, config::HalyardConfig, logging::Logger};

#[derive(Parser)]
#[command(name = "halyard", version, about = "Organizational data sync and email queue service")]
struct Cli {
    /// Path to the configuration file (overrides discovery)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the periodic email queue drain until interrupted
    Serve,

    /// Drain the email queue once and print the report
    Drain,

    /// Probe SMTP connectivity with the configured transporter options
    VerifySmtp,

    /// Replace the directory users collection from the configured export
    SyncDirectory {
        /// Also rebuild the by-division/department grouping
        #[arg(long)]
        grouped: bool,
    },

    /// Replace the positions collection from the configured workbook
    SyncPositions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    Logger::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => HalyardConfig::from_path(path)?,
        None => HalyardConfig::discover()?,
    };

    let controller = Controller::build(config)?;

    match cli.command {
        Command::Serve => {
            let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    let _ = shutdown_tx.send(Signal::Shutdown);
                }
            });

            controller.serve(shutdown_rx).await
        }
        Command::Drain => {
            let report = controller.mailer().process_queue().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::VerifySmtp => {
            controller.mailer().verify_smtp().await?;
            info!("SMTP connectivity verified");
            Ok(())
        }
        Command::SyncDirectory { grouped } => {
            let report = controller.directory().sync_users().await?;
            info!(records = report.records, "directory users synchronized");

            if grouped {
                let report = controller
                    .directory()
                    .sync_users_by_division_department()
                    .await?;
                info!(records = report.records, "grouped directory users synchronized");
            }
            Ok(())
        }
        Command::SyncPositions => {
            let report = controller.positions().sync_positions().await?;
            info!(records = report.records, "positions synchronized");
            Ok(())
        }
    }
}

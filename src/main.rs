use anyhow::Context;
use clap::{Parser, Subcommand};
use quakewatch::configuration::get_configuration;
use quakewatch::startup::{build, notify};
use quakewatch::telemetry::{get_subscriber, init_subscriber};

#[derive(Parser)]
#[command(name = "quakewatch", version, about = "Earthquake catalog explorer and digest mailer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the search frontend and the subscription form
    Serve,
    /// Mail the digest to every subscription that has not received it yet
    Notify {
        /// Start a new period: clear every sent flag before dispatching
        #[arg(long)]
        new_period: bool,
    },
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = get_subscriber("quakewatch".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber)?;

    let configuration = get_configuration().context("Failed to read configuration.")?;

    match cli.command {
        Command::Serve => {
            build(&configuration)
                .await?
                .launch()
                .await
                .map_err(|e| anyhow::anyhow!("The web server stopped: {}", e))?;
        }
        Command::Notify { new_period } => {
            let report = notify(&configuration, new_period).await?;
            tracing::info!(
                reset = ?report.reset,
                sent = report.sent.len(),
                skipped = report.skipped.len(),
                failed = report.failed.len(),
                invalid_rows = report.invalid_rows,
                "Notifier run complete"
            );
        }
    }
    Ok(())
}

use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::Parser;
use forecast_ics::{OpenMeteoProvider, Settings, WriteOutcome, logging, run};
use tracing::{error, info};

/// Publish a daily weather forecast as an iCalendar feed
#[derive(Parser)]
#[command(name = "forecast-ics")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file, overriding the configured one
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Render and compare without writing
    #[arg(long)]
    dry_run: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = match Settings::load_from_path(cli.config) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Err(e.into());
        }
    };

    if let Some(output) = cli.output {
        if !settings.locations.is_empty() {
            bail!("--output cannot be used with a [[locations]] list");
        }
        settings.output = output;
    }

    logging::init(&settings.logging, cli.verbose)?;

    let provider = OpenMeteoProvider::new(&settings.provider)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;

    let report = match runtime.block_on(run(&settings, &provider, Utc::now(), cli.dry_run)) {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e.user_message());
            return Err(e.into());
        }
    };

    for location in &report.locations {
        let action = match (location.outcome, report.dry_run) {
            (WriteOutcome::Written, true) => "would be written",
            (WriteOutcome::Written, false) => "written",
            (WriteOutcome::Unchanged, _) => "unchanged",
        };
        info!(
            "{} -> {} ({} events, {})",
            location.name,
            location.output.display(),
            location.events,
            action
        );
    }

    Ok(())
}

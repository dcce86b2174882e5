//! One generation run: fetch, render and persist every configured location

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::Result;
use crate::calendar;
use crate::config::Settings;
use crate::output::{self, WriteOutcome};
use crate::weather::ForecastProvider;

/// Result of processing one location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationReport {
    pub name: String,
    pub output: PathBuf,
    pub outcome: WriteOutcome,
    pub events: usize,
}

/// Result of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub locations: Vec<LocationReport>,
    pub dry_run: bool,
}

impl RunReport {
    /// Number of files that were (or would be) rewritten
    #[must_use]
    pub fn written(&self) -> usize {
        self.locations
            .iter()
            .filter(|l| l.outcome == WriteOutcome::Written)
            .count()
    }
}

/// Process every configured location in order.
///
/// The first error aborts the run; feeds written before it stay written
/// and the failing location's file is left as it was.
#[instrument(skip_all, fields(dry_run = dry_run))]
pub async fn run<P: ForecastProvider>(
    settings: &Settings,
    provider: &P,
    now: DateTime<Utc>,
    dry_run: bool,
) -> Result<RunReport> {
    let locations = settings.locations()?;
    let mut report = RunReport {
        locations: Vec::with_capacity(locations.len()),
        dry_run,
    };

    for location in &locations {
        let days = provider.fetch(location).await?;
        let document = calendar::generate(location, &days, now)?;

        let outcome = if dry_run {
            output::plan(&location.output, &document)?
        } else {
            output::write_if_changed(&location.output, &document)?
        };
        info!(
            "{}: {} events, {} ({})",
            location.name,
            days.len(),
            outcome,
            location.output.display()
        );

        report.locations.push(LocationReport {
            name: location.name.clone(),
            output: location.output.clone(),
            outcome,
            events: days.len(),
        });
    }

    Ok(report)
}

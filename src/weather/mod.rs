//! Forecast fetching
//!
//! [`ForecastProvider`] is the seam between the pipeline and the weather
//! source; [`OpenMeteoProvider`] is the production implementation.

use std::time::{Duration, Instant};

use chrono_tz::Tz;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::config::ProviderConfig;
use crate::error::ForecastError;
use crate::models::{DailyForecast, LocationConfig};
use crate::Result;

pub mod open_meteo;

/// Source of daily forecasts for a location
#[allow(async_fn_in_trait)]
pub trait ForecastProvider {
    /// Fetch `location.forecast_days` consecutive days starting today in the
    /// location's timezone.
    async fn fetch(&self, location: &LocationConfig) -> Result<Vec<DailyForecast>>;
}

/// Open-Meteo HTTP client
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    client: Client,
    base_url: String,
}

impl OpenMeteoProvider {
    /// Create a new client with the configured base URL and timeout
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("forecast-ics/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ForecastError::fetch(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

impl ForecastProvider for OpenMeteoProvider {
    #[instrument(skip_all, fields(location = %location.name, days = location.forecast_days))]
    async fn fetch(&self, location: &LocationConfig) -> Result<Vec<DailyForecast>> {
        info!(
            "Getting {}-day forecast for coordinates: {}",
            location.forecast_days,
            location.format_coordinates()
        );
        let start_time = Instant::now();

        let url = open_meteo::forecast_url(&self.base_url, location);
        debug!("OpenMeteo API request URL: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ForecastError::fetch(format!(
                "provider answered HTTP {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let forecast_response: open_meteo::ForecastResponse = response.json().await?;
        if let Some(timezone) = &forecast_response.timezone {
            if !same_zone(timezone, location.timezone) {
                warn!(
                    "Provider answered in timezone {} instead of {}",
                    timezone,
                    location.timezone.name()
                );
            }
        }

        let days = forecast_response.into_daily_forecasts(usize::from(location.forecast_days))?;

        let total_duration = start_time.elapsed();
        info!(
            "Retrieved {} forecast days in {:.3}s",
            days.len(),
            total_duration.as_secs_f64()
        );
        if total_duration.as_secs() > 5 {
            warn!("Slow API response detected: {:.3}s", total_duration.as_secs_f64());
        }

        Ok(days)
    }
}

const UTC_ALIASES: [&str; 8] = [
    "UTC", "GMT", "Etc/UTC", "Etc/GMT", "Etc/UCT", "Etc/Zulu", "UCT", "Zulu",
];

/// Whether the zone name the provider echoed back matches the requested one.
///
/// Open-Meteo answers `GMT` when asked for `UTC`.
fn same_zone(reported: &str, requested: Tz) -> bool {
    let is_utc = |name: &str| UTC_ALIASES.iter().any(|alias| alias.eq_ignore_ascii_case(name));
    reported == requested.name() || (is_utc(reported) && is_utc(requested.name()))
}

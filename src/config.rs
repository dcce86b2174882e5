//! Configuration management for the forecast feed generator
//!
//! Settings come from an optional file (TOML, JSON or YAML, picked by
//! extension) and are then overridden by environment variables named after
//! the settings they replace (`LOCATION_NAME`, `LATITUDE`, ...).

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use chrono::NaiveTime;
use chrono_tz::Tz;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File};
use serde::{Deserialize, Serialize};

use crate::models::{LocationConfig, Units};
use crate::{ForecastError, Result};

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "forecast.toml";

/// Largest horizon Open-Meteo serves
pub const MAX_FORECAST_DAYS: u8 = 16;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Display name of the location
    #[serde(default = "default_location_name")]
    pub location_name: String,
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    /// IANA timezone identifier
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Local event time (`HH:MM`); empty for all-day events
    #[serde(default)]
    pub event_time: String,
    /// Link embedded in every event
    #[serde(default)]
    pub link_url: String,
    /// Number of forecast days
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u8,
    /// Output file of the single-location feed
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Units requested from the provider
    #[serde(default)]
    pub units: Units,
    /// Weather provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Multi-location variant; replaces the top-level location when present
    #[serde(default)]
    pub locations: Vec<LocationEntry>,
}

/// One entry of the multi-location list; unset values inherit the
/// top-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationEntry {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Option<String>,
    pub event_time: Option<String>,
    pub link_url: Option<String>,
    /// Defaults to `forecast-<slug>.ics`
    pub output: Option<PathBuf>,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL for weather API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_location_name() -> String {
    "Athens".to_string()
}

fn default_latitude() -> f64 {
    37.9838
}

fn default_longitude() -> f64 {
    23.7275
}

fn default_timezone() -> String {
    "Europe/Athens".to_string()
}

fn default_forecast_days() -> u8 {
    7
}

fn default_output() -> PathBuf {
    PathBuf::from("forecast.ics")
}

fn default_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            location_name: default_location_name(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            timezone: default_timezone(),
            event_time: String::new(),
            link_url: String::new(),
            forecast_days: default_forecast_days(),
            output: default_output(),
            units: Units::default(),
            provider: ProviderConfig::default(),
            logging: LoggingConfig::default(),
            locations: Vec::new(),
        }
    }
}

/// Environment variables holding plain string settings
const STRING_OVERRIDES: [(&str, &str); 4] = [
    ("LOCATION_NAME", "location_name"),
    ("TIMEZONE", "timezone"),
    ("EVENT_TIME", "event_time"),
    ("OUTPUT_PATH", "output"),
];

fn apply_env_overrides(
    mut builder: ConfigBuilder<DefaultState>,
    env: &HashMap<String, String>,
) -> Result<ConfigBuilder<DefaultState>> {
    for (var, key) in STRING_OVERRIDES {
        builder = builder.set_override_option(key, env.get(var).cloned())?;
    }

    // LINK_URL wins over the older widget page name
    let link = env.get("LINK_URL").or_else(|| env.get("WIDGET_PAGE_URL"));
    builder = builder.set_override_option("link_url", link.cloned())?;

    for (var, key) in [("LATITUDE", "latitude"), ("LONGITUDE", "longitude")] {
        let value = env
            .get(var)
            .map(|raw| {
                raw.trim().parse::<f64>().map_err(|_| {
                    ForecastError::config(format!("{var} must be a number, got '{raw}'"))
                })
            })
            .transpose()?;
        builder = builder.set_override_option(key, value)?;
    }

    let days = env
        .get("FORECAST_DAYS")
        .map(|raw| {
            raw.trim().parse::<i64>().map_err(|_| {
                ForecastError::config(format!("FORECAST_DAYS must be an integer, got '{raw}'"))
            })
        })
        .transpose()?;
    builder = builder.set_override_option("forecast_days", days)?;

    Ok(builder)
}

/// Parse `H`, `HH:MM` or `HH:MM:SS`; blank means all-day events
pub fn parse_event_time(raw: &str) -> Result<Option<NaiveTime>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let invalid = || ForecastError::config(format!("Invalid event time '{raw}', expected HH:MM"));
    let parts = raw
        .split(':')
        .map(|p| p.trim().parse::<u32>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>>>()?;

    let time = match parts.as_slice() {
        [hour] => NaiveTime::from_hms_opt(*hour, 0, 0),
        [hour, minute] => NaiveTime::from_hms_opt(*hour, *minute, 0),
        [hour, minute, second] => NaiveTime::from_hms_opt(*hour, *minute, *second),
        _ => None,
    };
    time.map(Some).ok_or_else(invalid)
}

fn parse_timezone(raw: &str) -> Result<Tz> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|e| ForecastError::config(format!("Invalid timezone '{raw}': {e}")))
}

impl Settings {
    /// Load configuration from the default file and the process environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path and the process environment
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load_with_env(config_path, &env)
    }

    /// Load configuration from a file and an explicit set of variables
    pub fn load_with_env(
        config_path: Option<PathBuf>,
        env: &HashMap<String, String>,
    ) -> Result<Self> {
        let mut builder = Config::builder();

        match config_path {
            Some(path) if !path.exists() => {
                return Err(ForecastError::config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            Some(path) => builder = builder.add_source(File::from(path)),
            None => {
                if let Some(path) = Self::default_config_file() {
                    builder = builder.add_source(File::from(path).required(false));
                }
            }
        }

        builder = apply_env_overrides(builder, env)?;

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Configuration file used when none is given on the command line
    #[must_use]
    pub fn default_config_file() -> Option<PathBuf> {
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        Self::get_config_path().filter(|path| path.exists())
    }

    /// Get the per-user configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("forecast-ics").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.locations()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.forecast_days == 0 || self.forecast_days > MAX_FORECAST_DAYS {
            return Err(ForecastError::config(format!(
                "forecast_days must be between 1 and {MAX_FORECAST_DAYS}"
            )));
        }

        if self.provider.timeout_seconds == 0 || self.provider.timeout_seconds > 300 {
            return Err(ForecastError::config(
                "Weather API timeout must be between 1 and 300 seconds",
            ));
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(ForecastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(ForecastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            )));
        }

        if !is_http_url(&self.provider.base_url) {
            return Err(ForecastError::config(
                "Weather API base URL must be a valid HTTP or HTTPS URL",
            ));
        }

        Ok(())
    }

    /// Resolve the configured locations into validated [`LocationConfig`]s
    pub fn locations(&self) -> Result<Vec<LocationConfig>> {
        if self.locations.is_empty() {
            return Ok(vec![self.resolve(
                &self.location_name,
                self.latitude,
                self.longitude,
                &self.timezone,
                &self.event_time,
                &self.link_url,
                self.output.clone(),
            )?]);
        }

        let mut outputs = HashSet::new();
        let mut resolved = Vec::with_capacity(self.locations.len());
        for entry in &self.locations {
            let output = entry
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(format!("forecast-{}.ics", slug::slugify(&entry.name))));
            let location = self.resolve(
                &entry.name,
                entry.latitude,
                entry.longitude,
                entry.timezone.as_deref().unwrap_or(&self.timezone),
                entry.event_time.as_deref().unwrap_or(&self.event_time),
                entry.link_url.as_deref().unwrap_or(&self.link_url),
                output,
            )?;
            if !outputs.insert(location.output.clone()) {
                return Err(ForecastError::config(format!(
                    "output {} is used by more than one location",
                    location.output.display()
                )));
            }
            resolved.push(location);
        }
        Ok(resolved)
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve(
        &self,
        name: &str,
        latitude: f64,
        longitude: f64,
        timezone: &str,
        event_time: &str,
        link_url: &str,
        output: PathBuf,
    ) -> Result<LocationConfig> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ForecastError::config("Location name cannot be empty"));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ForecastError::config(format!(
                "Latitude of {name} must be between -90 and 90, got {latitude}"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ForecastError::config(format!(
                "Longitude of {name} must be between -180 and 180, got {longitude}"
            )));
        }
        let link_url = link_url.trim();
        if !link_url.is_empty() && !is_http_url(link_url) {
            return Err(ForecastError::config(format!(
                "Link URL of {name} must be an HTTP or HTTPS URL"
            )));
        }
        if output.as_os_str().is_empty() {
            return Err(ForecastError::config(format!("Output path of {name} is empty")));
        }

        Ok(LocationConfig {
            name: name.to_string(),
            latitude,
            longitude,
            timezone: parse_timezone(timezone)?,
            event_time: parse_event_time(event_time)?,
            link_url: link_url.to_string(),
            units: self.units,
            forecast_days: self.forecast_days,
            output,
        })
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

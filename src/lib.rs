//! `forecast-ics` - daily weather forecasts published as an iCalendar feed
//!
//! This library fetches a multi-day forecast for one or more locations,
//! renders it as an RFC 5545 document and rewrites the output file only
//! when the forecast itself changed.

pub mod calendar;
pub mod change;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod runner;
pub mod weather;

// Re-export core types for public API
pub use calendar::{CalendarEvent, generate};
pub use change::{has_changed, normalize};
pub use config::Settings;
pub use error::ForecastError;
pub use models::{DailyForecast, LocationConfig, Units};
pub use output::{WriteOutcome, write_if_changed};
pub use runner::{RunReport, run};
pub use weather::{ForecastProvider, OpenMeteoProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, ForecastError>;

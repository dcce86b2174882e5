//! Data models for the forecast feed
//!
//! This module contains the core domain models organized by concern:
//! - Location: coordinates, timezone and presentation settings
//! - Forecast: one record per forecast day
//! - Weather: condition codes and their display forms

pub mod forecast;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use forecast::DailyForecast;
pub use location::{LocationConfig, PrecipitationUnit, TemperatureUnit, Units, WindSpeedUnit};
pub use weather::Condition;

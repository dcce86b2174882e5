//! Location model: coordinates, timezone and presentation settings

use std::path::PathBuf;

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A fully validated location the feed is rendered for.
///
/// Built once from configuration and passed by reference through the
/// fetcher and the generator; nothing mutates it during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationConfig {
    /// Display name (city, region, etc.)
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// IANA timezone the forecast dates are expressed in
    pub timezone: Tz,
    /// Fixed local event time; `None` renders all-day events
    pub event_time: Option<NaiveTime>,
    /// Link embedded in every event description
    pub link_url: String,
    /// Units requested from the provider and used for labels
    pub units: Units,
    /// Number of days to request
    pub forecast_days: u8,
    /// Where the rendered feed is written
    pub output: PathBuf,
}

impl LocationConfig {
    /// Create an all-day location with default units and horizon
    #[must_use]
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64, timezone: Tz) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            timezone,
            event_time: None,
            link_url: String::new(),
            units: Units::default(),
            forecast_days: 7,
            output: PathBuf::from("forecast.ics"),
        }
    }

    /// Use timed events at the given local time
    #[must_use]
    pub fn with_event_time(mut self, time: NaiveTime) -> Self {
        self.event_time = Some(time);
        self
    }

    /// Set the link URL shown in descriptions
    #[must_use]
    pub fn with_link_url(mut self, url: impl Into<String>) -> Self {
        self.link_url = url.into();
        self
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Round coordinates to a fixed number of decimals
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Stable key identifying this location inside event UIDs
    ///
    /// Combines the transliterated name with rounded coordinates, so two
    /// places sharing a name still get distinct identifiers.
    #[must_use]
    pub fn uid_key(&self) -> String {
        let (lat, lon) = self.rounded_coordinates(4);
        let slug = slug::slugify(&self.name);
        if slug.is_empty() {
            format!("{lat:.4}_{lon:.4}")
        } else {
            format!("{slug}-{lat:.4}_{lon:.4}")
        }
    }

    /// Whether events are rendered as all-day entries
    #[must_use]
    pub fn is_all_day(&self) -> bool {
        self.event_time.is_none()
    }
}

/// Measurement units for the forecast values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Units {
    #[serde(default)]
    pub temperature: TemperatureUnit,
    #[serde(default)]
    pub wind_speed: WindSpeedUnit,
    #[serde(default)]
    pub precipitation: PrecipitationUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindSpeedUnit {
    #[default]
    Kmh,
    Ms,
    Mph,
    Kn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecipitationUnit {
    #[default]
    Mm,
    Inch,
}

impl TemperatureUnit {
    /// Query parameter value understood by Open-Meteo
    #[must_use]
    pub fn as_query(self) -> &'static str {
        match self {
            Self::Celsius => "celsius",
            Self::Fahrenheit => "fahrenheit",
        }
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    /// Convert a value in this unit to Celsius
    #[must_use]
    pub fn to_celsius(self, value: f64) -> f64 {
        match self {
            Self::Celsius => value,
            Self::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
        }
    }
}

impl WindSpeedUnit {
    /// Query parameter value understood by Open-Meteo
    #[must_use]
    pub fn as_query(self) -> &'static str {
        match self {
            Self::Kmh => "kmh",
            Self::Ms => "ms",
            Self::Mph => "mph",
            Self::Kn => "kn",
        }
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Kmh => "km/h",
            Self::Ms => "m/s",
            Self::Mph => "mph",
            Self::Kn => "kn",
        }
    }

    /// Convert a value in this unit to km/h
    #[must_use]
    pub fn to_kmh(self, value: f64) -> f64 {
        match self {
            Self::Kmh => value,
            Self::Ms => value * 3.6,
            Self::Mph => value * 1.609_344,
            Self::Kn => value * 1.852,
        }
    }
}

impl PrecipitationUnit {
    /// Query parameter value understood by Open-Meteo
    #[must_use]
    pub fn as_query(self) -> &'static str {
        match self {
            Self::Mm => "mm",
            Self::Inch => "inch",
        }
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Mm => "mm",
            Self::Inch => "in",
        }
    }
}

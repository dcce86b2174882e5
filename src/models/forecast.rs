//! Daily forecast record and display helpers

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::weather::{Condition, weather_code_to_description};
use super::{TemperatureUnit, Units, WindSpeedUnit};

/// Temperature at or above which a day is flagged as hot (°C)
const HOT_THRESHOLD_C: f64 = 30.0;
/// Temperature at or below which a day is flagged as cold (°C)
const COLD_THRESHOLD_C: f64 = 5.0;
/// Wind speed at or above which a day is flagged as windy (km/h)
const WINDY_THRESHOLD_KMH: f64 = 40.0;

/// Forecast for one calendar day in the location's timezone.
///
/// Values are in the units requested from the provider and are never
/// converted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    /// Calendar date
    pub date: NaiveDate,
    /// Minimum temperature
    pub temperature_min: f64,
    /// Maximum temperature
    pub temperature_max: f64,
    /// Precipitation probability (0-100%)
    pub precipitation_probability: u8,
    /// Precipitation amount
    pub precipitation: f64,
    /// Maximum wind speed
    pub wind_speed_max: f64,
    /// WMO weather code, when the provider supplies one
    pub weather_code: Option<u8>,
    /// Local sunrise time
    pub sunrise: Option<NaiveTime>,
    /// Local sunset time
    pub sunset: Option<NaiveTime>,
}

impl DailyForecast {
    /// Create a forecast day without optional details
    #[must_use]
    pub fn new(
        date: NaiveDate,
        temperature_min: f64,
        temperature_max: f64,
        precipitation_probability: u8,
        precipitation: f64,
        wind_speed_max: f64,
    ) -> Self {
        Self {
            date,
            temperature_min,
            temperature_max,
            precipitation_probability,
            precipitation,
            wind_speed_max,
            weather_code: None,
            sunrise: None,
            sunset: None,
        }
    }

    /// Numeric fields paired with their names, for validation messages
    #[must_use]
    pub fn numeric_fields(&self) -> [(&'static str, f64); 4] {
        [
            ("temperature_min", self.temperature_min),
            ("temperature_max", self.temperature_max),
            ("precipitation", self.precipitation),
            ("wind_speed_max", self.wind_speed_max),
        ]
    }

    #[must_use]
    pub fn condition(&self) -> Option<Condition> {
        self.weather_code.map(Condition::from_wmo_code)
    }

    /// Description of the weather code, if any
    #[must_use]
    pub fn condition_description(&self) -> Option<&'static str> {
        self.weather_code.map(weather_code_to_description)
    }

    /// Pick a summary emoji: temperature extremes first, then the weather
    /// code, then wind, then precipitation probability.
    #[must_use]
    pub fn emoji(&self, units: &Units) -> &'static str {
        let max_c = units.temperature.to_celsius(self.temperature_max);
        if max_c >= HOT_THRESHOLD_C {
            return "🔥";
        }
        if max_c <= COLD_THRESHOLD_C {
            return "🥶";
        }
        match self.condition() {
            Some(condition) if condition != Condition::Unknown => condition.emoji(),
            _ if units.wind_speed.to_kmh(self.wind_speed_max) >= WINDY_THRESHOLD_KMH => "💨",
            _ if self.precipitation_probability >= 60 => "🌧️",
            _ => "🌤️",
        }
    }

    /// Format the maximum temperature with unit
    #[must_use]
    pub fn format_high(&self, unit: TemperatureUnit) -> String {
        format!("{}{}", format_number(self.temperature_max), unit.symbol())
    }

    /// Format the minimum temperature with unit
    #[must_use]
    pub fn format_low(&self, unit: TemperatureUnit) -> String {
        format!("{}{}", format_number(self.temperature_min), unit.symbol())
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self, unit: WindSpeedUnit) -> String {
        format!("{} {}", format_number(self.wind_speed_max), unit.symbol())
    }

    /// Description lines enumerating every forecast field
    #[must_use]
    pub fn description_lines(&self, units: &Units) -> Vec<String> {
        let mut lines = Vec::with_capacity(7);
        if let Some(description) = self.condition_description() {
            lines.push(format!("Conditions: {description}"));
        }
        lines.push(format!(
            "Temperature: {} – {}",
            self.format_low(units.temperature),
            self.format_high(units.temperature)
        ));
        lines.push(format!(
            "Precipitation probability: {}%",
            self.precipitation_probability
        ));
        lines.push(format!(
            "Precipitation: {} {}",
            format_number(self.precipitation),
            units.precipitation.symbol()
        ));
        lines.push(format!("Wind: {}", self.format_wind(units.wind_speed)));
        if let Some(sunrise) = self.sunrise {
            lines.push(format!("Sunrise: {}", sunrise.format("%H:%M")));
        }
        if let Some(sunset) = self.sunset {
            lines.push(format!("Sunset: {}", sunset.format("%H:%M")));
        }
        lines
    }
}

/// Shortest decimal form of a provider value (`27`, `27.5`, `-3.2`)
#[must_use]
pub fn format_number(value: f64) -> String {
    // -0.0 would otherwise print as "-0"
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

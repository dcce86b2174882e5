//! `OpenMeteo` API response structures and conversion into [`DailyForecast`]

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;

use crate::error::ForecastError;
use crate::models::{DailyForecast, LocationConfig};
use crate::Result;

/// Daily variables requested from the provider
pub const DAILY_FIELDS: &str = "temperature_2m_min,temperature_2m_max,precipitation_sum,\
precipitation_probability_max,wind_speed_10m_max,weather_code,sunrise,sunset";

/// Forecast response from `OpenMeteo`
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub daily: Option<DailyData>,
}

/// Daily weather data from `OpenMeteo`; every series may contain nulls
#[derive(Debug, Deserialize)]
pub struct DailyData {
    pub time: Vec<String>,
    #[serde(rename = "temperature_2m_min")]
    pub temperature_min: Option<Vec<Option<f64>>>,
    #[serde(rename = "temperature_2m_max")]
    pub temperature_max: Option<Vec<Option<f64>>>,
    #[serde(rename = "precipitation_sum")]
    pub precipitation: Option<Vec<Option<f64>>>,
    #[serde(rename = "precipitation_probability_max")]
    pub precipitation_probability: Option<Vec<Option<f64>>>,
    #[serde(rename = "wind_speed_10m_max")]
    pub wind_speed_max: Option<Vec<Option<f64>>>,
    #[serde(rename = "weather_code")]
    pub weather_code: Option<Vec<Option<f64>>>,
    pub sunrise: Option<Vec<Option<String>>>,
    pub sunset: Option<Vec<Option<String>>>,
}

/// Build the forecast request URL for a location
#[must_use]
pub fn forecast_url(base_url: &str, location: &LocationConfig) -> String {
    format!(
        "{}/forecast?latitude={}&longitude={}&daily={}&timezone={}&forecast_days={}\
&temperature_unit={}&wind_speed_unit={}&precipitation_unit={}",
        base_url.trim_end_matches('/'),
        location.latitude,
        location.longitude,
        DAILY_FIELDS,
        urlencoding::encode(location.timezone.name()),
        location.forecast_days,
        location.units.temperature.as_query(),
        location.units.wind_speed.as_query(),
        location.units.precipitation.as_query(),
    )
}

fn required(series: Option<&Vec<Option<f64>>>, field: &str, index: usize, date: NaiveDate) -> Result<f64> {
    series
        .ok_or_else(|| ForecastError::fetch(format!("response has no daily {field} series")))?
        .get(index)
        .copied()
        .flatten()
        .ok_or_else(|| ForecastError::fetch(format!("{field} is missing for {date}")))
}

fn optional<T: Clone>(series: Option<&Vec<Option<T>>>, index: usize) -> Option<T> {
    series.and_then(|values| values.get(index).cloned().flatten())
}

fn parse_clock(value: &str) -> Option<NaiveTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .ok()
        .map(|dt| dt.time())
}

fn weather_code(value: f64) -> Option<u8> {
    (value.is_finite() && (0.0..=255.0).contains(&value)).then(|| value.round() as u8)
}

impl ForecastResponse {
    /// Convert the daily series into consecutive forecast days.
    ///
    /// Exactly `days` entries are produced. A missing series, a null
    /// required value, an unparseable date or a gap between dates is a
    /// fetch error.
    pub fn into_daily_forecasts(self, days: usize) -> Result<Vec<DailyForecast>> {
        let daily = self
            .daily
            .ok_or_else(|| ForecastError::fetch("response has no daily block"))?;

        if daily.time.len() < days {
            return Err(ForecastError::fetch(format!(
                "expected {days} forecast days, provider returned {}",
                daily.time.len()
            )));
        }

        let mut forecasts: Vec<DailyForecast> = Vec::with_capacity(days);
        for (index, raw_date) in daily.time.iter().take(days).enumerate() {
            let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|e| {
                ForecastError::fetch(format!("invalid forecast date '{raw_date}': {e}"))
            })?;

            if let Some(previous) = forecasts.last() {
                if previous.date + Duration::days(1) != date {
                    return Err(ForecastError::fetch(format!(
                        "forecast dates are not consecutive: {} then {date}",
                        previous.date
                    )));
                }
            }

            let probability = required(
                daily.precipitation_probability.as_ref(),
                "precipitation_probability_max",
                index,
                date,
            )?;

            forecasts.push(DailyForecast {
                date,
                temperature_min: required(daily.temperature_min.as_ref(), "temperature_2m_min", index, date)?,
                temperature_max: required(daily.temperature_max.as_ref(), "temperature_2m_max", index, date)?,
                precipitation_probability: probability.clamp(0.0, 100.0).round() as u8,
                precipitation: required(daily.precipitation.as_ref(), "precipitation_sum", index, date)?,
                wind_speed_max: required(daily.wind_speed_max.as_ref(), "wind_speed_10m_max", index, date)?,
                weather_code: optional(daily.weather_code.as_ref(), index).and_then(weather_code),
                sunrise: optional(daily.sunrise.as_ref(), index).as_deref().and_then(parse_clock),
                sunset: optional(daily.sunset.as_ref(), index).as_deref().and_then(parse_clock),
            });
        }

        Ok(forecasts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> ForecastResponse {
        serde_json::from_value(value).unwrap()
    }

    fn sample() -> serde_json::Value {
        json!({
            "latitude": 37.98,
            "longitude": 23.72,
            "timezone": "Europe/Athens",
            "daily": {
                "time": ["2024-06-01", "2024-06-02", "2024-06-03"],
                "temperature_2m_min": [18.0, 19.0, 17.0],
                "temperature_2m_max": [27.0, 28.0, 25.0],
                "precipitation_sum": [0.0, 0.0, 4.0],
                "precipitation_probability_max": [10, 0, 60],
                "wind_speed_10m_max": [12.0, 8.0, 20.0],
                "weather_code": [0, 1, 61],
                "sunrise": ["2024-06-01T06:05", "2024-06-02T06:04", null],
                "sunset": ["2024-06-01T20:40", "2024-06-02T20:41", "2024-06-03T20:41"]
            }
        })
    }

    #[test]
    fn test_parse_daily_forecasts() {
        let days = response(sample()).into_daily_forecasts(3).unwrap();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(days[0].temperature_max, 27.0);
        assert_eq!(days[2].precipitation_probability, 60);
        assert_eq!(days[2].precipitation, 4.0);
        assert_eq!(days[2].weather_code, Some(61));
        assert_eq!(days[0].sunrise, NaiveTime::from_hms_opt(6, 5, 0));
        assert_eq!(days[2].sunrise, None);
    }

    #[test]
    fn test_extra_days_are_truncated() {
        let days = response(sample()).into_daily_forecasts(2).unwrap();
        assert_eq!(days.len(), 2);
    }

    #[test]
    fn test_too_few_days_is_an_error() {
        let result = response(sample()).into_daily_forecasts(7);
        assert!(matches!(result, Err(ForecastError::Fetch { .. })));
    }

    #[test]
    fn test_null_required_value_is_an_error() {
        let mut value = sample();
        value["daily"]["temperature_2m_max"] = json!([27.0, null, 25.0]);
        let err = response(value).into_daily_forecasts(3).unwrap_err();
        assert!(err.to_string().contains("temperature_2m_max is missing for 2024-06-02"));
    }

    #[test]
    fn test_missing_series_is_an_error() {
        let mut value = sample();
        value["daily"]
            .as_object_mut()
            .unwrap()
            .remove("wind_speed_10m_max");
        let result = response(value).into_daily_forecasts(3);
        assert!(matches!(result, Err(ForecastError::Fetch { .. })));
    }

    #[test]
    fn test_missing_daily_block_is_an_error() {
        let result = response(json!({"latitude": 1.0})).into_daily_forecasts(3);
        assert!(matches!(result, Err(ForecastError::Fetch { .. })));
    }

    #[test]
    fn test_gap_between_dates_is_an_error() {
        let mut value = sample();
        value["daily"]["time"] = json!(["2024-06-01", "2024-06-03", "2024-06-04"]);
        let result = response(value).into_daily_forecasts(3);
        assert!(matches!(result, Err(ForecastError::Fetch { .. })));
    }

    #[test]
    fn test_invalid_date_is_an_error() {
        let mut value = sample();
        value["daily"]["time"] = json!(["June 1st", "2024-06-02", "2024-06-03"]);
        let result = response(value).into_daily_forecasts(3);
        assert!(matches!(result, Err(ForecastError::Fetch { .. })));
    }

    #[test]
    fn test_optional_series_may_be_absent() {
        let mut value = sample();
        let daily = value["daily"].as_object_mut().unwrap();
        daily.remove("weather_code");
        daily.remove("sunrise");
        daily.remove("sunset");
        let days = response(value).into_daily_forecasts(3).unwrap();
        assert!(days.iter().all(|d| d.weather_code.is_none() && d.sunset.is_none()));
    }

    #[test]
    fn test_forecast_url() {
        let location = LocationConfig::new("Athens", 37.9838, 23.7275, chrono_tz::Europe::Athens);
        let url = forecast_url("https://api.open-meteo.com/v1/", &location);
        assert!(url.starts_with("https://api.open-meteo.com/v1/forecast?latitude=37.9838&longitude=23.7275"));
        assert!(url.contains("&timezone=Europe%2FAthens"));
        assert!(url.contains("&forecast_days=7"));
        assert!(url.contains("&wind_speed_unit=kmh"));
    }
}

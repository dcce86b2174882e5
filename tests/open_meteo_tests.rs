//! Open-Meteo fetcher against a mock HTTP server

use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use forecast_ics::config::ProviderConfig;
use forecast_ics::models::WindSpeedUnit;
use forecast_ics::{ForecastError, ForecastProvider, LocationConfig, OpenMeteoProvider};

fn athens() -> LocationConfig {
    let mut location = LocationConfig::new("Athens", 37.9838, 23.7275, chrono_tz::Europe::Athens);
    location.forecast_days = 3;
    location
}

fn provider(server: &MockServer) -> OpenMeteoProvider {
    OpenMeteoProvider::new(&ProviderConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
    })
    .unwrap()
}

fn daily_body() -> serde_json::Value {
    json!({
        "latitude": 37.98,
        "longitude": 23.72,
        "timezone": "Europe/Athens",
        "daily": {
            "time": ["2024-06-01", "2024-06-02", "2024-06-03"],
            "temperature_2m_min": [18.0, 19.5, 17.0],
            "temperature_2m_max": [27.0, 28.5, 25.0],
            "precipitation_sum": [0.0, 0.0, 4.2],
            "precipitation_probability_max": [10, 0, 60],
            "wind_speed_10m_max": [12.0, 8.0, 20.0],
            "weather_code": [0, 2, 61],
            "sunrise": ["2024-06-01T06:05", "2024-06-02T06:04", "2024-06-03T06:04"],
            "sunset": ["2024-06-01T20:40", "2024-06-02T20:41", "2024-06-03T20:41"]
        }
    })
}

#[tokio::test]
async fn fetch_parses_daily_series() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("latitude", "37.9838"))
        .and(query_param("longitude", "23.7275"))
        .and(query_param("timezone", "Europe/Athens"))
        .and(query_param("forecast_days", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(daily_body()))
        .expect(1)
        .mount(&server)
        .await;

    let days = provider(&server).fetch(&athens()).await.unwrap();

    assert_eq!(days.len(), 3);
    assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    assert_eq!(days[1].temperature_max, 28.5);
    assert_eq!(days[2].precipitation_probability, 60);
    assert_eq!(days[2].weather_code, Some(61));
}

#[tokio::test]
async fn fetch_requests_configured_units() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("wind_speed_unit", "kn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(daily_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut location = athens();
    location.units.wind_speed = WindSpeedUnit::Kn;
    assert!(provider(&server).fetch(&location).await.is_ok());
}

#[tokio::test]
async fn server_error_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = provider(&server).fetch(&athens()).await.unwrap_err();
    assert!(matches!(err, ForecastError::Fetch { .. }));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn malformed_body_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let result = provider(&server).fetch(&athens()).await;
    assert!(matches!(result, Err(ForecastError::Fetch { .. })));
}

#[tokio::test]
async fn short_series_is_a_fetch_error() {
    let server = MockServer::start().await;
    let mut body = daily_body();
    body["daily"]["time"] = json!(["2024-06-01", "2024-06-02"]);
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let result = provider(&server).fetch(&athens()).await;
    assert!(matches!(result, Err(ForecastError::Fetch { .. })));
}

#[tokio::test]
async fn unreachable_server_is_a_fetch_error() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    drop(server);

    let provider = OpenMeteoProvider::new(&ProviderConfig {
        base_url,
        timeout_seconds: 2,
    })
    .unwrap();
    let result = provider.fetch(&athens()).await;
    assert!(matches!(result, Err(ForecastError::Fetch { .. })));
}

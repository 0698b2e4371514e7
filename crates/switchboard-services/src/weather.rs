//! Current-conditions lookups against WeatherAPI.com.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use switchboard_core::config::WeatherConfig;

/// A current-conditions report for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub location: String,
    pub country: String,
    pub temperature_c: f64,
    pub temperature_f: f64,
    pub feels_like_c: f64,
    pub feels_like_f: f64,
    pub condition: String,
    pub humidity: f64,
    pub wind_kph: f64,
    pub wind_direction: String,
    pub pressure_mb: f64,
    pub visibility_km: f64,
    pub cloud_cover: f64,
    pub uv_index: f64,
    pub local_time: String,
    pub source: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WeatherError {
    #[error("Weather API key not configured")]
    MissingApiKey,

    #[error("Invalid weather API key")]
    InvalidApiKey,

    #[error("Invalid location: \"{0}\". Please check the spelling.")]
    InvalidLocation(String),

    #[error("Weather API key disabled or over its quota")]
    Forbidden,

    #[error("Weather API error {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Cannot connect to weather service: {0}")]
    Network(String),

    #[error("Weather service timed out")]
    Timeout,

    #[error("Unexpected weather payload: {0}")]
    InvalidPayload(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WeatherError::Timeout
        } else if err.is_decode() {
            WeatherError::InvalidPayload(err.to_string())
        } else {
            WeatherError::Network(err.to_string())
        }
    }
}

#[async_trait]
pub trait WeatherService: Send + Sync {
    async fn current_weather(&self, location: &str) -> Result<CurrentWeather, WeatherError>;
}

// =============================================================================
// WeatherAPI.com client
// =============================================================================

#[derive(Debug, Deserialize)]
struct ApiResponse {
    location: ApiLocation,
    current: ApiCurrent,
}

#[derive(Debug, Deserialize)]
struct ApiLocation {
    name: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    localtime: String,
}

#[derive(Debug, Deserialize)]
struct ApiCurrent {
    temp_c: f64,
    temp_f: f64,
    feelslike_c: f64,
    feelslike_f: f64,
    condition: ApiCondition,
    humidity: f64,
    wind_kph: f64,
    #[serde(default)]
    wind_dir: String,
    pressure_mb: f64,
    vis_km: f64,
    cloud: f64,
    uv: f64,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

impl From<ApiResponse> for CurrentWeather {
    fn from(r: ApiResponse) -> Self {
        Self {
            location: r.location.name,
            country: r.location.country,
            temperature_c: r.current.temp_c,
            temperature_f: r.current.temp_f,
            feels_like_c: r.current.feelslike_c,
            feels_like_f: r.current.feelslike_f,
            condition: r.current.condition.text,
            humidity: r.current.humidity,
            wind_kph: r.current.wind_kph,
            wind_direction: r.current.wind_dir,
            pressure_mb: r.current.pressure_mb,
            visibility_km: r.current.vis_km,
            cloud_cover: r.current.cloud,
            uv_index: r.current.uv,
            local_time: r.location.localtime,
            source: "WeatherAPI.com".to_string(),
        }
    }
}

pub struct WeatherApiClient {
    client: reqwest::Client,
    config: WeatherConfig,
}

impl WeatherApiClient {
    pub fn new(config: WeatherConfig) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WeatherError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl WeatherService for WeatherApiClient {
    async fn current_weather(&self, location: &str) -> Result<CurrentWeather, WeatherError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(WeatherError::MissingApiKey)?;

        let url = format!("{}/current.json", self.config.base_url.trim_end_matches('/'));
        debug!(location, "fetching current weather");
        let response = self
            .client
            .get(url)
            .query(&[("key", key), ("q", location), ("aqi", "no")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        match status {
            StatusCode::OK => {
                let parsed: ApiResponse = serde_json::from_str(&body)
                    .map_err(|e| WeatherError::InvalidPayload(e.to_string()))?;
                let report = CurrentWeather::from(parsed);
                info!(location = %report.location, "weather report received");
                Ok(report)
            }
            StatusCode::UNAUTHORIZED => Err(WeatherError::InvalidApiKey),
            StatusCode::BAD_REQUEST => Err(WeatherError::InvalidLocation(location.to_string())),
            StatusCode::FORBIDDEN => Err(WeatherError::Forbidden),
            other => {
                let message = serde_json::from_str::<ApiErrorBody>(&body)
                    .map(|b| b.error.message)
                    .unwrap_or_else(|_| "Unknown error".to_string());
                Err(WeatherError::Provider {
                    status: other.as_u16(),
                    message,
                })
            }
        }
    }
}

// =============================================================================
// Mock
// =============================================================================

/// Weather service returning canned data and recording every location asked.
#[derive(Debug)]
pub struct MockWeatherService {
    response: Result<CurrentWeather, WeatherError>,
    locations: Mutex<Vec<String>>,
}

impl MockWeatherService {
    /// Mild conditions echoing the requested location.
    pub fn new() -> Self {
        Self::with_report(sample_weather("Mock City"))
    }

    pub fn with_report(report: CurrentWeather) -> Self {
        Self {
            response: Ok(report),
            locations: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: WeatherError) -> Self {
        Self {
            response: Err(error),
            locations: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.locations.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl Default for MockWeatherService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WeatherService for MockWeatherService {
    async fn current_weather(&self, location: &str) -> Result<CurrentWeather, WeatherError> {
        if let Ok(mut l) = self.locations.lock() {
            l.push(location.to_string());
        }
        self.response.clone().map(|mut r| {
            if r.location == "Mock City" {
                r.location = location.to_string();
            }
            r
        })
    }
}

/// A plausible report, used by the mock and by tests.
pub fn sample_weather(location: &str) -> CurrentWeather {
    CurrentWeather {
        location: location.to_string(),
        country: "Testland".to_string(),
        temperature_c: 21.0,
        temperature_f: 69.8,
        feels_like_c: 20.0,
        feels_like_f: 68.0,
        condition: "Partly cloudy".to_string(),
        humidity: 55.0,
        wind_kph: 11.2,
        wind_direction: "NW".to_string(),
        pressure_mb: 1015.0,
        visibility_km: 10.0,
        cloud_cover: 25.0,
        uv_index: 4.0,
        local_time: "2024-06-01 12:00".to_string(),
        source: "mock".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, key: Option<&str>) -> WeatherApiClient {
        WeatherApiClient::new(WeatherConfig {
            base_url: server.uri(),
            api_key: key.map(str::to_string),
            ..WeatherConfig::default()
        })
        .unwrap()
    }

    fn paris_body() -> serde_json::Value {
        json!({
            "location": { "name": "Paris", "country": "France", "localtime": "2024-06-01 14:00" },
            "current": {
                "temp_c": 18.0, "temp_f": 64.4, "feelslike_c": 17.0, "feelslike_f": 62.6,
                "condition": { "text": "Sunny" }, "humidity": 40, "wind_kph": 9.0,
                "wind_dir": "W", "pressure_mb": 1020.0, "vis_km": 10.0, "cloud": 0, "uv": 6.0
            }
        })
    }

    #[tokio::test]
    async fn test_current_weather_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/current.json"))
            .and(query_param("q", "Paris"))
            .and(query_param("key", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paris_body()))
            .expect(1)
            .mount(&server)
            .await;

        let report = client_for(&server, Some("k"))
            .current_weather("Paris")
            .await
            .unwrap();
        assert_eq!(report.location, "Paris");
        assert_eq!(report.country, "France");
        assert_eq!(report.condition, "Sunny");
        assert!((report.humidity - 40.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_missing_key_short_circuits() {
        let server = MockServer::start().await;
        let err = client_for(&server, None)
            .current_weather("Paris")
            .await
            .unwrap_err();
        assert_eq!(err, WeatherError::MissingApiKey);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "Nowhere"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("q", "Locked"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("q", "Broken"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(json!({ "error": { "code": 9999, "message": "maintenance" } })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Some("k"));
        assert_eq!(
            client.current_weather("Nowhere").await.unwrap_err(),
            WeatherError::InvalidLocation("Nowhere".into())
        );
        assert_eq!(
            client.current_weather("Locked").await.unwrap_err(),
            WeatherError::InvalidApiKey
        );
        assert_eq!(
            client.current_weather("Broken").await.unwrap_err(),
            WeatherError::Provider {
                status: 503,
                message: "maintenance".into()
            }
        );
    }

    #[tokio::test]
    async fn test_mock_records_locations() {
        let mock = MockWeatherService::new();
        let r = mock.current_weather("Paris").await.unwrap();
        assert_eq!(r.location, "Paris");
        assert_eq!(mock.calls(), vec!["Paris"]);
    }

    #[tokio::test]
    async fn test_mock_failing() {
        let mock = MockWeatherService::failing(WeatherError::Timeout);
        assert_eq!(
            mock.current_weather("Paris").await.unwrap_err(),
            WeatherError::Timeout
        );
        assert_eq!(mock.calls().len(), 1);
    }
}

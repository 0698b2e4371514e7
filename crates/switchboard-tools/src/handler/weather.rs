//! Weather handler.

use std::sync::Arc;

use async_trait::async_trait;

use switchboard_core::Capability;
use switchboard_services::{CurrentWeather, WeatherService};

use crate::error::ToolError;
use crate::handler::{wrong_args, ToolHandler};
use crate::types::{ToolArgs, ToolOutput};

/// Multi-line current-conditions report.
pub fn render_report(w: &CurrentWeather) -> String {
    let place = if w.country.is_empty() {
        w.location.clone()
    } else {
        format!("{}, {}", w.location, w.country)
    };
    let mut lines = vec![
        format!("Current weather in {}", place),
        format!("Temperature: {}°C ({}°F)", w.temperature_c, w.temperature_f),
        format!("Feels like: {}°C ({}°F)", w.feels_like_c, w.feels_like_f),
        format!("Condition: {}", w.condition),
        format!("Humidity: {}%", w.humidity),
        format!("Wind: {} km/h {}", w.wind_kph, w.wind_direction),
        format!("Pressure: {} mb", w.pressure_mb),
        format!("Visibility: {} km", w.visibility_km),
        format!("Cloud cover: {}%", w.cloud_cover),
        format!("UV index: {}", w.uv_index),
    ];
    if !w.local_time.is_empty() {
        lines.push(format!("Local time: {}", w.local_time));
    }
    lines.push(format!("Source: {}", w.source));
    lines.join("\n")
}

/// Handler for current-weather lookups.
pub struct WeatherHandler {
    service: Arc<dyn WeatherService>,
}

impl WeatherHandler {
    pub fn new(service: Arc<dyn WeatherService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for WeatherHandler {
    fn capability(&self) -> Capability {
        Capability::Weather
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let ToolArgs::Weather { location } = args else {
            return Err(wrong_args(self.capability(), args));
        };
        let report = self.service.current_weather(location).await?;
        tracing::debug!(location = %report.location, condition = %report.condition, "weather fetched");
        Ok(ToolOutput::text(render_report(&report)))
    }

    fn describe(&self, args: &ToolArgs) -> String {
        match args {
            ToolArgs::Weather { location } => format!("Weather for {}", location),
            _ => "Weather".to_string(),
        }
    }
}

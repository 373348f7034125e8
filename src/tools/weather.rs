//! Current weather lookup backed by Open-Meteo.

use super::{fetch_json, ParamSpec, Tool, ToolArgs};
use crate::config::ToolSettings;
use crate::error::{AgentError, Result, ToolError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

/// Resolves a city to coordinates, then reports temperature and wind.
pub struct WeatherTool {
    client: reqwest::Client,
    geocoding_url: Url,
    forecast_url: Url,
}

#[derive(Debug, Deserialize)]
struct WeatherArgs {
    city: String,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<Place>,
}

#[derive(Debug, Deserialize)]
struct Place {
    name: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
    windspeed: f64,
}

impl WeatherTool {
    pub fn new(client: reqwest::Client, settings: &ToolSettings) -> Result<Self> {
        Ok(Self {
            client,
            geocoding_url: parse_url("tools.geocoding_url", &settings.geocoding_url)?,
            forecast_url: parse_url("tools.forecast_url", &settings.forecast_url)?,
        })
    }

    #[instrument(skip(self))]
    async fn lookup(&self, city: &str) -> std::result::Result<String, ToolError> {
        let url = Url::parse_with_params(
            self.geocoding_url.as_str(),
            &[("name", city), ("count", "1")],
        )
        .map_err(|e| ToolError::Failed(format!("Error: {}", e)))?;

        let geocoding: GeocodingResponse = fetch_json(&self.client, url).await?;
        let Some(place) = geocoding.results.into_iter().next() else {
            return Ok(format!("City not found: {}", city));
        };

        debug!(
            "Resolved {} to {} ({}, {})",
            city, place.name, place.latitude, place.longitude
        );

        let url = Url::parse_with_params(
            self.forecast_url.as_str(),
            &[
                ("latitude", place.latitude.to_string()),
                ("longitude", place.longitude.to_string()),
                ("current_weather", "true".to_string()),
            ],
        )
        .map_err(|e| ToolError::Failed(format!("Error: {}", e)))?;

        let forecast: ForecastResponse = fetch_json(&self.client, url).await?;
        Ok(format_weather(&place.name, &forecast.current_weather))
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Gets current weather for a city. Use this when user asks about weather."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required_string("city", "City name, e.g. 'New York'")]
    }

    async fn execute(&self, args: ToolArgs) -> std::result::Result<String, ToolError> {
        let args: WeatherArgs = args.parse()?;
        self.lookup(args.city.trim()).await
    }
}

fn format_weather(name: &str, current: &CurrentWeather) -> String {
    format!(
        "{}: {:.1}°C, wind {:.1} km/h",
        name, current.temperature, current.windspeed
    )
}

pub(super) fn parse_url(key: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| AgentError::Config(format!("Invalid {} '{}': {}", key, value, e)))
}

//! `get_current_weather` tool backed by the OpenWeatherMap current-weather API.
//!
//! The API key is read from an environment variable at call time, so the
//! tool is always registered; without a key it fails with an `UNAVAILABLE`
//! tool error that the orchestrator turns into an error turn.

use async_trait::async_trait;
use parley_domain::{
    ProviderError, ToolCapability, ToolDefinition, ToolError, ToolParameter, ToolProvider,
    ToolSpec, ValidatedArguments,
};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const GET_CURRENT_WEATHER: &str = "get_current_weather";

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSettings {
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub base_url: String,
    pub units: String,
    pub lang: String,
    pub timeout: Duration,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            api_key_env: "WEATHER_API_KEY".to_string(),
            base_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            units: "metric".to_string(),
            lang: "pl".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: MainReadings,
    #[serde(default)]
    weather: Vec<Conditions>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    pressure: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct Conditions {
    description: String,
}

/// "kraków " -> "Kraków"
fn normalize_city(city: &str) -> String {
    capitalize(&city.trim().to_lowercase())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn temperature_unit(units: &str) -> &'static str {
    match units {
        "imperial" => "°F",
        "standard" => "K",
        _ => "°C",
    }
}

fn format_report(city: &str, units: &str, report: &WeatherResponse) -> String {
    let conditions = report
        .weather
        .first()
        .map(|c| capitalize(&c.description))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "Pogoda w mieście {}:\n- Warunki: {}\n- Temperatura: {}{}\n- Ciśnienie: {} hPa\n- Wilgotność: {}%",
        city,
        conditions,
        report.main.temp,
        temperature_unit(units),
        report.main.pressure,
        report.main.humidity
    )
}

struct WeatherCapability {
    client: reqwest::Client,
    settings: WeatherSettings,
}

impl WeatherCapability {
    fn api_key(&self) -> Result<String, ToolError> {
        std::env::var(&self.settings.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ToolError::unavailable(format!(
                    "Weather API key is not configured (set {})",
                    self.settings.api_key_env
                ))
            })
    }
}

#[async_trait]
impl ToolCapability for WeatherCapability {
    async fn invoke(&self, args: &ValidatedArguments) -> Result<String, ToolError> {
        let city = normalize_city(args.require_str("city")?);
        if city.is_empty() {
            return Err(ToolError::invalid_argument("City name is empty"));
        }
        let api_key = self.api_key()?;
        debug!("Fetching weather for '{}'", city);

        let response = self
            .client
            .get(&self.settings.base_url)
            .query(&[
                ("q", city.as_str()),
                ("appid", api_key.as_str()),
                ("units", self.settings.units.as_str()),
                ("lang", self.settings.lang.as_str()),
            ])
            .timeout(self.settings.timeout)
            .send()
            .await
            .map_err(|e| {
                warn!("Weather service request failed: {}", e);
                ToolError::unavailable("Cannot reach the weather service")
            })?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(ToolError::not_found(format!("city '{}'", city))),
            StatusCode::UNAUTHORIZED => {
                return Err(ToolError::unavailable("Weather API key was rejected"));
            }
            status => {
                return Err(ToolError::execution_failed(format!(
                    "Weather service returned {}",
                    status
                )));
            }
        }

        let report: WeatherResponse = response.json().await.map_err(|e| {
            ToolError::execution_failed(format!("Unexpected weather service reply: {}", e))
        })?;
        Ok(format_report(&city, &self.settings.units, &report))
    }
}

pub struct WeatherProvider {
    settings: WeatherSettings,
    client: reqwest::Client,
}

impl WeatherProvider {
    pub fn new(settings: WeatherSettings) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
        }
    }

    pub fn tool(&self) -> ToolSpec {
        ToolSpec::from_capability(
            ToolDefinition::new(
                GET_CURRENT_WEATHER,
                "Returns the current weather for a city. Use when the user asks about weather, \
                 temperature or conditions in a specific place.",
            )
            .with_parameter(ToolParameter::new(
                "city",
                "Name of the city to check the weather for",
                true,
            )),
            WeatherCapability {
                client: self.client.clone(),
                settings: self.settings.clone(),
            },
        )
    }
}

#[async_trait]
impl ToolProvider for WeatherProvider {
    fn id(&self) -> &str {
        "weather"
    }

    fn display_name(&self) -> &str {
        "Weather"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn discover_tools(&self) -> Result<Vec<ToolSpec>, ProviderError> {
        Ok(vec![self.tool()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_domain::ArgValue;

    #[test]
    fn test_normalize_city() {
        assert_eq!(normalize_city("  kraków "), "Kraków");
        assert_eq!(normalize_city("WARSZAWA"), "Warszawa");
        assert_eq!(normalize_city("łódź"), "Łódź");
        assert_eq!(normalize_city("   "), "");
    }

    #[test]
    fn test_format_report() {
        let body = r#"{
            "weather": [{"id": 800, "main": "Clear", "description": "bezchmurnie"}],
            "main": {"temp": 21.5, "feels_like": 21.0, "pressure": 1013, "humidity": 40},
            "cod": 200
        }"#;
        let report: WeatherResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            format_report("Gdańsk", "metric", &report),
            "Pogoda w mieście Gdańsk:\n- Warunki: Bezchmurnie\n- Temperatura: 21.5°C\n\
             - Ciśnienie: 1013 hPa\n- Wilgotność: 40%"
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let provider = WeatherProvider::new(WeatherSettings {
            api_key_env: "PARLEY_TEST_WEATHER_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        });
        let args = ValidatedArguments::new().with("city", ArgValue::String("Poznań".into()));

        let err = provider.tool().invoke(&args).await.unwrap_err();
        assert_eq!(err.code, "UNAVAILABLE");
        assert!(err.message.contains("PARLEY_TEST_WEATHER_KEY_THAT_IS_NEVER_SET"));
    }
}

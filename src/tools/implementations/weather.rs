//! Current weather and forecasts from OpenWeatherMap
//!
//! Requires `OPENWEATHER_API_KEY`.

use crate::errors::{AgentError, Result};
use crate::tools::implementations::text::ToolInput;
use crate::tools::types::{Tool, ToolCategory, ToolContext};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

const CURRENT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";
const MAX_FORECAST_DAYS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Metric,
    Imperial,
}

impl Units {
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("imperial") => Units::Imperial,
            _ => Units::Metric,
        }
    }

    fn api_value(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    fn temp(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    fn speed(&self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Condition {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    #[serde(default)]
    pub feels_like: f64,
    #[serde(default)]
    pub temp_min: f64,
    #[serde(default)]
    pub temp_max: f64,
    #[serde(default)]
    pub humidity: f64,
}

#[derive(Debug, Deserialize)]
pub struct Wind {
    pub speed: f64,
}

#[derive(Debug, Deserialize, Default)]
pub struct Sys {
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Deserialize)]
pub struct CurrentWeather {
    pub weather: Vec<Condition>,
    pub main: MainReadings,
    pub wind: Wind,
    pub name: String,
    #[serde(default)]
    pub sys: Sys,
}

#[derive(Debug, Deserialize)]
pub struct ForecastEntry {
    pub dt_txt: String,
    pub main: MainReadings,
    pub weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastCity {
    pub name: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Deserialize)]
pub struct Forecast {
    pub city: ForecastCity,
    pub list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn describe(conditions: &[Condition]) -> String {
    conditions
        .first()
        .map(|c| capitalize(&c.description))
        .unwrap_or_else(|| "Unknown".to_string())
}

pub fn format_current(data: &CurrentWeather, units: Units) -> String {
    format!(
        "**Current weather in {}, {}:**\n\
         Conditions: {}\n\
         Temperature: {}{} (feels like {}{})\n\
         Humidity: {}%\n\
         Wind speed: {} {}",
        data.name,
        data.sys.country,
        describe(&data.weather),
        data.main.temp,
        units.temp(),
        data.main.feels_like,
        units.temp(),
        data.main.humidity,
        data.wind.speed,
        units.speed()
    )
}

/// Hour of a `YYYY-MM-DD HH:MM:SS` timestamp
fn hour_of(dt_txt: &str) -> Option<i32> {
    dt_txt.split(' ').nth(1)?.split(':').next()?.parse().ok()
}

fn noon_distance(entry: &ForecastEntry) -> i32 {
    hour_of(&entry.dt_txt).map(|h| (h - 12).abs()).unwrap_or(24)
}

/// One line per day, using the reading closest to noon
pub fn format_forecast(data: &Forecast, units: Units, days: usize) -> String {
    let mut daily: BTreeMap<&str, &ForecastEntry> = BTreeMap::new();

    for entry in &data.list {
        let Some(date) = entry.dt_txt.split(' ').next() else {
            continue;
        };
        match daily.get(date) {
            Some(existing) if noon_distance(existing) <= noon_distance(entry) => {}
            _ => {
                daily.insert(date, entry);
            }
        }
    }

    let mut lines = vec![format!(
        "**{}-day forecast for {}, {}:**\n",
        days, data.city.name, data.city.country
    )];

    for (date, entry) in daily.iter().take(days) {
        lines.push(format!(
            "{}: {}, {:.0}-{:.0}{} (avg {:.0}{})",
            date,
            describe(&entry.weather),
            entry.main.temp_min,
            entry.main.temp_max,
            units.temp(),
            entry.main.temp,
            units.temp()
        ));
    }

    lines.join("\n")
}

/// Weather tool
#[derive(Debug, Clone)]
pub struct WeatherTool {
    context: Arc<ToolContext>,
}

impl WeatherTool {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Get current weather or forecast for a location.\n\n\
         SIMPLE USAGE: Just provide a city name: 'London', 'New York', 'Tokyo'\n\n\
         ADVANCED USAGE: Provide JSON with options:\n\
         {\"location\": \"Paris\", \"units\": \"imperial\", \"forecast\": true, \"days\": 5}\n\n\
         OPTIONS:\n\
         - location: City name\n\
         - lat/lon: Coordinates (instead of city name)\n\
         - units: 'metric' (Celsius, default) or 'imperial' (Fahrenheit)\n\
         - forecast: true for 5-day forecast, false for current weather (default)\n\
         - days: Number of forecast days (1-5, default 3)"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Weather
    }

    async fn call(&self, query: &str) -> Result<String> {
        let Some(api_key) = self.context.openweather_api_key.as_deref() else {
            return Ok("Weather API key not configured. Set OPENWEATHER_API_KEY in your \
                       environment. Get a free key at: https://openweathermap.org/api"
                .to_string());
        };

        let input = ToolInput::parse(query);
        let units = Units::parse(input.str_opt("units"));
        let forecast = input.bool_opt("forecast").unwrap_or(false);
        let days = input.usize_opt("days").unwrap_or(3).clamp(1, MAX_FORECAST_DAYS);

        let mut params = vec![
            ("appid", api_key.to_string()),
            ("units", units.api_value().to_string()),
        ];

        let location = input
            .str_opt("location")
            .map(str::to_string)
            .or_else(|| (input.options.is_empty() && !input.query.is_empty()).then(|| input.query.clone()));

        match (input.f64_opt("lat"), input.f64_opt("lon"), location) {
            (Some(lat), Some(lon), _) => {
                params.push(("lat", lat.to_string()));
                params.push(("lon", lon.to_string()));
            }
            (_, _, Some(location)) => params.push(("q", location)),
            _ => {
                return Err(AgentError::InvalidInput(
                    "Provide a location (city name) or coordinates (lat/lon).".to_string(),
                ))
            }
        }

        let url = if forecast { FORECAST_URL } else { CURRENT_WEATHER_URL };
        let response = self.context.http.get(url, &params).await?;

        match response.status {
            200 if forecast => {
                let data: Forecast = serde_json::from_str(&response.body)?;
                Ok(format_forecast(&data, units, days))
            }
            200 => {
                let data: CurrentWeather = serde_json::from_str(&response.body)?;
                Ok(format_current(&data, units))
            }
            404 => Ok("Location not found. Try a different city name.".to_string()),
            _ => {
                let message = serde_json::from_str::<ApiError>(&response.body)
                    .ok()
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "Unknown error".to_string());
                Ok(format!("Weather API error: {}", message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_current() {
        let body = r#"{"weather":[{"description":"light rain"}],
            "main":{"temp":12.3,"feels_like":10.1,"humidity":81},
            "wind":{"speed":4.6},"name":"London","sys":{"country":"GB"}}"#;
        let data: CurrentWeather = serde_json::from_str(body).unwrap();
        let text = format_current(&data, Units::Metric);

        assert!(text.starts_with("**Current weather in London, GB:**"));
        assert!(text.contains("Conditions: Light rain"));
        assert!(text.contains("Temperature: 12.3°C (feels like 10.1°C)"));
        assert!(text.contains("Wind speed: 4.6 m/s"));
    }

    #[test]
    fn test_forecast_uses_reading_nearest_noon() {
        let body = r#"{"city":{"name":"Paris","country":"FR"},"list":[
            {"dt_txt":"2026-10-15 09:00:00","main":{"temp":10,"temp_min":9,"temp_max":11},"weather":[{"description":"fog"}]},
            {"dt_txt":"2026-10-15 12:00:00","main":{"temp":15,"temp_min":14,"temp_max":16},"weather":[{"description":"clear sky"}]},
            {"dt_txt":"2026-10-15 18:00:00","main":{"temp":12,"temp_min":11,"temp_max":13},"weather":[{"description":"clouds"}]},
            {"dt_txt":"2026-10-16 15:00:00","main":{"temp":17,"temp_min":16,"temp_max":18},"weather":[{"description":"sun"}]},
            {"dt_txt":"2026-10-17 12:00:00","main":{"temp":8,"temp_min":7,"temp_max":9},"weather":[{"description":"snow"}]}
        ]}"#;
        let data: Forecast = serde_json::from_str(body).unwrap();
        let text = format_forecast(&data, Units::Imperial, 2);

        assert!(text.starts_with("**2-day forecast for Paris, FR:**"));
        assert!(text.contains("2026-10-15: Clear sky, 14-16°F (avg 15°F)"));
        assert!(text.contains("2026-10-16: Sun"));
        assert!(!text.contains("2026-10-17"));
    }

    #[test]
    fn test_units_parse() {
        assert_eq!(Units::parse(Some("imperial")), Units::Imperial);
        assert_eq!(Units::parse(Some("kelvin")), Units::Metric);
    }

    #[tokio::test]
    async fn test_missing_key_message() {
        let mut context = ToolContext::new().unwrap();
        context.openweather_api_key = None;
        let tool = WeatherTool::new(Arc::new(context));

        let output = tool.call("London").await.unwrap();
        assert!(output.contains("OPENWEATHER_API_KEY"));
    }
}

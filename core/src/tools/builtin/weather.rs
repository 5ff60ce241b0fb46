//! Weekly weather forecast from the JMA forecast API

use crate::config::WeatherConfig;
use crate::error::ToolError;
use crate::tools::base::get_parameter;
use crate::tools::{Tool, ToolExample};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Area whose weather text is reported in the short-range forecast
const DETAIL_AREA_NAME: &str = "東京地方";

/// Station whose temperatures are reported in the weekly forecast
const TEMPERATURE_AREA_NAME: &str = "東京";

const TIME_KEYWORDS: &[&str] = &[
    "朝", "昼", "夕方", "夜", "昼前", "昼過ぎ", "明け方", "所により", "ところにより",
];

pub struct WeatherTool {
    client: Client,
    config: WeatherConfig,
}

impl WeatherTool {
    pub fn new(config: WeatherConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn area_code(&self, location: &str) -> Result<&str, ToolError> {
        self.config
            .area_codes
            .get(location)
            .map(String::as_str)
            .ok_or_else(|| ToolError::InvalidParameters {
                message: format!("Unsupported location: {}", location),
            })
    }

    async fn fetch(&self, area_code: &str) -> Result<Value, ToolError> {
        let url = format!(
            "{}/{}.json",
            self.config.base_url.trim_end_matches('/'),
            area_code
        );
        info!("Fetching weather data from: {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .send()
            .await
            .map_err(request_error)?
            .error_for_status()
            .map_err(request_error)?;

        response.json::<Value>().await.map_err(request_error)
    }
}

fn request_error(err: reqwest::Error) -> ToolError {
    let message = if err.is_timeout() {
        "Forecast API request timed out".to_string()
    } else {
        format!("Forecast API request failed: {}", err)
    };
    ToolError::Http { message }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the weather forecast for the coming week.\n\
         \n\
         Supported locations: 東京 (Tokyo)\n\
         \n\
         Returns a forecast array with one entry per day for up to 7 days, each with the \
         weather (short-range days only) and min/max temperatures when published. \
         Work out 'tomorrow', 'the day after' or 'the weekend' from the returned dates."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "City name, e.g. 東京"
                }
            },
            "required": ["location"]
        })
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let location: String = get_parameter(&args, "location")?;
        let location = location.trim();
        if location.is_empty() {
            return Err(ToolError::InvalidParameters {
                message: "Location must be provided".to_string(),
            });
        }

        let area_code = match self.area_code(location) {
            Ok(code) => code,
            Err(err) => {
                warn!("{}", err);
                return Err(err);
            }
        };

        let data = self.fetch(area_code).await?;
        let forecast = parse_forecast(&data, location, area_code)?;
        info!("Successfully fetched weather data for {}", location);
        Ok(forecast)
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Weekly forecast for Tokyo".to_string(),
            parameters: json!({ "location": "東京" }),
            expected_result: "A forecast array with dates, weather and temperatures".to_string(),
        }]
    }
}

/// Build the tool output from the raw `[short_range, weekly]` API payload
pub fn parse_forecast(data: &Value, location: &str, area_code: &str) -> Result<Value, ToolError> {
    extract_forecast(data, location, area_code).map_err(|reason| {
        error!("Failed to parse weather data: {}", reason);
        ToolError::ExecutionFailed {
            name: "get_weather".to_string(),
            message: "Failed to parse weather data".to_string(),
        }
    })
}

fn named_area<'a>(series: &'a Value, name: &str) -> Option<&'a Value> {
    series
        .get("areas")?
        .as_array()?
        .iter()
        .find(|area| area.pointer("/area/name").and_then(Value::as_str) == Some(name))
}

fn strings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| item.as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn extract_forecast(data: &Value, location: &str, area_code: &str) -> Result<Value, String> {
    let detail = data.get(0).ok_or("missing short-range forecast")?;
    let weekly = data.get(1).ok_or("missing weekly forecast")?;

    let publishing_office = weekly
        .get("publishingOffice")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let report_datetime = weekly
        .get("reportDatetime")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let detail_series = detail
        .get("timeSeries")
        .and_then(Value::as_array)
        .and_then(|series| series.first())
        .ok_or("short-range forecast has no time series")?;
    let detail_weathers = strings(named_area(detail_series, DETAIL_AREA_NAME).and_then(|a| a.get("weathers")));

    let weekly_series = weekly
        .get("timeSeries")
        .and_then(Value::as_array)
        .filter(|series| series.len() >= 2)
        .ok_or("weekly forecast needs date and temperature series")?;

    let dates = strings(weekly_series[0].get("timeDefines"));
    let temperature_area = named_area(&weekly_series[1], TEMPERATURE_AREA_NAME)
        .ok_or("no temperatures for the configured station")?;
    let temps_min = strings(temperature_area.get("tempsMin"));
    let temps_max = strings(temperature_area.get("tempsMax"));

    let forecast: Vec<Value> = dates
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let date_only = date.split('T').next().unwrap_or(date);
            let weather = detail_weathers
                .get(i)
                .map(|text| simplify_weather_text(text))
                .unwrap_or_default();

            let mut item = json!({ "date": date_only, "weather": weather });

            let mut temperature = Map::new();
            if let Some(min) = temps_min.get(i).filter(|t| !t.is_empty()) {
                temperature.insert("min".to_string(), json!(min));
            }
            if let Some(max) = temps_max.get(i).filter(|t| !t.is_empty()) {
                temperature.insert("max".to_string(), json!(max));
            }
            if !temperature.is_empty() {
                item["temperature"] = Value::Object(temperature);
            }
            item
        })
        .collect();

    debug!("Parsed weather data for {} days", forecast.len());

    Ok(json!({
        "location": location,
        "area_code": area_code,
        "forecast": forecast,
        "publishing_office": publishing_office,
        "report_datetime": report_datetime,
    }))
}

/// Shorten JMA weather text, e.g. `くもり　夜　雨` becomes `曇り時々雨`
pub fn simplify_weather_text(weather: &str) -> String {
    if weather.is_empty() {
        return String::new();
    }

    let normalized = weather
        .replace("くもり", "曇り")
        .replace("はれ", "晴れ")
        .replace("から", "のち")
        .replace('後', "のち");

    let parts: Vec<&str> = normalized
        .split_whitespace()
        .filter(|part| !TIME_KEYWORDS.contains(part))
        .collect();

    match parts.as_slice() {
        [] => normalized.split_whitespace().collect::<Vec<_>>().join(" "),
        [only] => only.to_string(),
        _ => {
            for connective in ["のち", "時々"] {
                if let Some(idx) = parts.iter().position(|p| *p == connective) {
                    if idx > 0 && idx + 1 < parts.len() {
                        return format!("{}{}{}", parts[idx - 1], connective, parts[idx + 1]);
                    }
                    break;
                }
            }
            format!("{}時々{}", parts[0], parts[1])
        }
    }
}

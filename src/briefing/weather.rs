//! Current conditions from OpenWeatherMap.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use super::{get_json, Notification, NotificationSource};
use crate::config::WeatherConfig;
use crate::error::ClockError;
use crate::timefmt::{hhmm_string, round_to_nearest_int};

const SERVICE: &str = "weather";
const KELVIN_OFFSET: f64 = 273.15;

#[derive(Debug, Deserialize)]
pub struct WeatherResponse {
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub main: Readings,
}

#[derive(Debug, Deserialize)]
pub struct Condition {
    pub description: String,
}

/// Temperatures in Kelvin, as the API reports them by default.
#[derive(Debug, Deserialize)]
pub struct Readings {
    pub temp: f64,
    pub feels_like: f64,
}

fn kelvin_to_celsius(kelvin: f64) -> i64 {
    round_to_nearest_int(kelvin - KELVIN_OFFSET)
}

pub fn format_weather_notification(
    response: &WeatherResponse,
    location: &str,
    now: NaiveDateTime,
) -> Result<Notification, ClockError> {
    let condition = response
        .weather
        .first()
        .ok_or_else(|| ClockError::invalid(SERVICE, "no weather conditions in response"))?;

    let temp = kelvin_to_celsius(response.main.temp);
    let feels_like = kelvin_to_celsius(response.main.feels_like);

    let notification = Notification::new(
        format!("Weather - {location} - {}", hhmm_string(now)),
        format!(
            "Weather: {}. Temperature: {temp}°C Feels like: {feels_like}°C",
            condition.description
        ),
    );
    info!("notification {} has been created", notification.title);
    Ok(notification)
}

pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
    location: String,
}

impl WeatherClient {
    pub fn new(client: Client, config: &WeatherConfig, api_key: &str, location: &str) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            location: location.to_string(),
        }
    }

    pub async fn current(&self) -> Result<WeatherResponse, ClockError> {
        let request = self
            .client
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&[("appid", &self.api_key), ("q", &self.location)]);
        get_json(SERVICE, request).await
    }
}

#[async_trait]
impl NotificationSource for WeatherClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn fetch(&self, now: NaiveDateTime) -> Result<Notification, ClockError> {
        let response = self.current().await?;
        format_weather_notification(&response, &self.location, now)
    }
}

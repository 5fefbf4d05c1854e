//! Notification builders for the three upstream information sources.
//!
//! Each source fetches raw JSON with reqwest, selects the fields it needs
//! and reduces them to a [`Notification`]. The pure `format_*` functions
//! are separated from the fetch so they can be tested against fixtures.

pub mod health;
pub mod news;
pub mod weather;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::ClockError;

pub use health::HealthClient;
pub use news::NewsClient;
pub use weather::WeatherClient;

/// A titled piece of information shown on the page and read out by alarms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub content: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    async fn fetch(&self, now: NaiveDateTime) -> Result<Notification, ClockError>;
}

/// The three sources an alarm clock draws from.
#[derive(Clone)]
pub struct Sources {
    pub news: Arc<dyn NotificationSource>,
    pub weather: Arc<dyn NotificationSource>,
    pub health: Arc<dyn NotificationSource>,
}

impl Sources {
    pub fn from_config(config: &Config) -> Self {
        let client = http_client();
        Self {
            news: Arc::new(NewsClient::new(client.clone(), &config.news, &config.api_keys.news)),
            weather: Arc::new(WeatherClient::new(
                client.clone(),
                &config.weather,
                &config.api_keys.weather,
                &config.location,
            )),
            health: Arc::new(HealthClient::new(client, &config.health)),
        }
    }
}

pub(crate) fn http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .unwrap_or_default()
}

/// Send a GET and decode the JSON body, mapping every failure onto
/// `UpstreamUnavailable` for `service`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    service: &'static str,
    request: RequestBuilder,
) -> Result<T, ClockError> {
    debug!("pending {service} API request");
    let resp = request.send().await.map_err(|e| {
        if e.is_connect() {
            ClockError::upstream(service, "cannot connect")
        } else if e.is_timeout() {
            ClockError::upstream(service, "request timed out")
        } else {
            ClockError::upstream(service, e)
        }
    })?;

    if !resp.status().is_success() {
        return Err(ClockError::upstream(service, format!("status {}", resp.status())));
    }

    resp.json::<T>()
        .await
        .map_err(|e| ClockError::upstream(service, format!("undecodable body: {e}")))
}

//! Daily Covid-19 case and death figures from the UK coronavirus dashboard.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

use super::{get_json, Notification, NotificationSource};
use crate::config::HealthConfig;
use crate::error::ClockError;

const SERVICE: &str = "health";

const YELLOW_FROM: i64 = 10_000;
const RED_ABOVE: i64 = 15_000;

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub data: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdLevel {
    Green,
    Yellow,
    Red,
}

impl ThresholdLevel {
    pub fn classify(new_cases: i64) -> Self {
        if new_cases > RED_ABOVE {
            Self::Red
        } else if new_cases >= YELLOW_FROM {
            Self::Yellow
        } else {
            Self::Green
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Green => "Green - safe",
            Self::Yellow => "Yellow - Be careful",
            Self::Red => "Red - Not safe",
        }
    }
}

/// Render a record field exactly as the API supplied it.
fn field_text(record: &Map<String, Value>, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "unknown".to_string(),
        Some(other) => other.to_string(),
    }
}

fn field_int(record: &Map<String, Value>, key: &str) -> Result<i64, ClockError> {
    let parsed = match record.get(key) {
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(Value::Number(n)) => n.as_i64(),
        _ => None,
    };
    parsed.ok_or_else(|| ClockError::invalid(SERVICE, format!("{key} is not an integer")))
}

/// Builds the report from the two most recent daily records.
pub fn format_health_notification(
    response: &HealthResponse,
    area_name: &str,
) -> Result<Notification, ClockError> {
    let [today, yesterday, ..] = response.data.as_slice() else {
        return Err(ClockError::invalid(
            SERVICE,
            format!("expected two daily records, got {}", response.data.len()),
        ));
    };

    let level = ThresholdLevel::classify(field_int(today, "newCasesByPublishDate")?);

    let notification = Notification::new(
        format!("Covid-19 report - {area_name} {}", field_text(today, "date")),
        format!(
            "New cases today: {} New cases yesterday: {}, Total cases: {}, \
             Yesterday's deaths: {}, Total deaths: {} Threshold level is {}",
            field_text(today, "newCasesByPublishDate"),
            field_text(yesterday, "newCasesByPublishDate"),
            field_text(today, "cumCasesByPublishDate"),
            field_text(yesterday, "newDeathsByDeathDate"),
            field_text(yesterday, "cumDeathsByDeathDate"),
            level.label(),
        ),
    );
    info!("notification {} has been created", notification.title);
    Ok(notification)
}

pub struct HealthClient {
    client: Client,
    base_url: String,
    area_type: String,
    area_name: String,
}

impl HealthClient {
    pub fn new(client: Client, config: &HealthConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            area_type: config.area_type.clone(),
            area_name: config.area_name.clone(),
        }
    }

    pub async fn daily_records(&self) -> Result<HealthResponse, ClockError> {
        let filters = format!("areaType={};areaName={}", self.area_type, self.area_name);
        let structure = json!({
            "date": "date",
            "newCasesByPublishDate": "newCasesByPublishDate",
            "cumCasesByPublishDate": "cumCasesByPublishDate",
            "newDeathsByDeathDate": "newDeathsByDeathDate",
            "cumDeathsByDeathDate": "cumDeathsByDeathDate",
        })
        .to_string();

        let request = self
            .client
            .get(format!("{}/v1/data", self.base_url))
            .query(&[("filters", filters), ("structure", structure)]);
        get_json(SERVICE, request).await
    }
}

#[async_trait]
impl NotificationSource for HealthClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn fetch(&self, _now: NaiveDateTime) -> Result<Notification, ClockError> {
        let response = self.daily_records().await?;
        format_health_notification(&response, &self.area_name)
    }
}

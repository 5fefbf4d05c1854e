//! Top-headline news from newsapi.org.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use super::{get_json, Notification, NotificationSource};
use crate::config::NewsConfig;
use crate::error::ClockError;

const SERVICE: &str = "news";
const PREFERRED_SOURCE: &str = "BBC News";
const KEYWORD: &str = "Covid";

#[derive(Debug, Deserialize)]
pub struct NewsResponse {
    #[serde(default)]
    pub articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
pub struct Article {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub source: ArticleSource,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArticleSource {
    pub name: Option<String>,
}

impl Article {
    fn is_relevant(&self) -> bool {
        self.title.as_deref().is_some_and(|t| t.contains(KEYWORD))
            || self.source.name.as_deref() == Some(PREFERRED_SOURCE)
    }
}

/// First article mentioning Covid or published by the BBC.
pub fn format_news_notification(response: &NewsResponse) -> Result<Notification, ClockError> {
    let article = response
        .articles
        .iter()
        .find(|a| a.is_relevant())
        .ok_or(ClockError::NoRelevantArticle)?;

    let notification = Notification::new(
        article.title.clone().unwrap_or_default(),
        article.description.clone().unwrap_or_default(),
    );
    info!("notification {} has been created", notification.title);
    Ok(notification)
}

pub struct NewsClient {
    client: Client,
    base_url: String,
    api_key: String,
    country: String,
}

impl NewsClient {
    pub fn new(client: Client, config: &NewsConfig, api_key: &str) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            country: config.country.clone(),
        }
    }

    pub async fn top_headlines(&self) -> Result<NewsResponse, ClockError> {
        let request = self
            .client
            .get(format!("{}/v2/top-headlines", self.base_url))
            .query(&[("country", &self.country), ("apiKey", &self.api_key)]);
        get_json(SERVICE, request).await
    }
}

#[async_trait]
impl NotificationSource for NewsClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn fetch(&self, _now: NaiveDateTime) -> Result<Notification, ClockError> {
        let response = self.top_headlines().await?;
        format_news_notification(&response)
    }
}

//! HTTP contract tests for the news, weather and health sources and the
//! speaker API backend, against a mock server.

use briefing_clock::briefing::{HealthClient, NewsClient, NotificationSource, WeatherClient};
use briefing_clock::config::{HealthConfig, NewsConfig, WeatherConfig};
use briefing_clock::error::ClockError;
use briefing_clock::speech::{HttpSpeaker, Speaker};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 12, 4)
        .unwrap()
        .and_hms_opt(7, 30, 0)
        .unwrap()
}

fn news_client(server: &MockServer) -> NewsClient {
    let config = NewsConfig {
        base_url: server.uri(),
        country: "gb".into(),
    };
    NewsClient::new(reqwest::Client::new(), &config, "news-key")
}

#[tokio::test]
async fn news_request_carries_country_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/top-headlines"))
        .and(query_param("country", "gb"))
        .and(query_param("apiKey", "news-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "articles": [
                {"source": {"name": "BBC News"}, "title": "Floods in Devon", "description": "Rivers burst"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let notification = news_client(&server).fetch(now()).await.unwrap();
    assert_eq!(notification.title, "Floods in Devon");
    assert_eq!(notification.content, "Rivers burst");
}

#[tokio::test]
async fn news_server_error_is_upstream_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/top-headlines"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"status": "error"})))
        .mount(&server)
        .await;

    let result = news_client(&server).fetch(now()).await;
    assert!(matches!(
        result,
        Err(ClockError::UpstreamUnavailable { service: "news", .. })
    ));
}

#[tokio::test]
async fn news_without_match_is_no_relevant_article() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/top-headlines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "articles": [{"source": {"name": "Sky"}, "title": "Cricket", "description": "Rain stops play"}]
        })))
        .mount(&server)
        .await;

    assert!(matches!(
        news_client(&server).fetch(now()).await,
        Err(ClockError::NoRelevantArticle)
    ));
}

#[tokio::test]
async fn weather_request_uses_location_and_app_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("appid", "weather-key"))
        .and(query_param("q", "Exeter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "weather": [{"description": "light rain"}],
            "main": {"temp": 286.15, "feels_like": 285.15},
            "cod": 200
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = WeatherConfig {
        base_url: server.uri(),
    };
    let client = WeatherClient::new(reqwest::Client::new(), &config, "weather-key", "Exeter");
    let notification = client.fetch(now()).await.unwrap();

    assert_eq!(notification.title, "Weather - Exeter - 07:30");
    assert_eq!(
        notification.content,
        "Weather: light rain. Temperature: 13°C Feels like: 12°C"
    );
}

#[tokio::test]
async fn weather_garbage_body_is_upstream_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let config = WeatherConfig {
        base_url: server.uri(),
    };
    let client = WeatherClient::new(reqwest::Client::new(), &config, "k", "Exeter");
    assert!(matches!(
        client.fetch(now()).await,
        Err(ClockError::UpstreamUnavailable { service: "weather", .. })
    ));
}

#[tokio::test]
async fn health_request_filters_by_area() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/data"))
        .and(query_param("filters", "areaType=nation;areaName=England"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"date": "2020-11-02", "newCasesByPublishDate": 18950, "cumCasesByPublishDate": 910000},
                {"date": "2020-11-01", "newCasesByPublishDate": 23254, "newDeathsByDeathDate": 230, "cumDeathsByDeathDate": 41000}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = HealthConfig {
        base_url: server.uri(),
        ..HealthConfig::default()
    };
    let notification = HealthClient::new(reqwest::Client::new(), &config)
        .fetch(now())
        .await
        .unwrap();

    assert_eq!(notification.title, "Covid-19 report - England 2020-11-02");
    assert!(notification.content.ends_with("Threshold level is Red - Not safe"));
}

#[tokio::test(flavor = "multi_thread")]
async fn speaker_api_receives_each_line() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/speak"))
        .and(body_partial_json(json!({
            "text": "alarm fun has gone off",
            "event_type": "alarm",
            "summarize": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "speaking"})))
        .expect(1)
        .mount(&server)
        .await;

    let url = server.uri();
    let result = tokio::task::spawn_blocking(move || {
        let mut speaker = HttpSpeaker::new(&url);
        speaker.say("alarm fun has gone off")
    })
    .await
    .unwrap();

    assert!(result.is_ok());
}

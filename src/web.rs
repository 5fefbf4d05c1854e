//! Web page and JSON API.
//!
//! `GET /index` is driven by the form's query parameters: `alarm`
//! (`YYYY-MM-DDTHH:MM`) with `two` (the title) and optional `news` /
//! `weather` flags sets an alarm, `alarm_item` cancels one and `notif`
//! dismisses a notification. Every request ticks the scheduler first.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::briefing::Notification;
use crate::config::ServerConfig;
use crate::error::ClockError;
use crate::history::{self, AnnouncementRecord};
use crate::scheduler::{Alarm, NewAlarm, Scheduler};
use crate::service::AlarmService;
use crate::timefmt::{local_now, split_datetime_input, validate_date};

const PAGE_TITLE: &str = "Daily update";

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    pub alarm: Option<String>,
    pub two: Option<String>,
    pub alarm_item: Option<String>,
    pub notif: Option<String>,
    pub news: Option<String>,
    pub weather: Option<String>,
}

#[derive(Deserialize)]
struct HistoryQuery {
    date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Info(String),
    Error(String),
}

#[derive(Serialize)]
struct AlarmView {
    title: String,
    date: String,
    time: String,
    news: bool,
    weather: bool,
    state: String,
    due: Option<String>,
}

impl From<&Alarm> for AlarmView {
    fn from(alarm: &Alarm) -> Self {
        Self {
            title: alarm.title.clone(),
            date: alarm.date.clone(),
            time: alarm.time.clone(),
            news: alarm.news,
            weather: alarm.weather,
            state: alarm.state().to_string(),
            due: alarm.due().map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

fn flag(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Apply one `/index` request to the scheduler and describe the outcome.
pub fn apply_request(scheduler: &mut Scheduler, query: &IndexQuery, now: NaiveDateTime) -> Vec<Message> {
    let mut messages = Vec::new();

    if let Some(when) = non_empty(query.alarm.as_ref()) {
        info!("pending attempt to create alarm");
        match (non_empty(query.two.as_ref()), split_datetime_input(when)) {
            (None, _) => messages.push(Message::Error("An alarm needs a title".into())),
            (_, Err(e)) => messages.push(Message::Error(format!("Could not set alarm: {e}"))),
            (Some(title), Ok((date, time))) => {
                let new = NewAlarm {
                    title: title.to_string(),
                    date,
                    time,
                    news: flag(query.news.as_ref()),
                    weather: flag(query.weather.as_ref()),
                };
                match scheduler.add_alarm(new, now) {
                    Ok(alarm) => messages.push(Message::Info(format!(
                        "Alarm {} set for {} at {}",
                        alarm.title, alarm.date, alarm.time
                    ))),
                    Err(e @ (ClockError::DuplicateAlarm(_) | ClockError::Format { .. })) => {
                        messages.push(Message::Error(e.to_string()))
                    }
                    Err(e) => {
                        warn!("Unexpected error adding alarm: {e}");
                        messages.push(Message::Error(e.to_string()));
                    }
                }
            }
        }
    }

    if let Some(title) = non_empty(query.alarm_item.as_ref()) {
        info!("pending attempt to delete alarm");
        if scheduler.cancel_alarm(title) {
            messages.push(Message::Info(format!("Alarm {title} cancelled")));
        }
    }

    if let Some(title) = non_empty(query.notif.as_ref()) {
        info!("pending attempt to delete notification");
        scheduler.remove_notification(title);
    }

    messages
}

pub fn router(service: AlarmService) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/index", get(handle_schedule_event))
        .route("/api/alarms", get(handle_alarms))
        .route("/api/notifications", get(handle_notifications))
        .route("/api/history", get(handle_history))
        .route("/api/history/dates", get(handle_history_dates))
        .with_state(service)
}

/// Serve the page until the process exits.
pub async fn serve(service: AlarmService, config: &ServerConfig) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Alarm clock page on http://{addr}/");
    axum::serve(listener, router(service)).await
}

// --- Handlers ---

fn render(service: &AlarmService, messages: &[Message]) -> Html<String> {
    Html(service.with_scheduler(|s| render_page(s.alarms(), s.notifications(), messages)))
}

async fn handle_index(State(service): State<AlarmService>) -> Html<String> {
    service.run_due(local_now());
    render(&service, &[])
}

async fn handle_schedule_event(
    State(service): State<AlarmService>,
    Query(query): Query<IndexQuery>,
) -> Html<String> {
    let now = local_now();
    service.run_due(now);
    let messages = service.with_scheduler(|s| apply_request(s, &query, now));
    render(&service, &messages)
}

async fn handle_alarms(State(service): State<AlarmService>) -> Json<Vec<AlarmView>> {
    service.run_due(local_now());
    Json(service.with_scheduler(|s| s.alarms().iter().map(AlarmView::from).collect()))
}

async fn handle_notifications(State(service): State<AlarmService>) -> Json<Vec<Notification>> {
    service.run_due(local_now());
    Json(service.with_scheduler(|s| s.notifications().to_vec()))
}

async fn handle_history(
    State(service): State<AlarmService>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<AnnouncementRecord>>, (StatusCode, String)> {
    if let Some(date) = &query.date {
        validate_date(date).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    }

    let dir = service.history_dir().to_path_buf();
    let now = local_now();
    tokio::task::spawn_blocking(move || match query.date {
        Some(date) => history::load_records(&dir, &date),
        None => history::load_today(&dir, now),
    })
    .await
    .map(Json)
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

async fn handle_history_dates(
    State(service): State<AlarmService>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    let dir = service.history_dir().to_path_buf();
    tokio::task::spawn_blocking(move || history::list_available_dates(&dir))
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

// --- Page ---

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn alarm_item(alarm: &Alarm) -> String {
    let extras: Vec<&str> = [(alarm.news, "news"), (alarm.weather, "weather")]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();
    let extras = if extras.is_empty() {
        String::new()
    } else {
        format!(" with {}", extras.join(" and "))
    };
    format!(
        "<li><strong>{}</strong> {} {}{} <em>({})</em> <a href=\"/index?alarm_item={}\">cancel</a></li>",
        escape(&alarm.title),
        escape(&alarm.date),
        escape(&alarm.time),
        extras,
        alarm.state(),
        urlencoding::encode(&alarm.title),
    )
}

fn notification_item(notification: &Notification) -> String {
    format!(
        "<li><strong>{}</strong><p>{}</p><a href=\"/index?notif={}\">dismiss</a></li>",
        escape(&notification.title),
        escape(&notification.content),
        urlencoding::encode(&notification.title),
    )
}

pub fn render_page(alarms: &[Alarm], notifications: &[Notification], messages: &[Message]) -> String {
    let messages: String = messages
        .iter()
        .map(|m| match m {
            Message::Info(text) => format!("<p class=\"info\">{}</p>", escape(text)),
            Message::Error(text) => format!("<p class=\"error\">{}</p>", escape(text)),
        })
        .collect();
    let alarms: String = alarms.iter().map(alarm_item).collect();
    let notifications: String = notifications.iter().map(notification_item).collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta http-equiv="refresh" content="60; url=/">
<title>{PAGE_TITLE}</title>
</head>
<body>
<h1>{PAGE_TITLE}</h1>
{messages}
<form action="/index" method="get">
<input type="datetime-local" name="alarm" required>
<input type="text" name="two" placeholder="Alarm title" required>
<label><input type="checkbox" name="news" value="news"> news briefing</label>
<label><input type="checkbox" name="weather" value="weather"> weather briefing</label>
<input type="submit" value="Set alarm">
</form>
<h2>Alarms</h2>
<ul class="alarms">{alarms}</ul>
<h2>Notifications</h2>
<ul class="notifications">{notifications}</ul>
</body>
</html>
"#
    )
}

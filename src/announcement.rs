//! Builds the lines spoken when an alarm goes off.

use serde::Serialize;

use crate::briefing::Notification;
use crate::error::ClockError;
use crate::scheduler::Alarm;

/// Characters that trip up speech synthesis; each becomes a single space.
pub const UNSPEAKABLE: &str = "!\"#$%&`()*+,-./:;";

/// Briefing segments fetched for one alarm. `None` means the alarm did not
/// ask for that segment.
#[derive(Debug, Default)]
pub struct Briefing {
    pub health: Option<Result<Notification, ClockError>>,
    pub news: Option<Result<Notification, ClockError>>,
    pub weather: Option<Result<Notification, ClockError>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Announcement {
    pub lines: Vec<String>,
    /// Segments left out because their source failed.
    pub omitted: Vec<&'static str>,
}

pub fn strip_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| if UNSPEAKABLE.contains(c) { ' ' } else { c })
        .collect()
}

fn spoken_weather(content: &str) -> String {
    strip_punctuation(&content.replace("°C", " degrees celsius"))
}

fn segment(
    omitted: &mut Vec<&'static str>,
    name: &'static str,
    result: Option<&Result<Notification, ClockError>>,
    render: impl FnOnce(&Notification) -> String,
) -> Option<String> {
    match result? {
        Ok(notification) => Some(render(notification)),
        Err(_) => {
            omitted.push(name);
            None
        }
    }
}

/// Compose the announcement: the alarm line, the Covid report, then news
/// and weather when the alarm asked for them.
pub fn compose_announcement(alarm: &Alarm, briefing: &Briefing) -> Announcement {
    let mut omitted = Vec::new();
    let mut lines = vec![format!("alarm {} has gone off", alarm.title)];

    lines.extend(segment(&mut omitted, "health", briefing.health.as_ref(), |n| {
        format!("covid report is {}", strip_punctuation(&n.content))
    }));

    if alarm.news {
        lines.extend(segment(&mut omitted, "news", briefing.news.as_ref(), |n| {
            format!("latest news is {}", strip_punctuation(&n.title))
        }));
    }

    if alarm.weather {
        lines.extend(segment(&mut omitted, "weather", briefing.weather.as_ref(), |n| {
            format!("weather report is {}", spoken_weather(&n.content))
        }));
    }

    Announcement { lines, omitted }
}

//! Announcement history.
//!
//! Every fired alarm is appended as one JSON line to a daily file
//! `<dir>/YYYY-MM-DD.jsonl`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::announcement::Announcement;
use crate::scheduler::Alarm;
use crate::timefmt::{today_string, validate_date};

fn history_file(dir: &Path, date: &str) -> PathBuf {
    dir.join(format!("{date}.jsonl"))
}

/// Record of one alarm going off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementRecord {
    pub timestamp: String,
    pub title: String,
    pub date: String,
    pub time: String,
    pub lines: Vec<String>,
    #[serde(default)]
    pub omitted: Vec<String>,
}

impl AnnouncementRecord {
    pub fn new(alarm: &Alarm, announcement: &Announcement, now: NaiveDateTime) -> Self {
        Self {
            timestamp: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
            title: alarm.title.clone(),
            date: alarm.date.clone(),
            time: alarm.time.clone(),
            lines: announcement.lines.clone(),
            omitted: announcement.omitted.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Append a record to the history file for the day it fired.
pub fn save_record(dir: &Path, record: &AnnouncementRecord) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let day = record.timestamp.get(..10).unwrap_or(&record.timestamp);
    let path = history_file(dir, day);

    let mut file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
    writeln!(file, "{}", serde_json::to_string(record)?)?;
    debug!("Saved announcement record to {}", path.display());
    Ok(())
}

/// Load all announcement records for a given date (`YYYY-MM-DD`).
/// Malformed lines are skipped.
pub fn load_records(dir: &Path, date: &str) -> Vec<AnnouncementRecord> {
    let Ok(contents) = fs::read_to_string(history_file(dir, date)) else {
        return Vec::new();
    };

    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str(line) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("Skipping malformed history line: {e}");
                None
            }
        })
        .collect()
}

pub fn load_today(dir: &Path, now: NaiveDateTime) -> Vec<AnnouncementRecord> {
    load_records(dir, &today_string(now))
}

/// Days that have a history file, newest first.
pub fn list_available_dates(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut dates: Vec<String> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let day = name.strip_suffix(".jsonl")?;
            validate_date(day).is_ok().then(|| day.to_string())
        })
        .collect();

    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates
}

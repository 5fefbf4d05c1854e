//! Alarm scheduler: the live alarm set, the notification feed and the
//! timeline that decides when each alarm fires.
//!
//! Alarm state machine:
//!
//! UNSCHEDULED → SCHEDULED → FIRING → (removed)
//!
//! An alarm is scheduled when its date is today, either on creation or at
//! the first rollover check after midnight. Cancelling removes the alarm
//! and revokes its pending event in any state.
//!
//! The scheduler performs no I/O. [`Scheduler::tick`] hands back the
//! [`Job`]s that need network access or speech, and the service runs them.

pub mod timeline;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::Deserialize;
use tracing::{info, warn};

use crate::briefing::Notification;
use crate::config::ScheduleConfig;
use crate::error::ClockError;
use crate::timefmt::{hhmm_to_seconds, seconds_of_day, today_string, validate_date};

pub use timeline::{EventHandle, Timeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmState {
    Unscheduled,
    Scheduled(EventHandle),
    Firing,
}

impl std::fmt::Display for AlarmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unscheduled => write!(f, "UNSCHEDULED"),
            Self::Scheduled(_) => write!(f, "SCHEDULED"),
            Self::Firing => write!(f, "FIRING"),
        }
    }
}

/// User input for a new alarm.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAlarm {
    pub title: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    #[serde(default)]
    pub news: bool,
    #[serde(default)]
    pub weather: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub title: String,
    pub date: String,
    pub time: String,
    pub news: bool,
    pub weather: bool,
    state: AlarmState,
}

impl From<NewAlarm> for Alarm {
    fn from(new: NewAlarm) -> Self {
        Self {
            title: new.title,
            date: new.date,
            time: new.time,
            news: new.news,
            weather: new.weather,
            state: AlarmState::Unscheduled,
        }
    }
}

impl Alarm {
    pub fn state(&self) -> AlarmState {
        self.state
    }

    /// When the alarm will go off, if it is scheduled.
    pub fn due(&self) -> Option<NaiveDateTime> {
        match self.state {
            AlarmState::Scheduled(handle) => Some(handle.due()),
            _ => None,
        }
    }
}

/// Work produced by a tick that the scheduler cannot do itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// The alarm as it was when it went off.
    FireAlarm(Alarm),
    RefreshNotifications,
}

#[derive(Debug, Clone)]
enum Event {
    FireAlarm(String),
    RefreshNotifications,
    RolloverDay,
}

#[derive(Debug)]
pub struct Scheduler {
    alarms: Vec<Alarm>,
    notifications: Vec<Notification>,
    timeline: Timeline<Event>,
    today: NaiveDate,
}

impl Scheduler {
    /// Create a scheduler and register the periodic notification refresh
    /// and day-rollover checks.
    pub fn new(settings: &ScheduleConfig, now: NaiveDateTime) -> Self {
        let mut timeline = Timeline::new();
        let first_due = now + secs(settings.startup_delay_secs);
        timeline.every(
            first_due,
            secs(settings.refresh_interval_secs.max(1)),
            Event::RefreshNotifications,
        );
        timeline.every(
            first_due,
            secs(settings.rollover_interval_secs.max(1)),
            Event::RolloverDay,
        );

        Self {
            alarms: Vec::new(),
            notifications: Vec::new(),
            timeline,
            today: now.date(),
        }
    }

    pub fn alarms(&self) -> &[Alarm] {
        &self.alarms
    }

    pub fn alarm(&self, title: &str) -> Option<&Alarm> {
        self.alarms.iter().find(|a| a.title == title)
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Add an alarm, scheduling it straight away if it is for today.
    pub fn add_alarm(&mut self, new: NewAlarm, now: NaiveDateTime) -> Result<&Alarm, ClockError> {
        if self.alarm(&new.title).is_some() {
            warn!("alarm {} is a duplicate, it is not added to alarms", new.title);
            return Err(ClockError::DuplicateAlarm(new.title));
        }
        validate_date(&new.date)?;
        hhmm_to_seconds(&new.time)?;

        let mut alarm = Alarm::from(new);
        if alarm.date == today_string(now) {
            let handle = self.schedule(&alarm.title, &alarm.time, now)?;
            alarm.state = AlarmState::Scheduled(handle);
            info!(
                "alarm {} has been scheduled for {} on date {}",
                alarm.title, alarm.time, alarm.date
            );
        } else {
            info!(
                "alarm {} is for another day ({}), it will not be scheduled now",
                alarm.title, alarm.date
            );
        }

        let index = self.alarms.len();
        self.alarms.push(alarm);
        info!("alarm \"{}\" has been added to alarms", self.alarms[index].title);
        Ok(&self.alarms[index])
    }

    /// Remove an alarm, revoking its pending event. Returns false if no
    /// alarm had that title.
    pub fn cancel_alarm(&mut self, title: &str) -> bool {
        let Some(index) = self.alarms.iter().position(|a| a.title == title) else {
            return false;
        };
        let alarm = self.alarms.remove(index);
        if let AlarmState::Scheduled(handle) = alarm.state {
            if self.timeline.cancel(handle) {
                info!("alarm {title} has been deleted from scheduler");
            }
        }
        info!("alarm {title} has been deleted from alarms");
        true
    }

    /// Drop an alarm that has gone off. Safe to call more than once.
    pub fn finish_alarm(&mut self, title: &str) -> Option<Alarm> {
        let index = self
            .alarms
            .iter()
            .position(|a| a.title == title && a.state == AlarmState::Firing)?;
        info!("alarm {title} has been deleted from alarms");
        Some(self.alarms.remove(index))
    }

    pub fn push_notification(&mut self, notification: Notification) {
        info!("notification {} added to notifications", notification.title);
        self.notifications.push(notification);
    }

    /// Remove the first notification with this title.
    pub fn remove_notification(&mut self, title: &str) -> bool {
        let Some(index) = self.notifications.iter().position(|n| n.title == title) else {
            return false;
        };
        self.notifications.remove(index);
        info!("notification {title} has been deleted from notifications");
        true
    }

    /// Schedule waiting alarms once the calendar date has moved on.
    /// Returns how many alarms were scheduled.
    pub fn rollover_day(&mut self, now: NaiveDateTime) -> usize {
        if now.date() == self.today {
            return 0;
        }
        self.today = now.date();
        info!("alarm schedule updating for {}", self.today);

        let today = today_string(now);
        let waiting: Vec<usize> = self
            .alarms
            .iter()
            .enumerate()
            .filter(|(_, a)| a.state == AlarmState::Unscheduled && a.date == today)
            .map(|(i, _)| i)
            .collect();

        let mut scheduled = 0;
        for index in waiting {
            let (title, time) = (self.alarms[index].title.clone(), self.alarms[index].time.clone());
            match self.schedule(&title, &time, now) {
                Ok(handle) => {
                    self.alarms[index].state = AlarmState::Scheduled(handle);
                    info!("alarm {title} has been added to schedule");
                    scheduled += 1;
                }
                Err(e) => warn!("alarm {title} could not be scheduled: {e}"),
            }
        }
        scheduled
    }

    /// Advance the timeline to `now` and return the jobs that became due.
    pub fn tick(&mut self, now: NaiveDateTime) -> Vec<Job> {
        let mut jobs = Vec::new();
        for event in self.timeline.pop_due(now) {
            match event {
                Event::FireAlarm(title) => {
                    if let Some(alarm) = self.alarms.iter_mut().find(|a| a.title == title) {
                        info!("alarm {title} is going off");
                        alarm.state = AlarmState::Firing;
                        jobs.push(Job::FireAlarm(alarm.clone()));
                    }
                }
                Event::RefreshNotifications => jobs.push(Job::RefreshNotifications),
                Event::RolloverDay => {
                    self.rollover_day(now);
                }
            }
        }
        jobs
    }

    fn schedule(&mut self, title: &str, time: &str, now: NaiveDateTime) -> Result<EventHandle, ClockError> {
        let delay = hhmm_to_seconds(time)? - seconds_of_day(now);
        if delay < 0 {
            warn!("alarm {title} is set for {time}, which has already passed today; it will go off now");
        }
        let due = now
            .checked_add_signed(TimeDelta::seconds(delay))
            .ok_or_else(|| ClockError::format("time", time))?;
        Ok(self.timeline.enter(due, Event::FireAlarm(title.to_string())))
    }
}

fn secs(n: u64) -> TimeDelta {
    TimeDelta::seconds(n.min(u64::from(u32::MAX)) as i64)
}

//! Runs the scheduler's jobs: fetching briefings, composing announcements,
//! queueing speech and refreshing the notification feed.
//!
//! The scheduler advances whenever [`AlarmService::run_due`] is called.
//! Every page request calls it, and unless the clock runs in poll-only
//! mode a background ticker calls it as well, so alarms go off on time
//! even when nobody has the page open.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::announcement::{compose_announcement, Announcement, Briefing};
use crate::briefing::{Notification, NotificationSource, Sources};
use crate::error::ClockError;
use crate::history::{self, AnnouncementRecord};
use crate::scheduler::{Alarm, Job, Scheduler};
use crate::speech::SpeechQueue;
use crate::timefmt::local_now;

#[derive(Clone)]
pub struct AlarmService {
    scheduler: Arc<Mutex<Scheduler>>,
    sources: Sources,
    speech: SpeechQueue,
    history_dir: PathBuf,
}

async fn fetch_logged(
    source: Arc<dyn NotificationSource>,
    now: NaiveDateTime,
) -> Result<Notification, ClockError> {
    let result = source.fetch(now).await;
    if let Err(e) = &result {
        warn!("{} notification skipped: {e}", source.name());
    }
    result
}

impl AlarmService {
    pub fn new(scheduler: Scheduler, sources: Sources, speech: SpeechQueue, history_dir: PathBuf) -> Self {
        Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            sources,
            speech,
            history_dir,
        }
    }

    /// Run `f` with exclusive access to the scheduler. Never hold the
    /// scheduler across an await.
    pub fn with_scheduler<R>(&self, f: impl FnOnce(&mut Scheduler) -> R) -> R {
        let mut scheduler = self.scheduler.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut scheduler)
    }

    pub fn history_dir(&self) -> &std::path::Path {
        &self.history_dir
    }

    /// Tick the scheduler and start one task per due job, so a failing
    /// alarm cannot hold up the others.
    pub fn run_due(&self, now: NaiveDateTime) -> Vec<JoinHandle<()>> {
        let jobs = self.with_scheduler(|s| s.tick(now));
        jobs.into_iter()
            .map(|job| {
                let service = self.clone();
                tokio::spawn(async move {
                    match job {
                        Job::FireAlarm(alarm) => {
                            service.fire_alarm(alarm, now).await;
                        }
                        Job::RefreshNotifications => {
                            service.refresh_notifications(now).await;
                        }
                    }
                })
            })
            .collect()
    }

    /// Fetch the segments this alarm asked for. The Covid report is always
    /// included; failures are kept so the composer can omit them.
    pub async fn gather_briefing(&self, alarm: &Alarm, now: NaiveDateTime) -> Briefing {
        let fetch_if = |source: &Arc<dyn NotificationSource>, wanted: bool| {
            let source = source.clone();
            async move {
                if wanted {
                    Some(fetch_logged(source, now).await)
                } else {
                    None
                }
            }
        };

        let (health, news, weather) = tokio::join!(
            fetch_if(&self.sources.health, true),
            fetch_if(&self.sources.news, alarm.news),
            fetch_if(&self.sources.weather, alarm.weather),
        );
        Briefing {
            health,
            news,
            weather,
        }
    }

    /// Compose and queue the announcement for an alarm that has gone off,
    /// then drop it from the active set.
    ///
    /// `alarm` is the snapshot taken when it went off. If the title was
    /// cancelled and set again in the meantime, the new alarm is left alone.
    pub async fn fire_alarm(&self, alarm: Alarm, now: NaiveDateTime) -> Announcement {
        let title = alarm.title.as_str();
        let briefing = self.gather_briefing(&alarm, now).await;
        let announcement = compose_announcement(&alarm, &briefing);
        self.with_scheduler(|s| s.finish_alarm(title));

        if !announcement.omitted.is_empty() {
            info!("alarm {title} announced without: {}", announcement.omitted.join(", "));
        }
        if !self.speech.announce(announcement.lines.clone()) {
            warn!("Speech thread has stopped, alarm {title} was not read out");
        }

        let record = AnnouncementRecord::new(&alarm, &announcement, now);
        let dir = self.history_dir.clone();
        let saved = tokio::task::spawn_blocking(move || history::save_record(&dir, &record))
            .await
            .unwrap_or_else(|e| Err(std::io::Error::other(e)));
        if let Err(e) = saved {
            warn!("History for alarm {title} was not saved: {e}");
        }
        announcement
    }

    /// Append one news, weather and health notification, in that order.
    /// Returns how many were added.
    pub async fn refresh_notifications(&self, now: NaiveDateTime) -> usize {
        info!("notifications updating");
        let (news, weather, health) = tokio::join!(
            fetch_logged(self.sources.news.clone(), now),
            fetch_logged(self.sources.weather.clone(), now),
            fetch_logged(self.sources.health.clone(), now),
        );

        let fresh: Vec<Notification> = [news, weather, health].into_iter().flatten().collect();
        let added = fresh.len();
        self.with_scheduler(|s| fresh.into_iter().for_each(|n| s.push_notification(n)));
        added
    }

    /// Background ticker. Runs until the runtime shuts down.
    pub async fn run(self, every: Duration) {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Scheduler ticking every {every:?}");

        loop {
            interval.tick().await;
            self.run_due(local_now());
        }
    }
}

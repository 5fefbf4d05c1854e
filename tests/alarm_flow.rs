//! End-to-end alarm flow with canned notification sources and a
//! recording speaker.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use async_trait::async_trait;
use briefing_clock::briefing::{Notification, NotificationSource, Sources};
use briefing_clock::config::ScheduleConfig;
use briefing_clock::error::ClockError;
use briefing_clock::history;
use briefing_clock::scheduler::{Job, NewAlarm, Scheduler};
use briefing_clock::service::AlarmService;
use briefing_clock::speech::{Speaker, SpeechQueue};
use chrono::{NaiveDate, NaiveDateTime};

struct Canned {
    name: &'static str,
    notification: Option<Notification>,
}

#[async_trait]
impl NotificationSource for Canned {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, _now: NaiveDateTime) -> Result<Notification, ClockError> {
        self.notification
            .clone()
            .ok_or_else(|| ClockError::UpstreamUnavailable {
                service: self.name,
                reason: "connection refused".into(),
            })
    }
}

fn canned(name: &'static str, title: &str, content: &str) -> Arc<dyn NotificationSource> {
    Arc::new(Canned {
        name,
        notification: Some(Notification::new(title, content)),
    })
}

fn down(name: &'static str) -> Arc<dyn NotificationSource> {
    Arc::new(Canned {
        name,
        notification: None,
    })
}

fn healthy_sources() -> Sources {
    Sources {
        news: canned("news", "London Covid: Heathrow stays open", "Shops remain open"),
        weather: canned(
            "weather",
            "Weather - Exeter - 07:00",
            "Weather: light rain. Temperature: 13°C Feels like: 12°C",
        ),
        health: canned(
            "health",
            "Covid-19 report - England 2020-07-28",
            "New cases today: 547 Threshold level is Green - safe",
        ),
    }
}

struct Recorder(Arc<Mutex<Vec<String>>>);

impl Speaker for Recorder {
    fn say(&mut self, text: &str) -> Result<(), ClockError> {
        self.0.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 12, 4)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

struct Harness {
    service: AlarmService,
    spoken: Arc<Mutex<Vec<String>>>,
    speech_thread: JoinHandle<()>,
    history: tempfile::TempDir,
}

impl Harness {
    fn new(sources: Sources) -> Self {
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let (queue, speech_thread) = SpeechQueue::spawn(Recorder(spoken.clone())).unwrap();
        let history = tempfile::tempdir().unwrap();
        let service = AlarmService::new(
            Scheduler::new(&ScheduleConfig::default(), at(7, 0, 0)),
            sources,
            queue,
            history.path().to_path_buf(),
        );
        Self {
            service,
            spoken,
            speech_thread,
            history,
        }
    }

    fn add(&self, title: &str, time: &str, news: bool, weather: bool) {
        self.service
            .with_scheduler(|s| {
                s.add_alarm(
                    NewAlarm {
                        title: title.into(),
                        date: "2020-12-04".into(),
                        time: time.into(),
                        news,
                        weather,
                    },
                    at(7, 0, 0),
                )
                .map(|_| ())
            })
            .unwrap();
    }

    async fn run_due(&self, now: NaiveDateTime) {
        for job in self.service.run_due(now) {
            job.await.unwrap();
        }
    }

    /// Close the speech queue and wait for everything queued to be spoken.
    fn finish(self) -> (Vec<String>, tempfile::TempDir) {
        drop(self.service);
        self.speech_thread.join().unwrap();
        let spoken = self.spoken.lock().unwrap().clone();
        (spoken, self.history)
    }
}

#[tokio::test]
async fn full_briefing_is_spoken_in_order() {
    let harness = Harness::new(healthy_sources());
    harness.add("wake", "07:30", true, true);

    harness.run_due(at(7, 29, 59)).await;
    assert!(harness.service.with_scheduler(|s| s.alarm("wake").is_some()));

    harness.run_due(at(7, 30, 0)).await;
    assert!(harness.service.with_scheduler(|s| s.alarms().is_empty()));

    let (spoken, history_dir) = harness.finish();
    assert_eq!(
        spoken,
        vec![
            "alarm wake has gone off",
            "covid report is New cases today  547 Threshold level is Green   safe",
            "latest news is London Covid  Heathrow stays open",
            "weather report is Weather  light rain  Temperature  13 degrees celsius Feels like  12 degrees celsius",
        ]
    );

    let records = history::load_records(history_dir.path(), "2020-12-04");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "wake");
    assert_eq!(records[0].lines.len(), 4);
}

#[tokio::test]
async fn plain_alarm_speaks_two_lines() {
    let harness = Harness::new(healthy_sources());
    harness.add("plain", "08:00", false, false);
    harness.run_due(at(8, 0, 0)).await;

    let (spoken, _) = harness.finish();
    assert_eq!(spoken.len(), 2);
    assert_eq!(spoken[0], "alarm plain has gone off");
}

#[tokio::test]
async fn cancelled_alarm_is_never_announced() {
    let harness = Harness::new(healthy_sources());
    harness.add("wake", "07:30", true, false);
    assert!(harness.service.with_scheduler(|s| s.cancel_alarm("wake")));

    harness.run_due(at(9, 0, 0)).await;

    let (spoken, history_dir) = harness.finish();
    assert!(spoken.is_empty());
    assert!(history::load_records(history_dir.path(), "2020-12-04").is_empty());
}

#[tokio::test]
async fn title_set_again_before_announcing_keeps_the_new_alarm() {
    let harness = Harness::new(healthy_sources());
    harness.add("wake", "07:30", false, false);

    let jobs = harness.service.with_scheduler(|s| s.tick(at(7, 30, 0)));
    harness
        .service
        .with_scheduler(|s| {
            assert!(s.cancel_alarm("wake"));
            s.add_alarm(
                NewAlarm {
                    title: "wake".into(),
                    date: "2020-12-04".into(),
                    time: "09:00".into(),
                    news: true,
                    weather: true,
                },
                at(7, 30, 0),
            )
            .map(|_| ())
        })
        .unwrap();

    for job in jobs {
        if let Job::FireAlarm(alarm) = job {
            let announcement = harness.service.fire_alarm(alarm, at(7, 30, 0)).await;
            assert_eq!(announcement.lines.len(), 2);
        }
    }

    let still_set = harness
        .service
        .with_scheduler(|s| s.alarm("wake").and_then(|a| a.due()));
    assert_eq!(still_set, Some(at(9, 0, 0)));

    let (spoken, _) = harness.finish();
    assert_eq!(spoken.len(), 2);
    assert!(spoken.iter().all(|line| !line.starts_with("latest news")));
}

#[tokio::test]
async fn failing_source_drops_only_its_segment() {
    let sources = Sources {
        news: down("news"),
        ..healthy_sources()
    };
    let harness = Harness::new(sources);
    harness.add("wake", "07:30", true, true);
    harness.add("second", "07:30", false, false);
    harness.run_due(at(7, 30, 0)).await;

    let (spoken, history_dir) = harness.finish();
    assert_eq!(spoken.len(), 5);
    assert!(spoken.iter().all(|line| !line.starts_with("latest news")));
    assert!(spoken.contains(&"alarm second has gone off".to_string()));

    let records = history::load_records(history_dir.path(), "2020-12-04");
    let wake = records.iter().find(|r| r.title == "wake").unwrap();
    assert_eq!(wake.omitted, vec!["news"]);
}

#[tokio::test]
async fn refresh_appends_news_weather_health_in_order() {
    let harness = Harness::new(healthy_sources());
    harness.run_due(at(7, 0, 1)).await;

    let titles: Vec<String> = harness
        .service
        .with_scheduler(|s| s.notifications().iter().map(|n| n.title.clone()).collect());
    assert_eq!(
        titles,
        vec![
            "London Covid: Heathrow stays open",
            "Weather - Exeter - 07:00",
            "Covid-19 report - England 2020-07-28",
        ]
    );
}

#[tokio::test]
async fn refresh_skips_unavailable_sources() {
    let sources = Sources {
        weather: down("weather"),
        health: down("health"),
        ..healthy_sources()
    };
    let harness = Harness::new(sources);
    let added = harness.service.refresh_notifications(at(7, 0, 0)).await;

    assert_eq!(added, 1);
    assert!(harness.service.with_scheduler(|s| s.remove_notification("London Covid: Heathrow stays open")));
}

//! Text-to-speech for alarm announcements.
//!
//! Speaking is blocking, so announcements are queued to a dedicated
//! thread and read out line by line. Whole announcements are queued as a
//! unit, so two alarms going off together never interleave.

mod command;
mod http;

use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::SpeechConfig;
use crate::error::ClockError;

pub use command::{CommandSpeaker, LogSpeaker};
pub use http::HttpSpeaker;

/// Says one line of text and returns once it has been spoken.
pub trait Speaker: Send {
    fn say(&mut self, text: &str) -> Result<(), ClockError>;
}

impl<S: Speaker + ?Sized> Speaker for Box<S> {
    fn say(&mut self, text: &str) -> Result<(), ClockError> {
        (**self).say(text)
    }
}

pub fn speaker_from_config(config: &SpeechConfig) -> Box<dyn Speaker> {
    match config.backend.as_str() {
        "http" => Box::new(HttpSpeaker::new(&config.api_url)),
        "command" => Box::new(CommandSpeaker::new(&config.command, config.args.clone())),
        "log" => Box::new(LogSpeaker),
        other => {
            warn!("Unknown speech backend {other:?}, announcements will only be logged");
            Box::new(LogSpeaker)
        }
    }
}

/// Handle for queueing announcements to the speech thread.
#[derive(Clone)]
pub struct SpeechQueue {
    tx: mpsc::UnboundedSender<Vec<String>>,
}

impl SpeechQueue {
    /// Start the speech thread. It exits once every queue handle is dropped.
    pub fn spawn<S: Speaker + 'static>(mut speaker: S) -> Result<(Self, JoinHandle<()>), ClockError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<String>>();

        let handle = thread::Builder::new()
            .name("speech".into())
            .spawn(move || {
                while let Some(lines) = rx.blocking_recv() {
                    debug!("Speaking announcement of {} lines", lines.len());
                    for line in &lines {
                        if let Err(e) = speaker.say(line) {
                            warn!("Failed to speak {line:?}: {e}");
                        }
                    }
                }
                info!("Speech queue closed");
            })
            .map_err(|e| ClockError::Speech(format!("cannot start speech thread: {e}")))?;

        Ok((Self { tx }, handle))
    }

    /// Queue an announcement. Returns false if the speech thread is gone.
    pub fn announce(&self, lines: Vec<String>) -> bool {
        if lines.is_empty() {
            return true;
        }
        self.tx.send(lines).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Speaker for Recorder {
        fn say(&mut self, text: &str) -> Result<(), ClockError> {
            if text == "broken" {
                return Err(ClockError::Speech("cannot say that".into()));
            }
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn speaks_announcements_in_order() {
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let (queue, worker) = SpeechQueue::spawn(Recorder(spoken.clone())).unwrap();

        assert!(queue.announce(vec!["alarm one has gone off".into(), "broken".into(), "covid report".into()]));
        assert!(queue.announce(vec!["alarm two has gone off".into()]));
        drop(queue);
        worker.join().unwrap();

        assert_eq!(
            *spoken.lock().unwrap(),
            vec!["alarm one has gone off", "covid report", "alarm two has gone off"]
        );
    }

    #[test]
    fn unknown_backend_falls_back_to_logging() {
        let config = SpeechConfig {
            backend: "carrier-pigeon".into(),
            ..SpeechConfig::default()
        };
        let mut speaker = speaker_from_config(&config);
        assert!(speaker.say("hello").is_ok());
    }
}

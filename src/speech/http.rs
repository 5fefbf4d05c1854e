//! Speech through a speaker service's HTTP `/speak` endpoint.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{debug, info};

use super::Speaker;
use crate::error::ClockError;

#[derive(Serialize)]
struct SpeakRequest<'a> {
    text: &'a str,
    summarize: bool,
    event_type: &'a str,
    start_reminder: bool,
}

pub struct HttpSpeaker {
    base_url: String,
    // Built on first use: a blocking client must be created off the async runtime.
    client: Option<Client>,
}

impl HttpSpeaker {
    pub fn new(base_url: &str) -> Self {
        info!("Speech via speaker API at {base_url}");
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: None,
        }
    }

    fn client(&mut self) -> Result<&Client, ClockError> {
        if self.client.is_none() {
            let client = Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .map_err(|e| ClockError::Speech(format!("cannot build HTTP client: {e}")))?;
            self.client = Some(client);
        }
        self.client
            .as_ref()
            .ok_or_else(|| ClockError::Speech("HTTP client unavailable".into()))
    }
}

impl Speaker for HttpSpeaker {
    fn say(&mut self, text: &str) -> Result<(), ClockError> {
        let url = format!("{}/speak", self.base_url);
        let body = SpeakRequest {
            text,
            summarize: false,
            event_type: "alarm",
            start_reminder: false,
        };

        debug!("POST {url}: {text:?}");
        let resp = self
            .client()?
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| ClockError::Speech(format!("speaker API unreachable: {e}")))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ClockError::Speech(format!("speaker API returned {}", resp.status())))
        }
    }
}

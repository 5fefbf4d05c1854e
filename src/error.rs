//! Error kinds shared by the utilities, the briefing builders, the
//! scheduler and the speech backends.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClockError {
    /// A time, date or combined date-time string could not be parsed.
    #[error("malformed {what} {input:?}")]
    Format { what: &'static str, input: String },

    /// The news feed had no article worth announcing.
    #[error("no relevant news article found")]
    NoRelevantArticle,

    /// An alarm with this title is already set.
    #[error("an alarm titled {0:?} is already set")]
    DuplicateAlarm(String),

    /// The upstream API could not be reached or answered with an error status.
    #[error("{service} API unavailable: {reason}")]
    UpstreamUnavailable { service: &'static str, reason: String },

    /// The upstream API answered, but not with the data we need.
    #[error("{service} API returned unusable data: {reason}")]
    InvalidResponse { service: &'static str, reason: String },

    /// The text-to-speech backend failed to say a line.
    #[error("speech failed: {0}")]
    Speech(String),
}

impl ClockError {
    pub(crate) fn format(what: &'static str, input: &str) -> Self {
        Self::Format {
            what,
            input: input.to_string(),
        }
    }

    pub(crate) fn upstream(service: &'static str, reason: impl ToString) -> Self {
        Self::UpstreamUnavailable {
            service,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid(service: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service,
            reason: reason.into(),
        }
    }
}

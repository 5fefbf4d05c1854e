//! Local speech backends: an external synthesizer program, or the log.

use std::process::Command;

use tracing::{debug, info};

use super::Speaker;
use crate::error::ClockError;

/// Runs a speech synthesizer such as `espeak` with the line as its last
/// argument and waits for it to finish.
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    pub fn new(program: &str, args: Vec<String>) -> Self {
        info!("Speech via command: {program}");
        Self {
            program: program.to_string(),
            args,
        }
    }
}

impl Speaker for CommandSpeaker {
    fn say(&mut self, text: &str) -> Result<(), ClockError> {
        debug!("{} {:?}", self.program, text);
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .status()
            .map_err(|e| ClockError::Speech(format!("{} not runnable: {e}", self.program)))?;

        if status.success() {
            Ok(())
        } else {
            Err(ClockError::Speech(format!("{} exited with {status}", self.program)))
        }
    }
}

/// Writes announcements to the log instead of speaking them.
pub struct LogSpeaker;

impl Speaker for LogSpeaker {
    fn say(&mut self, text: &str) -> Result<(), ClockError> {
        info!("Announcement: {text}");
        Ok(())
    }
}

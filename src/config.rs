//! Configuration management for briefing-clock.
//!
//! Loads config from YAML files in standard locations. Every section has
//! defaults, so an empty or missing file still yields a runnable clock
//! (upstream calls just fail without API keys).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiKeysConfig {
    pub news: String,
    pub weather: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub base_url: String,
    pub country: String,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org".into(),
            country: "gb".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "http://api.openweathermap.org".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub base_url: String,
    pub area_type: String,
    pub area_name: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coronavirus.data.gov.uk".into(),
            area_type: "nation".into(),
            area_name: "England".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Only advance the timeline when a page is requested.
    pub poll_only: bool,
    pub tick_interval_ms: u64,
    pub refresh_interval_secs: u64,
    pub rollover_interval_secs: u64,
    pub startup_delay_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_only: false,
            tick_interval_ms: 1000,
            refresh_interval_secs: 4 * 3600,
            rollover_interval_secs: 60,
            startup_delay_secs: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// `http`, `command` or `log`.
    pub backend: String,
    pub api_url: String,
    pub command: String,
    pub args: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            backend: "command".into(),
            api_url: "http://127.0.0.1:8767".into(),
            command: "espeak".into(),
            args: vec![],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Defaults to ~/.briefing-clock-history when unset.
    pub dir: Option<PathBuf>,
}

impl HistoryConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".briefing-clock-history")
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub location: String,
    pub api_keys: ApiKeysConfig,
    pub news: NewsConfig,
    pub weather: WeatherConfig,
    pub health: HealthConfig,
    pub server: ServerConfig,
    pub schedule: ScheduleConfig,
    pub speech: SpeechConfig,
    pub history: HistoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: "Exeter".into(),
            api_keys: ApiKeysConfig::default(),
            news: NewsConfig::default(),
            weather: WeatherConfig::default(),
            health: HealthConfig::default(),
            server: ServerConfig::default(),
            schedule: ScheduleConfig::default(),
            speech: SpeechConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./config.yaml
    /// 2. ~/.config/briefing-clock/config.yaml
    /// 3. /etc/briefing-clock/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("config.yaml")),
                dirs::home_dir().map(|h| h.join(".config/briefing-clock/config.yaml")),
                Some(PathBuf::from("/etc/briefing-clock/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match Self::from_yaml(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(contents)
    }
}

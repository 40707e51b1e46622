use crate::dashboard::remote::RemoteConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const WEATHER_KEY_VAR: &str = "ORGANIZER_WEATHER_KEY";
pub const NEWS_KEY_VAR: &str = "ORGANIZER_NEWS_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Enable debug logging. `RUST_LOG` is honoured only when this is set.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional file that receives a copy of the log output.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Where dashboard state is stored. Defaults to the platform data dir.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Widget types added on the very first run.
    #[serde(default = "default_widgets")]
    pub default_widgets: Vec<String>,
    #[serde(default = "default_city")]
    pub default_city: String,
    #[serde(default)]
    pub weather_api_key: Option<String>,
    #[serde(default)]
    pub news_api_key: Option<String>,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
    /// Fixed seed for the quote widget. Random when unset.
    #[serde(default)]
    pub quote_seed: Option<u64>,
    #[serde(default = "default_window_size")]
    pub window_size: (f32, f32),
}

fn default_widgets() -> Vec<String> {
    vec!["tasks".into(), "calendar".into()]
}

fn default_city() -> String {
    RemoteConfig::default().default_city
}

fn default_http_timeout() -> u64 {
    10
}

fn default_window_size() -> (f32, f32) {
    (1100.0, 760.0)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_logging: false,
            log_file: None,
            data_dir: None,
            default_widgets: default_widgets(),
            default_city: default_city(),
            weather_api_key: None,
            news_api_key: None,
            http_timeout_secs: default_http_timeout(),
            quote_seed: None,
            window_size: default_window_size(),
        }
    }
}

impl Settings {
    /// Read settings from `path`. A missing or empty file gives the defaults.
    /// API keys from the environment take precedence over the file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        let mut settings = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_json::from_str(&content)?
        };
        settings.apply_env();
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn apply_env(&mut self) {
        if let Some(key) = env_value(WEATHER_KEY_VAR) {
            self.weather_api_key = Some(key);
        }
        if let Some(key) = env_value(NEWS_KEY_VAR) {
            self.news_api_key = Some(key);
        }
    }

    pub fn resolved_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        match dirs_next::data_dir() {
            Some(dir) => dir.join("organizer"),
            None => {
                tracing::warn!("no platform data directory; using ./organizer-data");
                PathBuf::from("organizer-data")
            }
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    pub fn remote_config(&self) -> RemoteConfig {
        let city = self.default_city.trim();
        RemoteConfig {
            weather_api_key: self.weather_api_key.clone(),
            news_api_key: self.news_api_key.clone(),
            default_city: if city.is_empty() {
                default_city()
            } else {
                city.to_string()
            },
            ..RemoteConfig::default()
        }
    }
}

fn env_value(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

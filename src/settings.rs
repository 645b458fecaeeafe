use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

const APP_DIR: &str = "worklog";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Directory holding one `activity_*.json` container per run.
    pub session_dir: PathBuf,
    /// Directory holding one `msg_*.json` file per captured message.
    pub message_dir: PathBuf,
    pub poll_interval_ms: u64,
    /// Upper bound on a single foreground-window query.
    pub sample_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let base = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self {
            session_dir: base.join("log"),
            message_dir: base.join("messages"),
            poll_interval_ms: 1500,
            sample_timeout_ms: 3000,
        }
    }
}

impl Settings {
    /// Load from `WORKLOG_SETTINGS` or the platform config dir, then apply
    /// environment overrides. A missing or unreadable file means defaults.
    pub fn load() -> Self {
        let path = env::var_os("WORKLOG_SETTINGS")
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE)));

        let mut settings = match path {
            Some(path) if path.exists() => Self::from_file(&path).unwrap_or_else(|err| {
                warn!("Ignoring settings file {}: {err:#}", path.display());
                Self::default()
            }),
            _ => Self::default(),
        };
        settings.apply_env_overrides(|key| env::var(key).ok());
        settings
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("WORKLOG_SESSION_DIR").filter(|v| !v.trim().is_empty()) {
            self.session_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("WORKLOG_MESSAGE_DIR").filter(|v| !v.trim().is_empty()) {
            self.message_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("WORKLOG_POLL_INTERVAL_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.poll_interval_ms = ms,
                _ => warn!("Ignoring invalid WORKLOG_POLL_INTERVAL_MS={raw:?}"),
            }
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn sample_timeout(&self) -> Duration {
        Duration::from_millis(self.sample_timeout_ms.max(1))
    }
}

/// Credentials and switches for the Slack message ingestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackSettings {
    /// Required so the ingestor only runs when the bridge has been set up
    /// with credentials; the bridge holds the connection, not this process.
    pub bot_token: String,
    pub app_token: String,
    pub self_user_id: String,
    /// Log every drop decision at info level.
    pub debug: bool,
    /// Keep messages from every author, not just `self_user_id`.
    pub log_all: bool,
    /// Where the event bridge writes envelopes; `None` reads stdin.
    pub events_path: Option<PathBuf>,
}

impl SlackSettings {
    /// Fails with a reason when a required credential is missing.
    pub fn from_env() -> std::result::Result<Self, &'static str> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> std::result::Result<Self, &'static str> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let flag = |key: &str| lookup(key).map(|v| v.trim() == "1").unwrap_or(false);

        let (Some(bot_token), Some(app_token)) =
            (non_empty("SLACK_BOT_TOKEN"), non_empty("SLACK_APP_TOKEN"))
        else {
            return Err("SLACK_BOT_TOKEN / SLACK_APP_TOKEN not set");
        };
        let Some(self_user_id) = non_empty("SLACK_SELF_USER_ID") else {
            return Err("SLACK_SELF_USER_ID not set");
        };

        let events_path = non_empty("SLACK_EVENTS_PATH")
            .filter(|v| v.trim() != "-")
            .map(PathBuf::from);

        Ok(Self {
            bot_token,
            app_token,
            self_user_id: self_user_id.trim().to_string(),
            debug: flag("SLACK_DEBUG"),
            log_all: flag("SLACK_LOG_ALL"),
            events_path,
        })
    }
}

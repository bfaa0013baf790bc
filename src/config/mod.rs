//! Configuration system (layered: defaults < TOML file < environment).

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{RelayError, Result};
use crate::util::backoff::BackoffSchedule;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7071";

/// Poll cadence for run status checks.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollSettings {
    pub initial_wait_ms: u64,
    pub fast_attempts: u32,
    pub multiplier: f64,
    pub max_wait_ms: u64,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        let schedule = BackoffSchedule::default();
        Self {
            initial_wait_ms: schedule.initial_wait.as_millis() as u64,
            fast_attempts: schedule.fast_attempts,
            multiplier: schedule.multiplier,
            max_wait_ms: schedule.max_wait.as_millis() as u64,
            max_attempts: schedule.max_attempts,
        }
    }
}

impl PollSettings {
    pub fn schedule(&self) -> BackoffSchedule {
        BackoffSchedule::builder()
            .initial_wait(Duration::from_millis(self.initial_wait_ms))
            .fast_attempts(self.fast_attempts)
            .multiplier(self.multiplier)
            .max_wait(Duration::from_millis(self.max_wait_ms))
            .max_attempts(self.max_attempts)
            .build()
    }
}

/// Relay configuration.
///
/// Resolution order, later wins:
/// 1. Built-in defaults
/// 2. A TOML file (`RelayConfig::from_file`)
/// 3. Environment variables, after loading `.env` if present
#[derive(Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub assistant_id: Option<String>,
    pub proxy_url: Option<String>,
    pub function_key: Option<String>,
    pub interaction_url: Option<String>,
    pub interaction_dir: Option<PathBuf>,
    pub bind_addr: String,
    pub request_timeout_secs: u64,
    pub tool_timeout_secs: u64,
    pub record_in_background: bool,
    pub poll: PollSettings,
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("base_url", &self.base_url)
            .field("assistant_id", &self.assistant_id)
            .field("proxy_url", &self.proxy_url)
            .field("function_key", &self.function_key.as_ref().map(|_| ".."))
            .field("interaction_url", &self.interaction_url)
            .field("interaction_dir", &self.interaction_dir)
            .field("bind_addr", &self.bind_addr)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("tool_timeout_secs", &self.tool_timeout_secs)
            .field("record_in_background", &self.record_in_background)
            .field("poll", &self.poll)
            .finish()
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            assistant_id: None,
            proxy_url: None,
            function_key: None,
            interaction_url: None,
            interaction_dir: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            request_timeout_secs: 60,
            tool_timeout_secs: 30,
            record_in_background: true,
            poll: PollSettings::default(),
        }
    }
}

impl RelayConfig {
    /// Load defaults, an optional TOML file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Parse a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw).map_err(|err| match err {
            RelayError::Configuration(msg) => {
                RelayError::Configuration(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| RelayError::Configuration(e.to_string()))
    }

    /// Overlay process environment variables (loads `.env` first).
    pub fn apply_env(&mut self) -> Result<()> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay variables resolved through `lookup`.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(*key))
                .find(|value| !value.trim().is_empty())
        };

        if let Some(v) = first(&["OPENAI_API_KEY"]) {
            self.api_key = Some(v);
        }
        if let Some(v) = first(&["OPENAI_BASE_URL"]) {
            self.base_url = v;
        }
        if let Some(v) = first(&["OPENAI_ASSISTANT_ID", "ASSISTANT_ID"]) {
            self.assistant_id = Some(v);
        }
        if let Some(v) = first(&["PROXY_URL", "AZURE_PROXY_URL"]) {
            self.proxy_url = Some(v);
        }
        if let Some(v) = first(&["FUNCTION_KEY"]) {
            self.function_key = Some(v);
        }
        if let Some(v) = first(&["INTERACTION_URL"]) {
            self.interaction_url = Some(v);
        }
        if let Some(v) = first(&["INTERACTION_DIR"]) {
            self.interaction_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = first(&["RELAY_BIND_ADDR"]) {
            self.bind_addr = v;
        }
        if let Some(v) = first(&["RELAY_REQUEST_TIMEOUT_SECS"]) {
            self.request_timeout_secs = parse_env("RELAY_REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = first(&["RELAY_TOOL_TIMEOUT_SECS"]) {
            self.tool_timeout_secs = parse_env("RELAY_TOOL_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = first(&["RELAY_RECORD_IN_BACKGROUND"]) {
            self.record_in_background = parse_env("RELAY_RECORD_IN_BACKGROUND", &v)?;
        }
        if let Some(v) = first(&["RELAY_POLL_INITIAL_MS"]) {
            self.poll.initial_wait_ms = parse_env("RELAY_POLL_INITIAL_MS", &v)?;
        }
        if let Some(v) = first(&["RELAY_POLL_FAST_ATTEMPTS"]) {
            self.poll.fast_attempts = parse_env("RELAY_POLL_FAST_ATTEMPTS", &v)?;
        }
        if let Some(v) = first(&["RELAY_POLL_MAX_WAIT_MS"]) {
            self.poll.max_wait_ms = parse_env("RELAY_POLL_MAX_WAIT_MS", &v)?;
        }
        if let Some(v) = first(&["RELAY_POLL_MAX_ATTEMPTS"]) {
            self.poll.max_attempts = parse_env("RELAY_POLL_MAX_ATTEMPTS", &v)?;
        }
        Ok(())
    }

    /// Check that everything needed to serve turns is present.
    pub fn validate(&self) -> Result<()> {
        self.api_key()?;
        self.assistant_id()?;
        self.proxy_url()?;
        if self.poll.max_attempts == 0 {
            return Err(RelayError::Configuration(
                "poll.max_attempts must be at least 1".into(),
            ));
        }
        if self.tool_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(RelayError::Configuration("timeouts must be non-zero".into()));
        }
        Ok(())
    }

    pub fn api_key(&self) -> Result<&str> {
        required(&self.api_key, "OPENAI_API_KEY")
    }

    pub fn assistant_id(&self) -> Result<&str> {
        required(&self.assistant_id, "OPENAI_ASSISTANT_ID")
    }

    pub fn proxy_url(&self) -> Result<&str> {
        required(&self.proxy_url, "PROXY_URL")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn backoff_schedule(&self) -> BackoffSchedule {
        self.poll.schedule()
    }
}

fn required<'a>(value: &'a Option<String>, env_var: &str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RelayError::Configuration(format!("Missing {env_var}")))
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| RelayError::Configuration(format!("Invalid value for {key}: '{value}'")))
}

//! System configuration parameters
//!
//! All tunable parameters for the PetFeeder dispatch engine.
//! Values come from an optional JSON file, then environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

/// Which midnight rolls the execution ledger over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayBoundary {
    /// The device's local time zone (DST-affected).
    Local,
    /// UTC midnight.
    Utc,
}

/// Core engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeederConfig {
    // --- Gateway ---
    /// Base URL of the backend API (schedules + controller proxy)
    pub api_base_url: String,
    /// Per-request timeout (milliseconds)
    pub request_timeout_ms: u64,

    // --- Schedule dispatch ---
    /// User whose schedules the runner polls
    pub user_id: u32,
    /// Schedule poll period (seconds)
    pub schedule_poll_interval_secs: u64,
    /// Minutes after a slot's time during which it may still fire
    pub due_window_minutes: u16,
    /// Hardware settling wait between routine stages (milliseconds)
    pub settle_delay_ms: u64,
    /// Day rollover zone for the execution ledger
    pub day_boundary: DayBoundary,

    // --- Water monitor ---
    /// Water monitor poll period (seconds)
    pub water_check_interval_secs: u64,
    /// Default refill threshold in grams when none is persisted
    pub water_threshold_g: f32,

    // --- Storage ---
    /// Directory backing the file key-value store
    pub storage_dir: PathBuf,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_ms: 10_000,

            user_id: 1,
            schedule_poll_interval_secs: 30,
            due_window_minutes: 2,
            settle_delay_ms: 1000,
            day_boundary: DayBoundary::Local,

            water_check_interval_secs: 60,
            water_threshold_g: 100.0,

            storage_dir: PathBuf::from("./petfeeder-data"),
        }
    }
}

impl FeederConfig {
    /// Load configuration: JSON file (if given and present), then
    /// `PETFEEDER_*` environment overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(p) if p.exists() => {
                let text = std::fs::read_to_string(p).map_err(|e| ConfigError::Io(e.to_string()))?;
                let cfg: FeederConfig =
                    serde_json::from_str(&text).map_err(|e| ConfigError::Corrupted(e.to_string()))?;
                info!("config: loaded {}", p.display());
                cfg
            }
            Some(p) => {
                info!("config: {} not found, using defaults", p.display());
                FeederConfig::default()
            }
            None => FeederConfig::default(),
        };

        cfg.apply_env(|k| std::env::var(k).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply environment overrides through `lookup` (injectable for tests).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(url) = lookup("PETFEEDER_API_URL") {
            self.api_base_url = url;
        }
        if let Some(uid) = lookup("PETFEEDER_USER_ID") {
            self.user_id = uid
                .trim()
                .parse()
                .map_err(|_| ConfigError::ValidationFailed("PETFEEDER_USER_ID must be an integer"))?;
        }
        if let Some(dir) = lookup("PETFEEDER_STORAGE_DIR") {
            self.storage_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationFailed(
                "api_base_url must start with http:// or https://",
            ));
        }
        if !(100..=120_000).contains(&self.request_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "request_timeout_ms must be 100–120000",
            ));
        }
        if !(1..=3600).contains(&self.schedule_poll_interval_secs) {
            return Err(ConfigError::ValidationFailed(
                "schedule_poll_interval_secs must be 1–3600",
            ));
        }
        if self.due_window_minutes > 30 {
            return Err(ConfigError::ValidationFailed(
                "due_window_minutes must be 0–30",
            ));
        }
        if self.settle_delay_ms > 30_000 {
            return Err(ConfigError::ValidationFailed(
                "settle_delay_ms must be 0–30000",
            ));
        }
        if !(5..=86_400).contains(&self.water_check_interval_secs) {
            return Err(ConfigError::ValidationFailed(
                "water_check_interval_secs must be 5–86400",
            ));
        }
        if !self.water_threshold_g.is_finite() || self.water_threshold_g <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "water_threshold_g must be a positive number",
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn schedule_poll_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_poll_interval_secs)
    }

    pub fn water_check_interval(&self) -> Duration {
        Duration::from_secs(self.water_check_interval_secs)
    }
}

/// Errors from loading or validating [`FeederConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted(String),
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// The config file could not be read.
    Io(String),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted(msg) => write!(f, "config corrupted: {}", msg),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

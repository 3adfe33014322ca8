use std::{fs, path::Path, time::Duration};

use client_core::{ControllerSettings, OperationParams};
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "inboxpilot.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base_url: String,
    pub poll_interval_secs: u64,
    pub toast_duration_ms: u64,
    pub scan_max_emails: u32,
    pub scheduler_delay_secs: f64,
    pub request_timeout_secs: u64,
    pub shutdown_grace_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".into(),
            poll_interval_secs: 30,
            toast_duration_ms: 3000,
            scan_max_emails: 10,
            scheduler_delay_secs: 1.5,
            request_timeout_secs: 60,
            shutdown_grace_secs: 5,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn operation_params(&self) -> OperationParams {
        OperationParams {
            scan_max_emails: self.scan_max_emails,
            scheduler_delay_secs: self.scheduler_delay_secs,
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            toast_duration: Duration::from_millis(self.toast_duration_ms),
            shutdown_grace: Duration::from_secs(self.shutdown_grace_secs),
            operations: self.operation_params(),
        }
    }
}

/// Keys accepted in the settings file. Anything missing keeps its default.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    poll_interval_secs: Option<u64>,
    toast_duration_ms: Option<u64>,
    scan_max_emails: Option<u32>,
    scheduler_delay_secs: Option<f64>,
    request_timeout_secs: Option<u64>,
    shutdown_grace_secs: Option<u64>,
}

pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(err) => warn!(path = %path.display(), "ignoring unreadable settings file: {err}"),
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.poll_interval_secs.filter(|v| *v > 0) {
        settings.poll_interval_secs = v;
    }
    if let Some(v) = file_cfg.toast_duration_ms {
        settings.toast_duration_ms = v;
    }
    if let Some(v) = file_cfg.scan_max_emails {
        settings.scan_max_emails = v;
    }
    if let Some(v) = file_cfg.scheduler_delay_secs.filter(|v| *v >= 0.0) {
        settings.scheduler_delay_secs = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs.filter(|v| *v > 0) {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.shutdown_grace_secs {
        settings.shutdown_grace_secs = v;
    }
}

/// Environment wins over the file. Unparseable numbers are ignored.
pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("INBOXPILOT_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = parsed::<u64>(&lookup, "APP__POLL_INTERVAL_SECS").filter(|v| *v > 0) {
        settings.poll_interval_secs = v;
    }
    if let Some(v) = parsed::<u64>(&lookup, "APP__TOAST_DURATION_MS") {
        settings.toast_duration_ms = v;
    }
    if let Some(v) = parsed::<u32>(&lookup, "APP__SCAN_MAX_EMAILS") {
        settings.scan_max_emails = v;
    }
    if let Some(v) = parsed::<f64>(&lookup, "APP__SCHEDULER_DELAY_SECS").filter(|v| *v >= 0.0) {
        settings.scheduler_delay_secs = v;
    }
    if let Some(v) = parsed::<u64>(&lookup, "APP__REQUEST_TIMEOUT_SECS").filter(|v| *v > 0) {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = parsed::<u64>(&lookup, "APP__SHUTDOWN_GRACE_SECS") {
        settings.shutdown_grace_secs = v;
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring invalid setting");
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

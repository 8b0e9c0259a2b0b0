use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use crate::services::upload::DEFAULT_MAX_UPLOAD_BYTES;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    // Uploads
    pub upload_max_bytes: u64,
    pub request_body_limit: usize,

    // Simulated analysis
    pub analysis_step_interval_ms: u64,
    pub analysis_retention_secs: u64,
    pub analysis_rate_limit: u32,
    pub analysis_rate_window_secs: u64,
}

impl Config {
    /// Reads settings from the environment. Unset numeric settings take
    /// their default; malformed ones are an error.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://mindful.db?mode=rwc".into()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: number_or("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),

            upload_max_bytes: number_or("UPLOAD_MAX_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            request_body_limit: number_or("REQUEST_BODY_LIMIT_BYTES", 32 * 1024 * 1024)?,

            analysis_step_interval_ms: number_or("ANALYSIS_STEP_INTERVAL_MS", 1500)?,
            analysis_retention_secs: number_or("ANALYSIS_RETENTION_SECS", 3600)?,
            analysis_rate_limit: number_or("ANALYSIS_RATE_LIMIT", 10)?,
            analysis_rate_window_secs: number_or("ANALYSIS_RATE_WINDOW_SECS", 60)?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn analysis_step_interval(&self) -> Duration {
        Duration::from_millis(self.analysis_step_interval_ms)
    }

    pub fn analysis_retention(&self) -> Duration {
        Duration::from_secs(self.analysis_retention_secs)
    }
}

fn number_or<T: FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    match env::var(key) {
        Ok(raw) => parse_number(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> anyhow::Result<T> {
    raw.trim()
        .parse()
        .ok()
        .with_context(|| format!("{key} must be a number, got {raw:?}"))
}

#[cfg(test)]
impl Config {
    /// Defaults without touching the process environment.
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            upload_max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            request_body_limit: 32 * 1024 * 1024,
            analysis_step_interval_ms: 1500,
            analysis_retention_secs: 3600,
            analysis_rate_limit: 10,
            analysis_rate_window_secs: 60,
        }
    }
}

//! Server configuration.
//!
//! Values come from environment variables first, then the `app_settings`
//! table, then built-in defaults.

use chrono::Duration;
use serde::Serialize;
use std::env;

use crate::db::Database;
use crate::error::{TrackerError, TrackerResult};

// Environment variable names
pub const ENV_PORT: &str = "PERFTRACK_PORT";
pub const ENV_SESSION_DAYS: &str = "PERFTRACK_SESSION_DAYS";

// Database setting keys
pub const SETTING_PORT: &str = "server_port";
pub const SETTING_SESSION_DAYS: &str = "session_days";

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_SESSION_DAYS: i64 = 7;

/// Every key accepted by `config set`.
pub const KNOWN_SETTINGS: &[&str] = &[SETTING_PORT, SETTING_SESSION_DAYS];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    pub port: u16,
    pub session_days: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            session_days: DEFAULT_SESSION_DAYS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and database settings.
    /// Environment variables take precedence over database settings.
    pub fn load(db: &Database) -> TrackerResult<Self> {
        let port = match lookup(db, ENV_PORT, SETTING_PORT)? {
            Some(raw) => parse_port(&raw)?,
            None => DEFAULT_PORT,
        };

        let session_days = match lookup(db, ENV_SESSION_DAYS, SETTING_SESSION_DAYS)? {
            Some(raw) => parse_session_days(&raw)?,
            None => DEFAULT_SESSION_DAYS,
        };

        Ok(Self { port, session_days })
    }

    pub fn session_lifetime(&self) -> Duration {
        Duration::days(self.session_days)
    }
}

fn lookup(db: &Database, env_key: &str, setting_key: &str) -> TrackerResult<Option<String>> {
    if let Ok(value) = env::var(env_key) {
        if !value.trim().is_empty() {
            return Ok(Some(value));
        }
    }
    db.get_setting(setting_key)
}

fn parse_port(raw: &str) -> TrackerResult<u16> {
    raw.trim()
        .parse::<u16>()
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| TrackerError::invalid(format!("invalid port '{}'", raw)))
}

fn parse_session_days(raw: &str) -> TrackerResult<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|d| (1..=365).contains(d))
        .ok_or_else(|| TrackerError::invalid(format!("session days must be 1-365, got '{}'", raw)))
}

/// Validate a value before it is stored with `config set`.
pub fn validate_setting(key: &str, value: &str) -> TrackerResult<()> {
    match key {
        SETTING_PORT => parse_port(value).map(|_| ()),
        SETTING_SESSION_DAYS => parse_session_days(value).map(|_| ()),
        other => Err(TrackerError::invalid(format!(
            "unknown setting '{}' (known: {})",
            other,
            KNOWN_SETTINGS.join(", ")
        ))),
    }
}

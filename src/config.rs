//! Configuration loading and validation.
//!
//! Everything comes from the process environment (optionally seeded from a
//! `.env` file by the binary). Required variables fail fast at startup.
//!
//! Persistence is a single sqlx URL ([`ENV_DATABASE_URL`]) in place of
//! separate host, user, password and database-name settings.

use std::path::PathBuf;

use chrono::Duration;
use thiserror::Error;

use crate::guard::DEFAULT_COOLDOWN_MINUTES;

/// Bot API token.
pub const ENV_TELEGRAM_TOKEN: &str = "CUPID_TELEGRAM_TOKEN";
/// Chat id of the admin review chat.
pub const ENV_ADMIN_CHAT_ID: &str = "CUPID_ADMIN_CHAT_ID";
/// Public channel: numeric id or `@username`.
pub const ENV_CHANNEL_ID: &str = "CUPID_CHANNEL_ID";
/// Public link to the channel shown to users.
pub const ENV_CHANNEL_LINK: &str = "CUPID_CHANNEL_LINK";
/// sqlx database URL.
pub const ENV_DATABASE_URL: &str = "CUPID_DATABASE_URL";
/// Minutes between two valentines of the same user.
pub const ENV_COOLDOWN_MINUTES: &str = "CUPID_COOLDOWN_MINUTES";
/// Directory for the JSON log files; unset logs to stderr only.
pub const ENV_LOG_DIR: &str = "CUPID_LOG_DIR";

/// Database used when [`ENV_DATABASE_URL`] is unset.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://cupid.db";

/// Errors from reading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable has a value that cannot be used.
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// The offending value.
        value: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Runtime configuration of the bot.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Bot API token.
    pub telegram_token: String,
    /// Chat id of the admin review chat.
    pub admin_chat_id: i64,
    /// Public channel: numeric id or `@username`.
    pub channel_id: String,
    /// Public link to the channel, if configured.
    pub channel_link: Option<String>,
    /// sqlx database URL.
    pub database_url: String,
    /// Cooldown between two valentines of the same user, in minutes.
    pub cooldown_minutes: i64,
    /// Directory for the JSON log files, if file logging is enabled.
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Load the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration using a custom variable resolver.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// does not parse.
    pub fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |key: &str| {
            env(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let telegram_token = require(ENV_TELEGRAM_TOKEN)?;

        let raw_admin = require(ENV_ADMIN_CHAT_ID)?;
        let admin_chat_id = raw_admin
            .parse::<i64>()
            .map_err(|e| ConfigError::Invalid {
                var: ENV_ADMIN_CHAT_ID,
                value: raw_admin.clone(),
                reason: e.to_string(),
            })?;

        let channel_id = require(ENV_CHANNEL_ID)?;

        let cooldown_minutes = match lookup(ENV_COOLDOWN_MINUTES) {
            None => DEFAULT_COOLDOWN_MINUTES,
            Some(raw) => match raw.parse::<i64>() {
                Ok(minutes) if minutes >= 0 && Duration::try_minutes(minutes).is_some() => minutes,
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        var: ENV_COOLDOWN_MINUTES,
                        value: raw,
                        reason: "out of range".to_owned(),
                    })
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: ENV_COOLDOWN_MINUTES,
                        value: raw,
                        reason: e.to_string(),
                    })
                }
            },
        };

        Ok(Self {
            telegram_token,
            admin_chat_id,
            channel_id,
            channel_link: lookup(ENV_CHANNEL_LINK),
            database_url: Self::database_url_from(&lookup),
            cooldown_minutes,
            log_dir: lookup(ENV_LOG_DIR).map(PathBuf::from),
        })
    }

    /// Database URL from the process environment, falling back to
    /// [`DEFAULT_DATABASE_URL`]. Used by commands that need no bot settings.
    pub fn database_url() -> String {
        Self::database_url_from(&|key| std::env::var(key).ok())
    }

    fn database_url_from(env: &dyn Fn(&str) -> Option<String>) -> String {
        env(ENV_DATABASE_URL)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned())
    }

    /// Cooldown as a duration.
    pub fn cooldown(&self) -> Duration {
        Duration::minutes(self.cooldown_minutes)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("telegram_token", &"__REDACTED__")
            .field("admin_chat_id", &self.admin_chat_id)
            .field("channel_id", &self.channel_id)
            .field("channel_link", &self.channel_link)
            .field("database_url", &self.database_url)
            .field("cooldown_minutes", &self.cooldown_minutes)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

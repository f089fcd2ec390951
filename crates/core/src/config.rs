use crate::error::{Result, SyncError};

pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";
pub const CHANNEL_ID_ENV: &str = "YOUTUBE_CHANNEL_ID";
pub const API_BASE_ENV: &str = "YOUTUBE_API_BASE";

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

/// Settings for one channel poll. Secrets come from the environment, never from source.
#[derive(Clone)]
pub struct SyncConfig {
    pub api_key: String,
    pub channel_id: String,
    pub api_base: String,
}

impl SyncConfig {
    pub fn new(api_key: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            channel_id: channel_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Load from `YOUTUBE_API_KEY`, `YOUTUBE_CHANNEL_ID` and optional `YOUTUBE_API_BASE`.
    ///
    /// `channel_override` takes precedence over the environment when given.
    pub fn from_env(channel_override: Option<String>) -> Result<Self> {
        let api_key = required_env(API_KEY_ENV)?;
        let channel_id = match channel_override {
            Some(id) => id,
            None => required_env(CHANNEL_ID_ENV)?,
        };
        let api_base = optional_env(API_BASE_ENV).unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Self {
            api_key,
            channel_id,
            api_base,
        })
    }
}

// Keep the key out of logs.
impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("api_key", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

pub fn required_env(env_var: &str) -> Result<String> {
    optional_env(env_var).ok_or_else(|| SyncError::MissingConfig {
        env_var: env_var.to_string(),
    })
}

/// Unset and blank values are treated the same.
pub fn optional_env(env_var: &str) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

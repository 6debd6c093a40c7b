// config.rs
use crate::errors::ConfigError;
use crate::job_poller::PollPolicy;

use dotenv::dotenv;
use log::warn;
use std::env;
use std::time::Duration;

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-3.1-pro-preview";
pub const DEFAULT_LEONARDO_API_BASE: &str = "https://cloud.leonardo.ai/api/rest/v1";
pub const DEFAULT_LEONARDO_MODEL_ID: &str = "6bef9f1b-29cb-40c7-b9df-32b51c1f67d3";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
    pub chat_model: String,
    pub leonardo_api_key: Option<String>,
    pub leonardo_api_base: String,
    pub leonardo_model_id: String,
    pub leonardo_max_dimension: u32,
    pub poll_policy: PollPolicy,
    pub bind_addr: String,
    pub log_config: String,
    pub interactive: bool,
}

impl AppConfig {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let secret = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let interval_ms = parse_number(&lookup, "POLL_INTERVAL_MS", 2000u64)?;
        let max_attempts = parse_number(&lookup, "POLL_MAX_ATTEMPTS", 15u32)?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "POLL_MAX_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        Ok(AppConfig {
            gemini_api_key: secret("GEMINI_API_KEY"),
            gemini_api_base: text("GEMINI_API_BASE", DEFAULT_GEMINI_API_BASE),
            chat_model: text("CHAT_MODEL", DEFAULT_CHAT_MODEL),
            leonardo_api_key: secret("LEONARDO_API_KEY"),
            leonardo_api_base: text("LEONARDO_API_BASE", DEFAULT_LEONARDO_API_BASE),
            leonardo_model_id: text("LEONARDO_MODEL_ID", DEFAULT_LEONARDO_MODEL_ID),
            leonardo_max_dimension: parse_number(&lookup, "LEONARDO_MAX_DIMENSION", 1536u32)?,
            poll_policy: PollPolicy {
                interval: Duration::from_millis(interval_ms),
                max_attempts,
            },
            bind_addr: text("BIND_ADDR", "127.0.0.1:8080"),
            log_config: text("LOG_CONFIG", "log4rs.yaml"),
            interactive: parse_flag(&lookup, "INTERACTIVE", true)?,
        })
    }

    /// Missing keys are not fatal; the affected remote calls fail and fall back.
    pub fn warn_missing_keys(&self) {
        if self.gemini_api_key.is_none() {
            warn!("GEMINI_API_KEY not set; chat replies will fall back to the apology message");
        }
        if self.leonardo_api_key.is_none() {
            warn!("LEONARDO_API_KEY not set; image generation requests will be rejected");
        }
    }
}

fn parse_number<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(default),
    }
}

fn parse_flag<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue { key, value: v }),
        },
    }
}

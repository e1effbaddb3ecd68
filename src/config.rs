// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";

/// Upper bound for `WS_PING_INTERVAL_SECS`
pub const MAX_PING_INTERVAL_SECS: u64 = 3600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a valid {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    /// `None` keeps the feed in process memory.
    pub database: Option<DatabaseConfig>,
    pub openrouter: OpenRouterConfig,
    pub feed: FeedConfig,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    pub timeout_secs: u64,
    pub referer: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub event_buffer: usize,
    pub ping_interval_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENROUTER_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            timeout_secs: 30,
            referer: "http://localhost:3000".to_string(),
            title: "AI Chat Tool".to_string(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            event_buffer: 256,
            ping_interval_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database = match get("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 10, "number")?,
            }),
            None => None,
        };

        let defaults = OpenRouterConfig::default();
        let log_format = match get("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    expected: "log format (text|json)",
                    value: other.to_string(),
                })
            }
        };

        Ok(Config {
            server: ServerConfig {
                host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&get, "SERVER_PORT", 3000, "port number")?,
                enable_cors: parse_or(&get, "ENABLE_CORS", true, "boolean")?,
            },
            database,
            openrouter: OpenRouterConfig {
                api_key: get("OPENROUTER_API_KEY"),
                base_url: get("OPENROUTER_API_URL").unwrap_or(defaults.base_url),
                default_model: get("OPENROUTER_DEFAULT_MODEL").unwrap_or(defaults.default_model),
                timeout_secs: parse_or(&get, "OPENROUTER_TIMEOUT_SECS", defaults.timeout_secs, "number")?,
                referer: get("APP_REFERER").unwrap_or(defaults.referer),
                title: get("APP_TITLE").unwrap_or(defaults.title),
            },
            feed: FeedConfig {
                event_buffer: parse_or(&get, "FEED_EVENT_BUFFER", 256, "number")?,
                ping_interval_secs: parse_at_most(
                    &get,
                    "WS_PING_INTERVAL_SECS",
                    30,
                    MAX_PING_INTERVAL_SECS,
                    "number of seconds up to 3600",
                )?,
            },
            log_format,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_or<G, T>(get: &G, key: &'static str, default: T, expected: &'static str) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            expected,
            value,
        }),
        None => Ok(default),
    }
}

fn parse_at_most<G>(
    get: &G,
    key: &'static str,
    default: u64,
    max: u64,
    expected: &'static str,
) -> Result<u64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let value = parse_or(get, key, default, expected)?;
    if value > max {
        return Err(ConfigError::Invalid {
            key,
            expected,
            value: value.to_string(),
        });
    }
    Ok(value)
}

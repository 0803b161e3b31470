//! Configuration management for the server.

use bondsync_engine::{MappingPolicy, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use std::env;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Bearer token the producer must present, if set
    pub auth_secret: Option<String>,
    /// Remote table access
    pub feishu: FeishuConfig,
    /// Snapshot page size
    pub page_size: u32,
    /// What to do with records that fail to map
    pub mapping_policy: MappingPolicy,
}

/// Credentials and coordinates of the Bitable table.
#[derive(Debug, Clone)]
pub struct FeishuConfig {
    pub base_url: String,
    pub app_id: String,
    pub app_secret: String,
    /// Bitable app (base) token
    pub app_token: String,
    pub table_id: String,
    /// Per-request timeout; unset leaves the transport default
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let page_size = match lookup("PAGE_SIZE") {
            Some(value) => value
                .parse::<u32>()
                .ok()
                .filter(|n| (1..=MAX_PAGE_SIZE).contains(n))
                .ok_or(ConfigError::Invalid {
                    key: "PAGE_SIZE",
                    value,
                })?,
            None => DEFAULT_PAGE_SIZE,
        };

        let mapping_policy = match lookup("MAPPING_POLICY") {
            Some(value) => value.parse::<MappingPolicy>().map_err(|_| ConfigError::Invalid {
                key: "MAPPING_POLICY",
                value,
            })?,
            None => MappingPolicy::default(),
        };

        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(value) => Some(
                value
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| ConfigError::Invalid {
                        key: "REQUEST_TIMEOUT_SECS",
                        value,
                    })?,
            ),
            None => None,
        };

        let feishu = FeishuConfig {
            base_url: lookup("FEISHU_BASE_URL")
                .unwrap_or_else(|| "https://open.feishu.cn".to_string()),
            app_id: required("FEISHU_APP_ID")?,
            app_secret: required("FEISHU_APP_SECRET")?,
            app_token: required("FEISHU_APP_TOKEN")?,
            table_id: required("FEISHU_TABLE_ID")?,
            request_timeout,
        };

        let auth_secret = lookup("AUTH_SECRET").filter(|s| !s.is_empty());

        Ok(Self {
            host,
            port,
            auth_secret,
            feishu,
            page_size,
            mapping_policy,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("Invalid {key} value: {value}")]
    Invalid { key: &'static str, value: String },
}

//! Connection settings for `PropertyClient`.

use crate::error::ApiError;

/// Staging endpoint of the properties API.
pub const DEFAULT_BASE_URL: &str = "https://api.stagingeb.com/v1";

pub const API_KEY_ENV: &str = "EASYBROKER_API_KEY";
pub const BASE_URL_ENV: &str = "EASYBROKER_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
}

impl ClientConfig {
    pub fn new(api_key: &str) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Overrides the base URL; a trailing `/` is dropped.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Reads `EASYBROKER_API_KEY` (required) and `EASYBROKER_BASE_URL`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let api_key = lookup(API_KEY_ENV)
            .filter(|key| !key.is_empty())
            .ok_or(ApiError::MissingConfig(API_KEY_ENV))?;
        let config = Self::new(&api_key);
        Ok(match lookup(BASE_URL_ENV) {
            Some(url) if !url.is_empty() => config.with_base_url(&url),
            _ => config,
        })
    }
}

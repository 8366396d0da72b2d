use std::env;
use std::fmt;

use anyhow::{Result, anyhow};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const API_KEY_HELP_URL: &str = "https://makersuite.google.com/app/apikey";

pub const DEFAULT_MODEL: &str = "gemini-pro";
const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// API key wrapper whose `Debug` output never contains the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub model: String,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub api_key: Option<ApiKey>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        Self {
            model: get_var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base_url: get_var("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            request_timeout_secs: parse_request_timeout_secs(
                get_var("GEMINI_TIMEOUT_SECS").as_deref(),
            ),
            api_key: get_var(API_KEY_ENV)
                .filter(|value| !value.trim().is_empty())
                .map(ApiKey::new),
        }
    }

    /// Applies CLI overrides on top of the environment. The `--api-key`
    /// flag wins over `GEMINI_API_KEY`, `--model` over `GEMINI_MODEL`.
    pub fn with_overrides(mut self, model: Option<String>, api_key: Option<String>) -> Self {
        if let Some(model) = model {
            self.model = model;
        }
        if let Some(key) = api_key {
            self.api_key = Some(ApiKey::new(key));
        }
        self
    }

    /// Fails when no usable credential was found anywhere. The message
    /// carries the remediation steps printed to stderr before exit.
    pub fn require_api_key(&self) -> Result<&ApiKey> {
        self.api_key.as_ref().ok_or_else(|| {
            anyhow!(
                "{API_KEY_ENV} not found.\n\
                 Please set the {API_KEY_ENV} environment variable or use the --api-key option.\n\
                 You can get an API key from: {API_KEY_HELP_URL}"
            )
        })
    }
}

fn parse_request_timeout_secs(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
}

use std::env;
use std::time::Duration;

use url::Url;

use crate::errors::ConfigError;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 5;
pub const DEFAULT_RATE_LIMIT_WINDOW_MS: u64 = 60_000;

/// Deployment mode. Diagnostics are only logged outside production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    #[must_use]
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base endpoint of the generation backend, without a trailing slash.
    pub webhook_base_url: String,
    pub timeout: Duration,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window: Duration,
    pub environment: Environment,
}

impl AppConfig {
    /// Config with defaults for everything but the endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if `webhook_base_url` is not an absolute http(s) URL
    /// or embeds credentials.
    pub fn new(webhook_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            webhook_base_url: parse_base_url(webhook_base_url)?,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            rate_limit_max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            rate_limit_window: Duration::from_millis(DEFAULT_RATE_LIMIT_WINDOW_MS),
            environment: Environment::Production,
        })
    }

    /// # Errors
    ///
    /// Returns an error if `IMAGINAI_WEBHOOK_URL` is missing or any variable
    /// holds an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = env::var("IMAGINAI_WEBHOOK_URL")
            .map_err(|_| ConfigError::Missing("IMAGINAI_WEBHOOK_URL"))?;

        let mut config = Self::new(&base)?;

        if let Some(ms) = positive_var("IMAGINAI_TIMEOUT_MS")? {
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(max) = positive_var("IMAGINAI_RATE_LIMIT_MAX_REQUESTS")? {
            config.rate_limit_max_requests =
                u32::try_from(max).map_err(|e| ConfigError::Invalid {
                    name: "IMAGINAI_RATE_LIMIT_MAX_REQUESTS",
                    reason: e.to_string(),
                })?;
        }
        if let Some(ms) = positive_var("IMAGINAI_RATE_LIMIT_WINDOW_MS")? {
            config.rate_limit_window = Duration::from_millis(ms);
        }
        if let Ok(raw) = env::var("IMAGINAI_ENV") {
            config.environment = parse_environment(&raw)?;
        }

        Ok(config)
    }
}

fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        name: "IMAGINAI_WEBHOOK_URL",
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(invalid("credentials must not be embedded in the URL".to_string()));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn positive_var(name: &'static str) -> Result<Option<u64>, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(v) => Ok(Some(v)),
        Err(e) => Err(ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}

fn parse_environment(raw: &str) -> Result<Environment, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "production" | "prod" => Ok(Environment::Production),
        "development" | "dev" => Ok(Environment::Development),
        other => Err(ConfigError::Invalid {
            name: "IMAGINAI_ENV",
            reason: format!("expected 'production' or 'development', got '{other}'"),
        }),
    }
}

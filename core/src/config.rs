//! Client runtime configuration.
//!
//! Configuration is resolved once at startup and passed into the client,
//! prober and shell. Nothing in this crate reads the environment while
//! handling a request.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_HEALTH_TIMEOUT_MS: u64 = 5_000;
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 1_000;

/// Deployment environment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(format!(
                "Environment must be one of development, staging, production (got {other:?})"
            )),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        };
        f.write_str(name)
    }
}

/// Every violated constraint found while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Configuration validation failed: {}", .violations.join(", "))]
pub struct ConfigError {
    pub violations: Vec<String>,
}

/// Validated client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub request_timeout: Duration,
    pub health_timeout: Duration,
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub debug_logs: bool,
    pub mock_data_fallback: bool,
    pub items_per_page: u32,
    pub max_search_results: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            health_timeout: Duration::from_millis(DEFAULT_HEALTH_TIMEOUT_MS),
            app_name: "Drug Database".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            debug_logs: false,
            mock_data_fallback: false,
            items_per_page: 20,
            max_search_results: 100,
        }
    }
}

impl ClientConfig {
    /// Load from `DRUGDB_*` process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names, then validate.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let mut violations = Vec::new();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let request_timeout_ms = parse_or(
            get("DRUGDB_API_TIMEOUT"),
            DEFAULT_REQUEST_TIMEOUT_MS,
            "API timeout",
            &mut violations,
        );
        let health_timeout_ms = parse_or(
            get("DRUGDB_HEALTH_TIMEOUT"),
            DEFAULT_HEALTH_TIMEOUT_MS,
            "Health check timeout",
            &mut violations,
        );
        let items_per_page = parse_or(
            get("DRUGDB_ITEMS_PER_PAGE"),
            defaults.items_per_page,
            "Items per page",
            &mut violations,
        );
        let max_search_results = parse_or(
            get("DRUGDB_MAX_SEARCH_RESULTS"),
            defaults.max_search_results,
            "Max search results",
            &mut violations,
        );
        let environment = match get("DRUGDB_ENVIRONMENT") {
            Some(raw) => raw.parse().unwrap_or_else(|e: String| {
                violations.push(e);
                Environment::default()
            }),
            None => Environment::default(),
        };

        let config = Self {
            api_url: lookup("DRUGDB_API_URL").unwrap_or(defaults.api_url),
            request_timeout: Duration::from_millis(request_timeout_ms),
            health_timeout: Duration::from_millis(health_timeout_ms),
            app_name: get("DRUGDB_APP_NAME").unwrap_or(defaults.app_name),
            app_version: get("DRUGDB_APP_VERSION").unwrap_or(defaults.app_version),
            environment,
            debug_logs: flag(get("DRUGDB_ENABLE_DEBUG_LOGS")),
            mock_data_fallback: flag(get("DRUGDB_ENABLE_MOCK_DATA_FALLBACK")),
            items_per_page,
            max_search_results,
        };

        violations.extend(config.violations());
        if violations.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError { violations })
        }
    }

    fn violations(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.api_url.trim().is_empty() {
            errors.push("API URL is required".to_string());
        } else if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            errors.push("API URL must start with http:// or https://".to_string());
        }
        if self.request_timeout < Duration::from_millis(MIN_REQUEST_TIMEOUT_MS) {
            errors.push(format!("API timeout must be at least {MIN_REQUEST_TIMEOUT_MS}ms"));
        }
        if self.health_timeout.is_zero() {
            errors.push("Health check timeout must be greater than 0ms".to_string());
        }
        if !(1..=100).contains(&self.items_per_page) {
            errors.push("Items per page must be between 1 and 100".to_string());
        }
        if !(1..=1000).contains(&self.max_search_results) {
            errors.push("Max search results must be between 1 and 1000".to_string());
        }
        errors
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn shows_debug_info(&self) -> bool {
        self.debug_logs && self.is_development()
    }

    /// Default tracing level implied by the debug-log flag.
    pub fn log_level(&self) -> &'static str {
        if self.debug_logs {
            "debug"
        } else {
            "warn"
        }
    }
}

fn parse_or<N: FromStr>(raw: Option<String>, default: N, label: &str, violations: &mut Vec<String>) -> N {
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            violations.push(format!("{label} must be a whole number (got {raw:?})"));
            default
        }),
        None => default,
    }
}

fn flag(raw: Option<String>) -> bool {
    raw.map(|v| v.trim().eq_ignore_ascii_case("true")).unwrap_or(false)
}

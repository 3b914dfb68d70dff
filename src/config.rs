use std::{env, str::FromStr, time::Duration};

use secrecy::SecretString;

use crate::error::ConfigError;

pub const DEFAULT_MAX_PLUS_POINTS: i64 = 10;
pub const DEFAULT_DD_SITE: &str = "datadoghq.com";
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";
pub const DEFAULT_METRIC_NAME: &str = "test.hackathon.recognidog.points";
pub const DEFAULT_METRIC_ENV: &str = "hackathon";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Clamp, resolve and emit for qualifying `message` events.
    #[default]
    Full,
    /// Log-only handling of `+g` mentions. Eligibility differs from `Full`.
    Legacy,
}

impl FromStr for DispatchMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "legacy" => Ok(Self::Legacy),
            _ => Err(ConfigError::InvalidValue {
                key: "DISPATCH_MODE",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidValue {
                key: "LOG_FORMAT",
                value: value.to_string(),
            }),
        }
    }
}

/// Process-wide settings, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slack_bot_token: SecretString,
    pub slack_api_base: String,
    pub dd_api_key: SecretString,
    pub dd_site: String,
    pub max_plus_points: i64,
    pub metric_name: String,
    pub metric_env: String,
    pub mode: DispatchMode,
    pub http_timeout: Duration,
    pub ip: String,
    pub port: u16,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let slack_bot_token =
            get("SLACK_BOT_TOKEN").ok_or(ConfigError::MissingEnvVar("SLACK_BOT_TOKEN"))?;
        let dd_api_key = get("DD_API_KEY").ok_or(ConfigError::MissingEnvVar("DD_API_KEY"))?;

        Ok(Self {
            slack_bot_token: slack_bot_token.into(),
            slack_api_base: get("SLACK_API_BASE")
                .unwrap_or(DEFAULT_SLACK_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            dd_api_key: dd_api_key.into(),
            dd_site: get("DD_SITE").unwrap_or(DEFAULT_DD_SITE.to_string()),
            max_plus_points: parse_or(
                "MAX_PLUS_POINTS",
                get("MAX_PLUS_POINTS"),
                DEFAULT_MAX_PLUS_POINTS,
            )?,
            metric_name: get("RECOGNITION_METRIC").unwrap_or(DEFAULT_METRIC_NAME.to_string()),
            metric_env: get("RECOGNITION_ENV").unwrap_or(DEFAULT_METRIC_ENV.to_string()),
            mode: get("DISPATCH_MODE")
                .map(|v| v.parse::<DispatchMode>())
                .transpose()?
                .unwrap_or_default(),
            http_timeout: Duration::from_secs(parse_or(
                "HTTP_TIMEOUT_SECS",
                get("HTTP_TIMEOUT_SECS"),
                5,
            )?),
            ip: get("IP").unwrap_or("0.0.0.0".to_string()),
            port: parse_or("PORT", get("PORT"), 3000)?,
            log_format: get("LOG_FORMAT")
                .map(|v| v.parse::<LogFormat>())
                .transpose()?
                .unwrap_or_default(),
        })
    }

    pub fn metrics_url(&self) -> String {
        format!("https://api.{}/api/v2/series", self.dd_site)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

fn parse_or<T: FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

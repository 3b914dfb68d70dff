use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{0}`")]
    MissingEnvVar(&'static str),
    #[error("invalid value for `{key}`: `{value}`")]
    InvalidValue { key: &'static str, value: String },
}

/// Inbound webhook body could not be turned into a payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("body is not a JSON object")]
    NotAnObject,
    #[error("nested `body` field is not a string")]
    NestedBodyNotString,
}

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("slack request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("slack api returned an error: {0}")]
    Api(String),
    #[error("slack response is missing `{0}`")]
    MissingField(&'static str),
    #[error("bot token is not a valid header value")]
    InvalidToken,
}

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metrics request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api key is not a valid header value")]
    InvalidApiKey,
    #[error("metrics api rejected the submission with {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

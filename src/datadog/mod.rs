use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, info};

use crate::{error::MetricsError, recognition::MetricSubmission};

use self::payloads::SeriesPayload;

pub mod payloads;

/// Accepts metric observations.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn submit(&self, submission: &MetricSubmission) -> Result<(), MetricsError>;
}

#[derive(Debug, Clone)]
pub struct DatadogClient {
    client: reqwest::Client,
    url: String,
}

impl DatadogClient {
    pub fn new(
        api_key: &SecretString,
        url: String,
        timeout: Duration,
    ) -> Result<Self, MetricsError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|_| MetricsError::InvalidApiKey)?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static("dd-api-key"), key);

        Ok(Self {
            client: reqwest::Client::builder()
                .default_headers(headers)
                .timeout(timeout)
                .build()?,
            url,
        })
    }
}

#[async_trait]
impl MetricsSink for DatadogClient {
    async fn submit(&self, submission: &MetricSubmission) -> Result<(), MetricsError> {
        let payload = SeriesPayload::from(submission);
        debug!(
            event_name = "datadog.series.sending",
            payload = ?payload,
            "sending metric to datadog"
        );

        let res = self.client.post(&self.url).json(&payload).send().await?;
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        info!(
            event_name = "datadog.series.response",
            status = %status,
            body = %body,
            "datadog api response"
        );

        if !status.is_success() {
            return Err(MetricsError::Rejected { status, body });
        }

        Ok(())
    }
}

/// Submits one point stamped with the current time. Failures are logged and
/// reported as `false`, never raised.
pub async fn emit(
    sink: &dyn MetricsSink,
    metric_name: &str,
    value: i64,
    tags: Vec<String>,
) -> bool {
    let submission = MetricSubmission {
        metric_name: metric_name.to_string(),
        value,
        timestamp_seconds: Utc::now().timestamp(),
        tags,
    };

    match sink.submit(&submission).await {
        Ok(()) => true,
        Err(err) => {
            error!(
                event_name = "datadog.series.failed",
                metric = metric_name,
                error = %err,
                "metric submission failed"
            );
            false
        }
    }
}

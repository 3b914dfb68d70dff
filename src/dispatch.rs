use std::sync::Arc;

use tracing::{debug, error, info};

use crate::{
    config::{AppConfig, DispatchMode},
    datadog::{emit, MetricsSink},
    recognition::{RecognitionClaim, ResolvedIdentities},
    slack::{
        mention::extract_user_id,
        payloads::{InboundPayload, APP_MENTION, EVENT_CALLBACK, MESSAGE, URL_VERIFICATION},
        resolve_channel_name, resolve_user_name, IdentityLookup,
    },
};

/// What a single webhook delivery turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Echo of a `url_verification` challenge.
    Challenge(Option<String>),
    Processed(PointsReceipt),
    /// Legacy mode acknowledgement.
    Acknowledged,
    NotProcessed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsReceipt {
    pub sender: String,
    pub receiver: String,
    pub points: i64,
    pub channel: String,
}

/// Classifies inbound payloads and drives extraction, resolution and emission.
/// Holds no per-delivery state.
pub struct EventDispatcher {
    identity: Arc<dyn IdentityLookup>,
    metrics: Arc<dyn MetricsSink>,
    mode: DispatchMode,
    max_plus_points: i64,
    metric_name: String,
    metric_env: String,
}

impl EventDispatcher {
    pub fn new(
        config: &AppConfig,
        identity: Arc<dyn IdentityLookup>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            identity,
            metrics,
            mode: config.mode,
            max_plus_points: config.max_plus_points,
            metric_name: config.metric_name.clone(),
            metric_env: config.metric_env.clone(),
        }
    }

    pub async fn dispatch(&self, payload: &InboundPayload) -> DispatchOutcome {
        if payload.is(URL_VERIFICATION) {
            info!(
                event_name = "slack.url_verification",
                challenge = payload.challenge.as_deref().unwrap_or_default(),
                "responding to slack challenge"
            );
            return DispatchOutcome::Challenge(payload.challenge.clone());
        }

        match self.mode {
            DispatchMode::Full => self.dispatch_points(payload).await,
            DispatchMode::Legacy => self.dispatch_legacy(payload),
        }
    }

    async fn dispatch_points(&self, payload: &InboundPayload) -> DispatchOutcome {
        let Some(event) = payload.event.as_ref().filter(|_| payload.is(EVENT_CALLBACK)) else {
            debug!(
                event_name = "slack.event.ignored",
                payload_type = ?payload.r#type,
                "not an event callback"
            );
            return DispatchOutcome::NotProcessed;
        };

        if !event.is(MESSAGE) || event.subtype.is_some() {
            debug!(
                event_name = "slack.event.ignored",
                event_type = ?event.r#type,
                subtype = ?event.subtype,
                "not a plain message event"
            );
            return DispatchOutcome::NotProcessed;
        }

        let claim = match RecognitionClaim::from_event(event, self.max_plus_points) {
            Ok(claim) => claim,
            Err(reason) => {
                debug!(
                    event_name = "recognition.claim.rejected",
                    reason = ?reason,
                    "message does not grant points"
                );
                return DispatchOutcome::NotProcessed;
            }
        };

        let identities = self.resolve(&claim).await;
        info!(
            event_name = "recognition.points.granted",
            sender = %identities.sender_name,
            receiver = %identities.receiver_name,
            points = claim.clamped_points,
            channel = %identities.channel_name,
            "plus points granted"
        );

        let tags = identities.tags(&self.metric_env);
        if emit(self.metrics.as_ref(), &self.metric_name, claim.clamped_points, tags).await {
            info!(event_name = "recognition.metric.sent", "metric successfully sent");
        } else {
            error!(event_name = "recognition.metric.failed", "failed to send metric");
        }

        DispatchOutcome::Processed(PointsReceipt {
            sender: identities.sender_name,
            receiver: identities.receiver_name,
            points: claim.clamped_points,
            channel: identities.channel_name,
        })
    }

    async fn resolve(&self, claim: &RecognitionClaim) -> ResolvedIdentities {
        let identity = self.identity.as_ref();
        let (sender_name, receiver_name, channel_name) = tokio::join!(
            resolve_user_name(identity, &claim.sender_id),
            resolve_user_name(identity, &claim.receiver_id),
            resolve_channel_name(identity, &claim.channel_id),
        );

        ResolvedIdentities {
            sender_name,
            receiver_name,
            channel_name,
        }
    }

    // Log-only variant: any `message`/`app_mention` with `+g` and a mention,
    // mention count unchecked.
    fn dispatch_legacy(&self, payload: &InboundPayload) -> DispatchOutcome {
        let Some(event) = payload.event.as_ref() else {
            return DispatchOutcome::Acknowledged;
        };

        if event.is(MESSAGE) || event.is(APP_MENTION) {
            let text = event.text();
            if text.to_lowercase().contains("+g") {
                if let Some(receiver) = extract_user_id(text) {
                    info!(
                        event_name = "recognition.legacy.detected",
                        giver = event.user.as_deref().unwrap_or("unknown"),
                        receiver = %receiver,
                        "giver -> receiver +g"
                    );
                }
            }
        }

        DispatchOutcome::Acknowledged
    }
}

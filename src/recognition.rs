use crate::{
    points::{clamp_points, extract_numeric_value},
    slack::{mention::extract_user_ids, payloads::ChatEvent},
};

/// Facts pulled from one qualifying message. Lives for a single delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionClaim {
    pub sender_id: String,
    pub receiver_id: String,
    pub raw_points: i64,
    pub clamped_points: i64,
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentities {
    pub sender_name: String,
    pub receiver_name: String,
    pub channel_name: String,
}

/// One observation handed to the metrics backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSubmission {
    pub metric_name: String,
    pub value: i64,
    pub timestamp_seconds: i64,
    pub tags: Vec<String>,
}

/// Why a message event did not produce a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MentionCount(usize),
    NoPoints,
    MissingSender,
    MissingChannel,
}

impl RecognitionClaim {
    /// Builds a claim when the text names exactly one receiver and carries a
    /// `+N` token. The event's type and subtype are the caller's concern.
    pub fn from_event(event: &ChatEvent, max_points: i64) -> Result<Self, Rejection> {
        let text = event.text();
        let mut receivers = extract_user_ids(text);
        if receivers.len() != 1 {
            return Err(Rejection::MentionCount(receivers.len()));
        }
        let raw_points = extract_numeric_value(text).ok_or(Rejection::NoPoints)?;
        let sender_id = event.user.clone().ok_or(Rejection::MissingSender)?;
        let channel_id = event.channel.clone().ok_or(Rejection::MissingChannel)?;

        Ok(Self {
            sender_id,
            receiver_id: receivers.remove(0),
            raw_points,
            clamped_points: clamp_points(raw_points, max_points),
            channel_id,
        })
    }
}

impl ResolvedIdentities {
    /// Tags in a fixed order: env, sender, receiver, channel.
    pub fn tags(&self, env: &str) -> Vec<String> {
        vec![
            format!("env:{env}"),
            format!("sender:{}", self.sender_name),
            format!("receiver:{}", self.receiver_name),
            format!("channel:{}", self.channel_name),
        ]
    }
}

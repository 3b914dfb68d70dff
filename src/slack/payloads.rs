use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::PayloadError;

pub const URL_VERIFICATION: &str = "url_verification";
pub const EVENT_CALLBACK: &str = "event_callback";
pub const MESSAGE: &str = "message";
pub const APP_MENTION: &str = "app_mention";

/// Decoded Events API body. Every field is optional and fields of an
/// unexpected shape read as absent, so other event types still reach the
/// catch-all response.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct InboundPayload {
    #[serde(default, deserialize_with = "lenient_string")]
    pub r#type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub challenge: Option<String>,
    #[serde(default, deserialize_with = "lenient_event")]
    pub event: Option<ChatEvent>,
}

/// The fields of an Events API `event` this service reads. `team_join`,
/// `channel_created` and friends send `user` / `channel` as objects; those
/// come through as `None`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChatEvent {
    #[serde(default, deserialize_with = "lenient_string")]
    pub r#type: Option<String>,
    /// `Some` whenever the key is present, even as `null`.
    #[serde(default, deserialize_with = "present")]
    pub subtype: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub channel: Option<String>,
}

impl InboundPayload {
    pub fn is(&self, kind: &str) -> bool {
        self.r#type.as_deref() == Some(kind)
    }
}

impl ChatEvent {
    pub fn is(&self, kind: &str) -> bool {
        self.r#type.as_deref() == Some(kind)
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(Some(value)),
        _ => Ok(None),
    }
}

fn lenient_event<'de, D>(deserializer: D) -> Result<Option<ChatEvent>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Parses a webhook body that is either the payload itself or a wrapper whose
/// `body` field holds the payload as a JSON string.
pub fn parse_inbound(raw: &[u8]) -> Result<InboundPayload, PayloadError> {
    let outer: Value = serde_json::from_slice(raw)?;

    let nested: Option<Value> = match outer.get("body") {
        None => None,
        Some(Value::String(nested)) => Some(serde_json::from_str(nested)?),
        Some(_) => return Err(PayloadError::NestedBodyNotString),
    };
    let value = nested.unwrap_or(outer);

    if !value.is_object() {
        return Err(PayloadError::NotAnObject);
    }

    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_direct_payload() {
        let payload = parse_inbound(
            br#"{"type":"event_callback","event":{"type":"message","text":"<@U1> +2",
                "user":"U9","channel":"C1"}}"#,
        )
        .unwrap();

        assert!(payload.is(EVENT_CALLBACK));
        let event = payload.event.unwrap();
        assert!(event.is(MESSAGE));
        assert!(event.subtype.is_none());
        assert_eq!(event.text(), "<@U1> +2");
        assert_eq!(event.user.as_deref(), Some("U9"));
        assert_eq!(event.channel.as_deref(), Some("C1"));
    }

    #[test]
    fn parses_payload_wrapped_in_body_string() {
        let payload = parse_inbound(
            br#"{"body":"{\"type\":\"url_verification\",\"challenge\":\"abc123\"}"}"#,
        )
        .unwrap();

        assert!(payload.is(URL_VERIFICATION));
        assert_eq!(payload.challenge.as_deref(), Some("abc123"));
    }

    #[test]
    fn null_subtype_still_counts_as_present() {
        let payload = parse_inbound(
            br#"{"type":"event_callback","event":{"type":"message","subtype":null}}"#,
        )
        .unwrap();

        assert!(payload.event.unwrap().subtype.is_some());
    }

    #[test]
    fn unknown_fields_and_missing_event_are_fine() {
        let payload = parse_inbound(br#"{"type":"something_else","team_id":"T1"}"#).unwrap();

        assert!(!payload.is(EVENT_CALLBACK));
        assert!(payload.event.is_none());
    }

    #[test]
    fn object_valued_user_and_channel_read_as_absent() {
        let team_join = parse_inbound(
            br#"{"type":"event_callback","event":{"type":"team_join",
                "user":{"id":"U1","name":"ada","profile":{"real_name":"Ada"}}}}"#,
        )
        .unwrap();
        let event = team_join.event.unwrap();
        assert!(event.is("team_join"));
        assert!(event.user.is_none());

        let channel_created = parse_inbound(
            br#"{"type":"event_callback","event":{"type":"channel_created",
                "channel":{"id":"C1","name":"general","creator":"U1"}}}"#,
        )
        .unwrap();
        let event = channel_created.event.unwrap();
        assert!(event.is("channel_created"));
        assert!(event.channel.is_none());
    }

    #[test]
    fn odd_field_shapes_do_not_fail_the_payload() {
        let payload = parse_inbound(
            br#"{"type":"event_callback","challenge":7,"event":{"type":"message","text":["x"]}}"#,
        )
        .unwrap();
        assert!(payload.challenge.is_none());
        assert_eq!(payload.event.unwrap().text(), "");

        let payload = parse_inbound(br#"{"type":"event_callback","event":"nope"}"#).unwrap();
        assert!(payload.event.is_none());
    }

    #[test]
    fn rejects_malformed_bodies() {
        assert!(matches!(parse_inbound(b"not json"), Err(PayloadError::Json(_))));
        assert!(matches!(parse_inbound(br#"{"body":"{oops"}"#), Err(PayloadError::Json(_))));
        assert!(matches!(
            parse_inbound(br#"{"body":{"type":"url_verification"}}"#),
            Err(PayloadError::NestedBodyNotString)
        ));
        assert!(matches!(parse_inbound(b"[1,2]"), Err(PayloadError::NotAnObject)));
    }
}

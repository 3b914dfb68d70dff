use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Response,
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, error};

use crate::error::SlackError;

pub mod mention;
pub mod payloads;

/// Turns opaque Slack ids into display names.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn user_name(&self, user_id: &str) -> Result<String, SlackError>;
    async fn channel_name(&self, channel_id: &str) -> Result<String, SlackError>;
}

#[derive(Debug, Clone)]
pub struct SlackApp {
    client: reqwest::Client,
    api_base: String,
}

impl SlackApp {
    pub fn new(
        token: &SecretString,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, SlackError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| SlackError::InvalidToken)?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        Ok(Self {
            client: reqwest::Client::builder()
                .default_headers(headers)
                .timeout(timeout)
                .build()?,
            api_base: api_base.to_string(),
        })
    }

    async fn validate_slack(&self, response: Response) -> Result<Value, SlackError> {
        let data: Value = response.json().await?;
        debug!(event_name = "slack.api.response", response = %data, "slack api response");

        if data["ok"].as_bool() != Some(true) {
            let reason = data["error"].as_str().unwrap_or("unknown_error");
            return Err(SlackError::Api(reason.to_string()));
        }

        Ok(data)
    }

    async fn get(&self, method: &str, query: [(&str, &str); 1]) -> Result<Value, SlackError> {
        let res = self
            .client
            .get(format!("{}/{}", self.api_base, method))
            .query(&query)
            .send()
            .await?;

        self.validate_slack(res).await
    }
}

#[async_trait]
impl IdentityLookup for SlackApp {
    async fn user_name(&self, user_id: &str) -> Result<String, SlackError> {
        let data = self.get("users.info", [("user", user_id)]).await?;
        parse_user_name(&data)
    }

    async fn channel_name(&self, channel_id: &str) -> Result<String, SlackError> {
        let data = self.get("conversations.info", [("channel", channel_id)]).await?;
        parse_channel_name(&data)
    }
}

fn parse_user_name(data: &Value) -> Result<String, SlackError> {
    data["user"]["real_name"]
        .as_str()
        .map(str::to_string)
        .ok_or(SlackError::MissingField("user.real_name"))
}

fn parse_channel_name(data: &Value) -> Result<String, SlackError> {
    data["channel"]["name"]
        .as_str()
        .map(str::to_string)
        .ok_or(SlackError::MissingField("channel.name"))
}

/// Display name for `user_id`, or the id itself when the lookup fails.
pub async fn resolve_user_name(lookup: &dyn IdentityLookup, user_id: &str) -> String {
    match lookup.user_name(user_id).await {
        Ok(name) => name,
        Err(err) => {
            error!(
                event_name = "slack.user_lookup.failed",
                user_id,
                error = %err,
                "failed to get user info"
            );
            user_id.to_string()
        }
    }
}

/// Channel name for `channel_id`, or the id itself when the lookup fails.
pub async fn resolve_channel_name(lookup: &dyn IdentityLookup, channel_id: &str) -> String {
    match lookup.channel_name(channel_id).await {
        Ok(name) => name,
        Err(err) => {
            error!(
                event_name = "slack.channel_lookup.failed",
                channel_id,
                error = %err,
                "failed to get channel info"
            );
            channel_id.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        extract::Query,
        http::StatusCode,
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use serde_json::json;

    use super::*;

    struct Directory;

    #[async_trait]
    impl IdentityLookup for Directory {
        async fn user_name(&self, user_id: &str) -> Result<String, SlackError> {
            match user_id {
                "U1" => Ok("Ada Lovelace".to_string()),
                _ => Err(SlackError::Api("user_not_found".to_string())),
            }
        }

        async fn channel_name(&self, _channel_id: &str) -> Result<String, SlackError> {
            Err(SlackError::MissingField("channel.name"))
        }
    }

    #[test]
    fn reads_names_from_successful_responses() {
        let user = json!({"ok": true, "user": {"id": "U1", "real_name": "Ada Lovelace"}});
        let channel = json!({"ok": true, "channel": {"id": "C1", "name": "general"}});

        assert_eq!(parse_user_name(&user).unwrap(), "Ada Lovelace");
        assert_eq!(parse_channel_name(&channel).unwrap(), "general");
    }

    #[test]
    fn missing_name_fields_are_errors() {
        let user = json!({"ok": true, "user": {"id": "U1"}});
        let channel = json!({"ok": true});

        assert!(matches!(
            parse_user_name(&user),
            Err(SlackError::MissingField("user.real_name"))
        ));
        assert!(matches!(
            parse_channel_name(&channel),
            Err(SlackError::MissingField("channel.name"))
        ));
    }

    #[tokio::test]
    async fn resolution_falls_back_to_raw_ids() {
        assert_eq!(resolve_user_name(&Directory, "U1").await, "Ada Lovelace");
        assert_eq!(resolve_user_name(&Directory, "U404").await, "U404");
        assert_eq!(resolve_channel_name(&Directory, "C1").await, "C1");
    }

    async fn users_info(
        headers: axum::http::HeaderMap,
        Query(query): Query<HashMap<String, String>>,
    ) -> axum::response::Response {
        let bearer = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        if bearer != Some("Bearer xoxb-test") {
            return Json(json!({"ok": false, "error": "invalid_auth"})).into_response();
        }

        match query.get("user").map(String::as_str) {
            Some("U1") => {
                Json(json!({"ok": true, "user": {"id": "U1", "real_name": "Ada Lovelace"}}))
                    .into_response()
            }
            Some("U500") => (StatusCode::BAD_GATEWAY, "<html>upstream down</html>").into_response(),
            _ => Json(json!({"ok": false, "error": "user_not_found"})).into_response(),
        }
    }

    async fn conversations_info(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
        match query.get("channel").map(String::as_str) {
            Some("C1") => Json(json!({"ok": true, "channel": {"id": "C1", "name": "kudos"}})),
            _ => Json(json!({"ok": false, "error": "channel_not_found"})),
        }
    }

    async fn slack_stub(token: &str) -> SlackApp {
        let router = Router::new()
            .route("/users.info", get(users_info))
            .route("/conversations.info", get(conversations_info));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        let token: SecretString = token.to_string().into();
        SlackApp::new(&token, &format!("http://{addr}"), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn looks_up_names_with_bearer_token() {
        let app = slack_stub("xoxb-test").await;

        assert_eq!(app.user_name("U1").await.unwrap(), "Ada Lovelace");
        assert_eq!(app.channel_name("C1").await.unwrap(), "kudos");
    }

    #[tokio::test]
    async fn ok_false_becomes_api_error() {
        let app = slack_stub("xoxb-test").await;

        let err = app.user_name("U404").await.unwrap_err();
        assert!(matches!(err, SlackError::Api(ref reason) if reason == "user_not_found"));

        let err = app.channel_name("C404").await.unwrap_err();
        assert!(matches!(err, SlackError::Api(ref reason) if reason == "channel_not_found"));
    }

    #[tokio::test]
    async fn wrong_token_is_rejected_by_slack() {
        let app = slack_stub("xoxb-wrong").await;

        let err = app.user_name("U1").await.unwrap_err();
        assert!(matches!(err, SlackError::Api(ref reason) if reason == "invalid_auth"));
        assert_eq!(resolve_user_name(&app, "U1").await, "U1");
    }

    #[tokio::test]
    async fn non_json_reply_falls_back_to_raw_id() {
        let app = slack_stub("xoxb-test").await;

        assert!(matches!(app.user_name("U500").await, Err(SlackError::Http(_))));
        assert_eq!(resolve_user_name(&app, "U500").await, "U500");
    }

    #[tokio::test]
    async fn unreachable_api_falls_back_to_raw_ids() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let token: SecretString = "xoxb-test".to_string().into();
        let app = SlackApp::new(&token, &format!("http://{addr}"), Duration::from_secs(1)).unwrap();

        assert_eq!(resolve_user_name(&app, "U1").await, "U1");
        assert_eq!(resolve_channel_name(&app, "C1").await, "C1");
    }
}

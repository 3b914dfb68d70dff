use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{debug, error};

use crate::{
    dispatch::{DispatchOutcome, PointsReceipt},
    slack::payloads::parse_inbound,
    ServerState,
};

pub fn get_router() -> Router<ServerState> {
    Router::new()
        .route("/", get(root))
        .route("/slack/events", post(slack_events))
}

async fn root() -> &'static str {
    "Hello, Recognition Points!"
}

async fn slack_events(State(state): State<ServerState>, body: Bytes) -> Response {
    debug!(event_name = "slack.webhook.raw", body = %String::from_utf8_lossy(&body), "raw event");

    let payload = match parse_inbound(&body) {
        Ok(payload) => payload,
        Err(err) => {
            error!(event_name = "slack.webhook.invalid_body", error = %err, "failed to parse body");
            let body = Json(json!({"error": "invalid body"}));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }
    };

    state.dispatcher.dispatch(&payload).await.into_response()
}

impl IntoResponse for DispatchOutcome {
    fn into_response(self) -> Response {
        let body = match self {
            DispatchOutcome::Challenge(challenge) => json!({ "challenge": challenge }),
            DispatchOutcome::Processed(PointsReceipt {
                sender,
                receiver,
                points,
                channel,
            }) => json!({
                "message": "Plus points event processed",
                "sender": sender,
                "receiver": receiver,
                "points": points,
                "channel": channel,
            }),
            DispatchOutcome::Acknowledged => json!({ "ok": true }),
            DispatchOutcome::NotProcessed => {
                json!({ "message": "Event received but not processed" })
            }
        };

        (StatusCode::OK, Json(body)).into_response()
    }
}

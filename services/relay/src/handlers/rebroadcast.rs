use axum::{
    Form, Json,
    extract::State,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::repository::{EventPublisher, WorkQueue};
use crate::error::RelayServiceError;
use crate::state::AppState;
use crate::usecase::rebroadcast::Broadcaster;

// ── POST /xgds_core/rest/rebroadcast/sse/ ────────────────────────────────────

#[derive(Deserialize)]
pub struct RebroadcastRequest {
    pub channel: String,
    #[serde(rename = "sseType")]
    pub sse_type: String,
    #[serde(rename = "jsonString")]
    pub json_string: String,
    #[serde(rename = "eventTime")]
    pub event_time: String,
}

/// Queue a remote site's event for timed publication; never publishes inline.
pub async fn rebroadcast_sse<Q, P>(
    State(broadcaster): State<Broadcaster<Q, P>>,
    Form(body): Form<RebroadcastRequest>,
) -> Result<Json<Value>, RelayServiceError>
where
    Q: WorkQueue + Clone + 'static,
    P: EventPublisher + Clone + 'static,
{
    let publish_time = broadcaster
        .accept_remote(&body.channel, &body.sse_type, &body.json_string, &body.event_time)
        .await?;
    Ok(Json(json!({
        "channel": body.channel,
        "publishTime": xgds_core::serde::to_iso8601(&publish_time),
    })))
}

// ── GET /xgds_core/sse/activeChannels/ ───────────────────────────────────────

pub async fn active_channels(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.config.sse_channels.clone())
}

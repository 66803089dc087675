use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::repository::RelayEventRepository;
use crate::domain::types::{RelayEvent, RelayUpload};
use crate::error::RelayServiceError;
use crate::state::AppState;
use crate::usecase::receive::{
    HandlerRegistry, ReceiveOutcome, ReceiveRelayUseCase, parse_relay_form,
};

// ── POST /xgds_core/rest/relay/ ──────────────────────────────────────────────

pub async fn receive_relay(
    State(handlers): State<Arc<HandlerRegistry>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, RelayServiceError> {
    let mut fields = HashMap::new();
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RelayServiceError::InvalidRelayForm(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match field.file_name().map(str::to_owned) {
            Some(file_name) => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| RelayServiceError::InvalidRelayForm(e.to_string()))?;
                files.push(RelayUpload {
                    file_key: name,
                    file_name,
                    bytes,
                });
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| RelayServiceError::InvalidRelayForm(e.to_string()))?;
                fields.insert(name, text);
            }
        }
    }

    let payload = parse_relay_form(fields, files)?;
    let usecase = ReceiveRelayUseCase {
        handlers: &handlers,
    };
    match usecase.execute(payload).await? {
        ReceiveOutcome::Exists(existing) => Ok(Json(json!({
            "exists": "true",
            "json": existing,
        }))),
        ReceiveOutcome::Applied(applied) => Ok(Json(applied)),
    }
}

// ── GET /xgds_core/rest/relay/pending/ ───────────────────────────────────────

pub const DEFAULT_PENDING_LIMIT: u64 = 100;

#[derive(Deserialize)]
pub struct PendingQuery {
    pub limit: Option<u64>,
}

#[derive(Serialize)]
pub struct PendingRelayResponse {
    pub id: i64,
    pub content_type: String,
    pub object_id: i64,
    pub url: String,
    pub is_update: bool,
    pub hostname: String,
    #[serde(serialize_with = "xgds_core::serde::to_rfc3339_ms_opt")]
    pub acquisition_time: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(serialize_with = "xgds_core::serde::to_rfc3339_ms_opt")]
    pub relay_start_time: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<RelayEvent> for PendingRelayResponse {
    fn from(event: RelayEvent) -> Self {
        Self {
            id: event.id.0,
            content_type: event.content_type.to_string(),
            object_id: event.object_id.0,
            url: event.url,
            is_update: event.is_update,
            hostname: event.hostname,
            acquisition_time: event.acquisition_time,
            relay_start_time: event.relay_start_time,
        }
    }
}

pub async fn list_pending(
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<Vec<PendingRelayResponse>>, RelayServiceError> {
    let limit = query.limit.unwrap_or(DEFAULT_PENDING_LIMIT);
    let events = state.relay_event_repo().list_undelivered(limit).await?;
    Ok(Json(events.into_iter().map(Into::into).collect()))
}

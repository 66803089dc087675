use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use xgds_domain::content_type::ContentType;
use xgds_domain::id::{ObjectId, RelayEventId};

/// A local data change waiting to be (or already) delivered to remote sites.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayEvent {
    pub id: RelayEventId,
    pub content_type: ContentType,
    pub object_id: ObjectId,
    pub acquisition_time: Option<DateTime<Utc>>,
    pub relay_start_time: Option<DateTime<Utc>>,
    pub relay_success_time: Option<DateTime<Utc>>,
    /// Opaque snapshot of the record, posted verbatim.
    pub serialized_form: String,
    /// Ingestion path on the remote site, relative to its base URL.
    pub url: String,
    pub is_update: bool,
    /// Origin site identifier.
    pub hostname: String,
}

impl RelayEvent {
    pub fn is_delivered(&self) -> bool {
        self.relay_success_time.is_some()
    }

    /// Form fields posted to the remote receive endpoint.
    pub fn serialized_data(&self) -> Vec<(&'static str, String)> {
        vec![
            ("object_id", self.object_id.to_string()),
            ("content_type_app_label", self.content_type.app_label.clone()),
            ("content_type_model", self.content_type.model.clone()),
            ("url", self.url.clone()),
            ("serialized_form", self.serialized_form.clone()),
            ("is_update", python_bool(self.is_update).to_owned()),
        ]
    }
}

// The receive side of older sites compares against Python's `str(bool)`.
fn python_bool(v: bool) -> &'static str {
    if v { "True" } else { "False" }
}

/// Fields for a relay event that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewRelayEvent {
    pub content_type: ContentType,
    pub object_id: ObjectId,
    pub acquisition_time: Option<DateTime<Utc>>,
    pub serialized_form: String,
    pub url: String,
    pub is_update: bool,
    pub hostname: String,
}

/// An attachment stored alongside a relay event.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayFile {
    pub id: i64,
    pub relay_event_id: RelayEventId,
    /// Multipart field name used on delivery.
    pub file_key: String,
    /// Path relative to the media root.
    pub path: String,
}

impl RelayFile {
    /// The name the file was uploaded with. Stored files are named
    /// `<32 hex digits>_<name>`; that prefix is dropped so it does not pile
    /// up on every hop.
    pub fn upload_name(&self) -> &str {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        match name.split_once('_') {
            Some((prefix, rest))
                if prefix.len() == 32 && prefix.bytes().all(|b| b.is_ascii_hexdigit()) =>
            {
                rest
            }
            _ => name,
        }
    }
}

/// An attachment as handed to `addRelay`, before it is written to disk.
#[derive(Debug, Clone)]
pub struct RelayUpload {
    pub file_key: String,
    pub file_name: String,
    pub bytes: Bytes,
}

/// Anything that can be relayed: a stored record identified by content type and key.
pub trait Relayable {
    fn content_type(&self) -> ContentType;
    fn object_id(&self) -> ObjectId;
    fn acquisition_time(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// Entry on the relay queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayQueueEntry {
    pub relay_event_pk: RelayEventId,
}

impl RelayQueueEntry {
    pub fn new(id: RelayEventId) -> Self {
        Self { relay_event_pk: id }
    }

    /// Encode exactly as `json.dumps` does, since operators remove entries by value.
    pub fn encode(&self) -> String {
        format!("{{\"relay_event_pk\": {}}}", self.relay_event_pk)
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallMethod {
    #[default]
    Get,
    Post,
}

/// A deferred outbound HTTP call, queued for the session manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallDescriptor {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub method: CallMethod,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// Live-update message as seen by browsers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SseMessage {
    #[serde(rename = "type")]
    pub sse_type: String,
    pub data: serde_json::Value,
}

impl SseMessage {
    pub fn new(sse_type: impl Into<String>, json: impl Into<String>) -> Self {
        Self {
            sse_type: sse_type.into(),
            data: serde_json::Value::String(json.into()),
        }
    }
}

/// A message to publish on `channel` no earlier than `publish_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebroadcastDescriptor {
    pub channel: String,
    #[serde(rename = "publishTime")]
    pub publish_time: String,
    #[serde(rename = "messageString")]
    pub message: SseMessage,
}

/// A relay delivery as received by this site.
#[derive(Debug, Clone)]
pub struct RelayPayload {
    pub content_type: ContentType,
    pub object_id: ObjectId,
    pub is_update: bool,
    pub url: String,
    pub fields: serde_json::Map<String, serde_json::Value>,
    pub files: Vec<RelayUpload>,
}

/// Whole-call attempts made by the session manager for one descriptor.
pub const MAX_SEND_ATTEMPTS: u32 = 3;

/// Pause between session manager attempts.
pub const SLEEP_TIME: Duration = Duration::from_secs(5);

/// Per-request timeout for session manager calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Transport-level retries on connection failures, per call.
pub const HTTP_RETRIES: u32 = 3;

/// Name of the Constant holding the delay before a new relay event is fired.
pub const RELAY_DELAY_CONSTANT: &str = "relay_delay_seconds";

/// Media subdirectory for relay attachments.
pub const RELAY_MEDIA_DIR: &str = "relay";

pub const RELAY_PATH: &str = "/xgds_core/rest/relay/";
pub const REBROADCAST_PATH: &str = "/xgds_core/rest/rebroadcast/sse/";

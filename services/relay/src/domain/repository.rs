//! Ports used by the relay use cases and workers.
//!
//! Methods return `Send` futures so generic workers can be spawned on the
//! multi-threaded runtime; implementations are free to use `async fn`.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use xgds_domain::content_type::ContentType;
use xgds_domain::id::{ObjectId, RelayEventId};

use crate::domain::types::{CallDescriptor, NewRelayEvent, RelayEvent, RelayFile, RelayPayload};
use crate::error::RelayServiceError;

/// Repository for relay events and their attachments.
pub trait RelayEventRepository: Send + Sync {
    fn find_by_id(
        &self,
        id: RelayEventId,
    ) -> impl Future<Output = Result<Option<RelayEvent>, RelayServiceError>> + Send;

    /// Find the undelivered, non-update event for a target, if any.
    fn find_pending(
        &self,
        content_type: &ContentType,
        object_id: ObjectId,
        hostname: &str,
    ) -> impl Future<Output = Result<Option<RelayEvent>, RelayServiceError>> + Send;

    fn create(
        &self,
        event: &NewRelayEvent,
    ) -> impl Future<Output = Result<RelayEvent, RelayServiceError>> + Send;

    fn add_file(
        &self,
        event_id: RelayEventId,
        file_key: &str,
        path: &str,
    ) -> impl Future<Output = Result<RelayFile, RelayServiceError>> + Send;

    fn list_files(
        &self,
        event_id: RelayEventId,
    ) -> impl Future<Output = Result<Vec<RelayFile>, RelayServiceError>> + Send;

    fn mark_started(
        &self,
        id: RelayEventId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), RelayServiceError>> + Send;

    /// Stamp `relay_success_time`. A no-op for an event that is already delivered.
    fn mark_succeeded(
        &self,
        id: RelayEventId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), RelayServiceError>> + Send;

    /// Undelivered events, oldest first.
    fn list_undelivered(
        &self,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<RelayEvent>, RelayServiceError>> + Send;
}

/// Blob storage for relay attachments, addressed by media-relative paths.
pub trait RelayFileStore: Send + Sync {
    /// Store `bytes` under `dir` and return the relative path written.
    fn save(
        &self,
        dir: &str,
        file_name: &str,
        bytes: Bytes,
    ) -> impl Future<Output = Result<String, RelayServiceError>> + Send;

    fn read(&self, path: &str) -> impl Future<Output = Result<Bytes, RelayServiceError>> + Send;
}

/// Named tunables stored in the `constants` table.
pub trait ConstantRepository: Send + Sync {
    fn find_value(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, RelayServiceError>> + Send;
}

/// Auto-increment settings of the local database shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoIncrement {
    pub offset: i64,
    pub increment: i64,
}

pub trait ShardInfo: Send + Sync {
    fn auto_increment(
        &self,
    ) -> impl Future<Output = Result<AutoIncrement, RelayServiceError>> + Send;
}

/// Durable FIFO lists shared between processes.
///
/// Producers push on the left and consumers take from the right, so the
/// oldest entry of a list is its rightmost element.
pub trait WorkQueue: Send + Sync {
    /// LPUSH.
    fn push(&self, key: &str, value: &str)
    -> impl Future<Output = Result<(), RelayServiceError>> + Send;

    /// RPUSH, for lists consumed from the left.
    fn push_back(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), RelayServiceError>> + Send;

    /// BRPOP, waiting at most `timeout`.
    fn pop_blocking(
        &self,
        key: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<String>, RelayServiceError>> + Send;

    /// BLPOP, waiting at most `timeout`.
    fn pop_front_blocking(
        &self,
        key: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<String>, RelayServiceError>> + Send;

    /// BRPOPLPUSH: atomically move the oldest entry of `src` onto `dst`.
    fn move_blocking(
        &self,
        src: &str,
        dst: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<String>, RelayServiceError>> + Send;

    /// Oldest entry without removing it.
    fn peek_oldest(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, RelayServiceError>> + Send;

    /// Remove one occurrence of `value`, searching from the oldest end.
    fn remove(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<u64, RelayServiceError>> + Send;

    /// Remove every occurrence of `value`.
    fn remove_all(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<u64, RelayServiceError>> + Send;

    fn len(&self, key: &str) -> impl Future<Output = Result<u64, RelayServiceError>> + Send;

    /// All entries, newest first.
    fn list(&self, key: &str)
    -> impl Future<Output = Result<Vec<String>, RelayServiceError>> + Send;
}

/// Local publish/subscribe channel feeding the SSE endpoints.
pub trait EventPublisher: Send + Sync {
    fn publish(
        &self,
        channel: &str,
        message: &str,
    ) -> impl Future<Output = Result<(), RelayServiceError>> + Send;
}

/// Executes a queued HTTP call; yields the response status.
pub trait UrlCaller: Send + Sync {
    fn call_url(
        &self,
        call: &CallDescriptor,
    ) -> impl Future<Output = Result<u16, RelayServiceError>> + Send;
}

/// Applies relayed payloads of one content type on the receiving site.
#[async_trait::async_trait]
pub trait RecordHandler: Send + Sync {
    /// Current JSON form of the record, if it already exists here.
    async fn find_existing(
        &self,
        object_id: ObjectId,
    ) -> Result<Option<serde_json::Value>, RelayServiceError>;

    async fn apply(&self, payload: RelayPayload) -> Result<serde_json::Value, RelayServiceError>;
}

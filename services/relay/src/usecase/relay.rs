use std::time::Duration;

use chrono::{DateTime, Utc};

use xgds_domain::content_type::ContentType;
use xgds_domain::id::{ObjectId, RelayEventId};

use crate::domain::repository::{
    ConstantRepository, RelayEventRepository, RelayFileStore, ShardInfo, WorkQueue,
};
use crate::domain::types::{
    NewRelayEvent, RELAY_DELAY_CONSTANT, RELAY_MEDIA_DIR, RelayEvent, RelayQueueEntry,
    RelayUpload, Relayable,
};
use crate::error::RelayServiceError;
use crate::usecase::guard::ShardGuard;

// ── fireRelay ─────────────────────────────────────────────────────────────────

/// Queue a stored event on the shared pending queue and stamp its start time.
#[derive(Clone)]
pub struct FireRelayUseCase<Q, R>
where
    Q: WorkQueue,
    R: RelayEventRepository,
{
    pub queue: Q,
    pub events: R,
    pub relay_channel: String,
}

impl<Q, R> FireRelayUseCase<Q, R>
where
    Q: WorkQueue,
    R: RelayEventRepository,
{
    pub async fn execute(&self, id: RelayEventId) -> Result<(), RelayServiceError> {
        self.queue
            .push(&self.relay_channel, &RelayQueueEntry::new(id).encode())
            .await?;
        self.events.mark_started(id, Utc::now()).await?;
        tracing::info!(event_id = %id, channel = %self.relay_channel, "relay queued");
        Ok(())
    }
}

// ── addRelay ──────────────────────────────────────────────────────────────────

pub struct AddRelayInput {
    pub content_type: ContentType,
    pub object_id: ObjectId,
    pub acquisition_time: Option<DateTime<Utc>>,
    pub files: Vec<RelayUpload>,
    pub serialized_form: String,
    pub url: String,
    pub broadcast: bool,
    pub update: bool,
}

impl AddRelayInput {
    /// A broadcast, non-update relay of `record` with no attachments.
    pub fn for_record(record: &impl Relayable, serialized_form: String, url: String) -> Self {
        Self {
            content_type: record.content_type(),
            object_id: record.object_id(),
            acquisition_time: record.acquisition_time(),
            files: Vec::new(),
            serialized_form,
            url,
            broadcast: true,
            update: false,
        }
    }

    pub fn with_files(mut self, files: Vec<RelayUpload>) -> Self {
        self.files = files;
        self
    }

    pub fn update(mut self) -> Self {
        self.update = true;
        self
    }

    pub fn without_broadcast(mut self) -> Self {
        self.broadcast = false;
        self
    }
}

pub struct AddRelayUseCase<R, F, C, S, Q>
where
    R: RelayEventRepository + Clone + 'static,
    F: RelayFileStore,
    C: ConstantRepository,
    S: ShardInfo,
    Q: WorkQueue + Clone + 'static,
{
    pub events: R,
    pub files: F,
    pub constants: C,
    pub guard: ShardGuard<S>,
    pub queue: Q,
    pub relay_channel: String,
    pub hostname: String,
}

impl<R, F, C, S, Q> AddRelayUseCase<R, F, C, S, Q>
where
    R: RelayEventRepository + Clone + 'static,
    F: RelayFileStore,
    C: ConstantRepository,
    S: ShardInfo,
    Q: WorkQueue + Clone + 'static,
{
    /// Record a relay event for a local change.
    ///
    /// Returns `None` when the record came from another site and must not be
    /// echoed back. Queueing failures are logged, never returned.
    pub async fn execute(
        &self,
        input: AddRelayInput,
    ) -> Result<Option<RelayEvent>, RelayServiceError> {
        if !input.update && self.guard.key_from_external_server(input.object_id.0).await {
            tracing::info!(
                content_type = %input.content_type,
                object_id = %input.object_id,
                "record minted by another site, not relaying"
            );
            return Ok(None);
        }

        let pending = if input.update {
            None
        } else {
            self.events
                .find_pending(&input.content_type, input.object_id, &self.hostname)
                .await?
        };

        let (event, created) = match pending {
            Some(event) => (event, false),
            None => {
                let event = self
                    .events
                    .create(&NewRelayEvent {
                        content_type: input.content_type,
                        object_id: input.object_id,
                        acquisition_time: Some(input.acquisition_time.unwrap_or_else(Utc::now)),
                        serialized_form: input.serialized_form,
                        url: input.url,
                        is_update: input.update,
                        hostname: self.hostname.clone(),
                    })
                    .await?;
                (event, true)
            }
        };

        for upload in input.files {
            let path = self
                .files
                .save(RELAY_MEDIA_DIR, &upload.file_name, upload.bytes)
                .await?;
            self.events.add_file(event.id, &upload.file_key, &path).await?;
        }

        // An already queued entry picks up new files when it is delivered.
        if input.broadcast && (created || event.relay_start_time.is_none()) {
            self.schedule_fire(event.id).await;
        }
        Ok(Some(event))
    }

    async fn schedule_fire(&self, id: RelayEventId) {
        let fire = FireRelayUseCase {
            queue: self.queue.clone(),
            events: self.events.clone(),
            relay_channel: self.relay_channel.clone(),
        };
        match self.relay_delay().await {
            None => {
                if let Err(e) = fire.execute(id).await {
                    tracing::error!(event_id = %id, error = %e, "failed to queue relay");
                }
            }
            Some(delay) => {
                tracing::debug!(event_id = %id, delay_secs = delay.as_secs_f64(), "relay deferred");
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Err(e) = fire.execute(id).await {
                        tracing::error!(event_id = %id, error = %e, "failed to queue deferred relay");
                    }
                });
            }
        }
    }

    /// Positive delay from the relay delay constant, if one is configured.
    async fn relay_delay(&self) -> Option<Duration> {
        let raw = match self.constants.find_value(RELAY_DELAY_CONSTANT).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "cannot read relay delay, relaying immediately");
                return None;
            }
        };
        parse_delay(&raw)
    }
}

fn parse_delay(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs > 0.0 => Some(Duration::from_secs_f64(secs)),
        Ok(_) => None,
        Err(_) => {
            tracing::warn!(value = raw, "relay delay is not a number, relaying immediately");
            None
        }
    }
}

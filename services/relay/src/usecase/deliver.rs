use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};

use xgds_domain::queue::Destination;

use crate::domain::repository::{RelayEventRepository, RelayFileStore};
use crate::domain::types::RelayQueueEntry;
use crate::error::RelayServiceError;
use crate::infra::session::SessionRegistry;

/// Result of one delivery attempt for an active queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The remote site accepted the event.
    Delivered,
    /// The entry can never be delivered (malformed, unknown or already
    /// delivered) and should be dropped.
    Discarded,
    /// The attempt failed; the entry stays at the head of the active queue.
    Failed,
}

impl DeliveryOutcome {
    /// Whether the entry should be removed from the active queue.
    pub fn acknowledges(self) -> bool {
        !matches!(self, Self::Failed)
    }
}

struct Attachment {
    file_key: String,
    file_name: String,
    bytes: Bytes,
}

/// POST one relay event to a destination's receive endpoint.
pub struct DeliverRelayUseCase<R, F>
where
    R: RelayEventRepository,
    F: RelayFileStore,
{
    pub events: R,
    pub files: F,
    pub sessions: SessionRegistry,
    pub destination: Destination,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

impl<R, F> DeliverRelayUseCase<R, F>
where
    R: RelayEventRepository,
    F: RelayFileStore,
{
    pub async fn execute(&self, raw_entry: &str) -> Result<DeliveryOutcome, RelayServiceError> {
        let nickname = self.destination.nickname.as_str();
        let entry = match RelayQueueEntry::decode(raw_entry) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(nickname, entry = raw_entry, error = %e, "malformed relay entry, dropping");
                return Ok(DeliveryOutcome::Discarded);
            }
        };
        let id = entry.relay_event_pk;

        let Some(event) = self.events.find_by_id(id).await? else {
            tracing::warn!(nickname, event_id = %id, "relay event not found, dropping");
            return Ok(DeliveryOutcome::Discarded);
        };
        if event.is_delivered() {
            tracing::info!(nickname, event_id = %id, "relay event already delivered, dropping");
            return Ok(DeliveryOutcome::Discarded);
        }

        let mut attachments = Vec::new();
        for file in self.events.list_files(id).await? {
            let bytes = match self.files.read(&file.path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(nickname, event_id = %id, path = %file.path, error = %e, "cannot read relay file");
                    return Ok(DeliveryOutcome::Failed);
                }
            };
            attachments.push(Attachment {
                file_name: file.upload_name().to_owned(),
                file_key: file.file_key,
                bytes,
            });
        }

        let fields = event.serialized_data();
        let url = self.destination.url_for(&event.url);
        let session = self.sessions.session_for(&url)?;
        tracing::info!(nickname, event_id = %id, url = %url, files = attachments.len(), "relay begin");

        let sent = session
            .execute(|client| {
                let mut form = Form::new();
                for (name, value) in &fields {
                    form = form.text(*name, value.clone());
                }
                for a in &attachments {
                    form = form.part(
                        a.file_key.clone(),
                        Part::bytes(a.bytes.to_vec()).file_name(a.file_name.clone()),
                    );
                }
                client
                    .post(&url)
                    .basic_auth(&self.username, Some(&self.password))
                    .timeout(self.timeout)
                    .multipart(form)
            })
            .await;

        match sent {
            Ok(resp) if resp.status() == StatusCode::OK => {
                self.events.mark_succeeded(id, Utc::now()).await?;
                tracing::info!(nickname, event_id = %id, "relay success");
                Ok(DeliveryOutcome::Delivered)
            }
            Ok(resp) => {
                tracing::warn!(nickname, event_id = %id, status = resp.status().as_u16(), "relay failed");
                Ok(DeliveryOutcome::Failed)
            }
            Err(e) => {
                tracing::warn!(nickname, event_id = %id, error = %e, "relay failed");
                Ok(DeliveryOutcome::Failed)
            }
        }
    }
}

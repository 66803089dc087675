use std::time::Duration;

use anyhow::Context as _;
use chrono::{DateTime, Utc};

use xgds_core::serde::{parse_iso8601, to_iso8601};
use xgds_domain::queue::QueueNames;

use crate::domain::repository::{EventPublisher, WorkQueue};
use crate::domain::types::{
    CallDescriptor, CallMethod, REBROADCAST_PATH, RebroadcastDescriptor, SseMessage,
};
use crate::error::RelayServiceError;

/// Producer side of live updates: local publishes, timed rebroadcasts and
/// rebroadcast requests to remote sites.
#[derive(Clone)]
pub struct Broadcaster<Q, P>
where
    Q: WorkQueue,
    P: EventPublisher,
{
    pub queue: Q,
    pub publisher: P,
    pub queues: QueueNames,
    pub rebroadcast_sites: Vec<String>,
    pub remote_username: Option<String>,
    pub remote_token: Option<String>,
    /// Added to the event time of inbound rebroadcast requests.
    pub rebroadcast_delay: Duration,
}

impl<Q, P> Broadcaster<Q, P>
where
    Q: WorkQueue,
    P: EventPublisher,
{
    /// Publish `{"type", "data"}` on `channel` now.
    pub async fn publish_sse(
        &self,
        channel: &str,
        sse_type: &str,
        json: &str,
    ) -> Result<(), RelayServiceError> {
        let message = serde_json::to_string(&SseMessage::new(sse_type, json))
            .context("encode sse message")?;
        self.publisher.publish(channel, &message).await
    }

    /// Queue a message for the rebroadcast scheduler to publish at `publish_time`.
    pub async fn publish_sse_at_time(
        &self,
        channel: &str,
        sse_type: &str,
        json: &str,
        publish_time: DateTime<Utc>,
    ) -> Result<(), RelayServiceError> {
        let descriptor = RebroadcastDescriptor {
            channel: channel.to_owned(),
            publish_time: to_iso8601(&publish_time),
            message: SseMessage::new(sse_type, json),
        };
        let encoded =
            serde_json::to_string(&descriptor).context("encode rebroadcast descriptor")?;
        self.queue.push_back(&self.queues.rebroadcast, &encoded).await
    }

    /// Ask every configured remote site to rebroadcast this event.
    ///
    /// The calls go through the session manager queue, so a slow or dead
    /// site never holds up the caller.
    pub async fn call_remote_rebroadcast(
        &self,
        channel: &str,
        sse_type: &str,
        json: &str,
        event_time: Option<DateTime<Utc>>,
    ) -> Result<(), RelayServiceError> {
        if self.rebroadcast_sites.is_empty() {
            return Ok(());
        }
        let event_time = to_iso8601(&event_time.unwrap_or_else(Utc::now));
        let data = [
            ("channel", channel),
            ("sseType", sse_type),
            ("jsonString", json),
            ("eventTime", event_time.as_str()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        let mut call = CallDescriptor {
            url: String::new(),
            username: self.remote_username.clone(),
            password: self.remote_token.clone(),
            method: CallMethod::Post,
            data,
        };
        for site in &self.rebroadcast_sites {
            call.url = format!("{}{}", site.trim_end_matches('/'), REBROADCAST_PATH);
            let encoded = serde_json::to_string(&call).context("encode call descriptor")?;
            self.queue.push(&self.queues.session_manager, &encoded).await?;
            tracing::debug!(site = %site, channel, "remote rebroadcast queued");
        }
        Ok(())
    }

    /// Publish locally and ask remote sites to rebroadcast.
    pub async fn broadcast(
        &self,
        channel: &str,
        sse_type: &str,
        json: &str,
    ) -> Result<(), RelayServiceError> {
        self.publish_sse(channel, sse_type, json).await?;
        self.call_remote_rebroadcast(channel, sse_type, json, None).await
    }

    /// Schedule an inbound rebroadcast request for `event_time` plus the
    /// configured delay.
    pub async fn accept_remote(
        &self,
        channel: &str,
        sse_type: &str,
        json: &str,
        event_time: &str,
    ) -> Result<DateTime<Utc>, RelayServiceError> {
        let event_time = parse_iso8601(event_time)
            .map_err(|e| RelayServiceError::InvalidRebroadcast(format!("eventTime: {e}")))?;
        let delay = chrono::Duration::from_std(self.rebroadcast_delay)
            .context("rebroadcast delay out of range")?;
        let publish_time = event_time + delay;
        self.publish_sse_at_time(channel, sse_type, json, publish_time)
            .await?;
        Ok(publish_time)
    }
}

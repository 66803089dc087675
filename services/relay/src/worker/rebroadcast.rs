use std::time::Duration;

use chrono::{DateTime, Utc};

use xgds_core::serde::parse_iso8601;
use xgds_core::shutdown::ShutdownSignal;

use crate::domain::repository::{EventPublisher, WorkQueue};
use crate::domain::types::RebroadcastDescriptor;
use crate::error::RelayServiceError;
use crate::worker::supervisor::Worker;

/// A popped descriptor with its publish time resolved.
#[derive(Debug, Clone)]
pub struct ScheduledMessage {
    pub channel: String,
    pub publish_time: DateTime<Utc>,
    pub message: String,
}

/// Publishes queued rebroadcast messages no earlier than their publish time.
///
/// A single consumer handles one message at a time, in queue order. A message
/// with an earlier publish time queued behind a later one waits for it; the
/// producers are expected to enqueue in roughly increasing time order.
pub struct RebroadcastScheduler<Q, P>
where
    Q: WorkQueue,
    P: EventPublisher,
{
    pub queue: Q,
    pub publisher: P,
    pub queue_name: String,
    pub poll: Duration,
}

/// Time left until `publish_time`, rounded up to whole seconds.
pub fn wait_for(publish_time: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
    let millis = (publish_time - now).num_milliseconds();
    if millis <= 0 {
        return None;
    }
    let secs = (millis as u64).div_ceil(1000);
    Some(Duration::from_secs(secs))
}

impl<Q, P> RebroadcastScheduler<Q, P>
where
    Q: WorkQueue,
    P: EventPublisher,
{
    pub fn parse(raw: &str) -> Option<ScheduledMessage> {
        let descriptor: RebroadcastDescriptor = match serde_json::from_str(raw) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(entry = raw, error = %e, "malformed rebroadcast descriptor, dropping");
                return None;
            }
        };
        let publish_time = match parse_iso8601(&descriptor.publish_time) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(publish_time = %descriptor.publish_time, error = %e, "bad publish time, dropping");
                return None;
            }
        };
        let message = match serde_json::to_string(&descriptor.message) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "cannot encode rebroadcast message, dropping");
                return None;
            }
        };
        Some(ScheduledMessage {
            channel: descriptor.channel,
            publish_time,
            message,
        })
    }

    pub async fn wait_until(publish_time: DateTime<Utc>) {
        if let Some(delay) = wait_for(publish_time, Utc::now()) {
            tracing::debug!(delay_secs = delay.as_secs(), "holding rebroadcast");
            tokio::time::sleep(delay).await;
        }
    }

    /// Publish a message whose time has come. Failures are logged; the
    /// message is not retried.
    pub async fn publish(&self, scheduled: &ScheduledMessage) {
        match self.publisher.publish(&scheduled.channel, &scheduled.message).await {
            Ok(()) => tracing::info!(channel = %scheduled.channel, "rebroadcast published"),
            Err(e) => {
                tracing::error!(channel = %scheduled.channel, error = %e, "rebroadcast publish failed")
            }
        }
    }

    /// Wait for and publish one raw descriptor.
    pub async fn handle(&self, raw: &str) {
        if let Some(scheduled) = Self::parse(raw) {
            Self::wait_until(scheduled.publish_time).await;
            self.publish(&scheduled).await;
        }
    }
}

impl<Q, P> Worker for RebroadcastScheduler<Q, P>
where
    Q: WorkQueue + 'static,
    P: EventPublisher + 'static,
{
    fn name(&self) -> String {
        "rebroadcast".to_owned()
    }

    async fn run(&self, mut shutdown: ShutdownSignal) -> Result<(), RelayServiceError> {
        tracing::info!(queue = %self.queue_name, "rebroadcast scheduler running");
        while !shutdown.is_triggered() {
            let next = tokio::select! {
                _ = shutdown.wait() => break,
                next = self.queue.pop_front_blocking(&self.queue_name, self.poll) => next?,
            };
            let Some(raw) = next else { continue };
            let Some(scheduled) = Self::parse(&raw) else { continue };

            tokio::select! {
                _ = shutdown.wait() => {
                    // Put the held message back at the head for the next run.
                    self.queue.push(&self.queue_name, &raw).await?;
                    break;
                }
                _ = Self::wait_until(scheduled.publish_time) => {}
            }
            self.publish(&scheduled).await;
        }
        Ok(())
    }
}

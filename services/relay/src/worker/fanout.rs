use std::time::Duration;

use xgds_core::shutdown::ShutdownSignal;
use xgds_domain::queue::{Destination, QueueNames};

use crate::domain::repository::WorkQueue;
use crate::error::RelayServiceError;
use crate::worker::supervisor::Worker;

/// Copies every entry of the shared pending queue onto each destination's
/// pending queue.
///
/// An entry is parked in the staging list while it is copied, so a crash
/// mid-copy repeats the copy on restart instead of losing the entry.
pub struct Fanout<Q>
where
    Q: WorkQueue,
{
    pub queue: Q,
    pub queues: QueueNames,
    pub destinations: Vec<Destination>,
    pub poll: Duration,
}

impl<Q> Fanout<Q>
where
    Q: WorkQueue,
{
    /// Replicate and clear everything currently in the staging list.
    pub async fn replicate_staged(&self) -> Result<(), RelayServiceError> {
        let staging = self.queues.fanout_staging();
        while let Some(entry) = self.queue.peek_oldest(staging).await? {
            for dest in &self.destinations {
                self.queue
                    .push(&self.queues.pending_for(&dest.nickname), &entry)
                    .await?;
            }
            self.queue.remove(staging, &entry).await?;
            tracing::debug!(entry = %entry, destinations = self.destinations.len(), "relay entry fanned out");
        }
        Ok(())
    }
}

impl<Q> Worker for Fanout<Q>
where
    Q: WorkQueue + 'static,
{
    fn name(&self) -> String {
        "fanout".to_owned()
    }

    async fn run(&self, mut shutdown: ShutdownSignal) -> Result<(), RelayServiceError> {
        tracing::info!(
            channel = %self.queues.relay_channel,
            destinations = self.destinations.len(),
            "relay fan-out running"
        );
        while !shutdown.is_triggered() {
            self.replicate_staged().await?;
            tokio::select! {
                _ = shutdown.wait() => break,
                moved = self.queue.move_blocking(
                    &self.queues.relay_channel,
                    self.queues.fanout_staging(),
                    self.poll,
                ) => {
                    moved?;
                }
            }
        }
        Ok(())
    }
}

use std::time::Duration;

use xgds_core::shutdown::ShutdownSignal;
use xgds_domain::queue::QueueNames;

use crate::domain::repository::{RelayEventRepository, RelayFileStore, WorkQueue};
use crate::error::RelayServiceError;
use crate::usecase::deliver::DeliverRelayUseCase;
use crate::worker::supervisor::Worker;

/// Delivers one destination's queue, oldest entry first.
///
/// Entries move from `<relay-channel>_<nickname>` to
/// `<relay-active-channel>_<nickname>` before delivery and leave the active
/// queue only once the remote site has accepted them, so an entry claimed by
/// a worker that dies is retried by the next one.
pub struct Dispatcher<Q, R, F>
where
    Q: WorkQueue,
    R: RelayEventRepository,
    F: RelayFileStore,
{
    pub queue: Q,
    pub deliver: DeliverRelayUseCase<R, F>,
    pub queues: QueueNames,
    /// Upper bound on each blocking wait for new entries.
    pub poll: Duration,
}

impl<Q, R, F> Dispatcher<Q, R, F>
where
    Q: WorkQueue,
    R: RelayEventRepository,
    F: RelayFileStore,
{
    fn nickname(&self) -> &str {
        &self.deliver.destination.nickname
    }

    pub fn pending_queue(&self) -> String {
        self.queues.pending_for(self.nickname())
    }

    pub fn active_queue(&self) -> String {
        self.queues.active_for(self.nickname())
    }

    /// Deliver active entries until the queue is empty or the head fails.
    pub async fn drain_active(&self, shutdown: &ShutdownSignal) -> Result<(), RelayServiceError> {
        let active = self.active_queue();
        while !shutdown.is_triggered() {
            let Some(entry) = self.queue.peek_oldest(&active).await? else {
                return Ok(());
            };
            let outcome = self.deliver.execute(&entry).await?;
            if !outcome.acknowledges() {
                return Ok(());
            }
            self.queue.remove(&active, &entry).await?;
        }
        Ok(())
    }

    /// Move the next pending entry into the active queue, waiting at most `poll`.
    pub async fn claim_next(&self) -> Result<bool, RelayServiceError> {
        let moved = self
            .queue
            .move_blocking(&self.pending_queue(), &self.active_queue(), self.poll)
            .await?;
        Ok(moved.is_some())
    }
}

impl<Q, R, F> Worker for Dispatcher<Q, R, F>
where
    Q: WorkQueue + 'static,
    R: RelayEventRepository + 'static,
    F: RelayFileStore + 'static,
{
    fn name(&self) -> String {
        format!("dispatcher:{}", self.nickname())
    }

    async fn run(&self, mut shutdown: ShutdownSignal) -> Result<(), RelayServiceError> {
        tracing::info!(nickname = self.nickname(), "relay dispatcher running");
        while !shutdown.is_triggered() {
            self.drain_active(&shutdown).await?;
            tokio::select! {
                _ = shutdown.wait() => break,
                claimed = self.claim_next() => {
                    claimed?;
                }
            }
        }
        Ok(())
    }
}

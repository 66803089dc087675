use std::time::Duration;

use xgds_core::shutdown::ShutdownSignal;

use crate::domain::repository::{UrlCaller, WorkQueue};
use crate::domain::types::{CallDescriptor, MAX_SEND_ATTEMPTS, SLEEP_TIME};
use crate::error::RelayServiceError;
use crate::worker::supervisor::Worker;

/// What happened to one dequeued call descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// The remote answered; non-2xx statuses are logged, not retried.
    Completed { attempts: u32, status: u16 },
    /// Every attempt failed before a response arrived.
    GaveUp { attempts: u32 },
    /// The descriptor could not be parsed.
    Dropped,
}

/// Executes HTTP calls queued on the session manager list.
pub struct SessionManagerWorker<Q, C>
where
    Q: WorkQueue,
    C: UrlCaller,
{
    pub queue: Q,
    pub caller: C,
    pub queue_name: String,
    pub poll: Duration,
    pub max_attempts: u32,
    pub sleep_time: Duration,
}

impl<Q, C> SessionManagerWorker<Q, C>
where
    Q: WorkQueue,
    C: UrlCaller,
{
    pub fn new(queue: Q, caller: C, queue_name: String, poll: Duration) -> Self {
        Self {
            queue,
            caller,
            queue_name,
            poll,
            max_attempts: MAX_SEND_ATTEMPTS,
            sleep_time: SLEEP_TIME,
        }
    }

    pub async fn handle(&self, raw: &str) -> CallOutcome {
        let call: CallDescriptor = match serde_json::from_str(raw) {
            Ok(call) => call,
            Err(e) => {
                tracing::warn!(entry = raw, error = %e, "malformed call descriptor, dropping");
                return CallOutcome::Dropped;
            }
        };

        for attempt in 1..=self.max_attempts {
            match self.caller.call_url(&call).await {
                Ok(status) => {
                    if (200..300).contains(&status) {
                        tracing::info!(url = %call.url, status, attempt, "call succeeded");
                    } else {
                        tracing::warn!(url = %call.url, status, attempt, "call returned error status");
                    }
                    return CallOutcome::Completed {
                        attempts: attempt,
                        status,
                    };
                }
                Err(e) => {
                    tracing::warn!(url = %call.url, attempt, error = %e, "call failed");
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.sleep_time).await;
                    }
                }
            }
        }
        tracing::error!(url = %call.url, attempts = self.max_attempts, "giving up on call");
        CallOutcome::GaveUp {
            attempts: self.max_attempts,
        }
    }
}

impl<Q, C> Worker for SessionManagerWorker<Q, C>
where
    Q: WorkQueue + 'static,
    C: UrlCaller + 'static,
{
    fn name(&self) -> String {
        "session-manager".to_owned()
    }

    async fn run(&self, mut shutdown: ShutdownSignal) -> Result<(), RelayServiceError> {
        tracing::info!(queue = %self.queue_name, "session manager running");
        while !shutdown.is_triggered() {
            let next = tokio::select! {
                _ = shutdown.wait() => break,
                next = self.queue.pop_blocking(&self.queue_name, self.poll) => next?,
            };
            if let Some(raw) = next {
                self.handle(&raw).await;
            }
        }
        Ok(())
    }
}

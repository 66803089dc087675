use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use xgds_core::shutdown::ShutdownSignal;

use crate::error::RelayServiceError;

/// Pause before a failed worker is started again.
pub const RESTART_DELAY: Duration = Duration::from_secs(5);

/// A long-running queue consumer.
///
/// `run` should return `Ok(())` only once `shutdown` has fired; any other
/// return, error or panic gets the worker restarted.
pub trait Worker: Send + Sync + 'static {
    fn name(&self) -> String;

    fn run(
        &self,
        shutdown: ShutdownSignal,
    ) -> impl Future<Output = Result<(), RelayServiceError>> + Send;
}

/// Run `worker` in its own task until shutdown, restarting it after errors
/// and panics.
pub async fn supervise<W>(worker: Arc<W>, mut shutdown: ShutdownSignal, restart_delay: Duration)
where
    W: Worker,
{
    let name = worker.name();
    let mut restarts = 0u64;
    while !shutdown.is_triggered() {
        let task = {
            let worker = Arc::clone(&worker);
            let signal = shutdown.clone();
            tokio::spawn(async move { worker.run(signal).await })
        };

        match task.await {
            Ok(Ok(())) if shutdown.is_triggered() => break,
            Ok(Ok(())) => tracing::warn!(worker = %name, "worker returned early"),
            Ok(Err(e)) => tracing::error!(worker = %name, error = %e, "worker failed"),
            Err(e) if e.is_panic() => tracing::error!(worker = %name, "worker panicked"),
            Err(e) => {
                tracing::error!(worker = %name, error = %e, "worker task cancelled");
                break;
            }
        }

        restarts += 1;
        tokio::select! {
            _ = shutdown.wait() => break,
            _ = tokio::time::sleep(restart_delay) => {
                tracing::info!(worker = %name, restarts, "restarting worker");
            }
        }
    }
    tracing::info!(worker = %name, "worker stopped");
}

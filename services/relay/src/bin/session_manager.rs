use std::sync::Arc;

use xgds_core::shutdown;
use xgds_relay::config::RelayConfig;
use xgds_relay::infra::queue::RedisQueue;
use xgds_relay::infra::session::SessionRegistry;
use xgds_relay::worker::session_manager::SessionManagerWorker;
use xgds_relay::worker::supervisor::{RESTART_DELAY, supervise};

#[tokio::main]
async fn main() {
    xgds_core::tracing::init_tracing("session-manager");

    let config = RelayConfig::from_env();
    let queue = RedisQueue::from_url(&config.redis_url).expect("failed to create Redis pool");

    let (trigger, signal) = shutdown::channel();
    tokio::spawn(shutdown::trigger_on_ctrl_c(trigger));

    let worker = SessionManagerWorker::new(
        queue,
        SessionRegistry::new(),
        config.queues.session_manager.clone(),
        config.queue_poll,
    );
    supervise(Arc::new(worker), signal, RESTART_DELAY).await;
}

use std::sync::Arc;

use sea_orm::Database;
use tracing::info;

use xgds_core::shutdown;

use xgds_relay::config::RelayConfig;
use xgds_relay::infra::files::DiskFileStore;
use xgds_relay::infra::queue::RedisQueue;
use xgds_relay::infra::records::DbRecordHandler;
use xgds_relay::router::build_router;
use xgds_relay::state::AppState;
use xgds_relay::usecase::rebroadcast::Broadcaster;
use xgds_relay::usecase::receive::HandlerRegistry;

#[tokio::main]
async fn main() {
    xgds_core::tracing::init_tracing("relay");

    let config = RelayConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let queue = RedisQueue::from_url(&config.redis_url).expect("failed to create Redis pool");

    let mut handlers = HandlerRegistry::new();
    for content_type in &config.record_types {
        handlers.register(
            content_type.clone(),
            Arc::new(DbRecordHandler {
                db: db.clone(),
                files: DiskFileStore::new(&config.media_root),
                content_type: content_type.clone(),
            }),
        );
    }

    let broadcaster = Broadcaster {
        queue: queue.clone(),
        publisher: queue.clone(),
        queues: config.queues.clone(),
        rebroadcast_sites: config.rebroadcast_sites.clone(),
        remote_username: config.remote_username.clone(),
        remote_token: config.remote_token.clone(),
        rebroadcast_delay: config.rebroadcast_delay,
    };

    let addr = format!("0.0.0.0:{}", config.relay_port);
    let state = AppState {
        db,
        queue,
        handlers: Arc::new(handlers),
        broadcaster,
        config: Arc::new(config),
    };

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    let (trigger, mut signal) = shutdown::channel();
    tokio::spawn(shutdown::trigger_on_ctrl_c(trigger));

    info!("relay service listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { signal.wait().await })
        .await
        .expect("server error");
}

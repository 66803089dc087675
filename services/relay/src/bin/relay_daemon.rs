use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sea_orm::Database;
use tracing::info;

use xgds_core::shutdown;
use xgds_domain::queue::Destination;
use xgds_relay::config::RelayConfig;
use xgds_relay::infra::db::DbRelayEventRepository;
use xgds_relay::infra::files::DiskFileStore;
use xgds_relay::infra::queue::RedisQueue;
use xgds_relay::infra::session::SessionRegistry;
use xgds_relay::usecase::deliver::DeliverRelayUseCase;
use xgds_relay::worker::dispatcher::Dispatcher;
use xgds_relay::worker::fanout::Fanout;
use xgds_relay::worker::supervisor::{RESTART_DELAY, supervise};

/// Deliver queued relay events to remote xGDS sites.
#[derive(Parser, Debug)]
#[command(name = "relay-daemon")]
struct Cli {
    /// Comma-separated destination base URLs, e.g. `https://boat.xgds.org,https://shore.xgds.org`.
    destinations: String,

    /// Timeout in seconds for the response to each relay POST.
    #[arg(short, long, default_value_t = 30)]
    timeout: u64,

    #[arg(short, long)]
    username: String,

    #[arg(short, long)]
    password: String,
}

#[tokio::main]
async fn main() {
    xgds_core::tracing::init_tracing("relay-daemon");

    let cli = Cli::parse();
    let config = RelayConfig::from_env();

    let destinations =
        Destination::parse_list(&cli.destinations).expect("invalid destination list");
    assert!(!destinations.is_empty(), "at least one destination is required");

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");
    let queue = RedisQueue::from_url(&config.redis_url).expect("failed to create Redis pool");
    let sessions = SessionRegistry::new();

    let (trigger, signal) = shutdown::channel();
    tokio::spawn(shutdown::trigger_on_ctrl_c(trigger));

    let mut workers = Vec::with_capacity(destinations.len() + 1);

    let fanout = Fanout {
        queue: queue.clone(),
        queues: config.queues.clone(),
        destinations: destinations.clone(),
        poll: config.queue_poll,
    };
    workers.push(tokio::spawn(supervise(
        Arc::new(fanout),
        signal.clone(),
        RESTART_DELAY,
    )));

    for destination in destinations {
        info!(nickname = %destination.nickname, url = %destination.base_url, "relaying to destination");
        let dispatcher = Dispatcher {
            queue: queue.clone(),
            deliver: DeliverRelayUseCase {
                events: DbRelayEventRepository { db: db.clone() },
                files: DiskFileStore::new(&config.media_root),
                sessions: sessions.clone(),
                destination,
                username: cli.username.clone(),
                password: cli.password.clone(),
                timeout: Duration::from_secs(cli.timeout),
            },
            queues: config.queues.clone(),
            poll: config.queue_poll,
        };
        workers.push(tokio::spawn(supervise(
            Arc::new(dispatcher),
            signal.clone(),
            RESTART_DELAY,
        )));
    }

    for result in futures::future::join_all(workers).await {
        if let Err(e) = result {
            tracing::error!(error = %e, "supervisor task failed");
        }
    }
    info!("relay daemon stopped");
}

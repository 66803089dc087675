use clap::Parser;

use xgds_domain::id::RelayEventId;
use xgds_relay::config::queue_names_from_env;
use xgds_relay::domain::repository::WorkQueue;
use xgds_relay::domain::types::RelayQueueEntry;
use xgds_relay::error::RelayServiceError;
use xgds_relay::infra::queue::RedisQueue;

/// Show a destination's active relay queue, optionally removing one entry.
#[derive(Parser, Debug)]
#[command(name = "show-active-relay")]
struct Cli {
    /// Destination nickname (host of its base URL).
    #[arg(short, long, default_value = "boat.xgds.org")]
    dest: String,

    /// Remove the entry for this relay event from the active queue.
    #[arg(short = 'e', long, visible_alias = "eventPK")]
    event_pk: Option<i64>,
}

async fn show(queue: &RedisQueue, key: &str) -> Result<(), RelayServiceError> {
    let len = queue.len(key).await?;
    println!("{key}: {len} active");
    for entry in queue.list(key).await? {
        println!("  {entry}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), RelayServiceError> {
    xgds_core::tracing::init_tracing("show-active-relay");

    let cli = Cli::parse();
    let redis_url = std::env::var("REDIS_URL").expect("REDIS_URL");
    let queue = RedisQueue::from_url(&redis_url).expect("failed to create Redis pool");
    let key = queue_names_from_env().active_for(&cli.dest);

    show(&queue, &key).await?;

    if let Some(pk) = cli.event_pk {
        let entry = RelayQueueEntry::new(RelayEventId(pk)).encode();
        let removed = queue.remove_all(&key, &entry).await?;
        println!("removed {removed} entries for relay event {pk}");
        show(&queue, &key).await?;
    }
    Ok(())
}

use std::time::Duration;

use xgds_domain::content_type::ContentType;
use xgds_domain::queue::{
    DEFAULT_REBROADCAST, DEFAULT_RELAY_ACTIVE, DEFAULT_RELAY_CHANNEL, DEFAULT_SESSION_MANAGER,
    QueueNames,
};

use crate::usecase::guard::ShardCheckPolicy;

/// Relay configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis connection URL.
    pub redis_url: String,
    /// Origin site identifier stamped on every relay event. Env var: `HOSTNAME`.
    pub hostname: String,
    /// TCP port for the receive endpoints (default 8181). Env var: `RELAY_PORT`.
    pub relay_port: u16,
    /// Root directory for relay attachments (default `./media`). Env var: `MEDIA_ROOT`.
    pub media_root: String,
    /// Redis list names (`XGDS_CORE_REDIS_*`).
    pub queues: QueueNames,
    /// Live-update channels served to browsers. Env var: `XGDS_SSE_CHANNELS`.
    pub sse_channels: Vec<String>,
    /// Remote sites that receive rebroadcast calls. Env var: `XGDS_CORE_SSE_REBROADCAST_SITES`.
    pub rebroadcast_sites: Vec<String>,
    pub remote_username: Option<String>,
    pub remote_token: Option<String>,
    /// Added to the event time of inbound rebroadcast requests.
    pub rebroadcast_delay: Duration,
    /// What the shard guard assumes when it cannot read the auto-increment settings.
    pub shard_check_policy: ShardCheckPolicy,
    /// Content types stored by the generic record handler. Env var: `RELAY_RECORD_TYPES`.
    pub record_types: Vec<ContentType>,
    /// Upper bound on each blocking queue pop. Env var: `QUEUE_POLL_SECS`.
    pub queue_poll: Duration,
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            redis_url: std::env::var("REDIS_URL").expect("REDIS_URL"),
            hostname: std::env::var("HOSTNAME").expect("HOSTNAME"),
            relay_port: parsed_var("RELAY_PORT").unwrap_or(8181),
            media_root: std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media".to_owned()),
            queues: queue_names_from_env(),
            sse_channels: {
                let channels = split_list(&var_or("XGDS_SSE_CHANNELS", "sse"));
                if channels.is_empty() {
                    vec!["sse".to_owned()]
                } else {
                    channels
                }
            },
            rebroadcast_sites: split_list(&var_or("XGDS_CORE_SSE_REBROADCAST_SITES", "")),
            remote_username: non_empty_var("XGDS_CORE_SSE_REMOTE_USERNAME"),
            remote_token: non_empty_var("XGDS_CORE_SSE_REMOTE_TOKEN"),
            rebroadcast_delay: Duration::from_secs(
                parsed_var("SSE_REBROADCAST_DELAY_SECS").unwrap_or(0),
            ),
            shard_check_policy: std::env::var("SHARD_CHECK_POLICY")
                .ok()
                .map(|v| v.parse().expect("SHARD_CHECK_POLICY must be `open` or `closed`"))
                .unwrap_or_default(),
            record_types: split_list(&var_or("RELAY_RECORD_TYPES", ""))
                .iter()
                .map(|ct| ct.parse().expect("RELAY_RECORD_TYPES"))
                .collect(),
            queue_poll: Duration::from_secs(parsed_var("QUEUE_POLL_SECS").unwrap_or(5).max(1)),
        }
    }
}

/// Redis list names, for tools that need nothing else from the environment.
pub fn queue_names_from_env() -> QueueNames {
    QueueNames {
        relay_channel: var_or("XGDS_CORE_REDIS_RELAY_CHANNEL", DEFAULT_RELAY_CHANNEL),
        relay_active: var_or("XGDS_CORE_REDIS_RELAY_ACTIVE", DEFAULT_RELAY_ACTIVE),
        rebroadcast: var_or("XGDS_CORE_REDIS_REBROADCAST", DEFAULT_REBROADCAST),
        session_manager: var_or("XGDS_CORE_REDIS_SESSION_MANAGER", DEFAULT_SESSION_MANAGER),
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Split a comma-separated env value, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

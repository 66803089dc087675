use std::sync::Arc;

use axum::extract::FromRef;
use sea_orm::DatabaseConnection;

use crate::config::RelayConfig;
use crate::infra::db::DbRelayEventRepository;
use crate::infra::queue::RedisQueue;
use crate::usecase::rebroadcast::Broadcaster;
use crate::usecase::receive::HandlerRegistry;

pub type RedisBroadcaster = Broadcaster<RedisQueue, RedisQueue>;

/// Shared application state passed to every handler via axum `State`.
///
/// The receive endpoints extract only the part they need (`FromRef`), so
/// they can be mounted on their own in tests.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub queue: RedisQueue,
    pub handlers: Arc<HandlerRegistry>,
    pub broadcaster: RedisBroadcaster,
    pub config: Arc<RelayConfig>,
}

impl AppState {
    pub fn relay_event_repo(&self) -> DbRelayEventRepository {
        DbRelayEventRepository {
            db: self.db.clone(),
        }
    }
}

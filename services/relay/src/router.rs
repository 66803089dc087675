use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use xgds_core::health::healthz;
use xgds_core::middleware::request_id_layer;

use crate::domain::types::{REBROADCAST_PATH, RELAY_PATH};
use crate::handlers::{
    health::readyz,
    rebroadcast::{active_channels, rebroadcast_sse},
    relay::{list_pending, receive_relay},
};
use crate::infra::queue::RedisQueue;
use crate::state::AppState;
use crate::usecase::receive::HandlerRegistry;

/// Relay deliveries carry attachments; allow well beyond axum's 2 MB default.
pub const RELAY_BODY_LIMIT: usize = 256 * 1024 * 1024;

/// The relay receive endpoint on its own, for sites that only accept relays.
pub fn relay_routes(handlers: Arc<HandlerRegistry>) -> Router {
    Router::new()
        .route(RELAY_PATH, post(receive_relay))
        .layer(DefaultBodyLimit::max(RELAY_BODY_LIMIT))
        .with_state(handlers)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Relay
        .route(RELAY_PATH, post(receive_relay))
        .route("/xgds_core/rest/relay/pending/", get(list_pending))
        // Live updates
        .route(
            REBROADCAST_PATH,
            post(rebroadcast_sse::<RedisQueue, RedisQueue>),
        )
        .route("/xgds_core/sse/activeChannels/", get(active_channels))
        .layer(DefaultBodyLimit::max(RELAY_BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}

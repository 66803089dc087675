use axum::{Json, extract::State, http::StatusCode};

use xgds_core::health::{Probe, readiness};

use crate::state::AppState;

/// `GET /readyz`: database and Redis must both answer.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Vec<Probe>>) {
    let database = state.db.ping().await;
    if let Err(e) = &database {
        tracing::warn!(error = %e, "database probe failed");
    }
    let redis = state.queue.ping().await;
    if let Err(e) = &redis {
        tracing::warn!(error = %e, "redis probe failed");
    }
    readiness(vec![
        Probe {
            name: "database",
            ok: database.is_ok(),
        },
        Probe {
            name: "redis",
            ok: redis.is_ok(),
        },
    ])
}

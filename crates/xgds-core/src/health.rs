use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

/// Handler for `GET /healthz`, the liveness check.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Outcome of one readiness probe (database, redis, ...).
#[derive(Debug, Clone, Serialize)]
pub struct Probe {
    pub name: &'static str,
    pub ok: bool,
}

/// Fold probe results into a `GET /readyz` response: 200 when every probe
/// passed, 503 otherwise, with the individual results in the body.
pub fn readiness(probes: Vec<Probe>) -> (StatusCode, Json<Vec<Probe>>) {
    let status = if probes.iter().all(|p| p.ok) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(probes))
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Relay service error variants.
#[derive(Debug, thiserror::Error)]
pub enum RelayServiceError {
    #[error("unknown content type {0}")]
    UnknownContentType(String),
    #[error("invalid relay form: {0}")]
    InvalidRelayForm(String),
    #[error("invalid rebroadcast request: {0}")]
    InvalidRebroadcast(String),
    #[error("invalid url {0}")]
    InvalidUrl(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl RelayServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownContentType(_) => "UNKNOWN_CONTENT_TYPE",
            Self::InvalidRelayForm(_) => "INVALID_RELAY_FORM",
            Self::InvalidRebroadcast(_) => "INVALID_REBROADCAST",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl From<deadpool_redis::PoolError> for RelayServiceError {
    fn from(e: deadpool_redis::PoolError) -> Self {
        Self::Internal(e.into())
    }
}

impl From<deadpool_redis::redis::RedisError> for RelayServiceError {
    fn from(e: deadpool_redis::redis::RedisError) -> Self {
        Self::Internal(e.into())
    }
}

impl IntoResponse for RelayServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::UnknownContentType(_)
            | Self::InvalidRelayForm(_)
            | Self::InvalidRebroadcast(_)
            | Self::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // 4xx are expected client errors; TraceLayer already records them.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

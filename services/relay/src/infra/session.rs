//! Pooled HTTP sessions, one per remote origin.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context as _;
use reqwest::{Client, RequestBuilder, Response};
use url::Url;

use crate::domain::repository::UrlCaller;
use crate::domain::types::{CallDescriptor, CallMethod, HTTP_RETRIES, REQUEST_TIMEOUT};
use crate::error::RelayServiceError;

/// A connection-pooling client bound to one origin.
#[derive(Debug)]
pub struct Session {
    origin: String,
    client: Client,
}

impl Session {
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Send the request built by `build`, rebuilding and resending it when the
    /// connection itself fails, up to `HTTP_RETRIES` extra times.
    pub async fn execute<F>(&self, build: F) -> Result<Response, reqwest::Error>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut retries = 0;
        loop {
            match build(&self.client).send().await {
                Err(e) if e.is_connect() && retries < HTTP_RETRIES => {
                    retries += 1;
                    tracing::warn!(origin = %self.origin, retry = retries, error = %e, "connection failed, retrying");
                }
                result => return result,
            }
        }
    }
}

/// Process-wide registry of sessions keyed by `scheme://host[:port]`.
///
/// Sessions are created on first use and live as long as the registry.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<String, Arc<Session>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_for(&self, url: &str) -> Result<Arc<Session>, RelayServiceError> {
        let parsed = Url::parse(url).map_err(|_| RelayServiceError::InvalidUrl(url.to_owned()))?;
        if parsed.host_str().is_none() {
            return Err(RelayServiceError::InvalidUrl(url.to_owned()));
        }
        let origin = parsed.origin().ascii_serialization();

        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = sessions.get(&origin) {
            return Ok(Arc::clone(session));
        }
        let client = Client::builder()
            .build()
            .context("build http client")?;
        let session = Arc::new(Session {
            origin: origin.clone(),
            client,
        });
        sessions.insert(origin.clone(), Arc::clone(&session));
        tracing::info!(origin = %origin, sessions = sessions.len(), "created http session");
        Ok(session)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Issue the call described by `call` through its origin's session.
    pub async fn send(&self, call: &CallDescriptor) -> Result<Response, RelayServiceError> {
        let session = self.session_for(&call.url)?;
        tracing::info!(url = %call.url, method = ?call.method, "calling url");
        let response = session
            .execute(|client| {
                let builder = match call.method {
                    CallMethod::Get => client.get(&call.url),
                    CallMethod::Post => client.post(&call.url).form(&call.data),
                };
                let builder = match &call.username {
                    Some(user) => builder.basic_auth(user, call.password.as_deref()),
                    None => builder,
                };
                builder.timeout(REQUEST_TIMEOUT)
            })
            .await
            .with_context(|| format!("call {}", call.url))?;
        Ok(response)
    }
}

impl UrlCaller for SessionRegistry {
    async fn call_url(&self, call: &CallDescriptor) -> Result<u16, RelayServiceError> {
        Ok(self.send(call).await?.status().as_u16())
    }
}

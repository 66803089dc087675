//! Redis list names shared by every relay process.
//!
//! These names are read by other xGDS components too, so they must match
//! byte for byte: `<relay-channel>_<nickname>` and
//! `<relay-active-channel>_<nickname>`.

use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_RELAY_CHANNEL: &str = "dataRelayQueue";
pub const DEFAULT_RELAY_ACTIVE: &str = "dataRelayActive";
pub const DEFAULT_REBROADCAST: &str = "sseRebroadcast";
pub const DEFAULT_SESSION_MANAGER: &str = "sessionManager";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueNames {
    /// Shared pending queue written by `fireRelay`, read by fan-out.
    pub relay_channel: String,
    /// Prefix of the per-destination active queues.
    pub relay_active: String,
    pub rebroadcast: String,
    pub session_manager: String,
}

impl Default for QueueNames {
    fn default() -> Self {
        Self {
            relay_channel: DEFAULT_RELAY_CHANNEL.to_owned(),
            relay_active: DEFAULT_RELAY_ACTIVE.to_owned(),
            rebroadcast: DEFAULT_REBROADCAST.to_owned(),
            session_manager: DEFAULT_SESSION_MANAGER.to_owned(),
        }
    }
}

impl QueueNames {
    pub fn pending_for(&self, nickname: &str) -> String {
        format!("{}_{}", self.relay_channel, nickname)
    }

    pub fn active_for(&self, nickname: &str) -> String {
        format!("{}_{}", self.relay_active, nickname)
    }

    /// In-flight list used by fan-out while copying one shared entry to every
    /// destination. Same name as the single-destination active queue of
    /// older deployments, which never coexist with fan-out.
    pub fn fanout_staging(&self) -> &str {
        &self.relay_active
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DestinationError {
    #[error("invalid destination url {0:?}")]
    InvalidUrl(String),
    #[error("destination url {0:?} has no host")]
    MissingHost(String),
}

/// A remote xGDS site the relay daemon delivers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Base URL without trailing slash, e.g. `https://boat.xgds.org`.
    pub base_url: String,
    /// Host of `base_url` with the port stripped; namespaces the queue keys.
    pub nickname: String,
}

impl Destination {
    pub fn parse(raw: &str) -> Result<Self, DestinationError> {
        let trimmed = raw.trim();
        let url = Url::parse(trimmed).map_err(|_| DestinationError::InvalidUrl(raw.to_owned()))?;
        let nickname = url
            .host_str()
            .ok_or_else(|| DestinationError::MissingHost(raw.to_owned()))?
            .to_owned();
        Ok(Self {
            base_url: trimmed.trim_end_matches('/').to_owned(),
            nickname,
        })
    }

    /// Parse a comma-separated destination list, skipping empty items.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, DestinationError> {
        raw.split(',')
            .filter(|s| !s.trim().is_empty())
            .map(Self::parse)
            .collect()
    }

    /// Join a target-relative path onto the base URL with exactly one slash.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

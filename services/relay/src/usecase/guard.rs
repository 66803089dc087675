use std::str::FromStr;

use crate::domain::repository::ShardInfo;

/// What to assume about a key when the shard settings cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShardCheckPolicy {
    /// Treat the key as local and relay it.
    #[default]
    FailOpen,
    /// Treat the key as external and suppress the relay.
    FailClosed,
}

#[derive(Debug, thiserror::Error)]
#[error("shard check policy must be `open` or `closed`, got {0:?}")]
pub struct ParseShardCheckPolicyError(String);

impl FromStr for ShardCheckPolicy {
    type Err = ParseShardCheckPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::FailOpen),
            "closed" => Ok(Self::FailClosed),
            _ => Err(ParseShardCheckPolicyError(s.to_owned())),
        }
    }
}

/// True when `pk` falls outside this shard's residue class.
///
/// With an increment of 1 (or less) every key is local. The offset is taken
/// modulo the increment so `offset == increment` still matches residue 0.
pub fn is_foreign_key(pk: i64, offset: i64, increment: i64) -> bool {
    increment > 1 && pk.rem_euclid(increment) != offset.rem_euclid(increment)
}

/// Anti-echo check: was this primary key minted by another federation member?
pub struct ShardGuard<S>
where
    S: ShardInfo,
{
    pub shard: S,
    pub policy: ShardCheckPolicy,
}

impl<S> ShardGuard<S>
where
    S: ShardInfo,
{
    pub async fn key_from_external_server(&self, pk: i64) -> bool {
        match self.shard.auto_increment().await {
            Ok(settings) => is_foreign_key(pk, settings.offset, settings.increment),
            Err(e) => {
                let external = self.policy == ShardCheckPolicy::FailClosed;
                tracing::error!(
                    pk,
                    error = %e,
                    policy = ?self.policy,
                    treat_as_external = external,
                    "cannot read auto-increment settings"
                );
                external
            }
        }
    }
}

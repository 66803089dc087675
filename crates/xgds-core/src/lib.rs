//! Cross-cutting plumbing shared by the xGDS relay binaries: tracing setup,
//! HTTP middleware, health handlers, time formats and shutdown signalling.

pub mod health;
pub mod middleware;
pub mod serde;
pub mod shutdown;
pub mod tracing;

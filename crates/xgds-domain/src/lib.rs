//! Domain types shared across the xGDS relay workspace.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers as well as in `infra/` adapters.

pub mod content_type;
pub mod id;
pub mod queue;

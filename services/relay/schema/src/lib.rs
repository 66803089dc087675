//! sea-orm entities for the relay tables.

pub mod constants;
pub mod global_variables;
pub mod records;
pub mod relay_events;
pub mod relay_files;

pub mod db;
pub mod files;
pub mod queue;
pub mod records;
pub mod session;

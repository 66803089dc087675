//! Long-running queue consumers and their supervisor.

pub mod dispatcher;
pub mod fanout;
pub mod rebroadcast;
pub mod session_manager;
pub mod supervisor;

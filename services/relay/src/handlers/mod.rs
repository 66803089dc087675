pub mod health;
pub mod rebroadcast;
pub mod relay;

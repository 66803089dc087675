pub mod deliver;
pub mod guard;
pub mod rebroadcast;
pub mod receive;
pub mod relay;

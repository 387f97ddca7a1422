pub mod app;
pub mod core;
pub mod network;
pub mod notifications;
pub mod queue;

include!(concat!(env!("OUT_DIR"), "/version.rs"));

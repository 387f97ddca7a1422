//! End-to-end test modules

pub mod network_dispatch;
pub mod toml_config;

//! CLI module containing argument parsing and configuration loading

pub mod args;
pub mod config;

pub use args::{Args, Command, SendArgs, ServeArgs};
pub use config::{default_config_path, Config, ConfigError, ModuleConfig};

/// Version line shown by `--version`
pub fn version_string() -> String {
    format!(
        "{} (built {}, git {})",
        env!("CARGO_PKG_VERSION"),
        crate::BUILD_TIME,
        crate::GIT_HASH
    )
}

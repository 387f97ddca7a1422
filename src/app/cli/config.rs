//! TOML configuration file loading and validation
//!
//! An explicitly named file must exist. Without one the default location
//! under the user's config directory is used if present, otherwise the
//! built-in defaults apply. Command line options override file values.

use crate::app::cli::args::{Args, Command};
use crate::core::error_handling::ContextualError;
use crate::queue::api::{modules, priorities, DEFAULT_BURST_PER_PASS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("The specified configuration file does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Error reading configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing configuration file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration value for '{field}': {message}")]
    Invalid { field: String, message: String },

    #[error("Configuration schema version {found} is newer than supported version {supported}")]
    SchemaVersion { found: u32, supported: u32 },
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        !matches!(self, ConfigError::Read { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::NotFound { .. } => Some("Check the path given with --config-file"),
            ConfigError::Parse { .. } => Some("The configuration file is not valid TOML"),
            ConfigError::Invalid { message, .. } => Some(message.as_str()),
            ConfigError::SchemaVersion { .. } => {
                Some("The configuration file was written for a newer release")
            }
            ConfigError::Read { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    pub burst_per_pass: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            burst_per_pass: DEFAULT_BURST_PER_PASS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: crate::network::api::DEFAULT_HOST.to_string(),
            port: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file: Option<PathBuf>,
    pub color: Option<bool>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            file: None,
            color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    pub id: String,
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub schema_version: Option<u32>,
    pub queue: QueueConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub modules: Vec<ModuleConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: None,
            queue: QueueConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            modules: vec![
                ModuleConfig {
                    id: modules::WHITEBOARD.to_string(),
                    priority: priorities::WHITEBOARD,
                },
                ModuleConfig {
                    id: modules::SCREEN_SHARE.to_string(),
                    priority: priorities::SCREEN_SHARE,
                },
                ModuleConfig {
                    id: modules::FILE.to_string(),
                    priority: priorities::FILE,
                },
            ],
        }
    }
}

/// `<config dir>/PacketDispatch/packet-dispatch.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("PacketDispatch").join("packet-dispatch.toml"))
}

fn supported_schema_version() -> u32 {
    crate::CONFIG_SCHEMA_VERSION.parse().unwrap_or(1)
}

impl Config {
    /// Resolve, read and validate the configuration
    pub async fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match config_file {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|path| path.exists()),
        };

        let Some(path) = path else {
            log::debug!("No configuration file found; using defaults");
            return Ok(Self::default());
        };

        let contents =
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
        let config = Self::from_toml_str(&contents, &path)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML text; `path` is only used in messages
    pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let supported = supported_schema_version();
        if let Some(found) = self.schema_version {
            if found > supported {
                return Err(ConfigError::SchemaVersion { found, supported });
            }
        }

        if self.queue.burst_per_pass == 0 {
            return Err(invalid("queue.burst_per_pass", "must be at least 1"));
        }
        if self.server.host.trim().is_empty() {
            return Err(invalid("server.host", "must not be empty"));
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid(
                "logging.level",
                &format!("must be one of {}", LOG_LEVELS.join(", ")),
            ));
        }
        if !crate::core::logging::LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(invalid(
                "logging.format",
                &format!(
                    "must be one of {}",
                    crate::core::logging::LOG_FORMATS.join(", ")
                ),
            ));
        }

        let mut seen = HashSet::new();
        for module in &self.modules {
            if module.id.trim().is_empty() {
                return Err(invalid("modules.id", "module identifiers must not be empty"));
            }
            if !seen.insert(module.id.as_str()) {
                return Err(invalid(
                    "modules.id",
                    &format!("module '{}' is listed more than once", module.id),
                ));
            }
        }
        Ok(())
    }

    /// Apply command line overrides on top of file values
    pub fn apply_args(&mut self, args: &Args) -> Result<(), ConfigError> {
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
        if let Some(format) = &args.log_format {
            self.logging.format = format.clone();
        }
        if let Some(file) = args.log_file_override() {
            self.logging.file = file;
        }
        if args.color.is_some() {
            self.logging.color = args.color;
        }

        if let Command::Serve(serve) = &args.command {
            if let Some(host) = &serve.host {
                self.server.host = host.clone();
            }
            if let Some(port) = serve.port {
                self.server.port = port;
            }
            if let Some(burst) = serve.burst_per_pass {
                self.queue.burst_per_pass = burst;
            }
        }

        self.validate()
    }

    /// Explicit setting, or colour when stderr is a terminal
    pub fn use_color(&self) -> bool {
        self.logging
            .color
            .unwrap_or_else(|| std::io::IsTerminal::is_terminal(&std::io::stderr()))
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.to_string(),
    }
}

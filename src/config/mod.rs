#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::Cli;
pub use toml_config::{AuditConfig, DbConfig, DbDriver, LoggingConfig, RegistryConfig};

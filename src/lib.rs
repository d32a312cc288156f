pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{CatalogStore, InMemoryAuditLog, JsonLinesAuditLog};
pub use config::RegistryConfig;
pub use core::{bus::CommandBus, response::CommandResponse};
pub use domain::status::Status;
pub use utils::error::{RegistryError, RepositoryError, Result};

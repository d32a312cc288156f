// Domain layer: catalog entities, natural keys, outcome codes and the ports
// the core consumes. No knowledge of concrete storage.

pub mod keys;
pub mod model;
pub mod ports;
pub mod status;

pub use keys::{Identifier, ModuleKey, ModuleVersionKey, ParseKeyError};
pub use model::{
    DownloadLocation, Module, ModuleFilters, ModuleVersion, ServiceDiscovery, VersionStatus,
};
pub use ports::{AuditLogStore, FileReader, ModuleRepository, Prompter, RepositoryResult};
pub use status::Status;

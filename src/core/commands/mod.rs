//! One command per registry operation.
//!
//! Every command validates its DTO, resolves what it needs from the
//! repository and reports through a [`CommandResponse`]. Validation failures,
//! misses and storage conflicts come back as data; only unexpected failures
//! are returned as errors.

pub mod add_module;
pub mod add_module_version;
pub mod delete_module;
pub mod delete_module_version;
pub mod download_module_version;
pub mod list_module_versions;
pub mod list_modules;
pub mod service_discovery;
pub mod show_module;
pub mod show_module_version;

use crate::core::response::{Action, AuditSubject, CommandResponse};
use crate::core::validation::Validator;
use crate::domain::ports::ModuleRepository;
use crate::utils::error::Result;
use async_trait::async_trait;

pub use add_module::{AddModuleCommand, AddModuleDto};
pub use add_module_version::{
    AddModuleVersionByKeyCommand, AddModuleVersionByKeyDto, AddModuleVersionCommand,
    AddModuleVersionDto,
};
pub use delete_module::{
    DeleteModuleByKeyCommand, DeleteModuleByKeyDto, DeleteModuleCommand, DeleteModuleDto,
};
pub use delete_module_version::{
    DeleteModuleVersionByKeyCommand, DeleteModuleVersionByKeyDto, DeleteModuleVersionCommand,
    DeleteModuleVersionDto,
};
pub use download_module_version::{DownloadModuleVersionCommand, DownloadModuleVersionDto};
pub use list_module_versions::{
    ListModuleVersionsByKeyCommand, ListModuleVersionsByKeyDto, ListModuleVersionsCommand,
    ListModuleVersionsDto,
};
pub use list_modules::{ListModulesCommand, ListModulesDto};
pub use service_discovery::ServiceDiscoveryCommand;
pub use show_module::{ShowModuleByKeyCommand, ShowModuleByKeyDto, ShowModuleCommand, ShowModuleDto};
pub use show_module_version::{
    ShowModuleVersionByKeyCommand, ShowModuleVersionByKeyDto, ShowModuleVersionCommand,
    ShowModuleVersionDto,
};

#[async_trait]
pub trait Command: Send + Sync {
    type Output: AuditSubject + Send + Sync + 'static;

    const ACTION: Action;

    async fn handle(
        &self,
        repo: &dyn ModuleRepository,
        validator: &Validator,
    ) -> Result<CommandResponse<Self::Output>>;
}

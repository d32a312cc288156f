use crate::domain::keys::{ModuleKey, ModuleVersionKey};
use crate::domain::model::{Module, ModuleFilters, ModuleVersion};
use crate::domain::status::Status;
use crate::utils::error::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Persistence contract for the module catalog.
///
/// Every single-entity lookup reports a miss as [`RepositoryError::NotFound`].
/// Writes that would break a storage constraint report
/// [`RepositoryError::Conflict`].
#[async_trait]
pub trait ModuleRepository: Send + Sync {
    async fn by_id(&self, id: Uuid) -> RepositoryResult<Module>;
    async fn by_key(&self, key: &ModuleKey) -> RepositoryResult<Module>;
    async fn all(&self, filters: &ModuleFilters) -> RepositoryResult<Vec<Module>>;

    async fn version_by_id(&self, id: Uuid) -> RepositoryResult<ModuleVersion>;
    async fn versions_by_module(&self, module_id: Uuid) -> RepositoryResult<Vec<ModuleVersion>>;
    async fn versions_by_module_key(&self, key: &ModuleKey)
        -> RepositoryResult<Vec<ModuleVersion>>;
    async fn version_by_module_and_value(
        &self,
        module_id: Uuid,
        version: &str,
    ) -> RepositoryResult<ModuleVersion>;
    async fn version_by_key(&self, key: &ModuleVersionKey) -> RepositoryResult<ModuleVersion>;

    async fn add_module(&self, module: Module) -> RepositoryResult<Module>;
    async fn delete_module(&self, module: &Module) -> RepositoryResult<()>;

    async fn add_version(&self, version: ModuleVersion) -> RepositoryResult<ModuleVersion>;
    async fn delete_versions_for_module(&self, module: &Module) -> RepositoryResult<()>;
    async fn delete_module_version(&self, version: &ModuleVersion) -> RepositoryResult<()>;

    /// Removes a module and all of its versions. Stores that can commit both
    /// deletes as one unit should override this.
    async fn delete_module_with_versions(&self, module: &Module) -> RepositoryResult<()> {
        self.delete_versions_for_module(module).await?;
        self.delete_module(module).await
    }
}

#[async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn save(
        &self,
        action: &str,
        status: Status,
        occurred_at: DateTime<Utc>,
        meta: &Map<String, Value>,
    ) -> RepositoryResult<()>;
}

pub trait Prompter: Send + Sync {
    fn ask(&self, question: &str) -> std::io::Result<String>;
}

#[async_trait]
pub trait FileReader: Send + Sync {
    async fn read_file(&self, path: &str) -> std::io::Result<Vec<u8>>;
}

use crate::core::commands::Command;
use crate::core::response::{Action, CommandResponse};
use crate::core::validation::{
    lenient_uuid, require, require_module_key, require_uuid, require_version, Predicate, Rules,
    ValidationError, Validator,
};
use crate::domain::keys::ModuleKey;
use crate::domain::model::{ModuleVersion, VersionStatus};
use crate::domain::ports::ModuleRepository;
use crate::utils::error::{RegistryError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddModuleVersionDto {
    pub version: String,
    pub module_id: String,
    pub source: String,
    pub repository_url: String,
}

impl Rules for AddModuleVersionDto {
    fn check_shape(&self, errors: &mut Vec<ValidationError>) {
        require_version(errors, "version", &self.version);
        require_uuid(errors, "module_id", &self.module_id);
        require(errors, "source", &self.source);
        require(errors, "repository_url", &self.repository_url);
    }

    fn predicates(&self) -> Vec<Predicate> {
        let module_id = lenient_uuid(&self.module_id);
        vec![
            Predicate::ModuleMustExistById(module_id),
            Predicate::ModuleVersionMustBeUniqueForId {
                module_id,
                version: self.version.clone(),
            },
        ]
    }
}

#[derive(Debug, Clone)]
pub struct AddModuleVersionCommand {
    pub dto: AddModuleVersionDto,
}

#[async_trait]
impl Command for AddModuleVersionCommand {
    type Output = ModuleVersion;

    const ACTION: Action = Action::AddModuleVersion;

    async fn handle(
        &self,
        repo: &dyn ModuleRepository,
        validator: &Validator,
    ) -> Result<CommandResponse<ModuleVersion>> {
        let errors = validator.validate(&self.dto, repo).await;
        if !errors.is_empty() {
            return Ok(CommandResponse::invalid(Self::ACTION, errors));
        }

        let module_id = lenient_uuid(&self.dto.module_id);
        let version = ModuleVersion {
            id: Uuid::new_v4(),
            version: self.dto.version.clone(),
            module_id,
            source: self.dto.source.clone(),
            repository_url: self.dto.repository_url.clone(),
            download_url: None,
            status: VersionStatus::Pending,
        };

        match repo.add_version(version).await {
            Ok(version) => {
                tracing::info!(
                    module_id = %module_id,
                    version = %version.version,
                    "module version added"
                );
                Ok(CommandResponse::created(Self::ACTION, version))
            }
            Err(e) if e.is_conflict() => {
                tracing::warn!(
                    module_id = %module_id,
                    version = %self.dto.version,
                    "module version conflicts with stored data: {}",
                    e
                );
                Ok(CommandResponse::conflict(Self::ACTION))
            }
            Err(e) => {
                tracing::error!(
                    command = "add_module_version",
                    module_id = %module_id,
                    version = %self.dto.version,
                    "failed to add module version to store: {}",
                    e
                );
                Err(RegistryError::repository("add_version", e))
            }
        }
    }
}

/// Same as [`AddModuleVersionDto`] but addressing the module by natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddModuleVersionByKeyDto {
    pub version: String,
    pub module: ModuleKey,
    pub source: String,
    pub repository_url: String,
}

impl Rules for AddModuleVersionByKeyDto {
    fn check_shape(&self, errors: &mut Vec<ValidationError>) {
        require_version(errors, "version", &self.version);
        require_module_key(errors, &self.module);
        require(errors, "source", &self.source);
        require(errors, "repository_url", &self.repository_url);
    }

    fn predicates(&self) -> Vec<Predicate> {
        vec![
            Predicate::ModuleMustExistByKey(self.module.clone()),
            Predicate::ModuleVersionMustBeUniqueForKey(
                self.module.clone().with_version(&self.version),
            ),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct AddModuleVersionByKeyCommand {
    pub dto: AddModuleVersionByKeyDto,
}

#[async_trait]
impl Command for AddModuleVersionByKeyCommand {
    type Output = ModuleVersion;

    const ACTION: Action = Action::AddModuleVersion;

    async fn handle(
        &self,
        repo: &dyn ModuleRepository,
        validator: &Validator,
    ) -> Result<CommandResponse<ModuleVersion>> {
        let errors = validator.validate(&self.dto, repo).await;
        if !errors.is_empty() {
            return Ok(CommandResponse::invalid(Self::ACTION, errors));
        }

        let module = match repo.by_key(&self.dto.module).await {
            Ok(module) => module,
            Err(e) if e.is_not_found() => return Ok(CommandResponse::not_found(Self::ACTION)),
            Err(e) => {
                tracing::error!(
                    command = "add_module_version",
                    fqn = %self.dto.module,
                    "failed to find module: {}",
                    e
                );
                return Err(RegistryError::repository("by_key", e));
            }
        };

        let by_id = AddModuleVersionCommand {
            dto: AddModuleVersionDto {
                version: self.dto.version.clone(),
                module_id: module.id.to_string(),
                source: self.dto.source.clone(),
                repository_url: self.dto.repository_url.clone(),
            },
        };

        by_id.handle(repo, validator).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::catalog::CatalogStore;
    use crate::core::commands::test_support::{seed_module, seed_version, StaleRepository};
    use crate::core::validation::Rule;
    use crate::domain::status::Status;

    fn dto(module_id: &str, version: &str) -> AddModuleVersionDto {
        AddModuleVersionDto {
            version: version.to_string(),
            module_id: module_id.to_string(),
            source: "git".to_string(),
            repository_url: "https://example.com/r".to_string(),
        }
    }

    #[tokio::test]
    async fn test_new_version_is_pending_without_download() {
        let store = CatalogStore::in_memory();
        let module = seed_module(&store, "github", "acme", "vpc").await;

        let response = AddModuleVersionCommand {
            dto: dto(&module.id.to_string(), "1.0.0"),
        }
        .handle(&store, &Validator::new())
        .await
        .unwrap();

        assert_eq!(response.status, Status::Created);
        let version = response.payload.unwrap();
        assert_eq!(version.status, VersionStatus::Pending);
        assert_eq!(version.download_url, None);
        assert_eq!(version.module_id, module.id);
    }

    #[tokio::test]
    async fn test_duplicate_version_is_invalid() {
        let store = CatalogStore::in_memory();
        let module = seed_module(&store, "github", "acme", "vpc").await;
        seed_version(&store, &module, "1.0.0").await;

        let response = AddModuleVersionCommand {
            dto: dto(&module.id.to_string(), "1.0.0"),
        }
        .handle(&store, &Validator::new())
        .await
        .unwrap();

        assert_eq!(response.status, Status::Invalid);
        assert_eq!(response.validation_errors[0].rule, Rule::UniqueModuleVersion);
    }

    #[tokio::test]
    async fn test_version_added_concurrently_is_conflict() {
        let repo = StaleRepository::new();
        let module = seed_module(&repo.inner, "github", "acme", "vpc").await;
        seed_version(&repo.inner, &module, "1.0.0").await;

        let response = AddModuleVersionCommand {
            dto: dto(&module.id.to_string(), "1.0.0"),
        }
        .handle(&repo, &Validator::new())
        .await
        .unwrap();

        assert_eq!(response.status, Status::Conflict);
        assert!(response.payload.is_none());
        assert!(response.validation_errors.is_empty());
        assert_eq!(repo.inner.versions_by_module(module.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_version_and_missing_module() {
        let store = CatalogStore::in_memory();

        let response = AddModuleVersionCommand {
            dto: dto(&Uuid::new_v4().to_string(), "not-a-semver"),
        }
        .handle(&store, &Validator::new())
        .await
        .unwrap();

        let rules: Vec<Rule> = response.validation_errors.iter().map(|e| e.rule).collect();
        assert_eq!(response.status, Status::Invalid);
        assert_eq!(rules, vec![Rule::Version, Rule::ModuleMustExist]);
    }

    #[tokio::test]
    async fn test_garbage_module_id_does_not_panic() {
        let store = CatalogStore::in_memory();

        let response = AddModuleVersionCommand {
            dto: AddModuleVersionDto {
                module_id: "???".to_string(),
                ..Default::default()
            },
        }
        .handle(&store, &Validator::new())
        .await
        .unwrap();

        let rules: Vec<Rule> = response.validation_errors.iter().map(|e| e.rule).collect();
        assert_eq!(
            rules,
            vec![
                Rule::Required,
                Rule::Uuid,
                Rule::Required,
                Rule::Required,
                Rule::ModuleMustExist
            ]
        );
    }

    #[tokio::test]
    async fn test_add_by_key_resolves_module() {
        let store = CatalogStore::in_memory();
        let module = seed_module(&store, "github", "acme", "vpc").await;

        let response = AddModuleVersionByKeyCommand {
            dto: AddModuleVersionByKeyDto {
                version: "dev-feature".to_string(),
                module: module.key(),
                source: "git".to_string(),
                repository_url: "https://example.com/r".to_string(),
            },
        }
        .handle(&store, &Validator::new())
        .await
        .unwrap();

        assert_eq!(response.status, Status::Created);
        assert_eq!(response.payload.unwrap().module_id, module.id);
    }

    #[tokio::test]
    async fn test_add_by_key_for_unknown_module() {
        let store = CatalogStore::in_memory();

        let response = AddModuleVersionByKeyCommand {
            dto: AddModuleVersionByKeyDto {
                version: "1.0.0".to_string(),
                module: ModuleKey::new("github", "acme", "missing"),
                source: "git".to_string(),
                repository_url: "https://example.com/r".to_string(),
            },
        }
        .handle(&store, &Validator::new())
        .await
        .unwrap();

        assert_eq!(response.status, Status::Invalid);
        assert_eq!(response.validation_errors[0].rule, Rule::ModuleMustExist);
    }
}

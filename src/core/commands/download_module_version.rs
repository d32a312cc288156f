use crate::core::commands::Command;
use crate::core::response::{Action, CommandResponse};
use crate::core::validation::{require, Predicate, Rules, ValidationError, Validator};
use crate::domain::keys::{ModuleKey, ModuleVersionKey};
use crate::domain::model::DownloadLocation;
use crate::domain::ports::ModuleRepository;
use crate::utils::error::{RegistryError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Path parameters of the registry protocol's download endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadModuleVersionDto {
    pub namespace: String,
    pub name: String,
    pub provider: String,
    pub version: String,
}

impl DownloadModuleVersionDto {
    pub fn module_key(&self) -> ModuleKey {
        ModuleKey::new(&self.provider, &self.namespace, &self.name)
    }

    pub fn key(&self) -> ModuleVersionKey {
        self.module_key().with_version(&self.version)
    }
}

impl From<ModuleVersionKey> for DownloadModuleVersionDto {
    fn from(key: ModuleVersionKey) -> Self {
        Self {
            namespace: key.module.namespace,
            name: key.module.name,
            provider: key.module.provider,
            version: key.version,
        }
    }
}

impl Rules for DownloadModuleVersionDto {
    fn check_shape(&self, errors: &mut Vec<ValidationError>) {
        require(errors, "namespace", &self.namespace);
        require(errors, "name", &self.name);
        require(errors, "provider", &self.provider);
        require(errors, "version", &self.version);
    }

    fn predicates(&self) -> Vec<Predicate> {
        vec![
            Predicate::ModuleMustExistByKey(self.module_key()),
            Predicate::ModuleVersionMustExistByKey(self.key()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct DownloadModuleVersionCommand {
    pub dto: DownloadModuleVersionDto,
}

#[async_trait]
impl Command for DownloadModuleVersionCommand {
    type Output = DownloadLocation;

    const ACTION: Action = Action::DownloadModuleVersion;

    async fn handle(
        &self,
        repo: &dyn ModuleRepository,
        validator: &Validator,
    ) -> Result<CommandResponse<DownloadLocation>> {
        let key = self.dto.key();
        let target = key.to_string();

        let errors = validator.validate(&self.dto, repo).await;
        if !errors.is_empty() {
            return Ok(CommandResponse::invalid(Self::ACTION, errors).attempted_for(target));
        }

        match repo.version_by_key(&key).await {
            Ok(version) => {
                tracing::debug!(
                    module_version_id = %version.id,
                    status = %version.status,
                    "resolved download location"
                );
                let location = DownloadLocation {
                    location: version.download_url,
                };
                Ok(CommandResponse::okay(Self::ACTION, location).attempted_for(target))
            }
            Err(e) if e.is_not_found() => {
                Ok(CommandResponse::not_found(Self::ACTION).attempted_for(target))
            }
            Err(e) => {
                tracing::error!(key = %target, "failed to resolve download location: {}", e);
                Err(RegistryError::repository("version_by_key", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::catalog::CatalogStore;
    use crate::core::commands::test_support::{seed_module, seed_version};
    use crate::core::validation::Rule;
    use crate::domain::status::Status;

    #[tokio::test]
    async fn test_download_returns_archive_location() {
        let store = CatalogStore::in_memory();
        let module = seed_module(&store, "github", "acme", "vpc").await;
        let version = seed_version(&store, &module, "1.0.0").await;

        let response = DownloadModuleVersionCommand {
            dto: version.key(&module).into(),
        }
        .handle(&store, &Validator::new())
        .await
        .unwrap();

        assert_eq!(response.status, Status::Okay);
        assert_eq!(
            response.payload.unwrap().location.as_deref(),
            Some("https://example.com/r/archive/1.0.0.tar.gz")
        );
    }

    #[tokio::test]
    async fn test_download_unknown_version() {
        let store = CatalogStore::in_memory();
        let module = seed_module(&store, "github", "acme", "vpc").await;

        let response = DownloadModuleVersionCommand {
            dto: module.key().with_version("2.0.0").into(),
        }
        .handle(&store, &Validator::new())
        .await
        .unwrap();

        let rules: Vec<Rule> = response.validation_errors.iter().map(|e| e.rule).collect();
        assert_eq!(response.status, Status::Invalid);
        assert_eq!(rules, vec![Rule::ModuleVersionMustExist]);
    }

    #[tokio::test]
    async fn test_download_unknown_module() {
        let store = CatalogStore::in_memory();

        let response = DownloadModuleVersionCommand {
            dto: DownloadModuleVersionDto {
                namespace: "acme".to_string(),
                name: "vpc".to_string(),
                provider: "github".to_string(),
                version: "1.0.0".to_string(),
            },
        }
        .handle(&store, &Validator::new())
        .await
        .unwrap();

        let rules: Vec<Rule> = response.validation_errors.iter().map(|e| e.rule).collect();
        assert_eq!(rules, vec![Rule::ModuleMustExist, Rule::ModuleVersionMustExist]);
    }

    #[tokio::test]
    async fn test_download_pending_version_has_no_location() {
        let store = CatalogStore::in_memory();
        let module = seed_module(&store, "github", "acme", "vpc").await;
        let mut version = seed_version(&store, &module, "1.0.0").await;
        store.delete_module_version(&version).await.unwrap();
        version.download_url = None;
        store.add_version(version.clone()).await.unwrap();

        let response = DownloadModuleVersionCommand {
            dto: version.key(&module).into(),
        }
        .handle(&store, &Validator::new())
        .await
        .unwrap();

        assert_eq!(response.status, Status::Okay);
        assert_eq!(response.payload, Some(DownloadLocation { location: None }));
    }
}

use crate::core::commands::Command;
use crate::core::response::{Action, CommandResponse};
use crate::core::validation::{
    lenient_uuid, require_module_version_key, require_uuid, Rules, ValidationError, Validator,
};
use crate::domain::keys::ModuleVersionKey;
use crate::domain::model::ModuleVersion;
use crate::domain::ports::ModuleRepository;
use crate::utils::error::{RegistryError, RepositoryError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowModuleVersionDto {
    pub id: String,
}

impl Rules for ShowModuleVersionDto {
    fn check_shape(&self, errors: &mut Vec<ValidationError>) {
        require_uuid(errors, "id", &self.id);
    }
}

#[derive(Debug, Clone)]
pub struct ShowModuleVersionCommand {
    pub dto: ShowModuleVersionDto,
}

#[async_trait]
impl Command for ShowModuleVersionCommand {
    type Output = ModuleVersion;

    const ACTION: Action = Action::ShowModuleVersion;

    async fn handle(
        &self,
        repo: &dyn ModuleRepository,
        validator: &Validator,
    ) -> Result<CommandResponse<ModuleVersion>> {
        let errors = validator.validate(&self.dto, repo).await;
        if !errors.is_empty() {
            return Ok(CommandResponse::invalid(Self::ACTION, errors).attempted_for(&self.dto.id));
        }

        let found = repo.version_by_id(lenient_uuid(&self.dto.id)).await;
        respond(found, &self.dto.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowModuleVersionByKeyDto {
    pub key: ModuleVersionKey,
}

impl Rules for ShowModuleVersionByKeyDto {
    fn check_shape(&self, errors: &mut Vec<ValidationError>) {
        require_module_version_key(errors, &self.key);
    }
}

#[derive(Debug, Clone)]
pub struct ShowModuleVersionByKeyCommand {
    pub dto: ShowModuleVersionByKeyDto,
}

#[async_trait]
impl Command for ShowModuleVersionByKeyCommand {
    type Output = ModuleVersion;

    const ACTION: Action = Action::ShowModuleVersion;

    async fn handle(
        &self,
        repo: &dyn ModuleRepository,
        validator: &Validator,
    ) -> Result<CommandResponse<ModuleVersion>> {
        let searched = self.dto.key.to_string();

        let errors = validator.validate(&self.dto, repo).await;
        if !errors.is_empty() {
            return Ok(CommandResponse::invalid(Self::ACTION, errors).attempted_for(searched));
        }

        let found = repo.version_by_key(&self.dto.key).await;
        respond(found, &searched)
    }
}

fn respond(
    found: std::result::Result<ModuleVersion, RepositoryError>,
    searched: &str,
) -> Result<CommandResponse<ModuleVersion>> {
    match found {
        Ok(version) => {
            Ok(CommandResponse::okay(Action::ShowModuleVersion, version).attempted_for(searched))
        }
        Err(e) if e.is_not_found() => {
            Ok(CommandResponse::not_found(Action::ShowModuleVersion).attempted_for(searched))
        }
        Err(e) => {
            tracing::error!(
                command = "show_module_version",
                searched_for = %searched,
                "failed to find module version: {}",
                e
            );
            Err(RegistryError::repository("show_module_version", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::catalog::CatalogStore;
    use crate::core::commands::test_support::{seed_module, seed_version};
    use crate::core::validation::Rule;
    use crate::domain::keys::ModuleKey;
    use crate::domain::status::Status;

    #[tokio::test]
    async fn test_show_version_by_id_and_key() {
        let store = CatalogStore::in_memory();
        let module = seed_module(&store, "github", "acme", "vpc").await;
        let version = seed_version(&store, &module, "1.2.3").await;

        let by_id = ShowModuleVersionCommand {
            dto: ShowModuleVersionDto {
                id: version.id.to_string(),
            },
        }
        .handle(&store, &Validator::new())
        .await
        .unwrap();
        let by_key = ShowModuleVersionByKeyCommand {
            dto: ShowModuleVersionByKeyDto {
                key: version.key(&module),
            },
        }
        .handle(&store, &Validator::new())
        .await
        .unwrap();

        assert_eq!(by_id.payload, Some(version.clone()));
        assert_eq!(by_key.payload, Some(version));
    }

    #[tokio::test]
    async fn test_show_version_missing() {
        let store = CatalogStore::in_memory();
        seed_module(&store, "github", "acme", "vpc").await;

        let response = ShowModuleVersionByKeyCommand {
            dto: ShowModuleVersionByKeyDto {
                key: ModuleKey::new("github", "acme", "vpc").with_version("0.0.1"),
            },
        }
        .handle(&store, &Validator::new())
        .await
        .unwrap();

        assert_eq!(response.status, Status::NotFound);
    }

    #[tokio::test]
    async fn test_show_version_requires_full_key() {
        let store = CatalogStore::in_memory();

        let response = ShowModuleVersionByKeyCommand {
            dto: ShowModuleVersionByKeyDto {
                key: ModuleKey::new("github", "", "vpc").with_version(""),
            },
        }
        .handle(&store, &Validator::new())
        .await
        .unwrap();

        let fields: Vec<&str> = response
            .validation_errors
            .iter()
            .map(|e| e.field.as_str())
            .collect();
        assert_eq!(response.status, Status::Invalid);
        assert_eq!(fields, vec!["namespace", "version"]);
        assert!(response.validation_errors.iter().all(|e| e.rule == Rule::Required));
    }
}

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
pub struct DeleteModuleVersionDto {
    pub id: String,
}

impl Rules for DeleteModuleVersionDto {
    fn check_shape(&self, errors: &mut Vec<ValidationError>) {
        require_uuid(errors, "id", &self.id);
    }
}

#[derive(Debug, Clone)]
pub struct DeleteModuleVersionCommand {
    pub dto: DeleteModuleVersionDto,
}

#[async_trait]
impl Command for DeleteModuleVersionCommand {
    type Output = ModuleVersion;

    const ACTION: Action = Action::DeleteModuleVersion;

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
        delete(repo, found, &self.dto.id).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteModuleVersionByKeyDto {
    pub key: ModuleVersionKey,
}

impl Rules for DeleteModuleVersionByKeyDto {
    fn check_shape(&self, errors: &mut Vec<ValidationError>) {
        require_module_version_key(errors, &self.key);
    }
}

#[derive(Debug, Clone)]
pub struct DeleteModuleVersionByKeyCommand {
    pub dto: DeleteModuleVersionByKeyDto,
}

#[async_trait]
impl Command for DeleteModuleVersionByKeyCommand {
    type Output = ModuleVersion;

    const ACTION: Action = Action::DeleteModuleVersion;

    async fn handle(
        &self,
        repo: &dyn ModuleRepository,
        validator: &Validator,
    ) -> Result<CommandResponse<ModuleVersion>> {
        let target = self.dto.key.to_string();

        let errors = validator.validate(&self.dto, repo).await;
        if !errors.is_empty() {
            return Ok(CommandResponse::invalid(Self::ACTION, errors).attempted_for(target));
        }

        let found = repo.version_by_key(&self.dto.key).await;
        delete(repo, found, &target).await
    }
}

async fn delete(
    repo: &dyn ModuleRepository,
    found: std::result::Result<ModuleVersion, RepositoryError>,
    target: &str,
) -> Result<CommandResponse<ModuleVersion>> {
    let version = match found {
        Ok(version) => version,
        Err(e) if e.is_not_found() => {
            return Ok(CommandResponse::not_found(Action::DeleteModuleVersion).attempted_for(target))
        }
        Err(e) => {
            tracing::error!(
                command = "delete_module_version",
                target = %target,
                "failed to find module version: {}",
                e
            );
            return Err(RegistryError::repository("find_module_version", e));
        }
    };

    match repo.delete_module_version(&version).await {
        Ok(()) => {
            tracing::info!(
                module_version_id = %version.id,
                module_id = %version.module_id,
                version = %version.version,
                "module version deleted"
            );
            Ok(CommandResponse::okay(Action::DeleteModuleVersion, version).attempted_for(target))
        }
        // Removed by someone else after the lookup.
        Err(e) if e.is_not_found() => {
            Ok(CommandResponse::not_found(Action::DeleteModuleVersion).attempted_for(target))
        }
        Err(e) => {
            tracing::error!(
                command = "delete_module_version",
                module_version_id = %version.id,
                "failed to delete module version from store: {}",
                e
            );
            Err(RegistryError::repository("delete_module_version", e))
        }
    }
}

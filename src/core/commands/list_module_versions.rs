use crate::core::commands::Command;
use crate::core::response::{Action, CommandResponse};
use crate::core::validation::{
    lenient_uuid, require_module_key, require_uuid, Rules, ValidationError, Validator,
};
use crate::domain::keys::ModuleKey;
use crate::domain::model::ModuleVersion;
use crate::domain::ports::ModuleRepository;
use crate::utils::error::{RegistryError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListModuleVersionsDto {
    pub module_id: String,
}

impl Rules for ListModuleVersionsDto {
    fn check_shape(&self, errors: &mut Vec<ValidationError>) {
        require_uuid(errors, "module_id", &self.module_id);
    }
}

#[derive(Debug, Clone)]
pub struct ListModuleVersionsCommand {
    pub dto: ListModuleVersionsDto,
}

#[async_trait]
impl Command for ListModuleVersionsCommand {
    type Output = Vec<ModuleVersion>;

    const ACTION: Action = Action::ListModuleVersions;

    async fn handle(
        &self,
        repo: &dyn ModuleRepository,
        validator: &Validator,
    ) -> Result<CommandResponse<Vec<ModuleVersion>>> {
        let target = &self.dto.module_id;

        let errors = validator.validate(&self.dto, repo).await;
        if !errors.is_empty() {
            return Ok(CommandResponse::invalid(Self::ACTION, errors).attempted_for(target));
        }

        let module = match repo.by_id(lenient_uuid(target)).await {
            Ok(module) => module,
            Err(e) if e.is_not_found() => {
                return Ok(CommandResponse::not_found(Self::ACTION).attempted_for(target))
            }
            Err(e) => {
                tracing::error!(module_id = %target, "failed to find module: {}", e);
                return Err(RegistryError::repository("by_id", e));
            }
        };

        match repo.versions_by_module(module.id).await {
            Ok(versions) => {
                Ok(CommandResponse::okay(Self::ACTION, sorted(versions)).attempted_for(target))
            }
            Err(e) => {
                tracing::error!(module_id = %module.id, "error listing module versions: {}", e);
                Err(RegistryError::repository("versions_by_module", e))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListModuleVersionsByKeyDto {
    pub module: ModuleKey,
}

impl Rules for ListModuleVersionsByKeyDto {
    fn check_shape(&self, errors: &mut Vec<ValidationError>) {
        require_module_key(errors, &self.module);
    }
}

#[derive(Debug, Clone)]
pub struct ListModuleVersionsByKeyCommand {
    pub dto: ListModuleVersionsByKeyDto,
}

#[async_trait]
impl Command for ListModuleVersionsByKeyCommand {
    type Output = Vec<ModuleVersion>;

    const ACTION: Action = Action::ListModuleVersions;

    async fn handle(
        &self,
        repo: &dyn ModuleRepository,
        validator: &Validator,
    ) -> Result<CommandResponse<Vec<ModuleVersion>>> {
        let target = self.dto.module.to_string();

        let errors = validator.validate(&self.dto, repo).await;
        if !errors.is_empty() {
            return Ok(CommandResponse::invalid(Self::ACTION, errors).attempted_for(target));
        }

        // The key listing alone cannot tell an unknown module from one
        // without versions.
        match repo.by_key(&self.dto.module).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                return Ok(CommandResponse::not_found(Self::ACTION).attempted_for(target))
            }
            Err(e) => {
                tracing::error!(fqn = %target, "failed to find module: {}", e);
                return Err(RegistryError::repository("by_key", e));
            }
        }

        match repo.versions_by_module_key(&self.dto.module).await {
            Ok(versions) => {
                Ok(CommandResponse::okay(Self::ACTION, sorted(versions)).attempted_for(target))
            }
            Err(e) => {
                tracing::error!(fqn = %target, "error listing module versions: {}", e);
                Err(RegistryError::repository("versions_by_module_key", e))
            }
        }
    }
}

fn sorted(mut versions: Vec<ModuleVersion>) -> Vec<ModuleVersion> {
    versions.sort_by(|a, b| a.version.cmp(&b.version));
    versions
}

use crate::core::commands::Command;
use crate::core::response::{Action, CommandResponse};
use crate::core::validation::{
    lenient_uuid, require_module_key, require_uuid, Predicate, Rules, ValidationError, Validator,
};
use crate::domain::keys::ModuleKey;
use crate::domain::model::Module;
use crate::domain::ports::ModuleRepository;
use crate::utils::error::{RegistryError, RepositoryError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteModuleDto {
    pub id: String,
    pub delete_versions: bool,
}

impl Rules for DeleteModuleDto {
    fn check_shape(&self, errors: &mut Vec<ValidationError>) {
        require_uuid(errors, "id", &self.id);
    }

    fn predicates(&self) -> Vec<Predicate> {
        if self.delete_versions {
            return Vec::new();
        }
        vec![Predicate::NoVersionsExistForModuleId(lenient_uuid(&self.id))]
    }
}

#[derive(Debug, Clone)]
pub struct DeleteModuleCommand {
    pub dto: DeleteModuleDto,
}

#[async_trait]
impl Command for DeleteModuleCommand {
    type Output = Module;

    const ACTION: Action = Action::DeleteModule;

    async fn handle(
        &self,
        repo: &dyn ModuleRepository,
        validator: &Validator,
    ) -> Result<CommandResponse<Module>> {
        let errors = validator.validate(&self.dto, repo).await;
        if !errors.is_empty() {
            return Ok(CommandResponse::invalid(Self::ACTION, errors).attempted_for(&self.dto.id));
        }

        let found = repo.by_id(lenient_uuid(&self.dto.id)).await;
        delete(repo, found, self.dto.delete_versions, &self.dto.id).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteModuleByKeyDto {
    pub key: ModuleKey,
    #[serde(default)]
    pub delete_versions: bool,
}

impl Rules for DeleteModuleByKeyDto {
    fn check_shape(&self, errors: &mut Vec<ValidationError>) {
        require_module_key(errors, &self.key);
    }

    fn predicates(&self) -> Vec<Predicate> {
        if self.delete_versions {
            return Vec::new();
        }
        vec![Predicate::NoVersionsExistForModuleKey(self.key.clone())]
    }
}

#[derive(Debug, Clone)]
pub struct DeleteModuleByKeyCommand {
    pub dto: DeleteModuleByKeyDto,
}

#[async_trait]
impl Command for DeleteModuleByKeyCommand {
    type Output = Module;

    const ACTION: Action = Action::DeleteModule;

    async fn handle(
        &self,
        repo: &dyn ModuleRepository,
        validator: &Validator,
    ) -> Result<CommandResponse<Module>> {
        let target = self.dto.key.to_string();

        let errors = validator.validate(&self.dto, repo).await;
        if !errors.is_empty() {
            return Ok(CommandResponse::invalid(Self::ACTION, errors).attempted_for(target));
        }

        let found = repo.by_key(&self.dto.key).await;
        delete(repo, found, self.dto.delete_versions, &target).await
    }
}

async fn delete(
    repo: &dyn ModuleRepository,
    found: std::result::Result<Module, RepositoryError>,
    with_versions: bool,
    target: &str,
) -> Result<CommandResponse<Module>> {
    let module = match found {
        Ok(module) => module,
        Err(e) if e.is_not_found() => {
            return Ok(CommandResponse::not_found(Action::DeleteModule).attempted_for(target))
        }
        Err(e) => {
            tracing::error!(
                command = "delete_module",
                target = %target,
                "failed to find module: {}",
                e
            );
            return Err(RegistryError::repository("find_module", e));
        }
    };

    let deleted = if with_versions {
        repo.delete_module_with_versions(&module).await
    } else {
        repo.delete_module(&module).await
    };

    match deleted {
        Ok(()) => {
            tracing::info!(
                module_id = %module.id,
                fqn = %module.key(),
                with_versions,
                "module deleted"
            );
            Ok(CommandResponse::okay(Action::DeleteModule, module).attempted_for(target))
        }
        Err(e) if e.is_conflict() => {
            // A version was added between validation and the delete.
            tracing::warn!(module_id = %module.id, "module delete blocked by stored data: {}", e);
            Ok(CommandResponse::conflict(Action::DeleteModule).attempted_for(target))
        }
        Err(e) => {
            tracing::error!(
                command = "delete_module",
                module_id = %module.id,
                with_versions,
                "failed to delete module from store: {}",
                e
            );
            Err(RegistryError::repository("delete_module", e))
        }
    }
}

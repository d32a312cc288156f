use crate::core::commands::Command;
use crate::core::response::{Action, CommandResponse};
use crate::core::validation::{
    lenient_uuid, require_module_key, require_uuid, Rules, ValidationError, Validator,
};
use crate::domain::keys::ModuleKey;
use crate::domain::model::Module;
use crate::domain::ports::ModuleRepository;
use crate::utils::error::{RegistryError, RepositoryError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowModuleDto {
    pub id: String,
}

impl Rules for ShowModuleDto {
    fn check_shape(&self, errors: &mut Vec<ValidationError>) {
        require_uuid(errors, "id", &self.id);
    }
}

#[derive(Debug, Clone)]
pub struct ShowModuleCommand {
    pub dto: ShowModuleDto,
}

#[async_trait]
impl Command for ShowModuleCommand {
    type Output = Module;

    const ACTION: Action = Action::ShowModule;

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
        respond(found, &self.dto.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowModuleByKeyDto {
    pub key: ModuleKey,
}

impl Rules for ShowModuleByKeyDto {
    fn check_shape(&self, errors: &mut Vec<ValidationError>) {
        require_module_key(errors, &self.key);
    }
}

#[derive(Debug, Clone)]
pub struct ShowModuleByKeyCommand {
    pub dto: ShowModuleByKeyDto,
}

#[async_trait]
impl Command for ShowModuleByKeyCommand {
    type Output = Module;

    const ACTION: Action = Action::ShowModule;

    async fn handle(
        &self,
        repo: &dyn ModuleRepository,
        validator: &Validator,
    ) -> Result<CommandResponse<Module>> {
        let searched = self.dto.key.to_string();

        let errors = validator.validate(&self.dto, repo).await;
        if !errors.is_empty() {
            return Ok(CommandResponse::invalid(Self::ACTION, errors).attempted_for(searched));
        }

        let found = repo.by_key(&self.dto.key).await;
        respond(found, &searched)
    }
}

fn respond(
    found: std::result::Result<Module, RepositoryError>,
    searched: &str,
) -> Result<CommandResponse<Module>> {
    match found {
        Ok(module) => Ok(CommandResponse::okay(Action::ShowModule, module).attempted_for(searched)),
        Err(e) if e.is_not_found() => {
            Ok(CommandResponse::not_found(Action::ShowModule).attempted_for(searched))
        }
        Err(e) => {
            tracing::error!(
                command = "show_module",
                searched_for = %searched,
                "failed to find module: {}",
                e
            );
            Err(RegistryError::repository("show_module", e))
        }
    }
}

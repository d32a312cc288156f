use crate::core::commands::Command;
use crate::core::response::{Action, CommandResponse};
use crate::core::validation::{require_module_key, Predicate, Rules, ValidationError, Validator};
use crate::domain::keys::ModuleKey;
use crate::domain::model::Module;
use crate::domain::ports::ModuleRepository;
use crate::utils::error::{RegistryError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddModuleDto {
    pub namespace: String,
    pub name: String,
    pub provider: String,
}

impl AddModuleDto {
    pub fn key(&self) -> ModuleKey {
        ModuleKey::new(&self.provider, &self.namespace, &self.name)
    }
}

impl Rules for AddModuleDto {
    fn check_shape(&self, errors: &mut Vec<ValidationError>) {
        require_module_key(errors, &self.key());
    }

    fn predicates(&self) -> Vec<Predicate> {
        vec![Predicate::ModuleKeyMustBeUnique(self.key())]
    }
}

#[derive(Debug, Clone)]
pub struct AddModuleCommand {
    pub dto: AddModuleDto,
}

#[async_trait]
impl Command for AddModuleCommand {
    type Output = Module;

    const ACTION: Action = Action::AddModule;

    async fn handle(
        &self,
        repo: &dyn ModuleRepository,
        validator: &Validator,
    ) -> Result<CommandResponse<Module>> {
        let errors = validator.validate(&self.dto, repo).await;
        if !errors.is_empty() {
            return Ok(CommandResponse::invalid(Self::ACTION, errors));
        }

        let key = self.dto.key();
        let module = Module {
            id: Uuid::new_v4(),
            name: key.name.clone(),
            namespace: key.namespace.clone(),
            provider: key.provider.clone(),
        };

        match repo.add_module(module).await {
            Ok(module) => {
                tracing::info!(module_id = %module.id, fqn = %key, "module added");
                Ok(CommandResponse::created(Self::ACTION, module))
            }
            Err(e) if e.is_conflict() => {
                tracing::warn!(fqn = %key, "module was added concurrently: {}", e);
                Ok(CommandResponse::conflict(Self::ACTION))
            }
            Err(e) => {
                tracing::error!(
                    command = "add_module",
                    fqn = %key,
                    "failed to add module to store: {}",
                    e
                );
                Err(RegistryError::repository("add_module", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::catalog::CatalogStore;
    use crate::core::commands::test_support::{seed_module, FailingRepository, StaleRepository};
    use crate::core::validation::{Rule, MODULE_KEY_FIELD};
    use crate::domain::status::Status;

    fn command(provider: &str, namespace: &str, name: &str) -> AddModuleCommand {
        AddModuleCommand {
            dto: AddModuleDto {
                namespace: namespace.to_string(),
                name: name.to_string(),
                provider: provider.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_add_module_created() {
        let store = CatalogStore::in_memory();

        let response = command("github", "acme", "vpc")
            .handle(&store, &Validator::new())
            .await
            .unwrap();

        assert_eq!(response.status, Status::Created);
        let module = response.payload.unwrap();
        assert_eq!(module.key(), ModuleKey::new("github", "acme", "vpc"));
        assert_eq!(store.by_id(module.id).await.unwrap(), module);
    }

    #[tokio::test]
    async fn test_add_module_rejects_duplicate_key() {
        let store = CatalogStore::in_memory();
        seed_module(&store, "github", "acme", "vpc").await;

        let response = command("github", "acme", "vpc")
            .handle(&store, &Validator::new())
            .await
            .unwrap();

        assert_eq!(response.status, Status::Invalid);
        assert!(response.payload.is_none());
        assert_eq!(response.validation_errors.len(), 1);
        assert_eq!(response.validation_errors[0].rule, Rule::UniqueModulePath);
        assert_eq!(response.validation_errors[0].field, MODULE_KEY_FIELD);
    }

    #[tokio::test]
    async fn test_add_module_reports_every_missing_field() {
        let store = CatalogStore::in_memory();

        let response = command("", "", "")
            .handle(&store, &Validator::new())
            .await
            .unwrap();

        let fields: Vec<&str> = response
            .validation_errors
            .iter()
            .map(|e| e.field.as_str())
            .collect();
        assert_eq!(response.status, Status::Invalid);
        assert_eq!(fields, vec!["provider", "namespace", "name"]);
    }

    #[tokio::test]
    async fn test_add_module_store_conflict_is_reported_as_data() {
        let repo = StaleRepository::new();
        seed_module(&repo.inner, "github", "acme", "vpc").await;

        let response = command("github", "acme", "vpc")
            .handle(&repo, &Validator::new())
            .await
            .unwrap();

        assert_eq!(response.status, Status::Conflict);
        assert!(response.payload.is_none());
        assert!(response.validation_errors.is_empty());
        assert_eq!(repo.inner.all(&Default::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_module_store_failure_is_internal_error() {
        let result = command("github", "acme", "vpc")
            .handle(&FailingRepository, &Validator::new())
            .await;

        assert!(matches!(
            result,
            Err(RegistryError::RepositoryError {
                operation: "add_module",
                ..
            })
        ));
    }

    #[test]
    fn test_dto_deserializes_from_json() {
        let dto: AddModuleDto =
            serde_json::from_str(r#"{"provider":"github","namespace":"acme","name":"vpc"}"#)
                .unwrap();

        assert_eq!(dto.key().to_string(), "github/acme/vpc");
    }
}

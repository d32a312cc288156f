use crate::core::commands::Command;
use crate::core::response::{Action, CommandResponse};
use crate::core::validation::{Rules, ValidationError, Validator};
use crate::domain::model::{Module, ModuleFilters};
use crate::domain::ports::ModuleRepository;
use crate::utils::error::{RegistryError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListModulesDto {
    pub provider: Option<String>,
    pub namespace: Option<String>,
}

impl ListModulesDto {
    /// Blank filters from the CLI mean "no filter".
    pub fn new(provider: Option<String>, namespace: Option<String>) -> Self {
        Self {
            provider: provider.filter(|p| !p.is_empty()),
            namespace: namespace.filter(|ns| !ns.is_empty()),
        }
    }

    fn filters(&self) -> ModuleFilters {
        ModuleFilters {
            provider: self.provider.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

impl Rules for ListModulesDto {
    fn check_shape(&self, _errors: &mut Vec<ValidationError>) {}
}

#[derive(Debug, Clone)]
pub struct ListModulesCommand {
    pub dto: ListModulesDto,
}

#[async_trait]
impl Command for ListModulesCommand {
    type Output = Vec<Module>;

    const ACTION: Action = Action::ListModules;

    async fn handle(
        &self,
        repo: &dyn ModuleRepository,
        _validator: &Validator,
    ) -> Result<CommandResponse<Vec<Module>>> {
        let filters = self.dto.filters();

        let mut modules = match repo.all(&filters).await {
            Ok(modules) => modules,
            Err(e) => {
                tracing::error!(
                    provider_filter = ?filters.provider,
                    namespace_filter = ?filters.namespace,
                    "error listing modules: {}",
                    e
                );
                return Err(RegistryError::repository("all", e));
            }
        };

        // Stores may hand back any order, and may ignore filters.
        modules.retain(|m| filters.matches(m));
        modules.sort_by(|a, b| {
            (&a.provider, &a.namespace, &a.name).cmp(&(&b.provider, &b.namespace, &b.name))
        });

        Ok(CommandResponse::okay(Self::ACTION, modules))
    }
}

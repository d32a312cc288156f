use crate::adapters::{CatalogStore, JsonLinesAuditLog, LocalFileReader, StdinPrompter};
use crate::config::{DbDriver, RegistryConfig};
use crate::core::auditor::Auditor;
use crate::core::bus::CommandBus;
use crate::domain::ports::{FileReader, ModuleRepository, Prompter};
use crate::utils::error::{RegistryError, Result};
use std::sync::Arc;

/// Assembles a [`CommandBus`] from configuration. Prompter and file reader
/// default to stdin and the working directory.
pub struct ServiceBuilder<'a> {
    config: &'a RegistryConfig,
    prompter: Option<Arc<dyn Prompter>>,
    files: Option<Arc<dyn FileReader>>,
}

impl<'a> ServiceBuilder<'a> {
    pub fn new(config: &'a RegistryConfig) -> Self {
        Self {
            config,
            prompter: None,
            files: None,
        }
    }

    pub fn with_prompter(mut self, prompter: Arc<dyn Prompter>) -> Self {
        self.prompter = Some(prompter);
        self
    }

    pub fn with_file_reader(mut self, files: Arc<dyn FileReader>) -> Self {
        self.files = Some(files);
        self
    }

    /// Must run inside a tokio runtime when auditing is enabled.
    pub async fn build(self) -> Result<CommandBus> {
        let repo = self.repository().await?;
        let prompter = self
            .prompter
            .unwrap_or_else(|| Arc::new(StdinPrompter::new()));
        let files = self
            .files
            .unwrap_or_else(|| Arc::new(LocalFileReader::current_dir()));

        let bus = CommandBus::new(repo, prompter, files);

        if !self.config.audit.enabled {
            tracing::debug!("audit log disabled");
            return Ok(bus);
        }

        let store = Arc::new(JsonLinesAuditLog::new(&self.config.audit.path));
        tracing::debug!(path = %self.config.audit.path, "audit log enabled");
        Ok(bus.with_audit(Auditor::new(store).spawn()))
    }

    async fn repository(&self) -> Result<Arc<dyn ModuleRepository>> {
        match self.config.db.driver {
            DbDriver::Memory => {
                tracing::debug!("using in-memory catalog");
                Ok(Arc::new(CatalogStore::in_memory()))
            }
            DbDriver::Fs => {
                let path = &self.config.db.options.fs.path;
                tracing::debug!(path = %path, "using file-backed catalog");
                let store = CatalogStore::open(path)
                    .await
                    .map_err(|e| RegistryError::repository("open_catalog", e))?;
                Ok(Arc::new(store))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::status::Status;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_backed_services() {
        let dir = TempDir::new().unwrap();
        let mut config = RegistryConfig::default();
        config.db.options.fs.path = dir.path().join("catalog.json").display().to_string();
        config.audit.path = dir.path().join("audit.log").display().to_string();

        let bus = ServiceBuilder::new(&config).build().await.unwrap();
        let response = bus
            .list_modules_from_cli(None, None)
            .await
            .unwrap();
        bus.shutdown().await;

        assert_eq!(response.status, Status::Okay);
        let audit = std::fs::read_to_string(dir.path().join("audit.log")).unwrap();
        assert!(audit.contains("v1.modules.list"));
    }

    #[tokio::test]
    async fn test_unreadable_catalog_fails_build() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, "garbage").unwrap();

        let mut config = RegistryConfig::default();
        config.db.options.fs.path = path.display().to_string();
        config.audit.enabled = false;

        let result = ServiceBuilder::new(&config).build().await;
        assert!(matches!(
            result,
            Err(RegistryError::RepositoryError {
                operation: "open_catalog",
                ..
            })
        ));
    }
}

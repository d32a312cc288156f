//! Facade between loosely-typed callers (the CLI, tests) and the commands.
//!
//! The bus decides whether an argument is an id or a natural key, loads
//! DTOs from JSON files or interactive answers, asks for confirmation
//! before destructive work and hands every outcome to the audit worker.

use crate::core::auditor::{AuditEntry, AuditHandle};
use crate::core::commands::*;
use crate::core::response::{Action, AuditSubject, CommandResponse};
use crate::core::validation::{Rule, ValidationError, Validator};
use crate::domain::keys::{Identifier, ModuleKey, ModuleVersionKey};
use crate::domain::model::{DownloadLocation, Module, ModuleVersion, ServiceDiscovery};
use crate::domain::ports::{FileReader, ModuleRepository, Prompter};
use crate::domain::status::Status;
use crate::utils::error::{RegistryError, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub const CONFIRMATION_QUESTION: &str = "Are you sure? [y/n]";

pub struct CommandBus {
    repo: Arc<dyn ModuleRepository>,
    prompter: Arc<dyn Prompter>,
    files: Arc<dyn FileReader>,
    audit: Option<AuditHandle>,
    validator: Validator,
}

impl CommandBus {
    pub fn new(
        repo: Arc<dyn ModuleRepository>,
        prompter: Arc<dyn Prompter>,
        files: Arc<dyn FileReader>,
    ) -> Self {
        Self {
            repo,
            prompter,
            files,
            audit: None,
            validator: Validator::new(),
        }
    }

    pub fn with_audit(mut self, handle: AuditHandle) -> Self {
        self.audit = Some(handle);
        self
    }

    /// Waits for queued audit records to be written.
    pub async fn shutdown(self) {
        if let Some(audit) = self.audit {
            audit.shutdown().await;
        }
    }

    // Modules

    pub async fn add_module_from_cli(&self, file: Option<&str>) -> Result<CommandResponse<Module>> {
        let dto = match file {
            Some(path) => self.load_json::<AddModuleDto>(path, "AddModuleDto").await?,
            None => AddModuleDto {
                provider: self.ask("Provider: ")?,
                namespace: self.ask("Namespace: ")?,
                name: self.ask("Name: ")?,
            },
        };

        self.add_module(dto).await
    }

    pub async fn add_module(&self, dto: AddModuleDto) -> Result<CommandResponse<Module>> {
        self.dispatch(AddModuleCommand { dto }).await
    }

    pub async fn list_modules_from_cli(
        &self,
        provider: Option<String>,
        namespace: Option<String>,
    ) -> Result<CommandResponse<Vec<Module>>> {
        self.list_modules(ListModulesDto::new(provider, namespace)).await
    }

    pub async fn list_modules(&self, dto: ListModulesDto) -> Result<CommandResponse<Vec<Module>>> {
        self.dispatch(ListModulesCommand { dto }).await
    }

    pub async fn show_module_from_cli(&self, id_or_fqn: &str) -> Result<CommandResponse<Module>> {
        match Identifier::<ModuleKey>::resolve(id_or_fqn) {
            Some(Identifier::ByKey(key)) => {
                self.show_module_by_key(ShowModuleByKeyDto { key }).await
            }
            Some(Identifier::ById(id)) => {
                self.show_module_by_id(ShowModuleDto { id: id.to_string() })
                    .await
            }
            None => self.unresolved(Action::ShowModule, id_or_fqn),
        }
    }

    pub async fn show_module_by_id(&self, dto: ShowModuleDto) -> Result<CommandResponse<Module>> {
        self.dispatch(ShowModuleCommand { dto }).await
    }

    pub async fn show_module_by_key(
        &self,
        dto: ShowModuleByKeyDto,
    ) -> Result<CommandResponse<Module>> {
        self.dispatch(ShowModuleByKeyCommand { dto }).await
    }

    pub async fn delete_module_from_cli(
        &self,
        id_or_fqn: &str,
        delete_versions: bool,
        force: bool,
    ) -> Result<CommandResponse<Module>> {
        let Some(identifier) = Identifier::<ModuleKey>::resolve(id_or_fqn) else {
            return self.unresolved(Action::DeleteModule, id_or_fqn);
        };

        self.confirm(format!("delete_module:{}", id_or_fqn), force)?;

        match identifier {
            Identifier::ByKey(key) => {
                self.delete_module_by_key(DeleteModuleByKeyDto {
                    key,
                    delete_versions,
                })
                .await
            }
            Identifier::ById(id) => {
                self.delete_module_by_id(DeleteModuleDto {
                    id: id.to_string(),
                    delete_versions,
                })
                .await
            }
        }
    }

    pub async fn delete_module_by_id(
        &self,
        dto: DeleteModuleDto,
    ) -> Result<CommandResponse<Module>> {
        self.dispatch(DeleteModuleCommand { dto }).await
    }

    pub async fn delete_module_by_key(
        &self,
        dto: DeleteModuleByKeyDto,
    ) -> Result<CommandResponse<Module>> {
        self.dispatch(DeleteModuleByKeyCommand { dto }).await
    }

    // Module versions

    pub async fn add_module_version_from_cli(
        &self,
        file: Option<&str>,
    ) -> Result<CommandResponse<ModuleVersion>> {
        if let Some(path) = file {
            let dto = self
                .load_json::<AddModuleVersionDto>(path, "AddModuleVersionDto")
                .await?;
            return self.add_module_version_for_module_id(dto).await;
        }

        let id_or_fqn = self.ask("Module (id or FQN): ")?;
        let version = self.ask("Version: ")?;
        let source = self.ask("Source: ")?;
        let repository_url = self.ask("Repository URL: ")?;

        match Identifier::<ModuleKey>::resolve(&id_or_fqn) {
            Some(Identifier::ByKey(module)) => {
                self.add_module_version_for_module_key(AddModuleVersionByKeyDto {
                    version,
                    module,
                    source,
                    repository_url,
                })
                .await
            }
            Some(Identifier::ById(id)) => {
                self.add_module_version_for_module_id(AddModuleVersionDto {
                    version,
                    module_id: id.to_string(),
                    source,
                    repository_url,
                })
                .await
            }
            None => {
                let error = ValidationError::new("module_id", Rule::ModuleIdOrFqn, &id_or_fqn);
                self.respond(
                    CommandResponse::invalid(Action::AddModuleVersion, vec![error])
                        .attempted_for(id_or_fqn),
                )
            }
        }
    }

    pub async fn add_module_version_for_module_id(
        &self,
        dto: AddModuleVersionDto,
    ) -> Result<CommandResponse<ModuleVersion>> {
        self.dispatch(AddModuleVersionCommand { dto }).await
    }

    pub async fn add_module_version_for_module_key(
        &self,
        dto: AddModuleVersionByKeyDto,
    ) -> Result<CommandResponse<ModuleVersion>> {
        self.dispatch(AddModuleVersionByKeyCommand { dto }).await
    }

    pub async fn list_module_versions_from_cli(
        &self,
        id_or_fqn: &str,
    ) -> Result<CommandResponse<Vec<ModuleVersion>>> {
        match Identifier::<ModuleKey>::resolve(id_or_fqn) {
            Some(Identifier::ByKey(module)) => {
                self.list_module_versions_by_key(ListModuleVersionsByKeyDto { module })
                    .await
            }
            Some(Identifier::ById(id)) => {
                self.list_module_versions_by_id(ListModuleVersionsDto {
                    module_id: id.to_string(),
                })
                .await
            }
            None => self.unresolved(Action::ListModuleVersions, id_or_fqn),
        }
    }

    pub async fn list_module_versions_by_id(
        &self,
        dto: ListModuleVersionsDto,
    ) -> Result<CommandResponse<Vec<ModuleVersion>>> {
        self.dispatch(ListModuleVersionsCommand { dto }).await
    }

    pub async fn list_module_versions_by_key(
        &self,
        dto: ListModuleVersionsByKeyDto,
    ) -> Result<CommandResponse<Vec<ModuleVersion>>> {
        self.dispatch(ListModuleVersionsByKeyCommand { dto }).await
    }

    pub async fn show_module_version_from_cli(
        &self,
        id_or_fqn: &str,
    ) -> Result<CommandResponse<ModuleVersion>> {
        match Identifier::<ModuleVersionKey>::resolve(id_or_fqn) {
            Some(Identifier::ByKey(key)) => {
                self.show_module_version_by_key(ShowModuleVersionByKeyDto { key })
                    .await
            }
            Some(Identifier::ById(id)) => {
                self.show_module_version_by_id(ShowModuleVersionDto { id: id.to_string() })
                    .await
            }
            None => self.unresolved(Action::ShowModuleVersion, id_or_fqn),
        }
    }

    pub async fn show_module_version_by_id(
        &self,
        dto: ShowModuleVersionDto,
    ) -> Result<CommandResponse<ModuleVersion>> {
        self.dispatch(ShowModuleVersionCommand { dto }).await
    }

    pub async fn show_module_version_by_key(
        &self,
        dto: ShowModuleVersionByKeyDto,
    ) -> Result<CommandResponse<ModuleVersion>> {
        self.dispatch(ShowModuleVersionByKeyCommand { dto }).await
    }

    pub async fn delete_module_version_from_cli(
        &self,
        id_or_fqn: &str,
        force: bool,
    ) -> Result<CommandResponse<ModuleVersion>> {
        let Some(identifier) = Identifier::<ModuleVersionKey>::resolve(id_or_fqn) else {
            return self.unresolved(Action::DeleteModuleVersion, id_or_fqn);
        };

        self.confirm(format!("delete_module_version:{}", id_or_fqn), force)?;

        match identifier {
            Identifier::ByKey(key) => {
                self.delete_module_version_by_key(DeleteModuleVersionByKeyDto { key })
                    .await
            }
            Identifier::ById(id) => {
                self.delete_module_version_by_id(DeleteModuleVersionDto { id: id.to_string() })
                    .await
            }
        }
    }

    pub async fn delete_module_version_by_id(
        &self,
        dto: DeleteModuleVersionDto,
    ) -> Result<CommandResponse<ModuleVersion>> {
        self.dispatch(DeleteModuleVersionCommand { dto }).await
    }

    pub async fn delete_module_version_by_key(
        &self,
        dto: DeleteModuleVersionByKeyDto,
    ) -> Result<CommandResponse<ModuleVersion>> {
        self.dispatch(DeleteModuleVersionByKeyCommand { dto }).await
    }

    /// Only the full `{provider}/{namespace}/{name}@{version}` form is
    /// accepted here; anything else is a parse error.
    pub async fn download_module_version_from_cli(
        &self,
        key: &str,
    ) -> Result<CommandResponse<DownloadLocation>> {
        let key: ModuleVersionKey = key.parse()?;
        self.download_module_version(key.into()).await
    }

    pub async fn download_module_version(
        &self,
        dto: DownloadModuleVersionDto,
    ) -> Result<CommandResponse<DownloadLocation>> {
        self.dispatch(DownloadModuleVersionCommand { dto }).await
    }

    pub fn service_discovery(&self) -> (Status, ServiceDiscovery) {
        ServiceDiscoveryCommand::new().handle()
    }

    // Plumbing

    async fn dispatch<C: Command>(&self, command: C) -> Result<CommandResponse<C::Output>> {
        let result = command.handle(self.repo.as_ref(), &self.validator).await;

        if let Some(audit) = &self.audit {
            match &result {
                Ok(response) => audit.record(response),
                Err(e) => audit.enqueue(AuditEntry::internal_error(C::ACTION, e)),
            }
        }

        result
    }

    fn respond<T>(&self, response: CommandResponse<T>) -> Result<CommandResponse<T>>
    where
        T: AuditSubject + Send + Sync,
    {
        if let Some(audit) = &self.audit {
            audit.record(&response);
        }
        Ok(response)
    }

    fn unresolved<T>(&self, action: Action, input: &str) -> Result<CommandResponse<T>>
    where
        T: AuditSubject + Send + Sync,
    {
        tracing::debug!(
            action = action.name(),
            input = %input,
            "argument is neither an id nor a natural key"
        );

        let error = ValidationError::new("id", Rule::IdOrFqn, input);
        self.respond(CommandResponse::invalid(action, vec![error]).attempted_for(input))
    }

    fn ask(&self, question: &str) -> Result<String> {
        match self.prompter.ask(question) {
            Ok(answer) => Ok(answer.trim().to_string()),
            Err(e) => {
                tracing::debug!(question = %question, "prompt failed: {}", e);
                Err(RegistryError::QuestionFailed {
                    question: question.to_string(),
                })
            }
        }
    }

    fn confirm(&self, action: String, force: bool) -> Result<()> {
        if force {
            return Ok(());
        }

        match self.prompter.ask(CONFIRMATION_QUESTION) {
            Ok(answer) if answer.trim().eq_ignore_ascii_case("y") => Ok(()),
            Ok(_) => Err(RegistryError::ConfirmationFailed { action }),
            Err(e) => {
                tracing::debug!(action = %action, "confirmation prompt failed: {}", e);
                Err(RegistryError::ConfirmationFailed { action })
            }
        }
    }

    async fn load_json<T: DeserializeOwned>(&self, path: &str, dto: &'static str) -> Result<T> {
        let bytes = self
            .files
            .read_file(path)
            .await
            .map_err(|source| RegistryError::FileReadError {
                path: path.to_string(),
                source,
            })?;

        serde_json::from_slice(&bytes).map_err(|source| RegistryError::InvalidJsonError {
            path: path.to_string(),
            dto,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::audit_log::InMemoryAuditLog;
    use crate::adapters::catalog::CatalogStore;
    use crate::core::auditor::Auditor;
    use crate::core::commands::test_support::{seed_module, seed_version, FailingRepository};
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::io;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Replays canned answers and remembers every question asked.
    #[derive(Default)]
    struct ScriptedPrompter {
        answers: Mutex<VecDeque<String>>,
        asked: Mutex<Vec<String>>,
    }

    impl ScriptedPrompter {
        fn answering(answers: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
                asked: Mutex::new(Vec::new()),
            })
        }

        fn asked(&self) -> Vec<String> {
            self.asked.lock().unwrap().clone()
        }
    }

    impl Prompter for ScriptedPrompter {
        fn ask(&self, question: &str) -> io::Result<String> {
            self.asked.lock().unwrap().push(question.to_string());
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"))
        }
    }

    #[derive(Default)]
    struct MockFiles {
        files: HashMap<String, Vec<u8>>,
    }

    impl MockFiles {
        fn with(path: &str, content: &str) -> Arc<Self> {
            let mut files = HashMap::new();
            files.insert(path.to_string(), content.as_bytes().to_vec());
            Arc::new(Self { files })
        }
    }

    #[async_trait]
    impl FileReader for MockFiles {
        async fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }
    }

    fn bus(store: &Arc<CatalogStore>, prompter: Arc<ScriptedPrompter>) -> CommandBus {
        CommandBus::new(store.clone(), prompter, Arc::new(MockFiles::default()))
    }

    #[tokio::test]
    async fn test_add_module_interactively() {
        let store = Arc::new(CatalogStore::in_memory());
        let prompter = ScriptedPrompter::answering(&["github\n", "acme", "vpc"]);
        let bus = bus(&store, prompter.clone());

        let response = bus.add_module_from_cli(None).await.unwrap();

        assert_eq!(response.status, Status::Created);
        assert_eq!(response.payload.unwrap().provider, "github");
        assert_eq!(prompter.asked(), vec!["Provider: ", "Namespace: ", "Name: "]);
    }

    #[tokio::test]
    async fn test_add_module_question_failure() {
        let store = Arc::new(CatalogStore::in_memory());
        let bus = bus(&store, ScriptedPrompter::answering(&["github"]));

        let err = bus.add_module_from_cli(None).await.unwrap_err();

        assert!(
            matches!(err, RegistryError::QuestionFailed { ref question } if question == "Namespace: ")
        );
    }

    #[tokio::test]
    async fn test_add_module_from_file() {
        let store = Arc::new(CatalogStore::in_memory());
        let files = MockFiles::with(
            "module.json",
            r#"{"provider": "github", "namespace": "acme", "name": "vpc"}"#,
        );
        let bus = CommandBus::new(store.clone(), ScriptedPrompter::answering(&[]), files);

        let response = bus.add_module_from_cli(Some("module.json")).await.unwrap();

        assert_eq!(response.status, Status::Created);
        assert!(store.by_key(&ModuleKey::new("github", "acme", "vpc")).await.is_ok());
    }

    #[tokio::test]
    async fn test_add_module_file_errors_are_distinct() {
        let store = Arc::new(CatalogStore::in_memory());
        let files = MockFiles::with("broken.json", "{not json");
        let bus = CommandBus::new(store, ScriptedPrompter::answering(&[]), files);

        let missing = bus.add_module_from_cli(Some("missing.json")).await.unwrap_err();
        let broken = bus.add_module_from_cli(Some("broken.json")).await.unwrap_err();

        assert!(matches!(missing, RegistryError::FileReadError { .. }));
        assert!(matches!(
            broken,
            RegistryError::InvalidJsonError {
                dto: "AddModuleDto",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_identifier_resolution() {
        let store = Arc::new(CatalogStore::in_memory());
        let module = seed_module(store.as_ref(), "github", "acme", "vpc").await;
        let bus = bus(&store, ScriptedPrompter::answering(&[]));

        let by_key = bus.show_module_from_cli("github/acme/vpc").await.unwrap();
        let by_id = bus
            .show_module_from_cli(&module.id.to_string())
            .await
            .unwrap();
        let neither = bus.show_module_from_cli("vpc").await.unwrap();

        assert_eq!(by_key.payload, Some(module.clone()));
        assert_eq!(by_id.payload, Some(module));
        assert_eq!(neither.status, Status::Invalid);
        assert_eq!(neither.validation_errors[0].rule, Rule::IdOrFqn);
        assert_eq!(neither.validation_errors[0].field, "id");
        assert_eq!(neither.validation_errors[0].value, "vpc");
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let store = Arc::new(CatalogStore::in_memory());
        let module = seed_module(store.as_ref(), "github", "acme", "vpc").await;
        let prompter = ScriptedPrompter::answering(&["n"]);
        let bus = bus(&store, prompter.clone());

        let err = bus
            .delete_module_from_cli("github/acme/vpc", false, false)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RegistryError::ConfirmationFailed { ref action } if action == "delete_module:github/acme/vpc"
        ));
        assert_eq!(prompter.asked(), vec![CONFIRMATION_QUESTION]);
        assert!(store.by_id(module.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_confirmation_is_case_insensitive() {
        let store = Arc::new(CatalogStore::in_memory());
        let module = seed_module(store.as_ref(), "github", "acme", "vpc").await;
        let bus = bus(&store, ScriptedPrompter::answering(&["Y"]));

        let response = bus
            .delete_module_from_cli(&module.id.to_string(), false, false)
            .await
            .unwrap();

        assert_eq!(response.status, Status::Okay);
        assert!(store.by_id(module.id).await.is_err());
    }

    #[tokio::test]
    async fn test_forced_delete_skips_prompt() {
        let store = Arc::new(CatalogStore::in_memory());
        let module = seed_module(store.as_ref(), "github", "acme", "vpc").await;
        let version = seed_version(store.as_ref(), &module, "1.0.0").await;
        let prompter = ScriptedPrompter::answering(&[]);
        let bus = bus(&store, prompter.clone());

        let response = bus
            .delete_module_version_from_cli("github/acme/vpc@1.0.0", true)
            .await
            .unwrap();

        assert_eq!(response.payload, Some(version));
        assert!(prompter.asked().is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_delete_never_prompts() {
        let store = Arc::new(CatalogStore::in_memory());
        let prompter = ScriptedPrompter::answering(&["y"]);
        let bus = bus(&store, prompter.clone());

        let response = bus
            .delete_module_version_from_cli("github/acme/vpc", false)
            .await
            .unwrap();

        assert_eq!(response.status, Status::Invalid);
        assert!(prompter.asked().is_empty());
    }

    #[tokio::test]
    async fn test_add_version_interactively_by_key() {
        let store = Arc::new(CatalogStore::in_memory());
        let module = seed_module(store.as_ref(), "github", "acme", "vpc").await;
        let prompter = ScriptedPrompter::answering(&[
            "github/acme/vpc",
            "1.0.0",
            "git",
            "https://example.com/r",
        ]);
        let bus = bus(&store, prompter.clone());

        let response = bus.add_module_version_from_cli(None).await.unwrap();

        assert_eq!(response.status, Status::Created);
        assert_eq!(response.payload.unwrap().module_id, module.id);
        assert_eq!(
            prompter.asked(),
            vec!["Module (id or FQN): ", "Version: ", "Source: ", "Repository URL: "]
        );
    }

    #[tokio::test]
    async fn test_add_version_with_unusable_module_reference() {
        let store = Arc::new(CatalogStore::in_memory());
        let bus = bus(
            &store,
            ScriptedPrompter::answering(&["vpc", "1.0.0", "git", "https://example.com/r"]),
        );

        let response = bus.add_module_version_from_cli(None).await.unwrap();

        assert_eq!(response.status, Status::Invalid);
        assert_eq!(response.validation_errors[0].rule, Rule::ModuleIdOrFqn);
        assert_eq!(response.validation_errors[0].field, "module_id");
    }

    #[tokio::test]
    async fn test_list_versions_rejects_unresolvable_reference() {
        let store = Arc::new(CatalogStore::in_memory());
        let bus = bus(&store, ScriptedPrompter::answering(&[]));

        let response = bus.list_module_versions_from_cli("not a module").await.unwrap();

        assert_eq!(response.status, Status::Invalid);
        assert_eq!(response.validation_errors[0].rule, Rule::IdOrFqn);
    }

    #[tokio::test]
    async fn test_download_requires_version_key() {
        let store = Arc::new(CatalogStore::in_memory());
        let bus = bus(&store, ScriptedPrompter::answering(&[]));

        let err = bus
            .download_module_version_from_cli("github/acme/vpc")
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_outcomes_are_audited() {
        let store = Arc::new(CatalogStore::in_memory());
        let log = Arc::new(InMemoryAuditLog::new());
        let bus = bus(&store, ScriptedPrompter::answering(&[]))
            .with_audit(Auditor::new(log.clone()).spawn());

        bus.show_module_from_cli(&Uuid::new_v4().to_string())
            .await
            .unwrap();
        bus.show_module_from_cli("nope").await.unwrap();
        bus.shutdown().await;

        let entries = log.entries().await;
        let statuses: Vec<Status> = entries.iter().map(|e| e.status).collect();
        assert_eq!(statuses, vec![Status::NotFound, Status::Invalid]);
        assert!(entries.iter().all(|e| e.action == "v1.modules.show"));
    }

    #[tokio::test]
    async fn test_internal_errors_are_audited() {
        let log = Arc::new(InMemoryAuditLog::new());
        let bus = CommandBus::new(
            Arc::new(FailingRepository),
            ScriptedPrompter::answering(&[]),
            Arc::new(MockFiles::default()),
        )
        .with_audit(Auditor::new(log.clone()).spawn());

        let result = bus.list_modules_from_cli(None, None).await;
        bus.shutdown().await;

        assert!(result.is_err());
        let entries = log.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, Status::InternalError);
        assert!(entries[0].meta.contains_key("error"));
    }

    #[test]
    fn test_service_discovery() {
        let store = Arc::new(CatalogStore::in_memory());
        let bus = bus(&store, ScriptedPrompter::answering(&[]));

        let (status, document) = bus.service_discovery();

        assert_eq!(status, Status::Okay);
        assert_eq!(document, ServiceDiscovery::default());
    }
}

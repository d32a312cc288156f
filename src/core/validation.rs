//! Two-phase request validation.
//!
//! Shape rules look only at the request itself. Predicates consult the
//! repository for existence and uniqueness. Both phases always run and every
//! violation is reported together.

use crate::domain::keys::{parse_uuid, ModuleKey, ModuleVersionKey};
use crate::domain::ports::ModuleRepository;
use crate::utils::error::RepositoryError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

static SEMVER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+$").expect("semver pattern compiles"));

pub const MODULE_KEY_FIELD: &str = "provider/namespace/name";
pub const MODULE_VERSION_KEY_FIELD: &str = "provider/namespace/name@version";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Required,
    Uuid,
    Version,
    UniqueModulePath,
    UniqueModuleVersion,
    ModuleMustExist,
    ModuleVersionMustExist,
    NoVersionsExistForId,
    NoVersionsExistForModuleFqn,
    IdOrFqn,
    ModuleIdOrFqn,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Uuid => "uuid",
            Self::Version => "version",
            Self::UniqueModulePath => "unique_module_path",
            Self::UniqueModuleVersion => "unique_module_version",
            Self::ModuleMustExist => "module_must_exist",
            Self::ModuleVersionMustExist => "module_version_must_exist",
            Self::NoVersionsExistForId => "no_versions_exist_for_id",
            Self::NoVersionsExistForModuleFqn => "no_versions_exist_for_module_fqn",
            Self::IdOrFqn => "id_or_fqn",
            Self::ModuleIdOrFqn => "module_id_or_fqn",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Required => "is required",
            Self::Uuid => "must be a valid uuid",
            Self::Version => {
                "must be semver (^[0-9]+\\.[0-9]+\\.[0-9]+$) or prefixed with 'dev-'"
            }
            Self::UniqueModulePath => "a module with this name already exists",
            Self::UniqueModuleVersion => "version already exists for this module",
            Self::ModuleMustExist => "the module does not exist",
            Self::ModuleVersionMustExist => "the module version does not exist",
            Self::NoVersionsExistForId | Self::NoVersionsExistForModuleFqn => {
                "the module still has versions, delete them first or request their deletion"
            }
            Self::IdOrFqn => {
                "id must be a uuid or an FQN formatted string ({provider}/{namespace}/{name})"
            }
            Self::ModuleIdOrFqn => {
                "module id must be a uuid or an FQN formatted string ({provider}/{namespace}/{name})"
            }
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub rule: Rule,
    pub message: String,
    pub value: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, rule: Rule, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule,
            message: rule.message().to_string(),
            value: value.into(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// Records a `required` violation and reports whether the field is present.
pub fn require(errors: &mut Vec<ValidationError>, field: &str, value: &str) -> bool {
    if value.is_empty() {
        errors.push(ValidationError::new(field, Rule::Required, value));
        return false;
    }
    true
}

pub fn require_uuid(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if require(errors, field, value) && parse_uuid(value).is_none() {
        errors.push(ValidationError::new(field, Rule::Uuid, value));
    }
}

pub fn require_version(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if require(errors, field, value) && !is_valid_version(value) {
        errors.push(ValidationError::new(field, Rule::Version, value));
    }
}

pub fn require_module_key(errors: &mut Vec<ValidationError>, key: &ModuleKey) {
    require(errors, "provider", &key.provider);
    require(errors, "namespace", &key.namespace);
    require(errors, "name", &key.name);
}

pub fn require_module_version_key(errors: &mut Vec<ValidationError>, key: &ModuleVersionKey) {
    require_module_key(errors, &key.module);
    require(errors, "version", &key.version);
}

/// Dev builds are let through regardless of shape.
pub fn is_valid_version(value: &str) -> bool {
    value.starts_with("dev-") || SEMVER.is_match(value)
}

/// Best-effort id for predicates running over input that may have failed
/// shape validation.
pub fn lenient_uuid(value: &str) -> Uuid {
    parse_uuid(value).unwrap_or_else(Uuid::nil)
}

/// Repository-backed invariants. Each variant issues exactly one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    ModuleKeyMustBeUnique(ModuleKey),
    ModuleVersionMustBeUniqueForKey(ModuleVersionKey),
    ModuleVersionMustBeUniqueForId { module_id: Uuid, version: String },
    ModuleMustExistById(Uuid),
    ModuleMustExistByKey(ModuleKey),
    ModuleVersionMustExistByKey(ModuleVersionKey),
    NoVersionsExistForModuleId(Uuid),
    NoVersionsExistForModuleKey(ModuleKey),
}

impl Predicate {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ModuleKeyMustBeUnique(_) => "module_key_must_be_unique",
            Self::ModuleVersionMustBeUniqueForKey(_) => "module_version_must_be_unique_for_key",
            Self::ModuleVersionMustBeUniqueForId { .. } => "module_version_must_be_unique_for_id",
            Self::ModuleMustExistById(_) => "module_must_exist_by_id",
            Self::ModuleMustExistByKey(_) => "module_must_exist_by_key",
            Self::ModuleVersionMustExistByKey(_) => "module_version_must_exist_by_key",
            Self::NoVersionsExistForModuleId(_) => "no_versions_exist_for_module_id",
            Self::NoVersionsExistForModuleKey(_) => "no_versions_exist_for_module_key",
        }
    }

    pub async fn evaluate(&self, repo: &dyn ModuleRepository) -> Option<ValidationError> {
        match self {
            Self::ModuleKeyMustBeUnique(key) => {
                let found = self.present(repo.by_key(key).await)?;
                found.then(|| {
                    ValidationError::new(MODULE_KEY_FIELD, Rule::UniqueModulePath, key.to_string())
                })
            }
            Self::ModuleVersionMustBeUniqueForKey(key) => {
                let found = self.present(repo.version_by_key(key).await)?;
                found.then(|| {
                    ValidationError::new(
                        MODULE_VERSION_KEY_FIELD,
                        Rule::UniqueModuleVersion,
                        key.to_string(),
                    )
                })
            }
            Self::ModuleVersionMustBeUniqueForId { module_id, version } => {
                let found =
                    self.present(repo.version_by_module_and_value(*module_id, version).await)?;
                found.then(|| {
                    ValidationError::new(
                        "module_id@version",
                        Rule::UniqueModuleVersion,
                        format!("{}@{}", module_id, version),
                    )
                })
            }
            Self::ModuleMustExistById(id) => {
                let found = self.present(repo.by_id(*id).await)?;
                (!found).then(|| {
                    ValidationError::new("module_id", Rule::ModuleMustExist, id.to_string())
                })
            }
            Self::ModuleMustExistByKey(key) => {
                let found = self.present(repo.by_key(key).await)?;
                (!found).then(|| {
                    ValidationError::new(MODULE_KEY_FIELD, Rule::ModuleMustExist, key.to_string())
                })
            }
            Self::ModuleVersionMustExistByKey(key) => {
                let found = self.present(repo.version_by_key(key).await)?;
                (!found).then(|| {
                    ValidationError::new(
                        MODULE_VERSION_KEY_FIELD,
                        Rule::ModuleVersionMustExist,
                        key.to_string(),
                    )
                })
            }
            Self::NoVersionsExistForModuleId(id) => {
                let versions = self.listed(repo.versions_by_module(*id).await)?;
                (versions > 0)
                    .then(|| ValidationError::new("id", Rule::NoVersionsExistForId, id.to_string()))
            }
            Self::NoVersionsExistForModuleKey(key) => {
                let versions = self.listed(repo.versions_by_module_key(key).await)?;
                (versions > 0).then(|| {
                    ValidationError::new(
                        MODULE_KEY_FIELD,
                        Rule::NoVersionsExistForModuleFqn,
                        key.to_string(),
                    )
                })
            }
        }
    }

    /// `Some(true)` when the lookup hit, `Some(false)` on a miss and `None`
    /// when the query itself failed.
    fn present<T>(&self, result: Result<T, RepositoryError>) -> Option<bool> {
        match result {
            Ok(_) => Some(true),
            Err(e) if e.is_not_found() => Some(false),
            Err(e) => {
                tracing::error!(
                    predicate = self.name(),
                    "unexpected repository error during validation: {}",
                    e
                );
                None
            }
        }
    }

    fn listed<T>(&self, result: Result<Vec<T>, RepositoryError>) -> Option<usize> {
        match result {
            Ok(items) => Some(items.len()),
            Err(e) if e.is_not_found() => Some(0),
            Err(e) => {
                tracing::error!(
                    predicate = self.name(),
                    "unexpected repository error during validation: {}",
                    e
                );
                None
            }
        }
    }
}

/// Implemented by every command DTO.
pub trait Rules {
    fn check_shape(&self, errors: &mut Vec<ValidationError>);

    fn predicates(&self) -> Vec<Predicate> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    pub async fn validate<R>(
        &self,
        request: &R,
        repo: &dyn ModuleRepository,
    ) -> Vec<ValidationError>
    where
        R: Rules + ?Sized + Sync,
    {
        let mut errors = Vec::new();
        request.check_shape(&mut errors);

        for predicate in request.predicates() {
            if let Some(e) = predicate.evaluate(repo).await {
                errors.push(e);
            }
        }

        if !errors.is_empty() {
            tracing::debug!("request failed validation with {} violation(s)", errors.len());
        }

        errors
    }
}

use crate::core::validation::ValidationError;
use crate::domain::model::{DownloadLocation, Module, ModuleVersion};
use crate::domain::status::Status;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Operation names as they appear in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    AddModule,
    ListModules,
    ShowModule,
    DeleteModule,
    AddModuleVersion,
    ListModuleVersions,
    ShowModuleVersion,
    DeleteModuleVersion,
    DownloadModuleVersion,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddModule => "v1.modules.add",
            Self::ListModules => "v1.modules.list",
            Self::ShowModule => "v1.modules.show",
            Self::DeleteModule => "v1.modules.delete",
            Self::AddModuleVersion => "v1.modules.versions.add",
            Self::ListModuleVersions => "v1.modules.versions.list",
            Self::ShowModuleVersion => "v1.modules.versions.show",
            Self::DeleteModuleVersion => "v1.modules.versions.delete",
            Self::DownloadModuleVersion => "v1.modules.versions.download",
        }
    }
}

/// Contributes the payload's identifying fields to audit metadata.
pub trait AuditSubject {
    fn audit_meta(&self, meta: &mut Map<String, Value>);
}

impl AuditSubject for Module {
    fn audit_meta(&self, meta: &mut Map<String, Value>) {
        meta.insert("module_id".into(), json!(self.id));
    }
}

impl AuditSubject for ModuleVersion {
    fn audit_meta(&self, meta: &mut Map<String, Value>) {
        meta.insert("module_version_id".into(), json!(self.id));
    }
}

impl<T> AuditSubject for Vec<T> {
    fn audit_meta(&self, meta: &mut Map<String, Value>) {
        meta.insert("total".into(), json!(self.len()));
    }
}

impl AuditSubject for DownloadLocation {
    fn audit_meta(&self, meta: &mut Map<String, Value>) {
        meta.insert("location".into(), json!(self.location));
    }
}

/// Uniform result of every command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse<T> {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<T>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<ValidationError>,
    #[serde(skip)]
    action: Action,
    #[serde(skip)]
    occurred_at: DateTime<Utc>,
    #[serde(skip)]
    attempted_for: Option<String>,
}

impl<T> CommandResponse<T> {
    fn build(action: Action, status: Status, payload: Option<T>) -> Self {
        Self {
            status,
            payload,
            validation_errors: Vec::new(),
            action,
            occurred_at: Utc::now(),
            attempted_for: None,
        }
    }

    pub fn okay(action: Action, payload: T) -> Self {
        Self::build(action, Status::Okay, Some(payload))
    }

    pub fn created(action: Action, payload: T) -> Self {
        Self::build(action, Status::Created, Some(payload))
    }

    pub fn invalid(action: Action, errors: Vec<ValidationError>) -> Self {
        let mut response = Self::build(action, Status::Invalid, None);
        response.validation_errors = errors;
        response
    }

    pub fn not_found(action: Action) -> Self {
        Self::build(action, Status::NotFound, None)
    }

    pub fn conflict(action: Action) -> Self {
        Self::build(action, Status::Conflict, None)
    }

    /// Remembers what the caller asked for, for the audit trail.
    pub fn attempted_for(mut self, target: impl Into<String>) -> Self {
        self.attempted_for = Some(target.into());
        self
    }

    pub fn attempted_target(&self) -> Option<&str> {
        self.attempted_for.as_deref()
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }
}

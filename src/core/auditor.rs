//! Best-effort audit trail.
//!
//! [`Auditor::record`] persists synchronously. [`AuditHandle`] moves that
//! work onto a detached worker so a request never waits on the audit log.

use crate::core::response::{Action, AuditSubject, CommandResponse};
use crate::domain::ports::AuditLogStore;
use crate::domain::status::Status;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub trait AuditableAction: Send + Sync {
    fn action_name(&self) -> &str;
    fn occurred_at(&self) -> DateTime<Utc>;
    fn response_status(&self) -> Status;
    fn audit_meta(&self) -> Map<String, Value>;
}

impl<T: AuditSubject + Send + Sync> AuditableAction for CommandResponse<T> {
    fn action_name(&self) -> &str {
        self.action().name()
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        CommandResponse::occurred_at(self)
    }

    fn response_status(&self) -> Status {
        self.status
    }

    fn audit_meta(&self) -> Map<String, Value> {
        let mut meta = Map::new();
        if let Some(payload) = self.payload() {
            payload.audit_meta(&mut meta);
        }
        if let Some(target) = self.attempted_target() {
            meta.insert("searched_for".into(), json!(target));
        }
        if !self.validation_errors.is_empty() {
            meta.insert("validation_errors".into(), json!(self.validation_errors));
        }
        meta
    }
}

/// Owned snapshot of an auditable action, detached from the response it came
/// from.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub action: String,
    pub status: Status,
    pub occurred_at: DateTime<Utc>,
    pub meta: Map<String, Value>,
}

impl AuditEntry {
    pub fn from_action(action: &dyn AuditableAction) -> Self {
        Self {
            action: action.action_name().to_string(),
            status: action.response_status(),
            occurred_at: action.occurred_at(),
            meta: action.audit_meta(),
        }
    }

    /// Entry for a command that ended in an unexpected error and produced no
    /// response.
    pub fn internal_error(action: Action, error: &dyn std::error::Error) -> Self {
        let mut meta = Map::new();
        meta.insert("error".into(), json!(error.to_string()));

        Self {
            action: action.name().to_string(),
            status: Status::InternalError,
            occurred_at: Utc::now(),
            meta,
        }
    }
}

impl AuditableAction for AuditEntry {
    fn action_name(&self) -> &str {
        &self.action
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    fn response_status(&self) -> Status {
        self.status
    }

    fn audit_meta(&self) -> Map<String, Value> {
        self.meta.clone()
    }
}

pub struct Auditor {
    store: Arc<dyn AuditLogStore>,
}

impl Auditor {
    pub fn new(store: Arc<dyn AuditLogStore>) -> Self {
        Self { store }
    }

    /// Never fails: a store error is logged and dropped.
    pub async fn record(&self, action: &dyn AuditableAction) {
        let entry = AuditEntry::from_action(action);
        self.save(&entry).await;
    }

    async fn save(&self, entry: &AuditEntry) {
        if let Err(e) = self
            .store
            .save(&entry.action, entry.status, entry.occurred_at, &entry.meta)
            .await
        {
            tracing::error!(
                action = %entry.action,
                status = %entry.status,
                "error during audit log save process: {}",
                e
            );
        }
    }

    /// Moves the auditor onto a background task and returns the handle used
    /// to feed it. Must be called from within a tokio runtime.
    pub fn spawn(self) -> AuditHandle {
        let (sender, mut receiver) = mpsc::unbounded_channel::<AuditEntry>();

        let worker = tokio::spawn(async move {
            while let Some(entry) = receiver.recv().await {
                self.save(&entry).await;
            }
            tracing::debug!("audit worker drained");
        });

        AuditHandle {
            sender,
            worker: Some(worker),
        }
    }
}

pub struct AuditHandle {
    sender: mpsc::UnboundedSender<AuditEntry>,
    worker: Option<JoinHandle<()>>,
}

impl AuditHandle {
    /// Queues the action and returns immediately.
    pub fn record(&self, action: &dyn AuditableAction) {
        self.enqueue(AuditEntry::from_action(action));
    }

    pub fn enqueue(&self, entry: AuditEntry) {
        if let Err(e) = self.sender.send(entry) {
            tracing::warn!(action = %e.0.action, "audit worker has stopped, dropping record");
        }
    }

    /// Closes the queue and waits for pending records to be written.
    pub async fn shutdown(mut self) {
        let worker = self.worker.take();
        drop(self);

        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::error!("audit worker terminated abnormally: {}", e);
            }
        }
    }
}

use crate::domain::ports::{AuditLogStore, RepositoryResult};
use crate::domain::status::Status;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// One saved audit record, as held by [`InMemoryAuditLog`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub action: String,
    pub status: Status,
    pub occurred_at: DateTime<Utc>,
    pub meta: Map<String, Value>,
}

#[derive(Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditRecord>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<AuditRecord> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl AuditLogStore for InMemoryAuditLog {
    async fn save(
        &self,
        action: &str,
        status: Status,
        occurred_at: DateTime<Utc>,
        meta: &Map<String, Value>,
    ) -> RepositoryResult<()> {
        self.entries.lock().await.push(AuditRecord {
            action: action.to_string(),
            status,
            occurred_at,
            meta: meta.clone(),
        });
        Ok(())
    }
}

#[derive(Serialize)]
struct AuditLine<'a> {
    action: &'a str,
    status: Status,
    occurred_at: DateTime<Utc>,
    meta: &'a Map<String, Value>,
}

/// Appends one JSON document per line.
pub struct JsonLinesAuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditLogStore for JsonLinesAuditLog {
    async fn save(
        &self,
        action: &str,
        status: Status,
        occurred_at: DateTime<Utc>,
        meta: &Map<String, Value>,
    ) -> RepositoryResult<()> {
        let mut line = serde_json::to_vec(&AuditLine {
            action,
            status,
            occurred_at,
            meta,
        })?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        Ok(())
    }
}

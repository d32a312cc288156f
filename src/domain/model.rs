use crate::domain::keys::{ModuleKey, ModuleVersionKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: Uuid,
    pub name: String,
    pub namespace: String,
    pub provider: String,
}

impl Module {
    pub fn key(&self) -> ModuleKey {
        ModuleKey::new(&self.provider, &self.namespace, &self.name)
    }
}

/// Lifecycle of a version archive. Only `Pending` is ever written here; the
/// archival pipeline owns the other transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Failed,
    Archived,
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Archived => "archived",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVersion {
    pub id: Uuid,
    pub version: String,
    pub module_id: Uuid,
    pub source: String,
    #[serde(rename = "repositoryURL", alias = "repository_url")]
    pub repository_url: String,
    #[serde(rename = "downloadURL", alias = "download_url")]
    pub download_url: Option<String>,
    pub status: VersionStatus,
}

impl ModuleVersion {
    pub fn key(&self, module: &Module) -> ModuleVersionKey {
        module.key().with_version(&self.version)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleFilters {
    pub provider: Option<String>,
    pub namespace: Option<String>,
}

impl ModuleFilters {
    pub fn matches(&self, module: &Module) -> bool {
        self.provider.as_deref().map_or(true, |p| p == module.provider)
            && self
                .namespace
                .as_deref()
                .map_or(true, |ns| ns == module.namespace)
    }
}

/// Where a client should fetch a version archive from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLocation {
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDiscovery {
    #[serde(rename = "modules.v1")]
    pub modules_v1: String,
}

impl Default for ServiceDiscovery {
    fn default() -> Self {
        Self {
            modules_v1: "/v1/modules/".to_string(),
        }
    }
}

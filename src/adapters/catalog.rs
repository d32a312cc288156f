//! Module catalog kept in memory, optionally backed by a JSON file.
//!
//! Every write is applied to a copy of the catalog, flushed to disk and only
//! then swapped in, so a failed flush leaves the visible state untouched.
//! The store enforces the catalog's constraints itself and reports
//! violations as [`RepositoryError::Conflict`].

use crate::domain::keys::{ModuleKey, ModuleVersionKey};
use crate::domain::model::{Module, ModuleFilters, ModuleVersion};
use crate::domain::ports::{ModuleRepository, RepositoryResult};
use crate::utils::error::RepositoryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Catalog {
    modules: HashMap<Uuid, Module>,
    versions: HashMap<Uuid, ModuleVersion>,
}

impl Catalog {
    fn module_by_key(&self, key: &ModuleKey) -> Option<&Module> {
        self.modules.values().find(|m| {
            m.provider == key.provider && m.namespace == key.namespace && m.name == key.name
        })
    }

    fn versions_of(&self, module_id: Uuid) -> impl Iterator<Item = &ModuleVersion> {
        self.versions
            .values()
            .filter(move |v| v.module_id == module_id)
    }
}

pub struct CatalogStore {
    state: Mutex<Catalog>,
    path: Option<PathBuf>,
}

impl CatalogStore {
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(Catalog::default()),
            path: None,
        }
    }

    /// Loads the catalog at `path`, starting empty when the file does not
    /// exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> RepositoryResult<Self> {
        let path = path.into();

        let catalog = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "catalog file not found, starting empty");
                Catalog::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            state: Mutex::new(catalog),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn read<T>(&self, f: impl FnOnce(&Catalog) -> T) -> T {
        let state = self.state.lock().await;
        f(&state)
    }

    /// Runs `f` against a copy of the catalog and commits the copy once it
    /// has been flushed.
    async fn write<T>(
        &self,
        f: impl FnOnce(&mut Catalog) -> RepositoryResult<T>,
    ) -> RepositoryResult<T> {
        let mut state = self.state.lock().await;

        let mut next = state.clone();
        let out = f(&mut next)?;
        self.flush(&next).await?;
        *state = next;

        Ok(out)
    }

    async fn flush(&self, catalog: &Catalog) -> RepositoryResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(catalog)?).await?;
        tokio::fs::rename(&tmp, path).await?;

        tracing::debug!(
            path = %path.display(),
            modules = catalog.modules.len(),
            versions = catalog.versions.len(),
            "catalog flushed"
        );
        Ok(())
    }
}

#[async_trait]
impl ModuleRepository for CatalogStore {
    async fn by_id(&self, id: Uuid) -> RepositoryResult<Module> {
        self.read(|c| c.modules.get(&id).cloned())
            .await
            .ok_or_else(|| RepositoryError::not_found("module", id.to_string()))
    }

    async fn by_key(&self, key: &ModuleKey) -> RepositoryResult<Module> {
        self.read(|c| c.module_by_key(key).cloned())
            .await
            .ok_or_else(|| RepositoryError::not_found("module", key.to_string()))
    }

    async fn all(&self, filters: &ModuleFilters) -> RepositoryResult<Vec<Module>> {
        Ok(self
            .read(|c| {
                c.modules
                    .values()
                    .filter(|m| filters.matches(m))
                    .cloned()
                    .collect()
            })
            .await)
    }

    async fn version_by_id(&self, id: Uuid) -> RepositoryResult<ModuleVersion> {
        self.read(|c| c.versions.get(&id).cloned())
            .await
            .ok_or_else(|| RepositoryError::not_found("module_version", id.to_string()))
    }

    async fn versions_by_module(&self, module_id: Uuid) -> RepositoryResult<Vec<ModuleVersion>> {
        Ok(self
            .read(|c| c.versions_of(module_id).cloned().collect())
            .await)
    }

    async fn versions_by_module_key(
        &self,
        key: &ModuleKey,
    ) -> RepositoryResult<Vec<ModuleVersion>> {
        Ok(self
            .read(|c| match c.module_by_key(key) {
                Some(module) => c.versions_of(module.id).cloned().collect(),
                None => Vec::new(),
            })
            .await)
    }

    async fn version_by_module_and_value(
        &self,
        module_id: Uuid,
        version: &str,
    ) -> RepositoryResult<ModuleVersion> {
        self.read(|c| c.versions_of(module_id).find(|v| v.version == version).cloned())
            .await
            .ok_or_else(|| {
                RepositoryError::not_found("module_version", format!("{}@{}", module_id, version))
            })
    }

    async fn version_by_key(&self, key: &ModuleVersionKey) -> RepositoryResult<ModuleVersion> {
        self.read(|c| {
            let module = c.module_by_key(&key.module)?;
            c.versions_of(module.id)
                .find(|v| v.version == key.version)
                .cloned()
        })
        .await
        .ok_or_else(|| RepositoryError::not_found("module_version", key.to_string()))
    }

    async fn add_module(&self, module: Module) -> RepositoryResult<Module> {
        self.write(|c| {
            if c.modules.contains_key(&module.id) || c.module_by_key(&module.key()).is_some() {
                return Err(RepositoryError::conflict("module", module.key().to_string()));
            }
            c.modules.insert(module.id, module.clone());
            Ok(module)
        })
        .await
    }

    async fn delete_module(&self, module: &Module) -> RepositoryResult<()> {
        self.write(|c| {
            if !c.modules.contains_key(&module.id) {
                return Err(RepositoryError::not_found("module", module.id.to_string()));
            }
            if c.versions_of(module.id).next().is_some() {
                return Err(RepositoryError::conflict("module", module.key().to_string()));
            }
            c.modules.remove(&module.id);
            Ok(())
        })
        .await
    }

    async fn add_version(&self, version: ModuleVersion) -> RepositoryResult<ModuleVersion> {
        self.write(|c| {
            let uri = format!("{}@{}", version.module_id, version.version);

            if !c.modules.contains_key(&version.module_id) {
                return Err(RepositoryError::conflict("module_version", uri));
            }
            let duplicate = c
                .versions_of(version.module_id)
                .any(|v| v.version == version.version);
            if duplicate || c.versions.contains_key(&version.id) {
                return Err(RepositoryError::conflict("module_version", uri));
            }

            c.versions.insert(version.id, version.clone());
            Ok(version)
        })
        .await
    }

    async fn delete_versions_for_module(&self, module: &Module) -> RepositoryResult<()> {
        self.write(|c| {
            c.versions.retain(|_, v| v.module_id != module.id);
            Ok(())
        })
        .await
    }

    async fn delete_module_version(&self, version: &ModuleVersion) -> RepositoryResult<()> {
        self.write(|c| match c.versions.remove(&version.id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::not_found(
                "module_version",
                version.id.to_string(),
            )),
        })
        .await
    }

    async fn delete_module_with_versions(&self, module: &Module) -> RepositoryResult<()> {
        self.write(|c| {
            if c.modules.remove(&module.id).is_none() {
                return Err(RepositoryError::not_found("module", module.id.to_string()));
            }
            c.versions.retain(|_, v| v.module_id != module.id);
            Ok(())
        })
        .await
    }
}

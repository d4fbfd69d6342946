//! Source URL cache
//!
//! Remembers where each library's source code lives, per package manager,
//! so repeat runs skip the registry. Loaded once before a diagnosis and
//! rebuilt from its result afterwards.
//!
//! # File format
//!
//! ```json
//! {"package_managers": [
//!   {"name": "npm", "repositories": [
//!     {"name": "promise", "source_url": "https://github.com/then/promise"}
//!   ]}
//! ]}
//! ```

use crate::diagnose::Diagnoses;
use crate::error::{DepdocError, DepdocResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// One cached library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    pub name: String,
    pub source_url: String,
}

/// Cached libraries of one package manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManagerEntry {
    pub name: String,

    #[serde(default)]
    pub repositories: Vec<RepositoryEntry>,
}

/// Persisted source URL cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStore {
    #[serde(default)]
    pub package_managers: Vec<PackageManagerEntry>,
}

impl CacheStore {
    /// Load the cache, treating a missing, unreadable or corrupt file as empty
    pub async fn load(path: &Path) -> Self {
        match Self::try_load(path).await {
            Ok(store) => store,
            Err(e) => {
                warn!("{}", e);
                Self::default()
            }
        }
    }

    /// Load the cache; a missing file is empty
    pub async fn try_load(path: &Path) -> DepdocResult<Self> {
        if !path.exists() {
            debug!("No source URL cache at {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| DepdocError::CacheLoadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        serde_json::from_str(&content).map_err(|e| DepdocError::CacheLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Library name to source URL for one package manager
    pub fn urls_for(&self, package_manager: &str) -> HashMap<String, String> {
        self.scope(package_manager)
            .into_iter()
            .flat_map(|entry| entry.repositories.iter())
            .map(|r| (r.name.clone(), r.source_url.clone()))
            .collect()
    }

    /// Replace `package_manager`'s entries with this run's results.
    ///
    /// Every diagnosed, non-erroring diagnosis with a URL becomes an entry.
    /// Prior entries for names not in that set are kept. Other package
    /// managers pass through untouched.
    pub fn rebuild(&self, diagnoses: &Diagnoses, package_manager: &str) -> Self {
        let mut urls: BTreeMap<String, String> = self.urls_for(package_manager).into_iter().collect();

        for diagnosis in diagnoses.values() {
            if diagnosis.diagnosed && diagnosis.error.is_none() && !diagnosis.url.is_empty() {
                urls.insert(diagnosis.name.clone(), diagnosis.url.clone());
            }
        }

        let mut rebuilt = self.clone();
        rebuilt.set_scope(package_manager, urls);
        rebuilt
    }

    /// Drop `package_manager`'s entries whose names are not in `names`
    pub fn retain_only(&mut self, package_manager: &str, names: &BTreeSet<String>) {
        if let Some(entry) = self.package_managers.iter_mut().find(|e| e.name == package_manager) {
            let before = entry.repositories.len();
            entry.repositories.retain(|r| names.contains(&r.name));
            debug!(
                "Pruned {} stale {} cache entries",
                before - entry.repositories.len(),
                package_manager
            );
        }
    }

    /// Number of cached libraries across all package managers
    pub fn len(&self) -> usize {
        self.package_managers.iter().map(|e| e.repositories.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Atomically overwrite the cache file.
    ///
    /// Writes a sibling temporary file, then renames it over `path`.
    pub async fn persist(&self, path: &Path) -> DepdocResult<()> {
        let persist_failed = |source| DepdocError::CachePersistFailed {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(persist_failed)?;
        }

        let mut sorted = self.clone();
        sorted.sort();
        let content = serde_json::to_string_pretty(&sorted)?;

        let tmp = temp_path(path);
        fs::write(&tmp, content).await.map_err(persist_failed)?;
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(persist_failed(e));
        }

        debug!("Saved {} source URLs to {}", self.len(), path.display());
        Ok(())
    }

    /// Delete the cache file, if any
    pub async fn clear(path: &Path) -> DepdocResult<bool> {
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)
            .await
            .map_err(|e| DepdocError::io(format!("removing {}", path.display()), e))?;
        Ok(true)
    }

    fn scope(&self, package_manager: &str) -> Option<&PackageManagerEntry> {
        self.package_managers.iter().find(|e| e.name == package_manager)
    }

    fn set_scope(&mut self, package_manager: &str, urls: BTreeMap<String, String>) {
        let repositories = urls
            .into_iter()
            .map(|(name, source_url)| RepositoryEntry { name, source_url })
            .collect();

        match self.package_managers.iter_mut().find(|e| e.name == package_manager) {
            Some(entry) => entry.repositories = repositories,
            None => self.package_managers.push(PackageManagerEntry {
                name: package_manager.to_string(),
                repositories,
            }),
        }
    }

    fn sort(&mut self) {
        self.package_managers.sort_by(|a, b| a.name.cmp(&b.name));
        for entry in &mut self.package_managers {
            entry.repositories.sort_by(|a, b| a.name.cmp(&b.name));
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "source-urls.json".to_string());
    path.with_file_name(format!(".{}.tmp", file_name))
}

//! Resolution stage: library name to repository key
//!
//! Each library's source URL comes from the cache when present, otherwise
//! from its registry. The URL is then normalized into a searchable key.

use crate::doctor::Doctor;
use crate::error::LookupError;
use crate::library::Library;
use crate::repo_url::{self, RepositoryKey};
use crate::ui::ResolveProgress;
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

/// How one library resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOutcome {
    pub library_name: String,

    /// Source URL as reported by the cache or registry
    pub source_url: Option<String>,

    /// Set iff `searchable`
    pub key: Option<RepositoryKey>,

    pub searchable: bool,

    pub error: Option<LookupError>,
}

impl ResolutionOutcome {
    fn resolved(name: &str, url: String, key: RepositoryKey) -> Self {
        Self {
            library_name: name.to_string(),
            source_url: Some(url),
            key: Some(key),
            searchable: true,
            error: None,
        }
    }

    fn failed(name: &str, url: Option<String>, error: LookupError) -> Self {
        Self {
            library_name: name.to_string(),
            source_url: url,
            key: None,
            searchable: false,
            error: Some(error),
        }
    }

    /// The registry knows the library but lists no source location
    fn unresolved(name: &str) -> Self {
        Self {
            library_name: name.to_string(),
            source_url: None,
            key: None,
            searchable: false,
            error: None,
        }
    }
}

/// Resolve every library, at most `gate`'s permit count at a time.
///
/// Spawning waits for a free permit, so a saturated gate holds back new
/// work. Returns exactly one outcome per input library, in no particular
/// order.
pub async fn resolve(
    libraries: &[Library],
    doctor: Arc<dyn Doctor>,
    cache: &HashMap<String, String>,
    skip_cache: bool,
    gate: Arc<Semaphore>,
    progress: &ResolveProgress,
) -> Vec<ResolutionOutcome> {
    let mut handles = Vec::with_capacity(libraries.len());

    for library in libraries {
        let cached = if skip_cache {
            None
        } else {
            cache.get(&library.name).cloned()
        };

        // Only fails if the semaphore is closed, which this stage never does
        let permit = Arc::clone(&gate).acquire_owned().await.ok();
        let doctor = Arc::clone(&doctor);
        let progress = progress.clone();
        let task_library = library.clone();

        let handle = tokio::spawn(async move {
            let _permit = permit;
            progress.start(&task_library.name, cached.is_some());
            resolve_one(&task_library, doctor.as_ref(), cached).await
        });
        handles.push((library.name.clone(), handle));
    }

    join_all(handles.into_iter().map(|(name, handle)| async move {
        handle.await.unwrap_or_else(|e| {
            ResolutionOutcome::failed(&name, None, LookupError::registry(&name, e))
        })
    }))
    .await
}

async fn resolve_one(
    library: &Library,
    doctor: &dyn Doctor,
    cached: Option<String>,
) -> ResolutionOutcome {
    let url = match cached {
        Some(url) => {
            debug!("{}: source URL from cache", library.name);
            url
        }
        None => match doctor.source_code_url(library).await {
            Ok(url) => url,
            Err(e) => return ResolutionOutcome::failed(&library.name, None, e),
        },
    };

    if url.trim().is_empty() {
        return ResolutionOutcome::unresolved(&library.name);
    }

    match repo_url::parse(&url) {
        Ok(key) => ResolutionOutcome::resolved(&library.name, url, key),
        Err(e) => ResolutionOutcome::failed(&library.name, Some(url), e),
    }
}

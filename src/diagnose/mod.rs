//! Maintenance diagnosis pipeline
//!
//! Resolves each library's repository, queries upstream state in batches
//! and classifies the result. Both network stages run concurrently under
//! their own bound.

pub mod batch;
pub mod classify;
pub mod resolve;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{Diagnoses, Diagnosis};
pub use resolve::ResolutionOutcome;

use crate::config::schema::DiagnoseConfig;
use crate::doctor::Doctor;
use crate::github::RepositoryQuery;
use crate::library::Library;
use crate::ui::ResolveProgress;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::info;

/// Tuning for one diagnosis run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnoseOptions {
    /// Activity threshold in years
    pub years: u32,

    /// Library names reported as ignored
    pub ignores: BTreeSet<String>,

    /// In-flight limit, applied to each stage separately
    pub concurrency: usize,

    pub batch_size: usize,

    /// Resolve every library from its registry
    pub skip_cache: bool,
}

impl Default for DiagnoseOptions {
    fn default() -> Self {
        Self::from_config(&DiagnoseConfig::default())
    }
}

impl DiagnoseOptions {
    pub fn from_config(config: &DiagnoseConfig) -> Self {
        Self {
            years: config.years,
            ignores: config.ignores.iter().cloned().collect(),
            concurrency: config.concurrency,
            batch_size: config.batch_size,
            skip_cache: false,
        }
    }
}

/// Runs the diagnosis pipeline for one package manager
pub struct Diagnoser {
    doctor: Arc<dyn Doctor>,
    query: Arc<dyn RepositoryQuery>,
    options: DiagnoseOptions,
    progress: ResolveProgress,
}

impl Diagnoser {
    pub fn new(doctor: Arc<dyn Doctor>, query: Arc<dyn RepositoryQuery>, options: DiagnoseOptions) -> Self {
        Self {
            doctor,
            query,
            options,
            progress: ResolveProgress::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ResolveProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Diagnose `libraries`, using `cache` for known source URLs
    pub async fn diagnose(&self, libraries: &[Library], cache: &HashMap<String, String>) -> Diagnoses {
        self.diagnose_at(libraries, cache, Utc::now()).await
    }

    /// [`Diagnoser::diagnose`] with activity measured from `now`
    pub async fn diagnose_at(
        &self,
        libraries: &[Library],
        cache: &HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> Diagnoses {
        let concurrency = self.options.concurrency.max(1);
        info!(
            "Diagnosing {} libraries (concurrency {}, batch size {})",
            libraries.len(),
            concurrency,
            self.options.batch_size
        );

        let started = Instant::now();
        let outcomes = resolve::resolve(
            libraries,
            Arc::clone(&self.doctor),
            cache,
            self.options.skip_cache,
            Arc::new(Semaphore::new(concurrency)),
            &self.progress,
        )
        .await;
        self.progress.finish();
        info!("Resolved {} libraries in {:?}", outcomes.len(), started.elapsed());

        let started = Instant::now();
        let repositories = batch::fetch_repositories(
            &outcomes,
            self.options.batch_size,
            Arc::clone(&self.query),
            Arc::new(Semaphore::new(concurrency)),
        )
        .await;
        info!("Queried {} repositories in {:?}", repositories.len(), started.elapsed());

        classify::classify(&outcomes, &repositories, &self.options.ignores, self.options.years, now)
    }
}

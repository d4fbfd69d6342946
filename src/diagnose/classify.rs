//! Diagnosis classifier
//!
//! Joins resolution outcomes with upstream repository state and assigns
//! each library exactly one state. Rules apply in order:
//!
//! 1. Ignored, when the user listed the library
//! 2. Errored, when resolution or the covering batch failed
//! 3. Unknown, when no repository was identified or the remote did not find it
//! 4. Diagnosed, carrying the archived flag and activity verdict

use super::resolve::ResolutionOutcome;
use crate::error::LookupError;
use crate::github::RemoteRepository;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Final state of one library
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Diagnosis {
    pub name: String,

    /// Repository URL when known, otherwise the resolved source URL
    pub url: String,

    pub archived: bool,
    pub ignored: bool,
    pub diagnosed: bool,
    pub is_active: bool,
    pub error: Option<LookupError>,
}

impl Diagnosis {
    /// Error text, empty when there is none
    pub fn error_message(&self) -> String {
        self.error.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    pub fn is_errored(&self) -> bool {
        self.error.is_some()
    }

    /// Neither diagnosed nor errored
    pub fn is_unknown(&self) -> bool {
        !self.diagnosed && self.error.is_none()
    }
}

/// Diagnoses keyed by library name
pub type Diagnoses = BTreeMap<String, Diagnosis>;

/// Classify every outcome against the repositories fetched for them.
///
/// Produces one diagnosis per distinct library name. Libraries sharing a
/// repository get the same archived and activity values.
pub fn classify(
    outcomes: &[ResolutionOutcome],
    repositories: &[RemoteRepository],
    ignores: &BTreeSet<String>,
    years: u32,
    now: DateTime<Utc>,
) -> Diagnoses {
    let by_key: HashMap<String, &RemoteRepository> = repositories
        .iter()
        .map(|repository| (repository.join_key(), repository))
        .collect();

    outcomes
        .iter()
        .map(|outcome| {
            let remote = outcome
                .key
                .as_ref()
                .and_then(|key| by_key.get(&key.canonical()).copied());
            let ignored = ignores.contains(&outcome.library_name);
            (
                outcome.library_name.clone(),
                classify_one(outcome, remote, ignored, years, now),
            )
        })
        .collect()
}

fn classify_one(
    outcome: &ResolutionOutcome,
    remote: Option<&RemoteRepository>,
    ignored: bool,
    years: u32,
    now: DateTime<Utc>,
) -> Diagnosis {
    let url = remote
        .filter(|r| !r.url.is_empty())
        .map(|r| r.url.clone())
        .or_else(|| outcome.source_url.clone())
        .unwrap_or_default();

    let mut diagnosis = Diagnosis {
        name: outcome.library_name.clone(),
        url,
        ..Diagnosis::default()
    };

    let healthy_remote = remote.filter(|r| r.error.is_none());

    if ignored {
        diagnosis.ignored = true;
        diagnosis.diagnosed = true;
        if let Some(repository) = healthy_remote {
            diagnosis.archived = repository.archived;
            diagnosis.is_active = repository.is_active_at(years, now);
        }
        return diagnosis;
    }

    if let Some(error) = outcome
        .error
        .clone()
        .or_else(|| remote.and_then(|r| r.error.clone()))
    {
        diagnosis.error = Some(error);
        return diagnosis;
    }

    if let Some(repository) = healthy_remote {
        diagnosis.diagnosed = true;
        diagnosis.archived = repository.archived;
        diagnosis.is_active = repository.is_active_at(years, now);
    }

    diagnosis
}

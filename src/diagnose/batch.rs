//! Batch query stage: repository keys to upstream state
//!
//! Searchable keys are deduplicated, split into fixed-size batches and
//! fetched concurrently. A failed batch marks every repository it covered.

use super::resolve::ResolutionOutcome;
use crate::error::LookupError;
use crate::github::{RemoteRepository, RepositoryQuery, MAX_BATCH_SIZE};
use crate::repo_url::RepositoryKey;
use futures_util::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Distinct keys of searchable outcomes.
///
/// Ordered by library name; when two libraries share a repository the key
/// of the first one is kept.
pub fn searchable_keys(outcomes: &[ResolutionOutcome]) -> Vec<RepositoryKey> {
    let mut searchable: Vec<&ResolutionOutcome> = outcomes.iter().filter(|o| o.searchable).collect();
    searchable.sort_by(|a, b| a.library_name.cmp(&b.library_name));

    let mut seen = HashSet::new();
    searchable
        .into_iter()
        .filter_map(|o| o.key.clone())
        .filter(|key| seen.insert(key.canonical()))
        .collect()
}

/// Split keys into batches of at most `size`, clamped to `1..=MAX_BATCH_SIZE`
pub fn batches(keys: Vec<RepositoryKey>, size: usize) -> Vec<Vec<RepositoryKey>> {
    keys.chunks(size.clamp(1, MAX_BATCH_SIZE))
        .map(<[RepositoryKey]>::to_vec)
        .collect()
}

/// Query every searchable repository, at most `gate`'s permit count of
/// batches at a time.
///
/// Every searchable key gets exactly one result, except keys the remote
/// does not know, which are absent.
pub async fn fetch_repositories(
    outcomes: &[ResolutionOutcome],
    batch_size: usize,
    query: Arc<dyn RepositoryQuery>,
    gate: Arc<Semaphore>,
) -> Vec<RemoteRepository> {
    let batches = batches(searchable_keys(outcomes), batch_size);
    debug!("Querying {} repository batches", batches.len());

    let mut handles = Vec::with_capacity(batches.len());
    for (index, batch) in batches.into_iter().enumerate() {
        let permit = Arc::clone(&gate).acquire_owned().await.ok();
        let query = Arc::clone(&query);
        let task_batch = batch.clone();

        let handle = tokio::spawn(async move {
            let _permit = permit;
            debug!("Batch {}: {} repositories", index, task_batch.len());
            query.fetch(&task_batch).await
        });
        handles.push((index, batch, handle));
    }

    let results = join_all(handles.into_iter().map(|(index, batch, handle)| async move {
        let error = match handle.await {
            Ok(Ok(repositories)) => return repositories,
            Ok(Err(e)) => e,
            Err(e) => LookupError::remote(e),
        };
        warn!("Batch {} failed: {}", index, error);
        batch
            .iter()
            .map(|key| RemoteRepository::failed(key, error.clone()))
            .collect::<Vec<_>>()
    }))
    .await;

    results.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnose::testing::FakeQuery;
    use chrono::Utc;

    fn outcome(name: &str, owner: &str, repo: &str) -> ResolutionOutcome {
        ResolutionOutcome {
            library_name: name.to_string(),
            source_url: Some(format!("https://github.com/{}/{}", owner, repo)),
            key: Some(RepositoryKey::new(owner, repo)),
            searchable: true,
            error: None,
        }
    }

    fn unsearchable(name: &str) -> ResolutionOutcome {
        ResolutionOutcome {
            library_name: name.to_string(),
            source_url: None,
            key: None,
            searchable: false,
            error: Some(LookupError::BlankInput),
        }
    }

    #[test]
    fn searchable_keys_dedupes_case_insensitively() {
        let outcomes = vec![
            outcome("b-lib", "Org", "Shared"),
            outcome("a-lib", "org", "shared"),
            unsearchable("c-lib"),
            outcome("d-lib", "org", "other"),
        ];

        let keys = searchable_keys(&outcomes);

        assert_eq!(
            keys,
            vec![RepositoryKey::new("org", "shared"), RepositoryKey::new("org", "other")]
        );
    }

    #[test]
    fn batches_split_by_size() {
        let keys: Vec<RepositoryKey> = (0..5).map(|i| RepositoryKey::new("o", format!("r{}", i))).collect();

        let split = batches(keys, 2);

        assert_eq!(split.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 2, 1]);
    }

    #[test]
    fn batches_treat_zero_size_as_one() {
        let keys = vec![RepositoryKey::new("o", "a"), RepositoryKey::new("o", "b")];
        assert_eq!(batches(keys, 0).len(), 2);
    }

    #[test]
    fn batches_never_exceed_search_limit() {
        let keys: Vec<RepositoryKey> = (0..250).map(|i| RepositoryKey::new("o", format!("r{}", i))).collect();

        let split = batches(keys, 150);

        assert_eq!(split.iter().map(Vec::len).collect::<Vec<_>>(), vec![100, 100, 50]);
    }

    #[tokio::test]
    async fn shared_repository_is_queried_once() {
        let query = Arc::new(FakeQuery::new().with_repository("org", "shared", false, Some(Utc::now())));
        let outcomes = vec![outcome("a", "org", "shared"), outcome("b", "ORG", "shared")];

        let repositories =
            fetch_repositories(&outcomes, 20, Arc::clone(&query) as Arc<dyn RepositoryQuery>, Arc::new(Semaphore::new(2)))
                .await;

        assert_eq!(repositories.len(), 1);
        let batches = query.recorded_batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
    }

    #[tokio::test]
    async fn failed_batch_marks_every_member() {
        let query = Arc::new(
            FakeQuery::new()
                .with_repository("org", "a", false, Some(Utc::now()))
                .with_repository("org", "b", false, Some(Utc::now()))
                .with_repository("org", "c", false, Some(Utc::now()))
                .failing_on("org", "b"),
        );
        let outcomes = vec![
            outcome("a", "org", "a"),
            outcome("b", "org", "b"),
            outcome("c", "org", "c"),
        ];

        let mut repositories =
            fetch_repositories(&outcomes, 2, query as Arc<dyn RepositoryQuery>, Arc::new(Semaphore::new(2))).await;
        repositories.sort_by_key(|r| r.join_key());

        assert_eq!(repositories.len(), 3);
        let expected = Some(LookupError::remote("API rate limit exceeded"));
        assert_eq!(repositories[0].error, expected);
        assert_eq!(repositories[1].error, expected);
        assert_eq!(repositories[2].error, None);
    }

    #[tokio::test]
    async fn nothing_searchable_issues_no_queries() {
        let query = Arc::new(FakeQuery::new());

        let repositories = fetch_repositories(
            &[unsearchable("x")],
            20,
            Arc::clone(&query) as Arc<dyn RepositoryQuery>,
            Arc::new(Semaphore::new(2)),
        )
        .await;

        assert!(repositories.is_empty());
        assert!(query.recorded_batches().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn batch_concurrency_is_bounded() {
        let mut query = FakeQuery::new().with_delay_ms(10);
        let mut outcomes = Vec::new();
        for i in 0..30 {
            let repo = format!("r{:02}", i);
            query = query.with_repository("org", &repo, false, Some(Utc::now()));
            outcomes.push(outcome(&format!("lib-{:02}", i), "org", &repo));
        }
        let query = Arc::new(query);

        let repositories = fetch_repositories(
            &outcomes,
            2,
            Arc::clone(&query) as Arc<dyn RepositoryQuery>,
            Arc::new(Semaphore::new(3)),
        )
        .await;

        assert_eq!(repositories.len(), 30);
        assert_eq!(query.recorded_batches().len(), 15);
        assert!(query.max_in_flight() <= 3);
    }
}

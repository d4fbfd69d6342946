//! In-memory registry and repository fakes for pipeline tests

use crate::doctor::{self, Doctor};
use crate::error::{DepdocResult, LookupError};
use crate::github::{RemoteRepository, RepositoryQuery};
use crate::library::Library;
use crate::repo_url::RepositoryKey;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Tracks how many calls overlap
#[derive(Default)]
pub struct InFlight {
    current: AtomicUsize,
    pub max: AtomicUsize,
}

impl InFlight {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeDoctor {
    urls: HashMap<String, Result<String, LookupError>>,
    delay: Option<Duration>,
    in_flight: InFlight,
    pub calls: AtomicUsize,
}

impl FakeDoctor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, name: &str, url: &str) -> Self {
        self.urls.insert(name.to_string(), Ok(url.to_string()));
        self
    }

    pub fn with_error(mut self, name: &str, reason: &str) -> Self {
        self.urls
            .insert(name.to_string(), Err(LookupError::registry(name, reason)));
        self
    }

    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay = Some(Duration::from_millis(ms));
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.in_flight.max.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Doctor for FakeDoctor {
    fn libraries(&self, input: &str) -> DepdocResult<Vec<Library>> {
        doctor::list::parse(input)
    }

    async fn source_code_url(&self, library: &Library) -> Result<String, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.in_flight.enter();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.exit();

        self.urls
            .get(&library.name)
            .cloned()
            .unwrap_or_else(|| Err(LookupError::registry(&library.name, "Got status code: 404")))
    }
}

#[derive(Default)]
pub struct FakeQuery {
    repositories: HashMap<String, RemoteRepository>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    in_flight: InFlight,
    pub batches: Mutex<Vec<Vec<RepositoryKey>>>,
}

impl FakeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repository(
        mut self,
        owner: &str,
        repo: &str,
        archived: bool,
        last_activity_at: Option<DateTime<Utc>>,
    ) -> Self {
        let repository = RemoteRepository {
            name: repo.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            url: format!("https://github.com/{}/{}", owner, repo),
            archived,
            last_activity_at,
            error: None,
        };
        self.repositories.insert(repository.join_key(), repository);
        self
    }

    /// Any batch containing this key fails as a whole
    pub fn failing_on(mut self, owner: &str, repo: &str) -> Self {
        self.failing.insert(RepositoryKey::new(owner, repo).canonical());
        self
    }

    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay = Some(Duration::from_millis(ms));
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.in_flight.max.load(Ordering::SeqCst)
    }

    pub fn recorded_batches(&self) -> Vec<Vec<RepositoryKey>> {
        self.batches.lock().map(|b| b.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RepositoryQuery for FakeQuery {
    async fn fetch(&self, keys: &[RepositoryKey]) -> Result<Vec<RemoteRepository>, LookupError> {
        if let Ok(mut batches) = self.batches.lock() {
            batches.push(keys.to_vec());
        }
        self.in_flight.enter();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.exit();

        if keys.iter().any(|k| self.failing.contains(&k.canonical())) {
            return Err(LookupError::remote("API rate limit exceeded"));
        }

        Ok(keys
            .iter()
            .filter_map(|k| self.repositories.get(&k.canonical()).cloned())
            .collect())
    }
}

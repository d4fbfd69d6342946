//! GitHub repository metadata
//!
//! Looks up archival state and last commit time for many repositories in
//! a single GraphQL search call.

pub mod token;

pub use token::GithubToken;

use crate::error::LookupError;
use crate::http;
use crate::repo_url::{canonical_key, RepositoryKey};
use async_trait::async_trait;
use chrono::{DateTime, Months, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Most results one search call may return
pub const MAX_BATCH_SIZE: usize = 100;

/// Search terms are ORed by separating them with spaces
const QUERY_SEPARATOR: &str = " ";

const SEARCH_QUERY: &str = r#"
query($query: String!, $count: Int!) {
  search(query: $query, first: $count, type: REPOSITORY) {
    repositoryCount
    nodes {
      ... on Repository {
        isArchived
        url
        name
        owner { login }
        defaultBranchRef {
          target {
            ... on Commit {
              history(first: 1) {
                edges { node { committedDate } }
              }
            }
          }
        }
      }
    }
  }
}"#;

/// Upstream repository state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepository {
    pub name: String,
    pub owner: String,
    pub repo: String,
    pub url: String,
    pub archived: bool,

    /// Most recent commit on the default branch
    pub last_activity_at: Option<DateTime<Utc>>,

    /// Set when the batch covering this repository failed
    pub error: Option<LookupError>,
}

impl RemoteRepository {
    /// Placeholder for a repository whose batch query failed
    pub fn failed(key: &RepositoryKey, error: LookupError) -> Self {
        Self {
            name: key.repo.clone(),
            owner: key.owner.clone(),
            repo: key.repo.clone(),
            url: String::new(),
            archived: false,
            last_activity_at: None,
            error: Some(error),
        }
    }

    /// Key joining this result back to resolution outcomes
    pub fn join_key(&self) -> String {
        canonical_key(&self.owner, &self.repo)
    }

    /// Whether there was a commit within `years` years before `now`.
    ///
    /// Active iff the last commit plus `years` is strictly after `now`. A
    /// repository without commits is never active.
    pub fn is_active_at(&self, years: u32, now: DateTime<Utc>) -> bool {
        let Some(last) = self.last_activity_at else {
            return false;
        };
        last.checked_add_months(Months::new(years.saturating_mul(12)))
            .map_or(true, |cutoff| cutoff > now)
    }
}

/// Batched repository metadata lookup
#[async_trait]
pub trait RepositoryQuery: Send + Sync {
    /// Fetch every repository in `keys` with one remote call.
    ///
    /// Keys the remote does not know are absent from the result. A failure
    /// covers the whole call.
    async fn fetch(&self, keys: &[RepositoryKey]) -> Result<Vec<RemoteRepository>, LookupError>;
}

/// GitHub GraphQL search client
#[derive(Clone)]
pub struct GithubClient {
    agent: ureq::Agent,
    api_url: String,
    token: String,
}

impl GithubClient {
    pub fn new(agent: ureq::Agent, api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            agent,
            api_url: api_url.into(),
            token: token.into(),
        }
    }

    /// Search string matching every key
    pub fn search_query(keys: &[RepositoryKey]) -> String {
        keys.iter()
            .map(RepositoryKey::query_term)
            .collect::<Vec<_>>()
            .join(QUERY_SEPARATOR)
    }

    /// Blocking form of [`RepositoryQuery::fetch`]
    pub fn fetch_blocking(&self, keys: &[RepositoryKey]) -> Result<Vec<RemoteRepository>, LookupError> {
        if keys.is_empty() {
            return Ok(vec![]);
        }

        let body = json!({
            "query": SEARCH_QUERY,
            "variables": {
                "query": Self::search_query(keys),
                "count": keys.len(),
            },
        })
        .to_string();

        debug!("Querying {} repositories", keys.len());

        let mut response = self
            .agent
            .post(&self.api_url)
            .header("Authorization", format!("bearer {}", self.token))
            .header("Content-Type", "application/json")
            .header("User-Agent", http::USER_AGENT)
            .send(body.as_str())
            .map_err(|e| LookupError::remote(http::describe_error(&e, &self.api_url)))?;

        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| LookupError::remote(http::describe_error(&e, &self.api_url)))?;

        parse_search_response(&text)
    }
}

#[async_trait]
impl RepositoryQuery for GithubClient {
    async fn fetch(&self, keys: &[RepositoryKey]) -> Result<Vec<RemoteRepository>, LookupError> {
        let client = self.clone();
        let keys = keys.to_vec();

        tokio::task::spawn_blocking(move || client.fetch_blocking(&keys))
            .await
            .map_err(LookupError::remote)?
    }
}

#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<SearchData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Deserialize)]
struct SearchData {
    search: Search,
}

#[derive(Deserialize)]
struct Search {
    #[serde(default)]
    nodes: Vec<Option<SearchNode>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNode {
    #[serde(default)]
    is_archived: bool,
    #[serde(default)]
    url: String,
    name: Option<String>,
    owner: Option<Owner>,
    default_branch_ref: Option<BranchRef>,
}

#[derive(Deserialize)]
struct Owner {
    login: String,
}

#[derive(Deserialize)]
struct BranchRef {
    target: Option<Target>,
}

#[derive(Deserialize)]
struct Target {
    history: Option<History>,
}

#[derive(Deserialize)]
struct History {
    #[serde(default)]
    edges: Vec<Edge>,
}

#[derive(Deserialize)]
struct Edge {
    node: Commit,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Commit {
    committed_date: DateTime<Utc>,
}

impl SearchNode {
    fn last_committed_at(&self) -> Option<DateTime<Utc>> {
        let history = self.default_branch_ref.as_ref()?.target.as_ref()?.history.as_ref()?;
        history.edges.first().map(|edge| edge.node.committed_date)
    }

    fn into_repository(self) -> Option<RemoteRepository> {
        let last_activity_at = self.last_committed_at();
        let name = self.name?;
        let owner = self.owner?.login;
        Some(RemoteRepository {
            repo: name.clone(),
            name,
            owner,
            url: self.url,
            archived: self.is_archived,
            last_activity_at,
            error: None,
        })
    }
}

fn parse_search_response(text: &str) -> Result<Vec<RemoteRepository>, LookupError> {
    let response: GraphqlResponse = serde_json::from_str(text)
        .map_err(|e| LookupError::remote(format!("invalid response: {}", e)))?;

    let Some(data) = response.data else {
        let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(LookupError::remote(if messages.is_empty() {
            "empty response".to_string()
        } else {
            messages.join("; ")
        }));
    };

    Ok(data
        .search
        .nodes
        .into_iter()
        .flatten()
        .filter_map(SearchNode::into_repository)
        .collect())
}

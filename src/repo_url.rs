//! Source URL normalization
//!
//! Turns whatever a registry reports as a package's source location into an
//! `owner/repo` pair that can be searched for and joined on.

use crate::error::LookupError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use url::Url;

/// Normalized repository identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryKey {
    pub owner: String,
    pub repo: String,
}

impl RepositoryKey {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Join key shared by resolution outcomes and query results.
    ///
    /// Hosting services treat owner and repository names case-insensitively,
    /// so the key is lowercased.
    pub fn canonical(&self) -> String {
        canonical_key(&self.owner, &self.repo)
    }

    /// Search term selecting exactly this repository
    pub fn query_term(&self) -> String {
        format!("repo:{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepositoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Build the join key for an owner and repository name
pub fn canonical_key(owner: &str, repo: &str) -> String {
    format!("{}/{}", owner.to_lowercase(), repo.to_lowercase())
}

/// Parse a source code URL into its repository key.
///
/// Accepted forms:
/// - `github.com/owner/repo` (host and path, no scheme)
/// - `git@github.com:owner/repo.git` (scp-like ssh)
/// - `https://`, `http://`, `ssh://`, `git://`, `git+ssh://`, `git+https://`
/// - `file://`
pub fn parse(url: &str) -> Result<RepositoryKey, LookupError> {
    let input = url.trim();
    if input.is_empty() {
        return Err(LookupError::BlankInput);
    }

    match input.split_once("://") {
        Some((scheme, rest)) => parse_with_scheme(input, &scheme.to_ascii_lowercase(), rest),
        None => match split_scp_like(input) {
            Some(path) => {
                note_host(input, scp_host(input));
                key_from_segments(input, &segments(path))
            }
            None => parse_host_path(input, input),
        },
    }
}

/// Whether `host` is GitHub, the only host repositories are searched on
pub fn is_github_host(host: &str) -> bool {
    let host = host.split(':').next().unwrap_or(host);
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    host == "github.com" || host.ends_with(".github.com")
}

/// Other hosts are still searched by path and may match an unrelated repository
fn note_host(input: &str, host: &str) {
    if !is_github_host(host) {
        debug!("{} is not hosted on GitHub; searching by path only", input);
    }
}

/// Host of `[user@]host:path`
fn scp_host(input: &str) -> &str {
    let host = input.split(':').next().unwrap_or_default();
    host.rsplit('@').next().unwrap_or(host)
}

fn parse_with_scheme(input: &str, scheme: &str, rest: &str) -> Result<RepositoryKey, LookupError> {
    match scheme {
        "https" | "http" | "ssh" | "git" | "git+ssh" | "git+https" => match Url::parse(input) {
            Ok(parsed) => {
                note_host(input, parsed.host_str().unwrap_or_default());
                let parts: Vec<&str> = parsed
                    .path_segments()
                    .map(|s| s.collect())
                    .unwrap_or_default();
                key_from_segments(input, &parts)
            }
            // `git+ssh://git@host:owner/repo` is an scp path behind a scheme
            Err(_) => match split_scp_like(rest) {
                Some(path) => {
                    note_host(input, scp_host(rest));
                    key_from_segments(input, &segments(path))
                }
                None => Err(LookupError::MalformedPath(input.to_string())),
            },
        },
        "file" => parse_file_path(input, rest),
        _ => Err(LookupError::UnrecognizedScheme(input.to_string())),
    }
}

/// `file://` paths either start with a host or point into a local checkout,
/// in which case the last two segments name the repository.
fn parse_file_path(input: &str, path: &str) -> Result<RepositoryKey, LookupError> {
    let parts = segments(path);
    match parts.first() {
        Some(first) if looks_like_host(first) => key_from_segments(input, &parts[1..]),
        _ if parts.len() >= 2 => key_from_segments(input, &parts[parts.len() - 2..]),
        _ => Err(LookupError::MalformedPath(input.to_string())),
    }
}

fn parse_host_path(input: &str, path: &str) -> Result<RepositoryKey, LookupError> {
    let parts = segments(path);
    match parts.first() {
        Some(first) if looks_like_host(first) => {
            note_host(input, first);
            key_from_segments(input, &parts[1..])
        }
        _ => Err(LookupError::MalformedPath(input.to_string())),
    }
}

/// Return the path of `[user@]host:path`, or `None` if `input` is not scp-like
fn split_scp_like(input: &str) -> Option<&str> {
    let (host, path) = input.split_once(':')?;
    if host.is_empty() || host.contains('/') || path.is_empty() {
        return None;
    }
    // A numeric "path" start is a port, not an scp path
    if path.split('/').next()?.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(path)
}

fn segments(path: &str) -> Vec<&str> {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn looks_like_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

fn key_from_segments(input: &str, parts: &[&str]) -> Result<RepositoryKey, LookupError> {
    let (owner, repo) = match parts {
        [owner, repo, ..] => (*owner, *repo),
        _ => return Err(LookupError::MalformedPath(input.to_string())),
    };
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if owner.is_empty() || repo.is_empty() {
        return Err(LookupError::MalformedPath(input.to_string()));
    }
    Ok(RepositoryKey::new(owner, repo))
}

//! GitHub access token discovery
//!
//! Reads the configured environment variable first, then falls back to the
//! gh CLI.

use crate::config::schema::GithubConfig;
use crate::error::{DepdocError, DepdocResult};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;
use url::Url;

const DEFAULT_API_HOST: &str = "api.github.com";

/// GitHub token provider
pub struct GithubToken;

impl GithubToken {
    /// Resolve the token needed for repository queries.
    ///
    /// Fails with `GithubTokenMissing` when neither source has one.
    pub async fn resolve(config: &GithubConfig) -> DepdocResult<String> {
        if let Some(token) = Self::from_env(&config.token_env) {
            debug!("Using GitHub token from ${}", config.token_env);
            return Ok(token);
        }

        if config.use_gh_cli {
            match Self::from_gh_cli(config).await {
                Some(token) => return Ok(token),
                None => debug!("gh CLI did not provide a token"),
            }
        }

        Err(DepdocError::GithubTokenMissing {
            env: config.token_env.clone(),
        })
    }

    /// Read a non-blank token from an environment variable
    pub fn from_env(var: &str) -> Option<String> {
        std::env::var(var)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    /// Get a token from `gh auth token`, if gh is installed and logged in
    async fn from_gh_cli(config: &GithubConfig) -> Option<String> {
        debug!("Getting GitHub token from gh CLI...");

        let mut cmd = Command::new("gh");
        cmd.args(["auth", "token"]);

        if let Some(host) = Self::enterprise_host(&config.api_url) {
            cmd.args(["--hostname", &host]);
        }

        let output = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| debug!("gh auth token failed to start: {}", e))
            .ok()?;

        if !output.status.success() {
            debug!(
                "gh auth token failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!token.is_empty()).then_some(token)
    }

    /// Host to pass to gh for a non-github.com API endpoint
    fn enterprise_host(api_url: &str) -> Option<String> {
        let host = Url::parse(api_url).ok()?.host_str()?.to_string();
        (host != DEFAULT_API_HOST).then_some(host)
    }
}

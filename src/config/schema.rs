//! Configuration schema for depdoc
//!
//! Configuration is stored at `~/.config/depdoc/config.toml`, optionally
//! overlaid by a project-local `.depdoc.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Diagnosis defaults
    pub diagnose: DiagnoseConfig,

    /// GitHub query settings
    pub github: GithubConfig,

    /// Source URL cache settings
    pub cache: CacheConfig,

    /// Package registries, keyed by package manager name
    pub registries: RegistriesConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Diagnosis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnoseConfig {
    /// Max years without a commit before a library counts as not maintained
    pub years: u32,

    /// Registry calls and batch queries in flight at once
    pub concurrency: usize,

    /// Repositories per batch query
    pub batch_size: usize,

    /// Timeout for every HTTP request, in seconds
    pub timeout_secs: u64,

    /// Exit non-zero on warnings too
    pub strict: bool,

    /// Library names excluded from error and warning classification
    pub ignores: Vec<String>,
}

impl Default for DiagnoseConfig {
    fn default() -> Self {
        Self {
            years: 5,
            concurrency: 20,
            batch_size: 20,
            timeout_secs: 30,
            strict: false,
            ignores: vec![],
        }
    }
}

/// GitHub settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// GraphQL endpoint (override for GitHub Enterprise)
    pub api_url: String,

    /// Environment variable holding the access token
    pub token_env: String,

    /// Fall back to `gh auth token` when the variable is unset
    pub use_gh_cli: bool,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com/graphql".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            use_gh_cli: true,
        }
    }
}

/// Source URL cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Disable to resolve every library through its registry
    pub enabled: bool,

    /// Cache file location (default: `~/.cache/depdoc/source-urls.json`)
    pub path: Option<PathBuf>,

    /// Drop cached entries for libraries no longer declared
    pub prune_missing: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            prune_missing: false,
        }
    }
}

/// A JSON package registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Package metadata URL; `{name}` is replaced with the library name
    pub url: String,

    /// JSON pointers tried in order; the first non-empty string is the source URL
    pub source_fields: Vec<String>,
}

impl RegistryConfig {
    fn new(url: &str, source_fields: &[&str]) -> Self {
        Self {
            url: url.to_string(),
            source_fields: source_fields.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Registry table
///
/// Entries from a config file are merged over the built-in ones, so a file
/// only needs to list what it adds or changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, RegistryConfig>", into = "BTreeMap<String, RegistryConfig>")]
pub struct RegistriesConfig(pub BTreeMap<String, RegistryConfig>);

impl RegistriesConfig {
    /// Registries known without any configuration
    pub fn builtin() -> BTreeMap<String, RegistryConfig> {
        let npm = RegistryConfig::new("https://registry.npmjs.org/{name}", &["/repository/url"]);
        let pypi = RegistryConfig::new(
            "https://pypi.org/pypi/{name}/json",
            &[
                "/info/project_urls/Source Code",
                "/info/project_urls/Code",
                "/info/project_urls/GitHub Project",
                "/info/project_urls/Source",
            ],
        );
        let rubygems = RegistryConfig::new(
            "https://rubygems.org/api/v1/gems/{name}.json",
            &["/source_code_uri", "/homepage_uri"],
        );
        let packagist = RegistryConfig::new(
            "https://repo.packagist.org/p2/{name}.json",
            &["/packages/{name}/0/source/url"],
        );

        let mut registries = BTreeMap::new();
        registries.insert("bundler".to_string(), rubygems);
        registries.insert(
            "cargo".to_string(),
            RegistryConfig::new("https://crates.io/api/v1/crates/{name}", &["/crate/repository"]),
        );
        registries.insert("composer".to_string(), packagist);
        registries.insert(
            "golang".to_string(),
            RegistryConfig::new("https://proxy.golang.org/{name}/@latest", &["/Origin/URL"]),
        );
        registries.insert(
            "mix".to_string(),
            RegistryConfig::new("https://hex.pm/api/packages/{name}", &["/meta/links/GitHub"]),
        );
        registries.insert("npm".to_string(), npm.clone());
        registries.insert("pip".to_string(), pypi.clone());
        registries.insert("pipenv".to_string(), pypi.clone());
        registries.insert("poetry".to_string(), pypi);
        registries.insert(
            "pub".to_string(),
            RegistryConfig::new(
                "https://pub.dev/api/packages/{name}",
                &[
                    "/latest/pubspec/repository",
                    "/latest/pubspec/homepage",
                    "/latest/pubspec/issue_tracker",
                ],
            ),
        );
        registries.insert("yarn".to_string(), npm);
        registries
    }
}

impl Default for RegistriesConfig {
    fn default() -> Self {
        Self(Self::builtin())
    }
}

impl From<BTreeMap<String, RegistryConfig>> for RegistriesConfig {
    fn from(overrides: BTreeMap<String, RegistryConfig>) -> Self {
        let mut registries = Self::builtin();
        registries.extend(overrides);
        Self(registries)
    }
}

impl From<RegistriesConfig> for BTreeMap<String, RegistryConfig> {
    fn from(registries: RegistriesConfig) -> Self {
        registries.0
    }
}

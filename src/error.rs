//! Error types for depdoc
//!
//! Process-level failures use `DepdocResult<T>`. Per-library failures are
//! carried as data via [`LookupError`] so one bad dependency never aborts a run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for depdoc operations
pub type DepdocResult<T> = Result<T, DepdocError>;

/// Errors that stop a command
#[derive(Error, Debug)]
pub enum DepdocError {
    // Preconditions
    #[error("GitHub access token not found: set `{env}` or authenticate with `gh auth login`")]
    GithubTokenMissing { env: String },

    #[error("Unknown package manager: {name}. You can choose from [{available}]")]
    UnknownPackageManager { name: String, available: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Input errors
    #[error("Can't open: {path}")]
    DependencyFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid dependency list at line {line}: {reason}")]
    DependencyListParse { line: usize, reason: String },

    // Cache errors
    #[error("Could not read source URL cache {path}: {reason}")]
    CacheLoadFailed { path: PathBuf, reason: String },

    #[error("Could not write source URL cache {path}: {source}")]
    CachePersistFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl DepdocError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::GithubTokenMissing { .. } => Some(
                "Create a token at https://github.com/settings/tokens and export it, or run: gh auth login",
            ),
            Self::UnknownPackageManager { .. } => Some("Run: depdoc package-managers"),
            Self::ConfigInvalid { .. } => Some("Run: depdoc config show"),
            Self::CacheLoadFailed { .. } | Self::CachePersistFailed { .. } => {
                Some("Run: depdoc cache clear")
            }
            _ => None,
        }
    }
}

/// Why a single library could not be diagnosed
///
/// Cloned onto every library a failed batch covered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("error: Blank URL")]
    BlankInput,

    #[error("error: Unknown URL scheme in {0}")]
    UnrecognizedScheme(String),

    #[error("error: Unknown URL {0}")]
    MalformedPath(String),

    #[error("registry lookup failed for {name}: {reason}")]
    RegistryLookupFailed { name: String, reason: String },

    #[error("repository query failed: {0}")]
    RemoteQueryFailed(String),
}

impl LookupError {
    /// Create a registry lookup failure
    pub fn registry(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::RegistryLookupFailed {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a remote query failure
    pub fn remote(reason: impl ToString) -> Self {
        Self::RemoteQueryFailed(reason.to_string())
    }
}

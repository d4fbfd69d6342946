//! Declared dependencies

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A library declared by a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    /// Registry-unique name
    pub name: String,

    /// Declared version, if the input carries one
    pub version: Option<String>,
}

impl Library {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    pub fn with_version(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
        }
    }

    /// Deduplicate by name and sort by name.
    ///
    /// Names compare case-sensitively. When a name repeats, the last
    /// declaration wins.
    pub fn unique_sorted(libraries: impl IntoIterator<Item = Library>) -> Vec<Library> {
        let by_name: BTreeMap<String, Library> = libraries
            .into_iter()
            .map(|lib| (lib.name.clone(), lib))
            .collect();
        by_name.into_values().collect()
    }
}

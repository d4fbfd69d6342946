//! Per-ecosystem dependency doctors
//!
//! A doctor knows how to read a project's declared libraries and how to ask
//! its package registry where each library's source code lives.

pub mod list;
pub mod registry;

pub use registry::JsonRegistry;

use crate::config::Config;
use crate::error::{DepdocError, DepdocResult, LookupError};
use crate::library::Library;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Reads declared libraries and resolves their source URLs
///
/// `source_code_url` is called from many tasks at once.
#[async_trait]
pub trait Doctor: Send + Sync {
    /// Parse the declared libraries out of a dependency file's contents
    fn libraries(&self, input: &str) -> DepdocResult<Vec<Library>>;

    /// Ask the registry for the library's source code URL
    async fn source_code_url(&self, library: &Library) -> Result<String, LookupError>;
}

/// Doctor backed by a JSON registry, reading plain dependency lists
pub struct RegistryDoctor {
    registry: Arc<JsonRegistry>,
}

impl RegistryDoctor {
    pub fn new(registry: JsonRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

#[async_trait]
impl Doctor for RegistryDoctor {
    fn libraries(&self, input: &str) -> DepdocResult<Vec<Library>> {
        list::parse(input)
    }

    async fn source_code_url(&self, library: &Library) -> Result<String, LookupError> {
        let registry = Arc::clone(&self.registry);
        let name = library.name.clone();

        tokio::task::spawn_blocking(move || registry.lookup(&name))
            .await
            .map_err(|e| LookupError::registry(&library.name, e))?
    }
}

/// Doctors by package manager name
#[derive(Default, Clone)]
pub struct Doctors {
    doctors: BTreeMap<String, Arc<dyn Doctor>>,
}

impl Doctors {
    pub fn new() -> Self {
        Self::default()
    }

    /// One registry doctor per configured registry
    pub fn from_config(config: &Config, agent: ureq::Agent) -> Self {
        let mut doctors = Self::new();
        for (name, registry) in &config.registries.0 {
            let doctor = RegistryDoctor::new(JsonRegistry::new(registry, agent.clone()));
            doctors.register(name.clone(), Arc::new(doctor));
        }
        doctors
    }

    pub fn register(&mut self, package_manager: impl Into<String>, doctor: Arc<dyn Doctor>) {
        self.doctors.insert(package_manager.into(), doctor);
    }

    /// Look up the doctor for a package manager
    pub fn get(&self, package_manager: &str) -> DepdocResult<Arc<dyn Doctor>> {
        self.doctors
            .get(package_manager)
            .cloned()
            .ok_or_else(|| DepdocError::UnknownPackageManager {
                name: package_manager.to_string(),
                available: self.package_managers().join(", "),
            })
    }

    /// Registered package managers, sorted
    pub fn package_managers(&self) -> Vec<&str> {
        self.doctors.keys().map(String::as_str).collect()
    }
}

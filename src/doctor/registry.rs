//! Source URL lookup against JSON package registries

use crate::config::schema::RegistryConfig;
use crate::error::LookupError;
use crate::http;
use serde_json::Value;
use tracing::debug;

/// A registry answering `GET <url>` with a JSON document that names the
/// package's source repository somewhere inside it
#[derive(Clone)]
pub struct JsonRegistry {
    url_template: String,
    source_fields: Vec<String>,
    agent: ureq::Agent,
}

impl JsonRegistry {
    pub fn new(config: &RegistryConfig, agent: ureq::Agent) -> Self {
        Self {
            url_template: config.url.clone(),
            source_fields: config.source_fields.clone(),
            agent,
        }
    }

    /// Metadata URL for a library
    pub fn package_url(&self, name: &str) -> String {
        self.url_template.replace("{name}", name)
    }

    /// Look up the source URL of `name`. Blocks on network I/O.
    ///
    /// Returns an empty string when the registry knows the package but lists
    /// no source location.
    pub fn lookup(&self, name: &str) -> Result<String, LookupError> {
        let url = self.package_url(name);
        debug!("GET {}", url);

        let mut response = self
            .agent
            .get(&url)
            .header("Accept", "application/json")
            .header("User-Agent", http::USER_AGENT)
            .call()
            .map_err(|e| LookupError::registry(name, http::describe_error(&e, &url)))?;

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| LookupError::registry(name, http::describe_error(&e, &url)))?;

        let document: Value = serde_json::from_str(&body)
            .map_err(|e| LookupError::registry(name, format!("invalid JSON from {}: {}", url, e)))?;

        Ok(self.extract(&document, name))
    }

    /// First non-empty string among the configured pointers
    fn extract(&self, document: &Value, name: &str) -> String {
        let escaped = escape_pointer_token(name);
        self.source_fields
            .iter()
            .filter_map(|field| document.pointer(&field.replace("{name}", &escaped)))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

/// Escape a value for use as one JSON pointer token (RFC 6901)
fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

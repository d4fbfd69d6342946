//! Shared HTTP client setup

use std::time::Duration;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("depdoc/", env!("CARGO_PKG_VERSION"));

/// Build the agent shared by registry lookups and repository queries.
///
/// Every request is bounded by `timeout`; a request that exceeds it fails
/// like any other transport error.
pub fn agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    ureq::Agent::new_with_config(config)
}

/// Describe a failed request for the report
pub fn describe_error(error: &ureq::Error, url: &str) -> String {
    match error {
        ureq::Error::StatusCode(code) => format!("Got status code: {} from {}", code, url),
        other => format!("{} ({})", other, url),
    }
}

//! CLI command implementations

pub mod cache;
pub mod config;
pub mod diagnose;
pub mod package_managers;

pub use cache::execute as cache;
pub use config::execute as config;
pub use diagnose::execute as diagnose;
pub use package_managers::execute as package_managers;

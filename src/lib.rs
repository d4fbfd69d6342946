//! depdoc - dependency maintenance diagnosis
//!
//! Finds where each declared library's source code lives and reports
//! libraries whose upstream repository is archived or inactive.

pub mod cache;
pub mod cli;
pub mod config;
pub mod diagnose;
pub mod doctor;
pub mod error;
pub mod github;
pub mod http;
pub mod library;
pub mod repo_url;
pub mod report;
pub mod ui;

pub use error::{DepdocError, DepdocResult};

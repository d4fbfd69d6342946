//! Terminal output helpers
//!
//! Detects interactive terminals and falls back to plain line output in
//! CI and pipes.

mod context;
mod progress;

pub use context::UiContext;
pub use progress::ResolveProgress;

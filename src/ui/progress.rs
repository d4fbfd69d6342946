//! Progress indicators with CI fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress of source URL resolution, one tick per library.
///
/// Shows an indicatif bar in interactive mode and one line per library on
/// stderr otherwise, so a JSON report on stdout stays clean. Cheap to clone
/// into worker tasks.
#[derive(Clone)]
pub struct ResolveProgress {
    bar: Option<ProgressBar>,
    plain: bool,
}

impl ResolveProgress {
    /// Create a progress indicator for `total` libraries
    pub fn new(ctx: &UiContext, total: usize) -> Self {
        if ctx.is_quiet() {
            return Self::hidden();
        }

        if ctx.use_fancy_output() {
            let bar = ProgressBar::new(total as u64);
            if let Ok(bar_style) = ProgressStyle::default_bar()
                .template("  {spinner:.cyan} Resolving  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}")
            {
                bar.set_style(bar_style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ").progress_chars("━╸─"));
            }
            bar.enable_steady_tick(Duration::from_millis(120));
            Self {
                bar: Some(bar),
                plain: false,
            }
        } else {
            Self {
                bar: None,
                plain: true,
            }
        }
    }

    /// No output at all
    pub fn hidden() -> Self {
        Self {
            bar: None,
            plain: false,
        }
    }

    /// A library's resolution is starting
    pub fn start(&self, name: &str, cached: bool) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
            bar.set_message(name.to_string());
        } else if self.plain {
            if cached {
                eprintln!("{} {}", name, style("(from source URL cache)").dim());
            } else {
                eprintln!("{}", name);
            }
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_non_interactive() {
        let ctx = UiContext::non_interactive();
        let progress = ResolveProgress::new(&ctx, 2);
        progress.start("thor", false);
        progress.start("faker", true);
        progress.finish();
        // Should not panic
    }

    #[test]
    fn progress_quiet_is_hidden() {
        let ctx = UiContext::non_interactive().with_quiet(true);
        let progress = ResolveProgress::new(&ctx, 1);
        assert!(progress.bar.is_none());
        assert!(!progress.plain);
    }
}

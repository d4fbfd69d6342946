//! Diagnose command - report unmaintained dependencies

use crate::cache::CacheStore;
use crate::cli::args::DiagnoseArgs;
use crate::config::{Config, ConfigManager};
use crate::diagnose::{DiagnoseOptions, Diagnoser};
use crate::doctor::Doctors;
use crate::error::{DepdocError, DepdocResult};
use crate::github::{GithubClient, GithubToken, RepositoryQuery};
use crate::http;
use crate::library::Library;
use crate::report::{self, ReportFormat, ReportSummary, Reporter};
use crate::ui::{ResolveProgress, UiContext};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

/// Execute the diagnose command
pub async fn execute(args: DiagnoseArgs, config: &Config) -> DepdocResult<ReportSummary> {
    // Fail fast before any registry traffic
    let token = GithubToken::resolve(&config.github).await?;

    let agent = http::agent(Duration::from_secs(config.diagnose.timeout_secs));
    let doctors = Doctors::from_config(config, agent.clone());
    let doctor = doctors.get(&args.package_manager)?;

    let input = fs::read_to_string(&args.file)
        .await
        .map_err(|source| DepdocError::DependencyFileRead {
            path: args.file.clone(),
            source,
        })?;
    let libraries = Library::unique_sorted(doctor.libraries(&input)?);
    info!(
        "Read {} libraries from {}",
        libraries.len(),
        args.file.display()
    );

    let options = options(&args, config);
    let strict = args.strict || config.diagnose.strict;

    let cache_path = ConfigManager::cache_path(config);
    let cache = if config.cache.enabled {
        CacheStore::load(&cache_path).await
    } else {
        CacheStore::default()
    };

    let query: Arc<dyn RepositoryQuery> =
        Arc::new(GithubClient::new(agent, config.github.api_url.clone(), token));
    // Machine-readable output runs silently
    let ctx = UiContext::detect().with_quiet(args.format == ReportFormat::Json);
    let progress = ResolveProgress::new(&ctx, libraries.len());
    let diagnoser = Diagnoser::new(doctor, query, options).with_progress(progress);

    let diagnoses = diagnoser
        .diagnose(&libraries, &cache.urls_for(&args.package_manager))
        .await;

    if config.cache.enabled {
        let mut rebuilt = cache.rebuild(&diagnoses, &args.package_manager);
        if config.cache.prune_missing {
            let declared: BTreeSet<String> = libraries.iter().map(|l| l.name.clone()).collect();
            rebuilt.retain_only(&args.package_manager, &declared);
        }
        if let Err(e) = rebuilt.persist(&cache_path).await {
            warn!("{}", e);
        }
    }

    let reporter = Reporter::new(&diagnoses, strict);
    match args.format {
        ReportFormat::Text => reporter.print(),
        ReportFormat::Json => println!("{}", report::to_json(&diagnoses)?),
    }

    Ok(reporter.summary())
}

/// Config values overridden by command line flags
fn options(args: &DiagnoseArgs, config: &Config) -> DiagnoseOptions {
    let mut options = DiagnoseOptions::from_config(&config.diagnose);
    if let Some(years) = args.years {
        options.years = years;
    }
    options.ignores.extend(
        args.ignores
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string),
    );
    options.skip_cache = args.disable_cache;
    options
}

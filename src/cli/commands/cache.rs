//! Cache command - inspect or reset the source URL cache

use crate::cache::CacheStore;
use crate::cli::args::{CacheAction, CacheArgs};
use crate::config::{Config, ConfigManager};
use crate::error::DepdocResult;
use console::style;
use std::path::Path;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> DepdocResult<()> {
    let path = ConfigManager::cache_path(config);

    match args.action {
        CacheAction::Path => println!("{}", path.display()),
        CacheAction::Show { package_manager } => show(&path, package_manager.as_deref()).await?,
        CacheAction::Clear => clear(&path).await?,
    }

    Ok(())
}

async fn show(path: &Path, package_manager: Option<&str>) -> DepdocResult<()> {
    let store = CacheStore::try_load(path).await?;

    if store.is_empty() {
        println!("No cached source URLs.");
        return Ok(());
    }

    let scopes = store
        .package_managers
        .iter()
        .filter(|entry| package_manager.map_or(true, |pm| entry.name == pm));

    for entry in scopes {
        println!("{}", style(&entry.name).bold().cyan());
        for repository in &entry.repositories {
            println!("  {:<32} {}", repository.name, style(&repository.source_url).dim());
        }
    }

    println!();
    println!("Total: {} source URL(s)", store.len());
    Ok(())
}

async fn clear(path: &Path) -> DepdocResult<()> {
    if CacheStore::clear(path).await? {
        println!("{} Removed {}", style("✓").green(), path.display());
    } else {
        println!("No cache file at {}", path.display());
    }
    Ok(())
}

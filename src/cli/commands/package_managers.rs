//! Package managers command - list configured registries

use crate::config::Config;
use crate::error::DepdocResult;
use console::style;

/// Execute the package-managers command
pub async fn execute(config: &Config) -> DepdocResult<()> {
    for (name, registry) in &config.registries.0 {
        println!("{:<10} {}", name, style(&registry.url).dim());
    }
    Ok(())
}

//! Installed command

use anyhow::{Context, Result};
use crossterm::style::Stylize;

use super::AppContext;

/// Report whether `version` is installed and where
pub async fn installed(ctx: &AppContext, version: &str) -> Result<()> {
    let found = ctx
        .inspector()
        .is_installed(version)
        .await
        .with_context(|| format!("Could not determine whether {version} is installed"))?;

    match found {
        Some(path) => println!("{} {version} at {}", "✓".green(), path.display()),
        None => println!("{} {version} is not installed", "✗".dark_grey()),
    }
    Ok(())
}

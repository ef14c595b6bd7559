//! Project command

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use enver_core::project;
use std::path::PathBuf;

use super::AppContext;

/// Show the version a project requires and whether it is installed
pub async fn project(ctx: &AppContext, path: Option<PathBuf>) -> Result<()> {
    let root = match path {
        Some(p) => p,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let required = project::read(&root)
        .with_context(|| format!("No project descriptor under {}", root.display()))?;

    let label_width = 12;
    println!("{:<label_width$}{}", "Version:", required.version.as_str().cyan());
    if let Some(changeset) = &required.changeset {
        println!("{:<label_width$}{}", "Changeset:", changeset.as_str().dark_grey());
    }

    match ctx.inspector().is_installed(&required.version).await {
        Ok(Some(path)) => println!("{:<label_width$}{}", "Installed:", path.display()),
        Ok(None) => println!("{:<label_width$}{}", "Installed:", "no".yellow()),
        Err(e) => println!("{:<label_width$}{} ({e})", "Installed:", "unknown".yellow()),
    }
    Ok(())
}

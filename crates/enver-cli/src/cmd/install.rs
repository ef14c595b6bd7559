//! Install command

use anyhow::{Context, Result, bail};
use crossterm::style::Stylize;
use enver_core::launcher::{HubLauncher, Launcher};

use super::AppContext;

/// Resolve an install request for `version` and hand it to the
/// distribution manager
pub async fn install(
    ctx: &AppContext,
    version: &str,
    modules: &[String],
    dry_run: bool,
) -> Result<()> {
    let mut resolver = ctx.resolver(dry_run)?;
    let catalog = resolver.resolve().await;

    if modules.is_empty() && catalog.find(version).is_some_and(|r| r.installed) {
        println!("{version} is already installed.");
        return Ok(());
    }

    let request = resolver
        .install_request(&catalog, version, modules)
        .with_context(|| format!("Cannot install {version}"))?;

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&request)?);
        return Ok(());
    }

    let Some(hub) = ctx.settings.hub_executable() else {
        bail!("Distribution manager not found; set ENVER_HUB_PATH or hub_path in config.toml");
    };

    println!(
        "{} {} ({})",
        "Installing".dark_grey(),
        request.version.as_str().cyan(),
        request.changeset
    );
    HubLauncher::new(hub)
        .launch(&request)
        .await
        .context("Installer failed")?;
    println!("{} Install handed to the distribution manager", "✓".green());
    Ok(())
}

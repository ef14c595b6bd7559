//! Modules command

use anyhow::{Context, Result, bail};
use crossterm::style::Stylize;

use super::AppContext;
use crate::ui::table;

/// Show the modules of `version`, or which of `missing` are not installed
pub async fn modules(ctx: &AppContext, version: &str, missing: Option<&[String]>) -> Result<()> {
    if let Some(requested) = missing {
        return report_missing(ctx, version, requested).await;
    }

    let catalog = ctx.catalog(false).await?;
    let Some(release) = catalog.find(version) else {
        bail!("Unknown version {version}");
    };
    if release.modules.is_empty() {
        println!("No module information for {version}.");
        return Ok(());
    }
    println!("{}", table::modules(release));
    Ok(())
}

async fn report_missing(ctx: &AppContext, version: &str, requested: &[String]) -> Result<()> {
    let inspector = ctx.inspector();
    let Some(path) = inspector
        .is_installed(version)
        .await
        .with_context(|| format!("Could not determine whether {version} is installed"))?
    else {
        bail!("{version} is not installed");
    };

    let missing = inspector.missing_modules(&path, requested);
    if missing.is_empty() {
        println!("{} all requested modules are installed", "✓".green());
    } else {
        for id in missing {
            println!("{id}");
        }
    }
    Ok(())
}

//! Cache management commands

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use enver_core::cache::CacheStore;

use crate::ui::theme::format_size;

/// Delete the catalog snapshot
pub fn clear() -> Result<()> {
    let store = CacheStore::open_default();
    store.clear().context("Failed to remove catalog cache")?;
    println!("{} Catalog cache cleared", "✓".green());
    Ok(())
}

/// Show the snapshot location, age and contents
pub fn info() -> Result<()> {
    let store = CacheStore::open_default();
    let label_width = 12;
    println!("{:<label_width$}{}", "Path:", store.path().display());

    let snapshot = match store.load() {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => {
            println!("{}", "No catalog cache".dark_grey());
            return Ok(());
        }
        Err(e) => {
            println!("{} {e}", "Unreadable:".yellow());
            return Ok(());
        }
    };

    let size = std::fs::metadata(store.path()).map(|m| m.len()).unwrap_or(0);
    println!(
        "{:<label_width$}{}",
        "Updated:",
        snapshot.updated_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!("{:<label_width$}{}", "Streams:", snapshot.streams.len());
    println!("{:<label_width$}{}", "Releases:", snapshot.releases.len());
    println!("{:<label_width$}{}", "Size:", format_size(size));
    Ok(())
}

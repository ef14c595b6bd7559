//! Command modules - one file per CLI command

pub mod cache;
pub mod changeset;
pub mod completions;
pub mod install;
pub mod installed;
pub mod latest;
pub mod list;
pub mod modules;
pub mod project;
pub mod streams;

use anyhow::{Context, Result};
use enver_core::install::InstallationInspector;
use enver_core::{Catalog, CatalogResolver, CatalogSource, NullReporter, Reporter, Settings};
use std::sync::Arc;

use crate::ui::ConsoleReporter;

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub settings: Settings,
}

impl AppContext {
    /// Load settings; `no_cache` turns off cache reads for this run.
    pub fn load(no_cache: bool) -> Result<Self> {
        let mut settings = Settings::load().context("Failed to load settings")?;
        if no_cache {
            settings.cache_reads = false;
        }
        Ok(Self { settings })
    }

    /// Resolver reporting progress to stderr unless `quiet`.
    pub fn resolver(&self, quiet: bool) -> Result<CatalogResolver> {
        let reporter: Arc<dyn Reporter> = if quiet {
            Arc::new(NullReporter)
        } else {
            Arc::new(ConsoleReporter::default())
        };
        Ok(CatalogResolver::from_settings(&self.settings)
            .context("Failed to set up the release API client")?
            .reporter(reporter))
    }

    /// Resolve the catalog once.
    pub async fn catalog(&self, quiet: bool) -> Result<Catalog> {
        let mut resolver = self.resolver(quiet)?;
        let catalog = resolver.resolve().await;
        if !quiet {
            note_source(&catalog);
        }
        Ok(catalog)
    }

    pub fn inspector(&self) -> InstallationInspector {
        InstallationInspector::from_settings(&self.settings)
    }
}

/// Tell the user when the catalog did not come from a fresh source.
fn note_source(catalog: &Catalog) {
    use crossterm::style::Stylize;

    match catalog.source {
        CatalogSource::Cache | CatalogSource::Remote => {}
        CatalogSource::StaleCache => eprintln!(
            "{}",
            "Release API unreachable; showing the last cached catalog".yellow()
        ),
        CatalogSource::LocalOnly => eprintln!(
            "{}",
            "Release API unreachable; showing the local manifest only".yellow()
        ),
    }
}

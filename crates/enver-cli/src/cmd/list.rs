//! List command

use anyhow::Result;
use chrono::{DateTime, Utc};
use enver_schema::{ReleaseRecord, StreamKind};
use serde::Serialize;
use std::path::Path;

use super::AppContext;
use crate::ui::table;

/// JSON shape of a listed release. Unlike the cached record it carries
/// install state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseView<'a> {
    version: &'a str,
    changeset: Option<&'a str>,
    stream: Option<StreamKind>,
    lts: bool,
    release_date: Option<DateTime<Utc>>,
    installed: bool,
    installed_path: Option<&'a Path>,
    modules: Vec<&'a str>,
}

impl<'a> From<&'a ReleaseRecord> for ReleaseView<'a> {
    fn from(r: &'a ReleaseRecord) -> Self {
        Self {
            version: &r.version,
            changeset: r.changeset.as_deref(),
            stream: r.stream,
            lts: r.is_lts,
            release_date: r.release_date,
            installed: r.installed,
            installed_path: r.installed_path.as_deref(),
            modules: r.modules.iter().map(|m| m.id.as_str()).collect(),
        }
    }
}

/// List releases, optionally restricted to one stream or to installed ones
pub async fn list(
    ctx: &AppContext,
    stream: Option<&str>,
    installed_only: bool,
    json: bool,
) -> Result<()> {
    let catalog = ctx.catalog(json).await?;

    let rows: Vec<&ReleaseRecord> = catalog
        .releases
        .iter()
        .filter(|r| stream.is_none_or(|mm| r.major_minor() == mm))
        .filter(|r| !installed_only || r.installed)
        .collect();

    if json {
        let views: Vec<ReleaseView<'_>> = rows.into_iter().map(ReleaseView::from).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No matching releases.");
        return Ok(());
    }

    println!("{}", table::releases(rows.iter().copied()));
    Ok(())
}

//! Latest command

use anyhow::Result;

use super::AppContext;
use crate::ui::table;

/// Newest release of every stream
pub async fn latest(ctx: &AppContext) -> Result<()> {
    let catalog = ctx.catalog(false).await?;
    let latest = catalog.latest_per_stream();
    if latest.is_empty() {
        println!("No releases known.");
        return Ok(());
    }
    println!("{}", table::releases(latest));
    Ok(())
}

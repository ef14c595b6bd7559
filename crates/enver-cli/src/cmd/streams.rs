//! Streams command

use anyhow::Result;

use super::AppContext;
use crate::ui::table;

/// List release streams that have at least one release
pub async fn streams(ctx: &AppContext) -> Result<()> {
    let catalog = ctx.catalog(false).await?;
    let visible: Vec<_> = catalog.visible_streams().collect();
    if visible.is_empty() {
        println!("No release streams available.");
        return Ok(());
    }
    println!("{}", table::streams(visible));
    Ok(())
}

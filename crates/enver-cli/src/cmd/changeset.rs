//! Changeset command

use anyhow::{Result, bail};

use super::AppContext;

/// Print the changeset of `version`
pub async fn changeset(ctx: &AppContext, version: &str) -> Result<()> {
    let mut resolver = ctx.resolver(true)?;
    match resolver.changeset_for(version).await? {
        Some(changeset) => {
            println!("{changeset}");
            Ok(())
        }
        None => bail!("No changeset known for {version}"),
    }
}

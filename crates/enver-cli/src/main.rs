//! enver - engine version catalog CLI

use anyhow::Result;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use enver_cli::cmd::{self, AppContext};
use enver_cli::{CacheCommands, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let mut filter = EnvFilter::from_default_env();
    if cli.verbose {
        filter = filter.add_directive(LevelFilter::DEBUG.into());
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let ctx = AppContext::load(cli.no_cache)?;

    match cli.command {
        Commands::List {
            stream,
            installed,
            json,
        } => cmd::list::list(&ctx, stream.as_deref(), installed, json).await,
        Commands::Streams => cmd::streams::streams(&ctx).await,
        Commands::Latest => cmd::latest::latest(&ctx).await,
        Commands::Installed { version } => cmd::installed::installed(&ctx, &version).await,
        Commands::Changeset { version } => cmd::changeset::changeset(&ctx, &version).await,
        Commands::Modules { version, missing } => {
            cmd::modules::modules(&ctx, &version, missing.as_deref()).await
        }
        Commands::Install {
            version,
            modules,
            dry_run,
        } => cmd::install::install(&ctx, &version, &modules, dry_run).await,
        Commands::Project { path } => cmd::project::project(&ctx, path).await,
        Commands::Cache { command } => match command {
            CacheCommands::Clear => cmd::cache::clear(),
            CacheCommands::Info => cmd::cache::info(),
        },
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
    }
}

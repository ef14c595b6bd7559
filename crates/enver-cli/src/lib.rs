//! enver - engine version catalog
//!
//! Lists every installable engine version, tells which ones are installed
//! locally and which modules they are missing, and hands install requests
//! to the distribution manager.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.enver/
//! ├── cache/
//! │   └── releases.json   # Catalog snapshot
//! └── config.toml         # Optional settings
//! ```

#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub mod cmd;
pub mod ui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "enver")]
#[command(author, version, about = "enver - engine version catalog")]
pub struct Cli {
    /// Ignore the catalog cache for this run (it is still rewritten)
    #[arg(
        long,
        global = true,
        env = "ENVER_NO_CACHE",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub no_cache: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List known releases
    List {
        /// Only releases of one major.minor line (e.g. 2022.3)
        #[arg(long)]
        stream: Option<String>,
        /// Only installed releases
        #[arg(long)]
        installed: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List release streams with their release counts
    Streams,
    /// Newest release of every stream
    Latest,
    /// Check whether a version is installed
    Installed {
        /// Version, e.g. 2022.3.60f1
        version: String,
    },
    /// Print the changeset of a version
    Changeset {
        /// Version, e.g. 2022.3.60f1
        version: String,
    },
    /// Show the modules of a version
    Modules {
        /// Version, e.g. 2022.3.60f1
        version: String,
        /// Only report which of these module ids are not installed
        #[arg(long, num_args = 1..)]
        missing: Option<Vec<String>>,
    },
    /// Install a version through the distribution manager
    Install {
        /// Version, e.g. 2022.3.60f1
        version: String,
        /// Module ids to install alongside
        #[arg(short, long = "module")]
        modules: Vec<String>,
        /// Print the install request instead of launching it
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the version a project requires and whether it is installed
    Project {
        /// Project root (defaults to the current directory)
        path: Option<PathBuf>,
    },
    /// Manage the catalog cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Delete the catalog snapshot
    Clear,
    /// Show where the snapshot lives and what it holds
    Info,
}

pub mod cache;
pub mod changeset;
pub mod config;
pub mod discovery;
pub mod error;
pub mod install;
pub mod launcher;
pub mod manifest;
pub mod merge;
pub mod paths;
pub mod project;
pub mod remote;
pub mod resolver;

pub mod reporter;

pub use config::Settings;
pub use error::{CatalogError, Result};
pub use paths::*;
pub use reporter::{NullReporter, Reporter};
pub use resolver::{Catalog, CatalogResolver, CatalogSource};

/// User Agent string for release API requests
pub const USER_AGENT: &str = concat!("enver/", env!("CARGO_PKG_VERSION"));

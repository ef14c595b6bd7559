//! Runtime settings
//!
//! Defaults, overlaid by `$ENVER_HOME/config.toml`, overlaid by environment
//! variables.

use enver_schema::{Arch, Platform};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CatalogError, Result};
use crate::paths;

/// Default GraphQL endpoint serving release metadata.
pub const DEFAULT_API_URL: &str = "https://services.unity.com/graphql";

/// Overrides [`Settings::api_url`].
pub const API_URL_ENV: &str = "ENVER_API_URL";
/// Overrides [`Settings::hub_path`].
pub const HUB_PATH_ENV: &str = "ENVER_HUB_PATH";
/// Overrides [`Settings::manifest_path`].
pub const MANIFEST_ENV: &str = "ENVER_MANIFEST";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Release API endpoint.
    pub api_url: String,
    /// Timeout for per-stream metadata probes.
    pub metadata_timeout_secs: u64,
    /// Timeout for the bulk release fetch.
    pub batch_timeout_secs: u64,
    /// Maximum releases requested per stream in the bulk fetch.
    pub releases_per_stream: u32,
    /// Distribution manager executable used for registry queries and installs.
    pub hub_path: Option<PathBuf>,
    /// Base directory engine versions are installed into.
    pub install_dir: Option<PathBuf>,
    /// Distribution manager's local release manifest.
    pub manifest_path: Option<PathBuf>,
    /// Whether the catalog cache may be read. Writes always happen.
    pub cache_reads: bool,
    /// How long resolved changesets stay valid in memory.
    pub changeset_ttl_secs: u64,
    pub platform: Platform,
    pub arch: Arch,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            metadata_timeout_secs: 10,
            batch_timeout_secs: 60,
            releases_per_stream: 200,
            hub_path: None,
            install_dir: None,
            manifest_path: None,
            cache_reads: true,
            changeset_ttl_secs: 15 * 60,
            platform: Platform::current(),
            arch: Arch::current(),
        }
    }
}

/// Boolean environment flag; accepts the same spellings as the CLI.
fn flag_set(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off" | "n" | "f"
    )
}

impl Settings {
    /// Load settings from the config file (if present) and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Config`] if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let mut settings = Self::from_file(&paths::config_path())?;
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Read a TOML settings file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Parse settings from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Config`] on malformed TOML.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CatalogError::Config(e.to_string()))
    }

    /// Overlay environment variables, read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(url) = non_empty(API_URL_ENV) {
            self.api_url = url;
        }
        if let Some(hub) = non_empty(HUB_PATH_ENV) {
            self.hub_path = Some(PathBuf::from(hub));
        }
        if let Some(dir) = non_empty(paths::INSTALL_DIR_ENV) {
            self.install_dir = Some(PathBuf::from(dir));
        }
        if let Some(manifest) = non_empty(MANIFEST_ENV) {
            self.manifest_path = Some(PathBuf::from(manifest));
        }
        if non_empty(paths::NO_CACHE_ENV).is_some_and(|flag| flag_set(&flag)) {
            self.cache_reads = false;
        }
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }

    pub fn changeset_ttl(&self) -> Duration {
        Duration::from_secs(self.changeset_ttl_secs)
    }

    /// Base install directory: explicit override, else the platform default.
    pub fn install_base(&self) -> Option<PathBuf> {
        self.install_dir
            .clone()
            .or_else(|| paths::default_install_base(self.platform))
    }

    /// Local manifest path: explicit override, else the platform default.
    pub fn manifest(&self) -> Option<PathBuf> {
        self.manifest_path
            .clone()
            .or_else(paths::default_manifest_path)
    }

    /// Locate the distribution manager executable.
    pub fn hub_executable(&self) -> Option<PathBuf> {
        if let Some(path) = &self.hub_path {
            return Some(path.clone());
        }
        if let Ok(found) = which::which("unityhub") {
            return Some(found);
        }
        let fallback = match self.platform {
            Platform::Windows => PathBuf::from(r"C:\Program Files\Unity Hub\Unity Hub.exe"),
            Platform::MacOs => {
                PathBuf::from("/Applications/Unity Hub.app/Contents/MacOS/Unity Hub")
            }
            Platform::Linux => return None,
        };
        fallback.exists().then_some(fallback)
    }
}

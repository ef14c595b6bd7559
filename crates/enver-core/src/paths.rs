use dirs::home_dir;
use enver_schema::Platform;
use std::path::{Path, PathBuf};

/// Overrides the state directory (`~/.enver`).
pub const HOME_ENV: &str = "ENVER_HOME";
/// Forces a custom base install directory for engine versions.
pub const INSTALL_DIR_ENV: &str = "ENVER_INSTALL_DIR";
/// Disables cache reads for one invocation. Writes still happen.
pub const NO_CACHE_ENV: &str = "ENVER_NO_CACHE";

/// Returns the primary state directory, or None if the user's home cannot be resolved.
pub fn try_enver_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var(HOME_ENV) {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".enver"))
}

/// Returns the enver state directory (`~/.enver`), falling back to a
/// relative `.enver` when no home directory exists.
pub fn enver_home() -> PathBuf {
    try_enver_home().unwrap_or_else(|| PathBuf::from(".enver"))
}

/// Cache directory: ~/.enver/cache
pub fn cache_dir() -> PathBuf {
    enver_home().join("cache")
}

/// Catalog snapshot: ~/.enver/cache/releases.json
pub fn catalog_cache_path() -> PathBuf {
    cache_dir().join("releases.json")
}

/// Optional settings file: ~/.enver/config.toml
pub fn config_path() -> PathBuf {
    enver_home().join("config.toml")
}

/// Default directory the distribution manager installs engine versions into.
pub fn default_install_base(platform: Platform) -> Option<PathBuf> {
    match platform {
        Platform::Windows => Some(PathBuf::from(r"C:\Program Files\Unity\Hub\Editor")),
        Platform::MacOs => Some(PathBuf::from("/Applications/Unity/Hub/Editor")),
        Platform::Linux => home_dir().map(|h| h.join("Unity").join("Hub").join("Editor")),
    }
}

/// Executable location relative to a version's install directory.
pub fn editor_executable(platform: Platform) -> &'static str {
    match platform {
        Platform::Windows => "Editor/Unity.exe",
        Platform::MacOs => "Unity.app/Contents/MacOS/Unity",
        Platform::Linux => "Editor/Unity",
    }
}

/// Directory module payloads are installed under, relative to a version's
/// install directory.
pub fn playback_engines_dir(platform: Platform) -> &'static str {
    match platform {
        Platform::MacOs => "PlaybackEngines",
        Platform::Windows | Platform::Linux => "Editor/Data/PlaybackEngines",
    }
}

/// Local manifest written by the distribution manager.
///
/// `dirs::config_dir()` resolves to `%APPDATA%`, `~/Library/Application Support`
/// or `~/.config` depending on the host.
pub fn default_manifest_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("UnityHub").join("releases.json"))
}

/// Expected executable for `version` under `base`.
pub fn executable_under(base: &Path, version: &str, platform: Platform) -> PathBuf {
    base.join(version).join(editor_executable(platform))
}

//! Local installation state
//!
//! Two tiers answer "is this version installed": a filesystem probe of the
//! base install directory, and the distribution manager's own registry of
//! editors (which also knows about installs in custom locations).

use async_trait::async_trait;
use enver_schema::{Platform, ReleaseRecord};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::config::Settings;
use crate::error::{CatalogError, Result};
use crate::paths;

/// An installed engine version as reported by a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledEditor {
    pub version: String,
    /// Install directory of the version (not the executable).
    pub path: PathBuf,
}

/// Best-effort enumeration of installed engine versions.
#[async_trait]
pub trait InstallRegistry: Send + Sync {
    async fn installed_editors(&self) -> Result<Vec<InstalledEditor>>;
}

/// Registry backed by the distribution manager's headless CLI.
#[derive(Debug, Clone)]
pub struct HubRegistry {
    executable: PathBuf,
    timeout: Duration,
}

impl HubRegistry {
    pub fn new(executable: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            timeout,
        }
    }

    /// Registry for the configured hub executable, if one can be located.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        settings
            .hub_executable()
            .map(|exe| Self::new(exe, settings.metadata_timeout()))
    }
}

#[async_trait]
impl InstallRegistry for HubRegistry {
    async fn installed_editors(&self) -> Result<Vec<InstalledEditor>> {
        let mut cmd = Command::new(&self.executable);
        cmd.args(["--", "--headless", "editors", "-i"]).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| CatalogError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| {
                CatalogError::Registry(format!("failed to run {}: {e}", self.executable.display()))
            })?;

        if !output.status.success() {
            return Err(CatalogError::Registry(format!(
                "{} exited with {}",
                self.executable.display(),
                output.status
            )));
        }

        let editors = parse_editor_list(&String::from_utf8_lossy(&output.stdout));
        debug!(count = editors.len(), "registry listed installed editors");
        Ok(editors)
    }
}

/// Fixed list of editors. Used when no distribution manager is available.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    editors: Vec<InstalledEditor>,
}

impl StaticRegistry {
    pub fn new(editors: Vec<InstalledEditor>) -> Self {
        Self { editors }
    }
}

#[async_trait]
impl InstallRegistry for StaticRegistry {
    async fn installed_editors(&self) -> Result<Vec<InstalledEditor>> {
        Ok(self.editors.clone())
    }
}

/// Parse the headless editor listing.
///
/// Lines look like `2022.3.60f1 , installed at /path/to/executable`, with an
/// optional architecture note after the version.
pub fn parse_editor_list(output: &str) -> Vec<InstalledEditor> {
    output
        .lines()
        .filter_map(|line| {
            let (head, location) = line.split_once(", installed at")?;
            let version = head.split_whitespace().next()?.to_string();
            let location = PathBuf::from(location.trim());
            if location.as_os_str().is_empty() {
                return None;
            }
            let path = install_root(&location, &version);
            Some(InstalledEditor { version, path })
        })
        .collect()
}

/// Walk up from an executable path to the directory named after the version.
fn install_root(location: &Path, version: &str) -> PathBuf {
    location
        .ancestors()
        .find(|p| p.file_name().is_some_and(|n| n == version))
        .or_else(|| location.parent())
        .unwrap_or(location)
        .to_path_buf()
}

/// Module payload directory relative to a version's install directory.
fn module_dir(id: &str, platform: Platform) -> Option<PathBuf> {
    let engine = match id {
        "android" => "AndroidPlayer",
        "ios" => "iOSSupport",
        "appletv" => "AppleTVSupport",
        "visionos" => "VisionOSPlayer",
        "webgl" => "WebGLSupport",
        "universal-windows-platform" => "MetroSupport",
        "windows-il2cpp" | "windows-mono" | "windows-server" => "WindowsStandaloneSupport",
        "mac-il2cpp" | "mac-mono" | "mac-server" => "MacStandaloneSupport",
        "linux-il2cpp" | "linux-mono" | "linux-server" => "LinuxStandaloneSupport",
        "documentation" => {
            return Some(match platform {
                Platform::MacOs => PathBuf::from("Documentation"),
                Platform::Windows | Platform::Linux => PathBuf::from("Editor/Data/Documentation"),
            });
        }
        _ => return None,
    };
    Some(Path::new(paths::playback_engines_dir(platform)).join(engine))
}

/// Answers install-state questions for one platform.
#[derive(Clone)]
pub struct InstallationInspector {
    base_dir: Option<PathBuf>,
    platform: Platform,
    registry: Arc<dyn InstallRegistry>,
}

impl InstallationInspector {
    pub fn new(
        base_dir: Option<PathBuf>,
        platform: Platform,
        registry: Arc<dyn InstallRegistry>,
    ) -> Self {
        Self {
            base_dir,
            platform,
            registry,
        }
    }

    /// Inspector using the configured install base and the hub registry
    /// when a hub executable can be found.
    pub fn from_settings(settings: &Settings) -> Self {
        let registry: Arc<dyn InstallRegistry> = match HubRegistry::from_settings(settings) {
            Some(hub) => Arc::new(hub),
            None => Arc::new(StaticRegistry::default()),
        };
        Self::new(settings.install_base(), settings.platform, registry)
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    fn probe(&self, version: &str) -> Option<PathBuf> {
        let base = self.base_dir.as_deref()?;
        paths::executable_under(base, version, self.platform)
            .exists()
            .then(|| base.join(version))
    }

    /// Versions installed under the base directory.
    fn scan_base(&self) -> HashMap<String, PathBuf> {
        let mut found = HashMap::new();
        let Some(base) = self.base_dir.as_deref() else {
            return found;
        };
        let Ok(entries) = std::fs::read_dir(base) else {
            return found;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if paths::executable_under(base, &name, self.platform).exists() {
                found.insert(name, entry.path());
            }
        }
        found
    }

    /// Mark every record (and its modules) with the current install state.
    ///
    /// The registry is queried once. A registry failure leaves only the
    /// filesystem tier.
    pub async fn enrich(&self, records: &mut [ReleaseRecord]) {
        let mut installed = match self.registry.installed_editors().await {
            Ok(editors) => editors
                .into_iter()
                .map(|e| (e.version, e.path))
                .collect::<HashMap<_, _>>(),
            Err(e) => {
                debug!("install registry unavailable: {e}");
                HashMap::new()
            }
        };
        for (version, path) in self.scan_base() {
            installed.entry(version).or_insert(path);
        }

        for record in records.iter_mut() {
            match installed.get(&record.version) {
                Some(path) => {
                    let ids: Vec<&str> = record.modules.iter().map(|m| m.id.as_str()).collect();
                    let missing = self.missing_modules(path, &ids);
                    for module in &mut record.modules {
                        module.installed = !missing.contains(&module.id);
                    }
                    record.installed = true;
                    record.installed_path = Some(path.clone());
                }
                None => {
                    record.installed = false;
                    record.installed_path = None;
                    for module in &mut record.modules {
                        module.installed = false;
                    }
                }
            }
        }
    }

    /// Install directory of `version`, if installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the filesystem probe misses and the registry
    /// cannot be queried, since "not installed" cannot be confirmed.
    pub async fn is_installed(&self, version: &str) -> Result<Option<PathBuf>> {
        if let Some(path) = self.probe(version) {
            return Ok(Some(path));
        }
        let editors = self.registry.installed_editors().await?;
        Ok(editors
            .into_iter()
            .find(|e| e.version == version)
            .map(|e| e.path))
    }

    /// Requested module ids not present under `install_path`, in request order.
    /// Ids with no known install location are always reported missing.
    pub fn missing_modules<S: AsRef<str>>(
        &self,
        install_path: &Path,
        requested: &[S],
    ) -> Vec<String> {
        requested
            .iter()
            .map(AsRef::as_ref)
            .filter(|id| match module_dir(id, self.platform) {
                Some(dir) => !install_path.join(dir).is_dir(),
                None => true,
            })
            .map(str::to_string)
            .collect()
    }
}

impl std::fmt::Debug for InstallationInspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallationInspector")
            .field("base_dir", &self.base_dir)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enver_schema::{ModuleCategory, ModuleRecord};
    use std::fs;

    struct FailingRegistry;

    #[async_trait]
    impl InstallRegistry for FailingRegistry {
        async fn installed_editors(&self) -> Result<Vec<InstalledEditor>> {
            Err(CatalogError::Registry("hub not running".into()))
        }
    }

    fn install_fake(base: &Path, version: &str, modules: &[&str]) -> PathBuf {
        let root = base.join(version);
        fs::create_dir_all(root.join("Editor")).unwrap();
        fs::write(root.join("Editor/Unity"), b"").unwrap();
        for m in modules {
            fs::create_dir_all(root.join("Editor/Data/PlaybackEngines").join(m)).unwrap();
        }
        root
    }

    fn module(id: &str) -> ModuleRecord {
        ModuleRecord {
            id: id.to_string(),
            name: id.to_string(),
            description: None,
            category: ModuleCategory::Platform,
            hidden: false,
            download_size: 0,
            installed_size: 0,
            installed: false,
        }
    }

    fn inspector(base: &Path, registry: Arc<dyn InstallRegistry>) -> InstallationInspector {
        InstallationInspector::new(Some(base.to_path_buf()), Platform::Linux, registry)
    }

    #[test]
    fn test_parse_editor_list() {
        let out = "2022.3.60f1 , installed at /opt/Unity/Hub/Editor/2022.3.60f1/Editor/Unity\n\
                   6000.0.40f1 (Apple silicon) , installed at /Applications/Unity/Hub/Editor/6000.0.40f1/Unity.app\n\
                   garbage line\n";
        let editors = parse_editor_list(out);
        assert_eq!(editors.len(), 2);
        assert_eq!(editors[0].version, "2022.3.60f1");
        assert_eq!(editors[0].path, PathBuf::from("/opt/Unity/Hub/Editor/2022.3.60f1"));
        assert_eq!(editors[1].version, "6000.0.40f1");
        assert_eq!(
            editors[1].path,
            PathBuf::from("/Applications/Unity/Hub/Editor/6000.0.40f1")
        );
    }

    #[test]
    fn test_missing_modules_nonexistent_path() {
        let dir = tempfile::tempdir().unwrap();
        let inspector = inspector(dir.path(), Arc::new(StaticRegistry::default()));
        let missing = inspector.missing_modules(&dir.path().join("nope"), &["android", "ios"]);
        assert_eq!(missing, vec!["android", "ios"]);
    }

    #[test]
    fn test_missing_modules_empty_request() {
        let dir = tempfile::tempdir().unwrap();
        let inspector = inspector(dir.path(), Arc::new(StaticRegistry::default()));
        let none: [&str; 0] = [];
        assert!(inspector.missing_modules(dir.path(), &none).is_empty());
    }

    #[test]
    fn test_missing_modules_partial_and_unmapped() {
        let dir = tempfile::tempdir().unwrap();
        let root = install_fake(dir.path(), "2022.3.60f1", &["AndroidPlayer"]);
        let inspector = inspector(dir.path(), Arc::new(StaticRegistry::default()));
        let missing = inspector.missing_modules(&root, &["android", "webgl", "visualstudio"]);
        assert_eq!(missing, vec!["webgl", "visualstudio"]);
    }

    #[tokio::test]
    async fn test_is_installed_fast_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = install_fake(dir.path(), "2022.3.60f1", &[]);
        let inspector = inspector(dir.path(), Arc::new(FailingRegistry));
        assert_eq!(inspector.is_installed("2022.3.60f1").await.unwrap(), Some(root));
    }

    #[tokio::test]
    async fn test_is_installed_registry_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let custom = PathBuf::from("/custom/6000.0.40f1");
        let registry = StaticRegistry::new(vec![InstalledEditor {
            version: "6000.0.40f1".into(),
            path: custom.clone(),
        }]);
        let inspector = inspector(dir.path(), Arc::new(registry));
        assert_eq!(inspector.is_installed("6000.0.40f1").await.unwrap(), Some(custom));
        assert_eq!(inspector.is_installed("2021.3.1f1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_is_installed_unconfirmed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let inspector = inspector(dir.path(), Arc::new(FailingRegistry));
        assert!(inspector.is_installed("2022.3.60f1").await.is_err());
    }

    #[tokio::test]
    async fn test_enrich_marks_versions_and_modules() {
        let dir = tempfile::tempdir().unwrap();
        let root = install_fake(dir.path(), "2022.3.60f1", &["AndroidPlayer"]);
        let inspector = inspector(dir.path(), Arc::new(FailingRegistry));

        let mut installed = ReleaseRecord::new("2022.3.60f1");
        installed.modules = vec![module("android"), module("ios")];
        let mut records = vec![installed, ReleaseRecord::new("6000.0.40f1")];
        records[1].installed = true;

        inspector.enrich(&mut records).await;

        assert!(records[0].installed);
        assert_eq!(records[0].installed_path.as_deref(), Some(root.as_path()));
        assert!(records[0].modules[0].installed);
        assert!(!records[0].modules[1].installed);
        assert!(!records[1].installed);
        assert!(records[1].installed_path.is_none());
    }
}

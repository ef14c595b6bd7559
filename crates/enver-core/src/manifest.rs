//! Distribution manager's local release manifest.
//!
//! The manager keeps a `releases.json` with two arrays, `official` and
//! `beta`. Entries carry a download URL whose path embeds the changeset,
//! which is the only place the manifest exposes it.

use enver_schema::{Arch, ModuleCategory, ModuleRecord, ReleaseRecord, StreamKind};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::Settings;
use crate::error::{CatalogError, Result};

static CHANGESET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/([0-9a-fA-F]{12})(?:/|$)").expect("changeset pattern is valid")
});

#[derive(Debug, Default, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    official: Vec<ManifestEntry>,
    #[serde(default)]
    beta: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestEntry {
    version: String,
    #[serde(default)]
    lts: bool,
    #[serde(default)]
    download_url: String,
    #[serde(default, alias = "architecture")]
    arch: Option<String>,
    #[serde(default)]
    download_size: Option<i64>,
    #[serde(default)]
    installed_size: Option<i64>,
    #[serde(default)]
    modules: Vec<ManifestModule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestModule {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: String,
    #[serde(default = "default_visible")]
    visible: bool,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    download_size: i64,
    #[serde(default)]
    installed_size: i64,
}

fn default_visible() -> bool {
    true
}

/// Extract the changeset from a download URL such as
/// `https://download.unity3d.com/download_unity/b2e806cf271c/Windows64EditorInstaller/UnitySetup64.exe`.
pub fn changeset_from_url(url: &str) -> Option<String> {
    CHANGESET_RE
        .captures(url)
        .map(|c| c[1].to_ascii_lowercase())
}

fn category_from_label(label: &str) -> ModuleCategory {
    let label = label.to_ascii_lowercase();
    if label.contains("platform") {
        ModuleCategory::Platform
    } else if label.contains("language") {
        ModuleCategory::LanguagePack
    } else if label.contains("doc") {
        ModuleCategory::Documentation
    } else {
        ModuleCategory::DevTool
    }
}

impl ManifestEntry {
    fn matches_arch(&self, arch: Arch) -> bool {
        match self.arch.as_deref() {
            None | Some("") => true,
            Some(raw) => raw.parse::<Arch>().is_ok_and(|a| a == arch),
        }
    }

    fn into_record(self, stream: Option<StreamKind>) -> ReleaseRecord {
        let modules = self
            .modules
            .into_iter()
            .map(|m| ModuleRecord {
                category: category_from_label(&m.category),
                hidden: m.hidden || !m.visible,
                id: m.id,
                name: m.name,
                description: m.description.filter(|d| !d.is_empty()),
                download_size: m.download_size,
                installed_size: m.installed_size,
                installed: false,
            })
            .collect();

        ReleaseRecord {
            changeset: changeset_from_url(&self.download_url),
            stream: stream.or(self.lts.then_some(StreamKind::Lts)),
            is_lts: self.lts,
            download_size: self.download_size,
            installed_size: self.installed_size,
            modules,
            ..ReleaseRecord::new(self.version)
        }
    }
}

/// Parse manifest content into release records for `arch`.
///
/// # Errors
///
/// Returns [`CatalogError::Manifest`] if the content is not a valid manifest.
pub fn parse(content: &str, arch: Arch, path: &Path) -> Result<Vec<ReleaseRecord>> {
    let file: ManifestFile = serde_json::from_str(content).map_err(|e| CatalogError::Manifest {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let official = file
        .official
        .into_iter()
        .filter(|e| e.matches_arch(arch))
        .map(|e| e.into_record(None));
    let beta = file
        .beta
        .into_iter()
        .filter(|e| e.matches_arch(arch))
        .map(|e| e.into_record(Some(StreamKind::Beta)));

    Ok(official.chain(beta).collect())
}

/// Reader for the local manifest file.
#[derive(Debug, Clone)]
pub struct LocalManifest {
    path: Option<PathBuf>,
    arch: Arch,
}

impl LocalManifest {
    pub fn new(path: Option<PathBuf>, arch: Arch) -> Self {
        Self { path, arch }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.manifest(), settings.arch)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load every release listed in the manifest. A missing file (or no
    /// known location) yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<Vec<ReleaseRecord>> {
        let Some(path) = &self.path else {
            return Ok(Vec::new());
        };
        let content = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no local manifest");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        let records = parse(&content, self.arch, path)?;
        debug!(releases = records.len(), "loaded local manifest");
        Ok(records)
    }

    /// Handle that reads the file once, however many steps of a pass ask.
    pub fn shared(&self) -> SharedManifest {
        SharedManifest {
            manifest: self.clone(),
            records: Arc::new(OnceCell::new()),
        }
    }
}

/// Manifest records shared by the steps of one resolution pass.
///
/// Clones share the same records. An unreadable manifest is logged and
/// treated as empty.
#[derive(Debug, Clone)]
pub struct SharedManifest {
    manifest: LocalManifest,
    records: Arc<OnceCell<Vec<ReleaseRecord>>>,
}

impl SharedManifest {
    pub async fn records(&self) -> &[ReleaseRecord] {
        self.records
            .get_or_init(|| async {
                self.manifest.load().await.unwrap_or_else(|e| {
                    debug!("local manifest unavailable: {e}");
                    Vec::new()
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "official": [
            {
                "version": "2022.3.60f1",
                "lts": true,
                "downloadUrl": "https://download.unity3d.com/download_unity/b2e806cf271c/Windows64EditorInstaller/UnitySetup64-2022.3.60f1.exe",
                "arch": "x86_64",
                "modules": [
                    {"id": "android", "name": "Android Build Support", "category": "Platforms", "visible": true},
                    {"id": "android-open-jdk", "name": "OpenJDK", "category": "Platforms", "visible": false}
                ]
            },
            {
                "version": "2022.3.60f1",
                "lts": true,
                "downloadUrl": "https://download.unity3d.com/download_unity/b2e806cf271c/MacEditorInstallerArm64/Unity.pkg",
                "arch": "arm64",
                "modules": []
            }
        ],
        "beta": [
            {
                "version": "6000.4.0b6",
                "downloadUrl": "https://beta.unity3d.com/download/0123456789ab/UnityDownloadAssistant.exe",
                "modules": [{"id": "ja", "name": "日本語", "category": "Language packs (Preview)"}]
            }
        ]
    }"#;

    #[test]
    fn test_changeset_from_url() {
        assert_eq!(
            changeset_from_url(
                "https://download.unity3d.com/download_unity/b2e806cf271c/Windows64EditorInstaller/UnitySetup64.exe"
            )
            .as_deref(),
            Some("b2e806cf271c")
        );
        assert_eq!(
            changeset_from_url("https://beta.unity3d.com/download/0123456789AB").as_deref(),
            Some("0123456789ab")
        );
        assert_eq!(changeset_from_url("https://example.com/no/changeset/here"), None);
        assert_eq!(changeset_from_url(""), None);
    }

    #[test]
    fn test_parse_filters_by_arch() {
        let records = parse(MANIFEST, Arch::X86_64, Path::new("releases.json")).unwrap();
        assert_eq!(records.len(), 2);

        let lts = &records[0];
        assert_eq!(lts.version, "2022.3.60f1");
        assert!(lts.is_lts);
        assert_eq!(lts.stream, Some(StreamKind::Lts));
        assert_eq!(lts.changeset.as_deref(), Some("b2e806cf271c"));
        assert_eq!(lts.modules.len(), 2);
        assert!(lts.modules[1].hidden);
        assert_eq!(lts.modules[0].category, ModuleCategory::Platform);

        let beta = &records[1];
        assert_eq!(beta.stream, Some(StreamKind::Beta));
        assert_eq!(beta.modules[0].category, ModuleCategory::LanguagePack);
    }

    #[test]
    fn test_parse_arm64_variant() {
        let records = parse(MANIFEST, Arch::Arm64, Path::new("releases.json")).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].modules.is_empty());
    }

    #[test]
    fn test_invalid_manifest_is_error() {
        let err = parse("[1, 2", Arch::X86_64, Path::new("releases.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Manifest { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = LocalManifest::new(Some(dir.path().join("releases.json")), Arch::X86_64);
        assert!(manifest.load().await.unwrap().is_empty());
        assert!(LocalManifest::new(None, Arch::X86_64).load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("releases.json");
        std::fs::write(&path, MANIFEST).unwrap();
        let records = LocalManifest::new(Some(path), Arch::X86_64).load().await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_shared_manifest_reads_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("releases.json");
        std::fs::write(&path, MANIFEST).unwrap();

        let shared = LocalManifest::new(Some(path.clone()), Arch::X86_64).shared();
        let other = shared.clone();
        assert_eq!(shared.records().await.len(), 2);

        std::fs::remove_file(&path).unwrap();
        assert_eq!(other.records().await.len(), 2);
    }

    #[tokio::test]
    async fn test_shared_manifest_invalid_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("releases.json");
        std::fs::write(&path, "{ broken").unwrap();
        let shared = LocalManifest::new(Some(path), Arch::X86_64).shared();
        assert!(shared.records().await.is_empty());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::version::{VersionId, major_minor};

/// Release line a version was published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StreamKind {
    /// Long-term support line.
    Lts,
    /// Rolling tech stream.
    Tech,
    /// Alpha and beta pre-releases.
    Beta,
    /// Supported (non-LTS) updates.
    Supported,
}

impl StreamKind {
    /// Every channel the release API can be queried for.
    pub const ALL: [Self; 4] = [Self::Lts, Self::Tech, Self::Beta, Self::Supported];

    /// Name used by the release API.
    pub fn api_name(self) -> &'static str {
        match self {
            Self::Lts => "LTS",
            Self::Tech => "TECH",
            Self::Beta => "BETA",
            Self::Supported => "SUPPORTED",
        }
    }
}

/// What kind of component a module installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModuleCategory {
    /// Build target support (Android, iOS, WebGL, ...)
    #[default]
    Platform,
    /// IDEs and developer tooling
    DevTool,
    /// Editor localisation
    LanguagePack,
    /// Offline documentation
    Documentation,
}

/// An optional installable component of a release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    /// Identifier, unique within a release (e.g. `android`).
    pub id: String,
    /// Human readable name.
    pub name: String,
    /// Optional long description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Module category.
    #[serde(default)]
    pub category: ModuleCategory,
    /// Hidden modules are pulled in as dependencies and never offered.
    #[serde(default)]
    pub hidden: bool,
    /// Download size in bytes.
    #[serde(default)]
    pub download_size: i64,
    /// Size on disk after install, in bytes.
    #[serde(default)]
    pub installed_size: i64,
    /// Whether the module is present on disk. Never persisted.
    #[serde(skip)]
    pub installed: bool,
}

impl ModuleRecord {
    /// Whether a user may pick this module for installation.
    pub fn is_selectable(&self) -> bool {
        self.category == ModuleCategory::Platform && !self.hidden
    }
}

/// One concrete installable engine version.
///
/// `version` is the identity key. Install state (`installed`,
/// `installed_path`) is computed on every pass and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRecord {
    /// Canonical version string, e.g. `2022.3.60f1`.
    pub version: String,
    /// Revision identifier the version was built from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changeset: Option<String>,
    /// Release line the version was published under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<StreamKind>,
    #[serde(default)]
    pub is_lts: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recommended: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_notes_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_size: Option<i64>,
    /// Security advisory label attached to the release, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_alert: Option<String>,
    #[serde(default)]
    pub modules: Vec<ModuleRecord>,
    #[serde(skip)]
    pub installed: bool,
    #[serde(skip)]
    pub installed_path: Option<PathBuf>,
}

impl ReleaseRecord {
    /// Create a bare record for a version.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    /// Parsed version for ordering.
    pub fn version_id(&self) -> VersionId {
        VersionId::parse(&self.version)
    }

    /// The `major.minor` line this release belongs to.
    pub fn major_minor(&self) -> &str {
        major_minor(&self.version)
    }

    /// Whether the changeset is known and non-empty.
    pub fn has_changeset(&self) -> bool {
        self.changeset.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// Modules a user may choose from.
    pub fn selectable_modules(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.iter().filter(|m| m.is_selectable())
    }

    /// Look up a module by id.
    pub fn module(&self, id: &str) -> Option<&ModuleRecord> {
        self.modules.iter().find(|m| m.id == id)
    }
}

/// Summary of a `major.minor` release line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSummary {
    /// The line, e.g. `2022.3`.
    pub major_minor: String,
    /// Label shown to users, e.g. `Unity 6 6000.0 LTS`.
    pub display_name: String,
    /// Number of releases the authoritative source reports for this line.
    pub total_count: u64,
    /// Newest version in the line.
    pub latest_version: String,
    #[serde(default)]
    pub is_lts: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(id: &str, category: ModuleCategory, hidden: bool) -> ModuleRecord {
        ModuleRecord {
            id: id.to_string(),
            name: id.to_string(),
            description: None,
            category,
            hidden,
            download_size: 0,
            installed_size: 0,
            installed: false,
        }
    }

    #[test]
    fn test_selectable_modules() {
        let mut release = ReleaseRecord::new("2022.3.60f1");
        release.modules = vec![
            module("android", ModuleCategory::Platform, false),
            module("android-sdk-ndk-tools", ModuleCategory::Platform, true),
            module("visualstudio", ModuleCategory::DevTool, false),
            module("ja", ModuleCategory::LanguagePack, false),
        ];
        let ids: Vec<&str> = release.selectable_modules().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["android"]);
    }

    #[test]
    fn test_install_state_is_not_serialized() {
        let mut release = ReleaseRecord::new("6000.0.23f1");
        release.installed = true;
        release.installed_path = Some(PathBuf::from("/opt/editors/6000.0.23f1"));
        let mut m = module("ios", ModuleCategory::Platform, false);
        m.installed = true;
        release.modules.push(m);

        let json = serde_json::to_string(&release).unwrap();
        assert!(!json.contains("installedPath"));
        assert!(!json.contains("\"installed\""));

        let back: ReleaseRecord = serde_json::from_str(&json).unwrap();
        assert!(!back.installed);
        assert!(back.installed_path.is_none());
        assert!(!back.modules[0].installed);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let json = r#"{"version":"2021.3.1f1","futureField":42,"modules":[]}"#;
        let release: ReleaseRecord = serde_json::from_str(json).unwrap();
        assert_eq!(release.major_minor(), "2021.3");
    }

    #[test]
    fn test_has_changeset() {
        let mut release = ReleaseRecord::new("2021.3.1f1");
        assert!(!release.has_changeset());
        release.changeset = Some(String::new());
        assert!(!release.has_changeset());
        release.changeset = Some("abc123def456".to_string());
        assert!(release.has_changeset());
    }
}

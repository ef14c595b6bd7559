//! Project descriptor reader.
//!
//! Projects pin their engine version in `ProjectSettings/ProjectVersion.txt`:
//!
//! ```text
//! m_EditorVersion: 2022.3.60f1
//! m_EditorVersionWithRevision: 2022.3.60f1 (b2e806cf271c)
//! ```

use std::path::{Path, PathBuf};

use crate::error::{CatalogError, Result};

/// Descriptor location relative to the project root.
pub const DESCRIPTOR: &str = "ProjectSettings/ProjectVersion.txt";

/// Engine version a project requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectVersion {
    pub version: String,
    /// Present when the descriptor records the revision as well.
    pub changeset: Option<String>,
}

/// Parse descriptor content. `path` is only used for error messages.
///
/// # Errors
///
/// Returns [`CatalogError::Project`] if no version key is present.
pub fn parse(content: &str, path: &Path) -> Result<ProjectVersion> {
    let mut version = None;
    let mut changeset = None;

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "m_EditorVersion" if !value.is_empty() => version = Some(value.to_string()),
            "m_EditorVersionWithRevision" => {
                if let Some((v, rest)) = value.split_once('(') {
                    let rev = rest.trim_end_matches(')').trim();
                    if !rev.is_empty() {
                        changeset = Some(rev.to_string());
                    }
                    if version.is_none() && !v.trim().is_empty() {
                        version = Some(v.trim().to_string());
                    }
                }
            }
            _ => {}
        }
    }

    let version = version.ok_or_else(|| CatalogError::Project {
        path: path.to_path_buf(),
        message: "no m_EditorVersion entry".to_string(),
    })?;
    Ok(ProjectVersion { version, changeset })
}

/// Read the descriptor of the project rooted at `root`.
///
/// # Errors
///
/// Returns an IO error if the descriptor cannot be read, or
/// [`CatalogError::Project`] if it names no version.
pub fn read(root: &Path) -> Result<ProjectVersion> {
    let path: PathBuf = root.join(DESCRIPTOR);
    let content = std::fs::read_to_string(&path)?;
    parse(&content, &path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_revision() {
        let pv = parse(
            "m_EditorVersion: 2022.3.60f1\nm_EditorVersionWithRevision: 2022.3.60f1 (b2e806cf271c)\n",
            Path::new(DESCRIPTOR),
        )
        .unwrap();
        assert_eq!(pv.version, "2022.3.60f1");
        assert_eq!(pv.changeset.as_deref(), Some("b2e806cf271c"));
    }

    #[test]
    fn test_parse_version_only() {
        let pv = parse("m_EditorVersion: 2019.4.40f1\r\n", Path::new(DESCRIPTOR)).unwrap();
        assert_eq!(pv.version, "2019.4.40f1");
        assert_eq!(pv.changeset, None);
    }

    #[test]
    fn test_missing_version_is_error() {
        let err = parse("something: else\n", Path::new(DESCRIPTOR)).unwrap_err();
        assert!(matches!(err, CatalogError::Project { .. }));
    }

    #[test]
    fn test_read_from_project_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("ProjectSettings")).unwrap();
        std::fs::write(dir.path().join(DESCRIPTOR), "m_EditorVersion: 6000.0.40f1\n").unwrap();
        assert_eq!(read(dir.path()).unwrap().version, "6000.0.40f1");
        assert!(read(&dir.path().join("missing")).is_err());
    }
}

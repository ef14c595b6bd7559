//! Handing resolved installs to the distribution manager.

use async_trait::async_trait;
use enver_schema::Arch;
use serde::Serialize;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::info;

use crate::error::{CatalogError, Result};

/// Everything the distribution manager needs to install a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallRequest {
    pub version: String,
    pub changeset: String,
    pub modules: Vec<String>,
    pub arch: Arch,
}

impl InstallRequest {
    /// Arguments for the headless CLI.
    pub fn hub_args(&self) -> Vec<String> {
        let mut args = vec![
            "--".to_string(),
            "--headless".to_string(),
            "install".to_string(),
            "--version".to_string(),
            self.version.clone(),
            "--changeset".to_string(),
            self.changeset.clone(),
            "--architecture".to_string(),
            self.arch.as_str().to_string(),
        ];
        for module in &self.modules {
            args.push("--module".to_string());
            args.push(module.clone());
        }
        args
    }
}

#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self, request: &InstallRequest) -> Result<()>;
}

/// Runs the distribution manager's headless installer, inheriting stdio.
#[derive(Debug, Clone)]
pub struct HubLauncher {
    executable: PathBuf,
}

impl HubLauncher {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

#[async_trait]
impl Launcher for HubLauncher {
    async fn launch(&self, request: &InstallRequest) -> Result<()> {
        info!(version = %request.version, changeset = %request.changeset, "launching installer");
        let status = Command::new(&self.executable)
            .args(request.hub_args())
            .status()
            .await
            .map_err(|e| {
                CatalogError::Registry(format!("failed to run {}: {e}", self.executable.display()))
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(CatalogError::Registry(format!(
                "installer exited with {status}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_args() {
        let request = InstallRequest {
            version: "2022.3.60f1".into(),
            changeset: "b2e806cf271c".into(),
            modules: vec!["android".into(), "ios".into()],
            arch: Arch::Arm64,
        };
        let args = request.hub_args();
        assert_eq!(&args[..3], ["--", "--headless", "install"]);
        assert!(args.windows(2).any(|w| w == ["--changeset", "b2e806cf271c"]));
        assert!(args.windows(2).any(|w| w == ["--architecture", "arm64"]));
        assert_eq!(args.iter().filter(|a| *a == "--module").count(), 2);
    }
}

//! Stream discovery
//!
//! The set of `major.minor` lines to probe is built from several providers,
//! tried in order. Each provider sees what earlier ones found. A failing
//! provider is logged and skipped.

use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::debug;

use crate::cache::CacheSnapshot;
use crate::error::Result;
use crate::manifest::SharedManifest;
use crate::remote::{self, ReleaseApi};

/// Lines known to have existed, used when nothing else answers.
pub const BASELINE_STREAMS: &[&str] = &[
    "2019.4", "2020.3", "2021.3", "2022.3", "2023.1", "2023.2", "6000.0", "6000.1", "6000.2",
];

/// Newest-generation lines, always probed so fresh lines show up before the
/// enumeration endpoint lists them.
pub const NEWEST_GENERATION_STREAMS: &[&str] = &["6000.0", "6000.1", "6000.2", "6000.3"];

/// One source of `major.minor` lines.
#[async_trait]
pub trait StreamProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lines this provider knows about, given what was found so far.
    async fn attempt(&self, found: &BTreeSet<String>) -> Result<Vec<String>>;
}

/// Enumerates lines from the release API.
#[derive(Debug)]
pub struct RemoteStreams {
    api: ReleaseApi,
}

impl RemoteStreams {
    pub fn new(api: ReleaseApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl StreamProvider for RemoteStreams {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn attempt(&self, _found: &BTreeSet<String>) -> Result<Vec<String>> {
        self.api.enumerate_streams().await
    }
}

/// Hardcoded baseline plus the newest-generation lines.
#[derive(Debug, Default)]
pub struct BaselineStreams;

#[async_trait]
impl StreamProvider for BaselineStreams {
    fn name(&self) -> &'static str {
        "baseline"
    }

    async fn attempt(&self, found: &BTreeSet<String>) -> Result<Vec<String>> {
        let mut lines: Vec<String> = Vec::new();
        if found.is_empty() {
            lines.extend(BASELINE_STREAMS.iter().map(|s| (*s).to_string()));
        }
        lines.extend(NEWEST_GENERATION_STREAMS.iter().map(|s| (*s).to_string()));
        Ok(lines)
    }
}

/// Lines recorded in the catalog cache snapshot loaded for this pass.
#[derive(Debug, Default)]
pub struct CacheStreams {
    lines: Vec<String>,
}

impl CacheStreams {
    /// `None` when cache reads are disabled or no snapshot exists.
    pub fn from_snapshot(snapshot: Option<&CacheSnapshot>) -> Self {
        let lines: BTreeSet<String> = snapshot
            .map(|s| s.major_minors().map(str::to_string).collect())
            .unwrap_or_default();
        Self {
            lines: lines.into_iter().collect(),
        }
    }
}

#[async_trait]
impl StreamProvider for CacheStreams {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn attempt(&self, _found: &BTreeSet<String>) -> Result<Vec<String>> {
        Ok(self.lines.clone())
    }
}

/// Lines of every release in the local manifest.
#[derive(Debug)]
pub struct ManifestStreams {
    manifest: SharedManifest,
}

impl ManifestStreams {
    pub fn new(manifest: SharedManifest) -> Self {
        Self { manifest }
    }
}

#[async_trait]
impl StreamProvider for ManifestStreams {
    fn name(&self) -> &'static str {
        "manifest"
    }

    async fn attempt(&self, _found: &BTreeSet<String>) -> Result<Vec<String>> {
        let records = self.manifest.records().await;
        Ok(records.iter().map(|r| r.major_minor().to_string()).collect())
    }
}

/// Ordered list of providers whose results are unioned.
pub struct StreamDiscovery {
    providers: Vec<Box<dyn StreamProvider>>,
}

impl StreamDiscovery {
    pub fn new(providers: Vec<Box<dyn StreamProvider>>) -> Self {
        Self { providers }
    }

    /// The standard chain: remote, baseline, cache, local manifest.
    pub fn standard(
        api: ReleaseApi,
        snapshot: Option<&CacheSnapshot>,
        manifest: SharedManifest,
    ) -> Self {
        Self::new(vec![
            Box::new(RemoteStreams::new(api)),
            Box::new(BaselineStreams),
            Box::new(CacheStreams::from_snapshot(snapshot)),
            Box::new(ManifestStreams::new(manifest)),
        ])
    }

    /// Union of every provider's lines, newest first.
    pub async fn discover(&self) -> Vec<String> {
        let mut found = BTreeSet::new();
        for provider in &self.providers {
            match provider.attempt(&found).await {
                Ok(lines) => {
                    let before = found.len();
                    found.extend(lines.into_iter().filter(|l| !l.is_empty()));
                    debug!(
                        provider = provider.name(),
                        added = found.len() - before,
                        "stream provider"
                    );
                }
                Err(e) => debug!(provider = provider.name(), "stream provider failed: {e}"),
            }
        }

        let mut lines: Vec<String> = found.into_iter().collect();
        lines.sort_by(|a, b| remote::stream_order(b, a));
        lines
    }
}

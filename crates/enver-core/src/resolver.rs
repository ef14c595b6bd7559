//! Catalog resolution
//!
//! One pass: load the cache, discover streams, probe their metadata, reuse
//! the cache if every count still matches, otherwise fetch remote releases
//! and the local manifest concurrently, merge, and write a new snapshot.
//! Install state is computed fresh at the end of every pass.

use enver_schema::{ReleaseRecord, StreamSummary};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::{self, CacheSnapshot, CacheStore};
use crate::changeset::ChangesetCache;
use crate::config::Settings;
use crate::discovery::StreamDiscovery;
use crate::error::{CatalogError, Result};
use crate::install::InstallationInspector;
use crate::launcher::InstallRequest;
use crate::manifest::{LocalManifest, SharedManifest};
use crate::merge;
use crate::remote::{self, ReleaseApi};
use crate::reporter::{NullReporter, Reporter};

/// Where the releases of a [`Catalog`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    /// Cache snapshot, still valid for the current stream counts.
    Cache,
    /// Freshly fetched and merged.
    Remote,
    /// Remote fetch failed; last snapshot (possibly stale) plus local manifest.
    StaleCache,
    /// Remote fetch failed and no snapshot exists; local manifest only.
    LocalOnly,
}

impl CatalogSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Remote => "remote",
            Self::StaleCache => "stale cache",
            Self::LocalOnly => "local manifest",
        }
    }
}

/// Read-only result of a resolution pass.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Every probed stream, newest first, including empty ones.
    pub streams: Vec<StreamSummary>,
    /// Releases, newest first, with install state filled in.
    pub releases: Vec<ReleaseRecord>,
    pub source: CatalogSource,
}

impl Catalog {
    /// Streams worth showing: those with at least one release.
    pub fn visible_streams(&self) -> impl Iterator<Item = &StreamSummary> {
        self.streams.iter().filter(|s| s.total_count > 0)
    }

    pub fn find(&self, version: &str) -> Option<&ReleaseRecord> {
        self.releases.iter().find(|r| r.version == version)
    }

    /// Releases of one `major.minor` line.
    pub fn releases_in<'a>(&'a self, mm: &'a str) -> impl Iterator<Item = &'a ReleaseRecord> {
        self.releases.iter().filter(move |r| r.major_minor() == mm)
    }

    pub fn installed(&self) -> impl Iterator<Item = &ReleaseRecord> {
        self.releases.iter().filter(|r| r.installed)
    }

    /// Newest release per `major.minor` line.
    pub fn latest_per_stream(&self) -> Vec<&ReleaseRecord> {
        merge::latest_per_stream(&self.releases)
    }
}

/// Streams recorded in a snapshot, for when no stream could be probed.
fn streams_from_snapshot(snapshot: &CacheSnapshot) -> Vec<StreamSummary> {
    let mut streams: Vec<StreamSummary> = snapshot
        .streams
        .iter()
        .map(|(mm, cached)| StreamSummary {
            major_minor: mm.clone(),
            display_name: remote::display_name(mm, cached.lts),
            total_count: cached.total_count,
            latest_version: cached.latest_version.clone(),
            is_lts: cached.lts,
        })
        .collect();
    streams.sort_by(|a, b| remote::stream_order(&b.major_minor, &a.major_minor));
    streams
}

/// Cached streams whose probe failed this pass, with their cached releases.
#[derive(Debug, Default)]
struct Carried {
    streams: Vec<StreamSummary>,
    releases: Vec<ReleaseRecord>,
}

fn carry_forward(snapshot: &CacheSnapshot, probed: &[StreamSummary]) -> Carried {
    let streams: Vec<StreamSummary> = streams_from_snapshot(snapshot)
        .into_iter()
        .filter(|cached| !probed.iter().any(|s| s.major_minor == cached.major_minor))
        .collect();
    let releases = snapshot
        .releases
        .iter()
        .filter(|r| streams.iter().any(|s| s.major_minor == r.major_minor()))
        .cloned()
        .collect();
    Carried { streams, releases }
}

/// Drives catalog resolution and answers questions about single versions.
pub struct CatalogResolver {
    api: ReleaseApi,
    cache: CacheStore,
    manifest: LocalManifest,
    inspector: InstallationInspector,
    cache_reads: bool,
    changesets: ChangesetCache,
    reporter: Arc<dyn Reporter>,
}

impl CatalogResolver {
    pub fn new(
        api: ReleaseApi,
        cache: CacheStore,
        manifest: LocalManifest,
        inspector: InstallationInspector,
    ) -> Self {
        Self {
            api,
            cache,
            manifest,
            inspector,
            cache_reads: true,
            changesets: ChangesetCache::new(Duration::from_secs(15 * 60)),
            reporter: Arc::new(NullReporter),
        }
    }

    /// Resolver wired from settings: default cache location, configured
    /// manifest, install base and hub registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api = ReleaseApi::new(remote::build_client()?, settings);
        Ok(Self::new(
            api,
            CacheStore::open_default(),
            LocalManifest::from_settings(settings),
            InstallationInspector::from_settings(settings),
        )
        .cache_reads(settings.cache_reads)
        .changeset_ttl(settings.changeset_ttl()))
    }

    #[must_use]
    pub fn cache_reads(mut self, enabled: bool) -> Self {
        self.cache_reads = enabled;
        self
    }

    #[must_use]
    pub fn changeset_ttl(mut self, ttl: Duration) -> Self {
        self.changesets = ChangesetCache::new(ttl);
        self
    }

    #[must_use]
    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn inspector(&self) -> &InstallationInspector {
        &self.inspector
    }

    pub fn cache_store(&self) -> &CacheStore {
        &self.cache
    }

    /// Load the snapshot for this pass. A corrupt snapshot is deleted.
    fn load_snapshot(&self) -> Option<CacheSnapshot> {
        if !self.cache_reads {
            debug!("cache reads disabled");
            return None;
        }
        match self.cache.load() {
            Ok(snapshot) => snapshot,
            Err(e @ CatalogError::CorruptCache { .. }) => {
                warn!("{e}; rebuilding");
                self.reporter.warning("Catalog cache was corrupt and has been reset");
                if let Err(e) = self.cache.clear() {
                    warn!("failed to remove corrupt cache: {e}");
                }
                None
            }
            Err(e) => {
                debug!("cache unreadable: {e}");
                None
            }
        }
    }

    /// Run one resolution pass.
    ///
    /// Never fails on transient errors: each source degrades independently,
    /// and when nothing remote answers the last snapshot is returned.
    pub async fn resolve(&mut self) -> Catalog {
        let snapshot = self.load_snapshot();
        let manifest = self.manifest.shared();

        self.reporter.live_phase("Discovering release streams");
        let discovery =
            StreamDiscovery::standard(self.api.clone(), snapshot.as_ref(), manifest.clone());
        // The manifest read overlaps the remote calls made during discovery.
        let (_, lines) = tokio::join!(manifest.records(), discovery.discover());
        let (mut streams, errors) = self.api.fetch_streams_metadata(&lines).await;
        self.reporter.live_phase_update(
            &format!("{} streams ({} unavailable)", streams.len(), errors.len()),
            !streams.is_empty(),
        );

        let mut catalog = match snapshot {
            Some(snapshot) if cache::is_valid(&snapshot, &streams) => {
                info!(releases = snapshot.releases.len(), "catalog cache is current");
                if streams.is_empty() {
                    streams = streams_from_snapshot(&snapshot);
                }
                Catalog {
                    streams,
                    releases: snapshot.releases,
                    source: CatalogSource::Cache,
                }
            }
            snapshot => self.rebuild(streams, snapshot, &manifest).await,
        };

        self.inspector.enrich(&mut catalog.releases).await;
        self.changesets.purge_expired();
        self.changesets.extend_from(&catalog.releases);
        catalog
    }

    async fn rebuild(
        &self,
        mut streams: Vec<StreamSummary>,
        snapshot: Option<CacheSnapshot>,
        manifest: &SharedManifest,
    ) -> Catalog {
        let active: Vec<String> = streams
            .iter()
            .filter(|s| s.total_count > 0)
            .map(|s| s.major_minor.clone())
            .collect();

        self.reporter.live_phase("Fetching releases");
        let fetch_remote = async {
            if active.is_empty() {
                return Err(CatalogError::Remote("no stream metadata available".to_string()));
            }
            self.api.fetch_releases_batched(&active).await
        };
        let (remote, local) = tokio::join!(fetch_remote, manifest.records());
        let local = local.to_vec();

        match remote {
            Ok(mut remote) => {
                let carried = snapshot
                    .as_ref()
                    .map(|snapshot| carry_forward(snapshot, &streams))
                    .unwrap_or_default();
                if !carried.streams.is_empty() {
                    debug!(
                        streams = carried.streams.len(),
                        "keeping cached streams that failed to probe"
                    );
                    streams.extend(carried.streams.iter().cloned());
                    streams.sort_by(|a, b| remote::stream_order(&b.major_minor, &a.major_minor));
                    remote.extend(carried.releases);
                }

                let mut releases = merge::deduplicate(merge::merge(remote, local));
                merge::sort_releases(&mut releases);
                self.reporter
                    .live_phase_update(&format!("{} releases", releases.len()), true);
                if !carried.streams.is_empty() {
                    self.reporter.info(&format!(
                        "{} streams unavailable; kept their cached releases",
                        carried.streams.len()
                    ));
                }
                if let Err(e) = self.cache.save(&streams, &releases) {
                    warn!("failed to write catalog cache: {e}");
                }
                Catalog {
                    streams,
                    releases,
                    source: CatalogSource::Remote,
                }
            }
            Err(e) => {
                if e.is_transient() {
                    debug!("remote releases unavailable: {e}");
                } else {
                    warn!("remote releases unusable: {e}");
                }
                self.reporter.live_phase_update("offline", false);
                let (base, source, streams) = match snapshot {
                    Some(snapshot) => {
                        debug!(
                            updated_at = %snapshot.updated_at,
                            "falling back to last catalog cache"
                        );
                        let streams = if streams.is_empty() {
                            streams_from_snapshot(&snapshot)
                        } else {
                            streams
                        };
                        (snapshot.releases, CatalogSource::StaleCache, streams)
                    }
                    None => (Vec::new(), CatalogSource::LocalOnly, streams),
                };
                let mut releases = merge::deduplicate(merge::merge(base, local));
                merge::sort_releases(&mut releases);
                Catalog {
                    streams,
                    releases,
                    source,
                }
            }
        }
    }

    /// Changeset for `version`, resolving the catalog if it is not known yet.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownVersion`] if no source knows the version.
    pub async fn changeset_for(&mut self, version: &str) -> Result<Option<String>> {
        if let Some(changeset) = self.changesets.get(version) {
            return Ok(Some(changeset.to_string()));
        }
        let catalog = self.resolve().await;
        let release = catalog
            .find(version)
            .ok_or_else(|| CatalogError::UnknownVersion(version.to_string()))?;
        Ok(release.changeset.clone().filter(|c| !c.is_empty()))
    }

    /// Build the request the launcher needs to install `version` with
    /// `modules`. Module ids the release does not list are reported as
    /// warnings and dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the version is unknown or has no changeset.
    pub fn install_request(
        &self,
        catalog: &Catalog,
        version: &str,
        modules: &[String],
    ) -> Result<InstallRequest> {
        let release = catalog
            .find(version)
            .ok_or_else(|| CatalogError::UnknownVersion(version.to_string()))?;
        let changeset = release
            .changeset
            .clone()
            .filter(|c| !c.is_empty())
            .or_else(|| self.changesets.get(version).map(str::to_string))
            .ok_or_else(|| CatalogError::MissingChangeset(version.to_string()))?;

        let mut selected = Vec::with_capacity(modules.len());
        for id in modules {
            if release.modules.is_empty() || release.module(id).is_some() {
                selected.push(id.clone());
            } else {
                self.reporter
                    .warning(&format!("{version} has no module '{id}', skipping"));
            }
        }

        Ok(InstallRequest {
            version: release.version.clone(),
            changeset,
            modules: selected,
            arch: self.api.arch(),
        })
    }
}

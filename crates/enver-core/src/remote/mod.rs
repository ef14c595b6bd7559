//! Release API client
//!
//! Stream metadata is probed with one small request per stream, fanned out
//! over a `JoinSet`. Full release lists come back in a single aliased
//! request for all streams.

mod graphql;

use enver_schema::version::{self, major_minor};
use enver_schema::{
    Arch, GENERATION_LABEL, NEWEST_GENERATION, Platform, ReleaseRecord, StreamKind, StreamSummary,
    VersionId,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{CatalogError, Result};
use graphql::{GraphQlQuery, GraphQlResponse, MajorVersionNode, MetadataData, ReleaseConnection};

/// Build the HTTP client used for release API calls.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn build_client() -> Result<Client> {
    Ok(Client::builder().user_agent(crate::USER_AGENT).build()?)
}

/// Client for the remote release catalog.
#[derive(Debug, Clone)]
pub struct ReleaseApi {
    client: Client,
    endpoint: String,
    metadata_timeout: Duration,
    batch_timeout: Duration,
    releases_per_stream: u32,
    platform: Platform,
    arch: Arch,
}

impl ReleaseApi {
    pub fn new(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            endpoint: settings.api_url.clone(),
            metadata_timeout: settings.metadata_timeout(),
            batch_timeout: settings.batch_timeout(),
            releases_per_stream: settings.releases_per_stream,
            platform: settings.platform,
            arch: settings.arch,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    async fn post<T: DeserializeOwned>(
        &self,
        query: &GraphQlQuery,
        timeout: Duration,
    ) -> Result<T> {
        let resp = self
            .client
            .post(&self.endpoint)
            .timeout(timeout)
            .json(query)
            .send()
            .await
            .map_err(|e| map_http_error(e, timeout))?;

        if !resp.status().is_success() {
            return Err(CatalogError::Remote(format!(
                "{} returned HTTP {}",
                query.operation_name,
                resp.status()
            )));
        }

        let text = resp.text().await.map_err(|e| map_http_error(e, timeout))?;
        let body: GraphQlResponse<T> = serde_json::from_str(&text).map_err(|e| {
            let snippet: String = text.chars().take(300).collect();
            CatalogError::Remote(format!(
                "failed to parse {}: {e}. Snippet: {snippet}",
                query.operation_name
            ))
        })?;

        if let Some(errors) = &body.errors {
            for err in errors {
                warn!(operation = query.operation_name, "GraphQL error: {}", err.message);
            }
        }

        body.data.ok_or_else(|| {
            CatalogError::Remote(format!("no data in {} response", query.operation_name))
        })
    }

    /// Probe one stream for its release count and newest release.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, times out or the response is malformed.
    pub async fn fetch_stream_metadata(&self, mm: &str) -> Result<StreamSummary> {
        let data: MetadataData = self
            .post(&graphql::metadata_query(mm), self.metadata_timeout)
            .await?;
        let connection = data.get_unity_releases;
        let newest = connection.edges.into_iter().next().map(|e| e.node);

        let latest_version = newest.as_ref().map(|n| n.version.clone()).unwrap_or_default();
        let is_lts = newest
            .as_ref()
            .and_then(|n| n.stream.as_deref())
            .and_then(graphql::parse_stream)
            == Some(StreamKind::Lts);

        Ok(StreamSummary {
            major_minor: mm.to_string(),
            display_name: display_name(mm, is_lts),
            total_count: connection.total_count,
            latest_version,
            is_lts,
        })
    }

    /// Probe every stream concurrently.
    ///
    /// One task per stream; successes are collected into a shared list and
    /// failures are sent over an error channel. A failing stream never
    /// aborts its siblings. Streams come back sorted newest first.
    pub async fn fetch_streams_metadata(
        &self,
        major_minors: &[String],
    ) -> (Vec<StreamSummary>, Vec<CatalogError>) {
        let results = Arc::new(Mutex::new(Vec::with_capacity(major_minors.len())));
        let (err_tx, mut err_rx) = mpsc::unbounded_channel::<(String, CatalogError)>();
        let mut set = JoinSet::new();

        for mm in major_minors {
            let api = self.clone();
            let results = Arc::clone(&results);
            let err_tx = err_tx.clone();
            let mm = mm.clone();
            set.spawn(async move {
                match api.fetch_stream_metadata(&mm).await {
                    Ok(stream) => results.lock().await.push(stream),
                    Err(e) => {
                        let _ = err_tx.send((mm, e));
                    }
                }
            });
        }
        drop(err_tx);

        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                warn!("stream metadata task failed: {e}");
            }
        }

        let mut errors = Vec::new();
        while let Some((mm, e)) = err_rx.recv().await {
            debug!(stream = %mm, "metadata probe failed: {e}");
            errors.push(e);
        }

        let mut streams = std::mem::take(&mut *results.lock().await);
        streams.sort_by(|a, b| stream_order(&b.major_minor, &a.major_minor));
        (streams, errors)
    }

    /// Fetch every release of the given streams in one request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, times out or cannot be decoded.
    pub async fn fetch_releases_batched(
        &self,
        major_minors: &[String],
    ) -> Result<Vec<ReleaseRecord>> {
        if major_minors.is_empty() {
            return Ok(Vec::new());
        }
        let query = graphql::batch_query(major_minors, self.releases_per_stream);
        let data: HashMap<String, Option<ReleaseConnection>> =
            self.post(&query, self.batch_timeout).await?;
        let records =
            graphql::records_from_batch(data, major_minors.len(), self.platform, self.arch);
        debug!(
            streams = major_minors.len(),
            releases = records.len(),
            "fetched release batch"
        );
        Ok(records)
    }

    /// Enumerate the `major.minor` lines of every release channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or cannot be decoded.
    pub async fn enumerate_streams(&self) -> Result<Vec<String>> {
        let data: HashMap<String, Option<Vec<MajorVersionNode>>> = self
            .post(&graphql::streams_query(), self.metadata_timeout)
            .await?;
        let lines: BTreeSet<String> = data
            .into_values()
            .flatten()
            .flatten()
            .map(|node| major_minor(&node.version).to_string())
            .filter(|mm| !mm.is_empty())
            .collect();
        Ok(lines.into_iter().collect())
    }
}

fn map_http_error(e: reqwest::Error, timeout: Duration) -> CatalogError {
    if e.is_timeout() {
        CatalogError::Timeout(timeout.as_secs())
    } else {
        CatalogError::Http(e)
    }
}

/// Ordering of `major.minor` lines, comparing them as `mm.0` versions.
pub fn stream_order(a: &str, b: &str) -> std::cmp::Ordering {
    version::compare(&format!("{a}.0"), &format!("{b}.0"))
}

/// User-facing name of a stream.
///
/// ```
/// use enver_core::remote::display_name;
///
/// assert_eq!(display_name("2022.3", true), "2022.3 LTS");
/// assert_eq!(display_name("6000.0", true), "Unity 6 6000.0 LTS");
/// ```
pub fn display_name(mm: &str, is_lts: bool) -> String {
    let mut name = mm.to_string();
    if VersionId::parse(mm).major() == NEWEST_GENERATION {
        name = format!("{GENERATION_LABEL} {name}");
    }
    if is_lts {
        name.push_str(" LTS");
    }
    name
}

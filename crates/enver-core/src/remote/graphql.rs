//! Wire types and query builders for the release GraphQL API.
//!
//! Batched queries alias one field per stream (`stream_0`, `stream_1`, ...).
//! Responses are first decoded into a map keyed by alias, then converted to
//! typed records by [`records_from_batch`]. Nothing outside this module sees
//! alias strings.

use chrono::{DateTime, Utc};
use enver_schema::{Arch, ModuleCategory, ModuleRecord, Platform, ReleaseRecord, StreamKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphQlQuery {
    pub operation_name: &'static str,
    pub query: String,
    pub variables: serde_json::Value,
}

#[derive(Deserialize, Debug)]
pub(crate) struct GraphQlResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct GraphQlError {
    pub message: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReleaseConnection {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub edges: Vec<ReleaseEdge>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ReleaseEdge {
    pub node: ReleaseNode,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReleaseNode {
    pub version: String,
    #[serde(default)]
    pub short_revision: Option<String>,
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recommended: bool,
    #[serde(default)]
    pub release_notes: Option<UrlNode>,
    #[serde(default)]
    pub label: Option<LabelNode>,
    #[serde(default)]
    pub downloads: Vec<DownloadNode>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct UrlNode {
    pub url: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct LabelNode {
    pub text: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DownloadNode {
    pub platform: String,
    pub architecture: String,
    #[serde(default)]
    pub download_size: i64,
    #[serde(default)]
    pub installed_size: i64,
    #[serde(default)]
    pub modules: Vec<ModuleNode>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ModuleNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub download_size: i64,
    #[serde(default)]
    pub installed_size: i64,
}

#[derive(Deserialize, Debug)]
pub(crate) struct MajorVersionNode {
    pub version: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MetadataData {
    pub get_unity_releases: ReleaseConnection,
}

const RELEASE_FIELDS: &str = r"
fragment ReleaseFields on UnityRelease {
    version
    shortRevision
    stream
    releaseDate
    recommended
    releaseNotes { url }
    label { text }
    downloads {
        platform
        architecture
        downloadSize
        installedSize
        modules {
            id
            name
            description
            category
            hidden
            downloadSize
            installedSize
        }
    }
}
";

pub(crate) const METADATA_OPERATION: &str = "GetStreamMetadata";
pub(crate) const BATCH_OPERATION: &str = "GetReleasesBatch";
pub(crate) const STREAMS_OPERATION: &str = "GetReleaseStreams";

/// Single-stream probe: total count plus the newest record.
pub(crate) fn metadata_query(major_minor: &str) -> GraphQlQuery {
    GraphQlQuery {
        operation_name: METADATA_OPERATION,
        query: r"
query GetStreamMetadata($version: String!, $limit: Int!) {
    getUnityReleases(version: $version, limit: $limit, orderBy: RELEASE_DATE_DESC) {
        totalCount
        edges { node { version stream releaseDate } }
    }
}"
        .to_string(),
        variables: serde_json::json!({ "version": major_minor, "limit": 1 }),
    }
}

/// Escape special characters in GraphQL string literals
fn escape_graphql_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Generate a consistent alias for a stream in batched queries
#[inline]
pub(crate) fn stream_alias(index: usize) -> String {
    format!("stream_{index}")
}

/// One request covering every stream, each under its own alias.
pub(crate) fn batch_query(major_minors: &[String], limit: u32) -> GraphQlQuery {
    let mut fields = String::new();
    for (i, mm) in major_minors.iter().enumerate() {
        fields.push_str(&format!(
            r#"
    {}: getUnityReleases(version: "{}", limit: {limit}, orderBy: RELEASE_DATE_DESC) {{
        totalCount
        edges {{ node {{ ...ReleaseFields }} }}
    }}"#,
            stream_alias(i),
            escape_graphql_string(mm),
        ));
    }

    GraphQlQuery {
        operation_name: BATCH_OPERATION,
        query: format!("query {BATCH_OPERATION} {{{fields}\n}}\n{RELEASE_FIELDS}"),
        variables: serde_json::json!({}),
    }
}

/// One request enumerating the major versions of every release channel.
pub(crate) fn streams_query() -> GraphQlQuery {
    let mut fields = String::new();
    for kind in StreamKind::ALL {
        fields.push_str(&format!(
            "\n    {}: getUnityReleaseMajorVersions(stream: {}) {{ version }}",
            kind.api_name().to_lowercase(),
            kind.api_name()
        ));
    }
    GraphQlQuery {
        operation_name: STREAMS_OPERATION,
        query: format!("query {STREAMS_OPERATION} {{{fields}\n}}"),
        variables: serde_json::json!({}),
    }
}

pub(crate) fn parse_stream(raw: &str) -> Option<StreamKind> {
    match raw.to_ascii_uppercase().as_str() {
        "LTS" => Some(StreamKind::Lts),
        "TECH" => Some(StreamKind::Tech),
        "BETA" | "ALPHA" => Some(StreamKind::Beta),
        "SUPPORTED" => Some(StreamKind::Supported),
        _ => None,
    }
}

fn parse_category(raw: &str) -> ModuleCategory {
    match raw.to_ascii_uppercase().as_str() {
        "PLATFORM" => ModuleCategory::Platform,
        "LANGUAGE_PACK" => ModuleCategory::LanguagePack,
        "DOCUMENTATION" => ModuleCategory::Documentation,
        _ => ModuleCategory::DevTool,
    }
}

fn module_from_node(node: &ModuleNode) -> ModuleRecord {
    ModuleRecord {
        id: node.id.clone(),
        name: node.name.clone(),
        description: node.description.clone().filter(|d| !d.is_empty()),
        category: parse_category(&node.category),
        hidden: node.hidden,
        download_size: node.download_size,
        installed_size: node.installed_size,
        installed: false,
    }
}

/// Convert one release node, keeping only the download variant for the
/// given platform and architecture.
pub(crate) fn record_from_node(node: ReleaseNode, platform: Platform, arch: Arch) -> ReleaseRecord {
    let stream = node.stream.as_deref().and_then(parse_stream);
    let variant = node.downloads.iter().find(|d| {
        d.platform.eq_ignore_ascii_case(platform.api_name())
            && d.architecture.eq_ignore_ascii_case(arch.api_name())
    });

    let (download_size, installed_size, modules) = match variant {
        Some(d) => (
            Some(d.download_size),
            Some(d.installed_size),
            d.modules.iter().map(module_from_node).collect(),
        ),
        None => (Some(0), Some(0), Vec::new()),
    };

    ReleaseRecord {
        version: node.version,
        changeset: node.short_revision.filter(|c| !c.is_empty()),
        stream,
        is_lts: stream == Some(StreamKind::Lts),
        release_date: node.release_date,
        recommended: node.recommended,
        release_notes_url: node.release_notes.map(|n| n.url),
        download_size,
        installed_size,
        security_alert: node.label.map(|l| l.text).filter(|t| !t.is_empty()),
        modules,
        installed: false,
        installed_path: None,
    }
}

/// Typed conversion of a decoded batch response. Streams are emitted in
/// request order; aliases missing from the response are skipped.
pub(crate) fn records_from_batch(
    mut data: HashMap<String, Option<ReleaseConnection>>,
    stream_count: usize,
    platform: Platform,
    arch: Arch,
) -> Vec<ReleaseRecord> {
    let mut records = Vec::new();
    for i in 0..stream_count {
        let Some(Some(connection)) = data.remove(&stream_alias(i)) else {
            continue;
        };
        records.extend(
            connection
                .edges
                .into_iter()
                .map(|edge| record_from_node(edge.node, platform, arch)),
        );
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCH_JSON: &str = r#"{
        "stream_0": {
            "totalCount": 1,
            "edges": [{
                "node": {
                    "version": "2022.3.60f1",
                    "shortRevision": "b2e806cf271c",
                    "stream": "LTS",
                    "releaseDate": "2025-02-25T00:00:00Z",
                    "recommended": true,
                    "releaseNotes": {"url": "https://example.com/notes/2022.3.60f1"},
                    "label": null,
                    "downloads": [
                        {
                            "platform": "LINUX", "architecture": "X86_64",
                            "downloadSize": 100, "installedSize": 300,
                            "modules": [{"id": "android", "name": "Android Build Support", "category": "PLATFORM"}]
                        },
                        {
                            "platform": "WINDOWS", "architecture": "X86_64",
                            "downloadSize": 200, "installedSize": 600,
                            "modules": [
                                {"id": "android", "name": "Android Build Support", "category": "PLATFORM"},
                                {"id": "visualstudio", "name": "Visual Studio", "category": "DEV_TOOL"}
                            ]
                        }
                    ]
                }
            }]
        },
        "stream_1": null
    }"#;

    #[test]
    fn test_batch_query_aliases_each_stream() {
        let q = batch_query(&["2022.3".to_string(), "6000.0".to_string()], 50);
        assert!(q.query.contains(r#"stream_0: getUnityReleases(version: "2022.3", limit: 50"#));
        assert!(q.query.contains(r#"stream_1: getUnityReleases(version: "6000.0""#));
        assert!(q.query.contains("fragment ReleaseFields"));
        assert_eq!(q.operation_name, BATCH_OPERATION);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_graphql_string(r#"a"b\c"#), r#"a\"b\\c"#);
    }

    #[test]
    fn test_streams_query_covers_channels() {
        let q = streams_query();
        for alias in ["lts:", "tech:", "beta:", "supported:"] {
            assert!(q.query.contains(alias), "{alias}");
        }
    }

    #[test]
    fn test_records_pick_matching_variant() {
        let data: HashMap<String, Option<ReleaseConnection>> =
            serde_json::from_str(BATCH_JSON).unwrap();
        let records = records_from_batch(data, 2, Platform::Windows, Arch::X86_64);

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.changeset.as_deref(), Some("b2e806cf271c"));
        assert!(r.is_lts);
        assert_eq!(r.download_size, Some(200));
        assert_eq!(r.modules.len(), 2);
        assert_eq!(r.modules[1].category, ModuleCategory::DevTool);
    }

    #[test]
    fn test_no_matching_variant_is_empty_not_error() {
        let data: HashMap<String, Option<ReleaseConnection>> =
            serde_json::from_str(BATCH_JSON).unwrap();
        let records = records_from_batch(data, 2, Platform::MacOs, Arch::Arm64);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].download_size, Some(0));
        assert_eq!(records[0].installed_size, Some(0));
        assert!(records[0].modules.is_empty());
    }

    #[test]
    fn test_unknown_stream_is_tolerated() {
        assert_eq!(parse_stream("lts"), Some(StreamKind::Lts));
        assert_eq!(parse_stream("NIGHTLY"), None);
    }
}

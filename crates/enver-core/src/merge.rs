//! Combining release records from several sources.

use enver_schema::{ReleaseRecord, VersionId};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Merge remote records with records from the local manifest.
///
/// Remote records are authoritative for metadata. When both sources know a
/// version and the remote record carries no modules, the local modules are
/// copied over (and a missing changeset is filled in the same way).
/// Versions only the local manifest knows are appended unchanged.
pub fn merge(remote: Vec<ReleaseRecord>, local: Vec<ReleaseRecord>) -> Vec<ReleaseRecord> {
    let mut local_by_version: HashMap<String, ReleaseRecord> = HashMap::with_capacity(local.len());
    let mut local_order = Vec::with_capacity(local.len());
    for record in local {
        if !local_by_version.contains_key(&record.version) {
            local_order.push(record.version.clone());
            local_by_version.insert(record.version.clone(), record);
        }
    }

    let mut merged = Vec::with_capacity(remote.len() + local_order.len());
    for mut record in remote {
        if let Some(local) = local_by_version.remove(&record.version) {
            let local_has_changeset = local.has_changeset();
            let ReleaseRecord { modules, changeset, .. } = local;
            if record.modules.is_empty() && !modules.is_empty() {
                record.modules = modules;
            }
            if !record.has_changeset() && local_has_changeset {
                record.changeset = changeset;
            }
        }
        merged.push(record);
    }

    merged.extend(
        local_order
            .into_iter()
            .filter_map(|version| local_by_version.remove(&version)),
    );
    merged
}

/// Whether `candidate` should replace `kept` during deduplication.
///
/// Checked in order:
/// 1. `candidate` has strictly more modules than `kept`.
/// 2. `candidate` has a changeset and `kept` has none.
///
/// Anything else keeps the earlier record.
pub fn is_richer(candidate: &ReleaseRecord, kept: &ReleaseRecord) -> bool {
    if candidate.modules.len() > kept.modules.len() {
        return true;
    }
    candidate.has_changeset() && !kept.has_changeset()
}

/// Drop duplicate versions, keeping the first occurrence unless a later one
/// is richer (see [`is_richer`]). Order of first appearance is preserved.
pub fn deduplicate(records: Vec<ReleaseRecord>) -> Vec<ReleaseRecord> {
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(records.len());
    let mut out: Vec<ReleaseRecord> = Vec::with_capacity(records.len());

    for record in records {
        match slots.get(&record.version) {
            Some(&idx) => {
                if is_richer(&record, &out[idx]) {
                    out[idx] = record;
                }
            }
            None => {
                slots.insert(record.version.clone(), out.len());
                out.push(record);
            }
        }
    }
    out
}

fn by_version_desc(a: &ReleaseRecord, b: &ReleaseRecord) -> Ordering {
    b.version_id().cmp(&a.version_id())
}

/// Sort newest first.
///
/// Two dated records compare by release date; any other pair compares by
/// version. Dated records are ordered among themselves by date and undated
/// ones by version, and the two runs are then interleaved by version, which
/// keeps the ordering total.
pub fn sort_releases(records: &mut Vec<ReleaseRecord>) {
    let (mut dated, mut undated): (Vec<_>, Vec<_>) =
        records.drain(..).partition(|r| r.release_date.is_some());

    dated.sort_by(|a, b| {
        b.release_date
            .cmp(&a.release_date)
            .then_with(|| by_version_desc(a, b))
    });
    undated.sort_by(by_version_desc);

    let mut dated = dated.into_iter().peekable();
    let mut undated = undated.into_iter().peekable();
    loop {
        let take_dated = match (dated.peek(), undated.peek()) {
            (Some(d), Some(u)) => by_version_desc(d, u) != Ordering::Greater,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_dated { dated.next() } else { undated.next() };
        records.extend(next);
    }
}

/// Newest release per `major.minor` line, in catalog order.
pub fn latest_per_stream(records: &[ReleaseRecord]) -> Vec<&ReleaseRecord> {
    let mut best: HashMap<&str, &ReleaseRecord> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for record in records {
        let mm = record.major_minor();
        let id: VersionId = record.version_id();
        match best.get(mm) {
            None => {
                order.push(mm);
                best.insert(mm, record);
            }
            Some(current) if id > current.version_id() => {
                best.insert(mm, record);
            }
            Some(_) => {}
        }
    }
    order.into_iter().filter_map(|mm| best.get(mm).copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use enver_schema::{ModuleCategory, ModuleRecord};

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

    fn release(version: &str) -> ReleaseRecord {
        ReleaseRecord::new(version)
    }

    fn dated(version: &str, day: u32) -> ReleaseRecord {
        let mut r = release(version);
        r.release_date = Some(Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap());
        r
    }

    fn versions(records: &[ReleaseRecord]) -> Vec<&str> {
        records.iter().map(|r| r.version.as_str()).collect()
    }

    #[test]
    fn test_merge_remote_date_local_modules() {
        let mut remote = dated("2022.3.60f1", 20);
        remote.recommended = true;
        let mut local = release("2022.3.60f1");
        local.modules = vec![module("android"), module("ios")];
        local.changeset = Some("b2e806cf271c".to_string());

        let merged = merge(vec![remote], vec![local]);
        assert_eq!(merged.len(), 1);
        let r = &merged[0];
        assert!(r.release_date.is_some());
        assert!(r.recommended);
        assert_eq!(r.modules.len(), 2);
        assert_eq!(r.changeset.as_deref(), Some("b2e806cf271c"));
    }

    #[test]
    fn test_merge_keeps_remote_modules() {
        let mut remote = release("2022.3.60f1");
        remote.modules = vec![module("webgl")];
        let mut local = release("2022.3.60f1");
        local.modules = vec![module("android"), module("ios")];

        let merged = merge(vec![remote], vec![local]);
        assert_eq!(merged[0].modules.len(), 1);
        assert_eq!(merged[0].modules[0].id, "webgl");
    }

    #[test]
    fn test_merge_fills_changeset_and_modules_independently() {
        let mut remote = release("6000.0.40f1");
        remote.modules = vec![module("webgl")];
        let mut local = release("6000.0.40f1");
        local.modules = vec![module("android"), module("ios")];
        local.changeset = Some("0123456789ab".to_string());

        let mut bare = release("2021.3.45f1");
        bare.changeset = Some("0da89fac8e79".to_string());
        let mut bare_local = release("2021.3.45f1");
        bare_local.modules = vec![module("android")];

        let merged = merge(vec![remote, bare], vec![local, bare_local]);
        assert_eq!(merged[0].modules.len(), 1);
        assert_eq!(merged[0].changeset.as_deref(), Some("0123456789ab"));
        assert_eq!(merged[1].modules.len(), 1);
        assert_eq!(merged[1].changeset.as_deref(), Some("0da89fac8e79"));
    }

    #[test]
    fn test_merge_appends_local_only() {
        let merged = merge(
            vec![release("6000.0.40f1")],
            vec![release("2021.3.45f1"), release("6000.0.40f1")],
        );
        assert_eq!(versions(&merged), vec!["6000.0.40f1", "2021.3.45f1"]);
    }

    #[test]
    fn test_merge_disjoint_is_commutative() {
        let a = vec![release("2022.3.1f1"), release("2022.3.2f1")];
        let b = vec![release("6000.0.1f1")];

        let mut ab: Vec<String> = merge(a.clone(), b.clone())
            .into_iter()
            .map(|r| r.version)
            .collect();
        let mut ba: Vec<String> = merge(b, a).into_iter().map(|r| r.version).collect();
        ab.sort();
        ba.sort();
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_is_richer() {
        let plain = release("2022.3.1f1");
        let mut with_modules = release("2022.3.1f1");
        with_modules.modules = vec![module("android")];
        let mut with_changeset = release("2022.3.1f1");
        with_changeset.changeset = Some("abcdefabcdef".to_string());

        assert!(is_richer(&with_modules, &plain));
        assert!(!is_richer(&plain, &with_modules));
        assert!(is_richer(&with_changeset, &plain));
        assert!(!is_richer(&plain, &with_changeset));
        assert!(!is_richer(&plain, &plain.clone()));
        // changeset rule applies even when the candidate has fewer modules
        assert!(is_richer(&with_changeset, &with_modules));
    }

    #[test]
    fn test_deduplicate_first_wins_unless_richer() {
        let mut first = release("2022.3.1f1");
        first.recommended = true;
        let second = release("2022.3.1f1");
        let mut third = release("2022.3.1f1");
        third.modules = vec![module("android")];

        let out = deduplicate(vec![first.clone(), release("6000.0.1f1"), second]);
        assert_eq!(versions(&out), vec!["2022.3.1f1", "6000.0.1f1"]);
        assert!(out[0].recommended);

        let out = deduplicate(vec![first, release("6000.0.1f1"), third]);
        assert_eq!(versions(&out), vec!["2022.3.1f1", "6000.0.1f1"]);
        assert_eq!(out[0].modules.len(), 1);
    }

    #[test]
    fn test_deduplicate_is_idempotent() {
        let mut rich = release("2022.3.1f1");
        rich.modules = vec![module("ios")];
        let input = vec![
            release("2022.3.1f1"),
            release("6000.0.1f1"),
            rich,
            release("6000.0.1f1"),
        ];
        let once = deduplicate(input);
        let twice = deduplicate(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sort_by_date_then_version() {
        let mut records = vec![
            dated("2022.3.59f1", 10),
            dated("6000.0.40f1", 5),
            dated("2022.3.60f1", 20),
        ];
        sort_releases(&mut records);
        assert_eq!(versions(&records), vec!["2022.3.60f1", "2022.3.59f1", "6000.0.40f1"]);
    }

    #[test]
    fn test_sort_undated_by_version() {
        let mut records = vec![
            release("2022.3.9f1"),
            release("6000.4.0b6"),
            release("2022.3.10f1"),
            release("6000.4.0a5"),
        ];
        sort_releases(&mut records);
        assert_eq!(
            versions(&records),
            vec!["6000.4.0b6", "6000.4.0a5", "2022.3.10f1", "2022.3.9f1"]
        );
    }

    #[test]
    fn test_sort_mixed_interleaves_by_version() {
        let mut records = vec![
            release("2021.3.1f1"),
            dated("2022.3.2f1", 2),
            release("6000.0.1f1"),
            dated("2022.3.1f1", 1),
        ];
        sort_releases(&mut records);
        assert_eq!(
            versions(&records),
            vec!["6000.0.1f1", "2022.3.2f1", "2022.3.1f1", "2021.3.1f1"]
        );
    }

    #[test]
    fn test_latest_per_stream() {
        let records = vec![
            release("2022.3.59f1"),
            release("6000.0.40f1"),
            release("2022.3.60f1"),
            release("6000.0.39f1"),
        ];
        let latest: Vec<&str> = latest_per_stream(&records)
            .into_iter()
            .map(|r| r.version.as_str())
            .collect();
        assert_eq!(latest, vec!["2022.3.60f1", "6000.0.40f1"]);
    }
}

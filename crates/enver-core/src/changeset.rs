//! In-memory version -> changeset lookup with expiry.
//!
//! Owned by whoever resolves catalogs; tests construct their own instances.

use enver_schema::ReleaseRecord;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Entry {
    changeset: String,
    stored_at: Instant,
}

/// Version to changeset lookup whose entries expire after a fixed TTL.
#[derive(Debug, Clone)]
pub struct ChangesetCache {
    ttl: Duration,
    entries: HashMap<String, Entry>,
}

impl ChangesetCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Empty changesets are ignored.
    fn insert_at(&mut self, version: String, changeset: String, stored_at: Instant) {
        if changeset.is_empty() {
            return;
        }
        self.entries.insert(
            version,
            Entry {
                changeset,
                stored_at,
            },
        );
    }

    /// Record every known changeset from a set of releases.
    pub fn extend_from(&mut self, releases: &[ReleaseRecord]) {
        let now = Instant::now();
        for release in releases {
            if let Some(changeset) = release.changeset.as_ref().filter(|c| !c.is_empty()) {
                self.insert_at(release.version.clone(), changeset.clone(), now);
            }
        }
    }

    /// Changeset for `version`, if known and not expired.
    pub fn get(&self, version: &str) -> Option<&str> {
        self.get_at(version, Instant::now())
    }

    fn get_at(&self, version: &str, now: Instant) -> Option<&str> {
        self.entries
            .get(version)
            .filter(|e| now.duration_since(e.stored_at) < self.ttl)
            .map(|e| e.changeset.as_str())
    }

    /// Drop expired entries.
    pub fn purge_expired(&mut self) {
        let now = Instant::now();
        let ttl = self.ttl;
        self.entries
            .retain(|_, e| now.duration_since(e.stored_at) < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(version: &str, changeset: &str) -> ReleaseRecord {
        let mut release = ReleaseRecord::new(version);
        release.changeset = Some(changeset.to_string());
        release
    }

    #[test]
    fn test_extend_and_get() {
        let mut cache = ChangesetCache::new(Duration::from_secs(60));
        cache.extend_from(&[release("2022.3.60f1", "b2e806cf271c")]);
        assert_eq!(cache.get("2022.3.60f1"), Some("b2e806cf271c"));
        assert_eq!(cache.get("2022.3.61f1"), None);
    }

    #[test]
    fn test_empty_changeset_ignored() {
        let mut cache = ChangesetCache::new(Duration::from_secs(60));
        cache.extend_from(&[release("2022.3.60f1", ""), ReleaseRecord::new("2022.3.59f1")]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entries_expire() {
        let mut cache = ChangesetCache::new(Duration::from_secs(60));
        let old = Instant::now();
        cache.insert_at("6000.0.1f1".into(), "abc".into(), old);

        assert_eq!(cache.get_at("6000.0.1f1", old + Duration::from_secs(59)), Some("abc"));
        assert_eq!(cache.get_at("6000.0.1f1", old + Duration::from_secs(61)), None);
    }

    #[test]
    fn test_zero_ttl_purges_everything() {
        let mut cache = ChangesetCache::new(Duration::ZERO);
        cache.extend_from(&[release("6000.0.1f1", "abc")]);
        cache.purge_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_isolated_instances() {
        let mut a = ChangesetCache::new(Duration::from_secs(60));
        let b = ChangesetCache::new(Duration::from_secs(60));
        a.extend_from(&[release("2021.3.45f1", "0da89fac8e79")]);
        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
    }
}

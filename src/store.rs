use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::model::{Field, Record};

/// Bucket key for records whose branch or section is unset.
pub const UNKNOWN_BUCKET: &str = "Unknown";

/// Which fields a search touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTarget {
    Field(Field),
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub branches: BTreeMap<String, usize>,
    pub sections: BTreeMap<String, usize>,
}

/// In-memory ordered record collection. A load replaces the backing
/// vector wholesale behind a single `Arc` swap; readers take a
/// snapshot and never observe a partially written store.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: RwLock<Arc<Vec<Record>>>,
}

impl RecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `records` as the store's current value. Last write
    /// wins; there is no merge.
    pub fn load(&self, records: Vec<Record>) {
        let mut guard = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(records);
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Record>> {
        Arc::clone(&self.records.read().unwrap_or_else(PoisonError::into_inner))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Case-insensitive exact match on one field; first hit in store
    /// order.
    #[must_use]
    pub fn find_by_key(&self, field: Field, value: &str) -> Option<Record> {
        let needle = value.to_lowercase();
        self.snapshot()
            .iter()
            .find(|record| record.field(field).to_lowercase() == needle)
            .cloned()
    }

    /// Case-insensitive substring match against one field or all five.
    /// A record appears once even when several fields match; result
    /// order is store order.
    #[must_use]
    pub fn search(&self, query: &str, target: SearchTarget) -> Vec<Record> {
        let needle = query.to_lowercase();
        self.snapshot()
            .iter()
            .filter(|record| match target {
                SearchTarget::Field(field) => {
                    record.field(field).to_lowercase().contains(&needle)
                }
                SearchTarget::All => Field::ALL
                    .iter()
                    .any(|&field| record.field(field).to_lowercase().contains(&needle)),
            })
            .cloned()
            .collect()
    }

    /// Single-pass tally of totals and per-branch / per-section
    /// counts. Unset values land under [`UNKNOWN_BUCKET`] rather than
    /// being dropped.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let snapshot = self.snapshot();
        let mut stats = StoreStats {
            total: snapshot.len(),
            ..StoreStats::default()
        };

        for record in snapshot.iter() {
            *stats.branches.entry(bucket(&record.branch)).or_insert(0) += 1;
            *stats.sections.entry(bucket(&record.section)).or_insert(0) += 1;
        }

        stats
    }
}

fn bucket(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        UNKNOWN_BUCKET.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordStore, SearchTarget, UNKNOWN_BUCKET};
    use crate::model::{Field, Record};

    fn record(roll: &str, app: &str, name: &str, branch: &str, section: &str) -> Record {
        Record {
            roll_no: roll.to_string(),
            application_no: app.to_string(),
            candidate_name: name.to_string(),
            branch: branch.to_string(),
            section: section.to_string(),
        }
    }

    fn seeded_store() -> RecordStore {
        let store = RecordStore::new();
        store.load(vec![
            record("24/A01/001", "240310038495", "AADIT MOGHA", "CS", "Sec-1"),
            record("24/A01/005", "OIA240000233", "AADYANH GUPTA", "CS", "Sec-1"),
            record("24/B02/011", "INT202400993", "Aashi Gupta", "EC", ""),
        ]);
        store
    }

    #[test]
    fn find_by_key_is_case_insensitive() {
        let store = seeded_store();
        let found = store
            .find_by_key(Field::Rno, "24/a01/001")
            .expect("record should be found");
        assert_eq!(found.candidate_name, "AADIT MOGHA");
        assert!(store.find_by_key(Field::Rno, "24/A01/999").is_none());
    }

    #[test]
    fn find_by_key_returns_first_match_in_store_order() {
        let store = RecordStore::new();
        store.load(vec![
            record("24/A01/001", "1", "FIRST", "CS", "Sec-1"),
            record("24/A01/001", "2", "SECOND", "CS", "Sec-1"),
        ]);
        let found = store
            .find_by_key(Field::Rno, "24/A01/001")
            .expect("record should be found");
        assert_eq!(found.candidate_name, "FIRST");
    }

    #[test]
    fn search_single_field_is_substring_match() {
        let store = seeded_store();
        let hits = store.search("gupta", SearchTarget::Field(Field::Cn));
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].candidate_name, "AADYANH GUPTA");
        assert_eq!(hits[1].candidate_name, "Aashi Gupta");
    }

    #[test]
    fn search_all_matches_any_field_without_duplicates() {
        let store = seeded_store();
        // "24" appears in Rno and Jno of the same records; each record
        // still appears exactly once, in store order.
        let hits = store.search("24", SearchTarget::All);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].roll_no, "24/A01/001");
        assert_eq!(hits[2].roll_no, "24/B02/011");

        let union_size = Field::ALL
            .iter()
            .flat_map(|&field| store.search("24", SearchTarget::Field(field)))
            .map(|record| record.roll_no)
            .collect::<std::collections::BTreeSet<_>>()
            .len();
        assert_eq!(hits.len(), union_size);
    }

    #[test]
    fn search_misses_return_empty_not_error() {
        let store = seeded_store();
        assert!(store.search("zzz", SearchTarget::All).is_empty());
    }

    #[test]
    fn stats_buckets_unset_values_under_unknown() {
        let store = seeded_store();
        let stats = store.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.branches.get("CS"), Some(&2));
        assert_eq!(stats.branches.get("EC"), Some(&1));
        assert_eq!(stats.sections.get("Sec-1"), Some(&2));
        assert_eq!(stats.sections.get(UNKNOWN_BUCKET), Some(&1));
    }

    #[test]
    fn stats_on_empty_store_is_zeroed() {
        let store = RecordStore::new();
        let stats = store.stats();
        assert_eq!(stats.total, 0);
        assert!(stats.branches.is_empty());
        assert!(stats.sections.is_empty());
    }

    #[test]
    fn load_replaces_wholesale() {
        let store = seeded_store();
        store.load(vec![record("25/C03/100", "X", "NEW ONLY", "ME", "Sec-2")]);
        assert_eq!(store.len(), 1);
        assert!(store.find_by_key(Field::Rno, "24/A01/001").is_none());
    }
}

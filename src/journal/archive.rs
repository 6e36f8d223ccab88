use crate::journal::date_key::{Clock, DateKey};
use crate::journal::kv::KeyValueStore;
use crate::journal::practice::{Domain, Practice};
use crate::journal::state::{Origin, load_collection, save_json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::Arc;

pub const MAX_SAVED_ENTRIES: usize = 200;

/// Full saved content for one practice domain and calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveEntry<C> {
    pub date: DateKey,
    pub timestamp: i64,
    #[serde(alias = "data")]
    pub content: C,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub date: DateKey,
    pub timestamp: i64,
    pub replaced: bool,
    pub evicted: Vec<DateKey>,
    pub persisted: bool,
}

/// Retention-capped store of full entries, kept newest-first by timestamp.
pub struct DetailedArchive<P: Practice> {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    key: String,
    max_entries: usize,
    entries: Vec<ArchiveEntry<P::Content>>,
    last_write_ok: bool,
    _practice: PhantomData<P>,
}

impl<P: Practice> DetailedArchive<P> {
    pub fn load(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, max_entries: usize) -> Self {
        let key = P::DOMAIN.archive_key();
        let mut entries: Vec<ArchiveEntry<P::Content>> = load_collection(
            kv.as_ref(),
            Origin {
                stage: "archive",
                domain: P::DOMAIN.label(),
                key: &key,
            },
        );
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        // Over-cap collections (a lowered cap, legacy data) are trimmed in
        // memory; the next write persists the trimmed list.
        let max_entries = max_entries.max(1);
        entries.truncate(max_entries);
        Self {
            kv,
            clock,
            key,
            max_entries,
            entries,
            last_write_ok: true,
            _practice: PhantomData,
        }
    }

    pub fn domain(&self) -> Domain {
        P::DOMAIN
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn last_write_ok(&self) -> bool {
        self.last_write_ok
    }

    /// Upserts the entry for `date`, then evicts the oldest entries beyond
    /// the retention cap.
    pub fn save(&mut self, date: DateKey, content: P::Content) -> SaveOutcome {
        let before = self.entries.len();
        self.entries.retain(|e| e.date != date);
        let replaced = self.entries.len() != before;

        let timestamp = self.clock.now_epoch_millis();
        self.entries.insert(
            0,
            ArchiveEntry {
                date,
                timestamp,
                content,
            },
        );
        self.entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let evicted = if self.entries.len() > self.max_entries {
            self.entries
                .split_off(self.max_entries)
                .into_iter()
                .map(|e| e.date)
                .collect()
        } else {
            Vec::new()
        };

        let persisted = self.flush();
        SaveOutcome {
            date,
            timestamp,
            replaced,
            evicted,
            persisted,
        }
    }

    pub fn get(&self, date: DateKey) -> Option<&ArchiveEntry<P::Content>> {
        self.entries.iter().find(|e| e.date == date)
    }

    /// Removes the saved entry. The completion ledger is deliberately left
    /// alone: a deleted reflection still counts as a practiced day.
    pub fn delete(&mut self, date: DateKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.date != date);
        if self.entries.len() == before {
            return false;
        }
        self.flush();
        true
    }

    /// All saved entries, newest first.
    pub fn list(&self) -> &[ArchiveEntry<P::Content>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops duplicate dates, keeping the most recently stamped entry.
    pub(crate) fn dedupe(&mut self) -> usize {
        let mut seen = BTreeSet::new();
        let before = self.entries.len();
        // Newest-first order means the first occurrence is the one to keep.
        self.entries.retain(|e| seen.insert(e.date));
        before - self.entries.len()
    }

    pub(crate) fn flush(&mut self) -> bool {
        self.last_write_ok = save_json(
            self.kv.as_ref(),
            Origin {
                stage: "archive",
                domain: P::DOMAIN.label(),
                key: &self.key,
            },
            &self.entries,
        );
        self.last_write_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::date_key::FixedClock;
    use crate::journal::kv::MemoryStore;
    use crate::journal::practice::{DetailedReview, EveningReview, Gratitude, GratitudeContent};
    use chrono::Duration;

    fn content(item: &str) -> GratitudeContent {
        GratitudeContent {
            items: vec![item.to_string()],
        }
    }

    fn key(raw: &str) -> DateKey {
        DateKey::parse(raw).expect("date")
    }

    #[test]
    fn saving_past_cap_evicts_smallest_timestamp() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::on("2024-01-01"));
        let mut archive: DetailedArchive<Gratitude> =
            DetailedArchive::load(kv.clone(), clock.clone(), MAX_SAVED_ENTRIES);

        let first = key("2020-01-01");
        let mut last = None;
        for offset in 0..201 {
            let date = first.add_days(offset).expect("date");
            last = Some(archive.save(date, content("x")));
            clock.advance(Duration::seconds(1));
        }

        assert_eq!(archive.len(), 200);
        assert!(archive.get(first).is_none());
        let outcome = last.expect("outcome");
        assert_eq!(outcome.evicted, vec![first]);

        let stored: Vec<ArchiveEntry<GratitudeContent>> =
            serde_json::from_str(&kv.raw("saved_gratitude_entries").expect("stored")).expect("json");
        assert_eq!(stored.len(), 200);
    }

    #[test]
    fn load_trims_to_a_lowered_cap() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::on("2024-01-01"));
        let mut archive: DetailedArchive<Gratitude> =
            DetailedArchive::load(kv.clone(), clock.clone(), 3);
        for day in ["2023-12-01", "2023-12-02", "2023-12-03"] {
            archive.save(key(day), content(day));
            clock.advance(Duration::seconds(1));
        }

        let mut smaller: DetailedArchive<Gratitude> = DetailedArchive::load(kv.clone(), clock, 2);
        assert_eq!(smaller.len(), 2);
        assert!(smaller.get(key("2023-12-01")).is_none());
        let dates: Vec<DateKey> = smaller.list().iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![key("2023-12-03"), key("2023-12-02")]);

        smaller.delete(key("2023-12-02"));
        let stored: Vec<ArchiveEntry<GratitudeContent>> =
            serde_json::from_str(&kv.raw("saved_gratitude_entries").expect("stored")).expect("json");
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn eviction_follows_timestamp_not_date() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::on("2024-01-01"));
        let mut archive: DetailedArchive<Gratitude> = DetailedArchive::load(kv, clock.clone(), 2);

        // Backfilled old date saved last survives; the first save goes.
        archive.save(key("2024-01-05"), content("a"));
        clock.advance(Duration::seconds(1));
        archive.save(key("2024-01-06"), content("b"));
        clock.advance(Duration::seconds(1));
        let outcome = archive.save(key("2023-06-01"), content("c"));

        assert_eq!(outcome.evicted, vec![key("2024-01-05")]);
        assert!(archive.get(key("2023-06-01")).is_some());
    }

    #[test]
    fn saving_same_date_replaces() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::on("2024-01-01"));
        let mut archive: DetailedArchive<Gratitude> =
            DetailedArchive::load(kv, clock.clone(), MAX_SAVED_ENTRIES);

        let first = archive.save(key("2024-01-01"), content("first"));
        assert!(!first.replaced);
        clock.advance(Duration::minutes(5));
        let second = archive.save(key("2024-01-01"), content("second"));
        assert!(second.replaced);

        assert_eq!(archive.len(), 1);
        let entry = archive.get(key("2024-01-01")).expect("entry");
        assert_eq!(entry.content.items, vec!["second"]);
        assert_eq!(entry.timestamp, second.timestamp);
    }

    #[test]
    fn list_is_newest_first() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::on("2024-01-01"));
        let mut archive: DetailedArchive<EveningReview> =
            DetailedArchive::load(kv.clone(), clock.clone(), MAX_SAVED_ENTRIES);

        archive.save(key("2024-01-03"), DetailedReview::default());
        clock.advance(Duration::seconds(1));
        archive.save(key("2024-01-01"), DetailedReview::default());
        clock.advance(Duration::seconds(1));
        archive.save(key("2024-01-02"), DetailedReview::default());

        let dates: Vec<String> = archive.list().iter().map(|e| e.date.as_key()).collect();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-01", "2024-01-03"]);

        let reloaded: DetailedArchive<EveningReview> =
            DetailedArchive::load(kv, clock, MAX_SAVED_ENTRIES);
        let dates: Vec<String> = reloaded.list().iter().map(|e| e.date.as_key()).collect();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-01", "2024-01-03"]);
    }

    #[test]
    fn delete_removes_only_that_date() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::on("2024-01-01"));
        let mut archive: DetailedArchive<Gratitude> =
            DetailedArchive::load(kv, clock, MAX_SAVED_ENTRIES);

        archive.save(key("2024-01-01"), content("a"));
        archive.save(key("2024-01-02"), content("b"));
        assert!(archive.delete(key("2024-01-01")));
        assert!(!archive.delete(key("2024-01-01")));
        assert_eq!(archive.len(), 1);
        assert!(archive.get(key("2024-01-02")).is_some());
    }

    #[test]
    fn loads_legacy_data_field() {
        let raw = r#"[{"date":"2024-02-01","timestamp":5,"data":{"resentfulFlag":"no","stayedSober":true}}]"#;
        let kv = Arc::new(MemoryStore::with("saved_evening_review_entries", raw));
        let clock = Arc::new(FixedClock::on("2024-02-02"));
        let archive: DetailedArchive<EveningReview> =
            DetailedArchive::load(kv, clock, MAX_SAVED_ENTRIES);
        let entry = archive.get(key("2024-02-01")).expect("entry");
        assert!(entry.content.stayed_sober);
    }
}

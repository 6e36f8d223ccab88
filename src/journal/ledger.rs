use crate::journal::date_key::{Clock, DateKey};
use crate::journal::kv::KeyValueStore;
use crate::journal::practice::{Domain, ItemList, Practice};
use crate::journal::state::{Origin, load_collection, save_json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// One lightweight record per practice domain per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry<T> {
    pub date: DateKey,
    pub payload: T,
    pub completed: bool,
    #[serde(default)]
    pub timestamp: i64,
}

/// Per-domain completion store. Holds the authoritative in-memory copy;
/// every mutation is written through to the key-value store.
pub struct CompletionLedger<P: Practice> {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    key: String,
    entries: Vec<LedgerEntry<P::Payload>>,
    last_write_ok: bool,
    _practice: PhantomData<P>,
}

impl<P: Practice> CompletionLedger<P> {
    pub fn load(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let key = P::DOMAIN.ledger_key();
        let entries = load_collection(
            kv.as_ref(),
            Origin {
                stage: "ledger",
                domain: P::DOMAIN.label(),
                key: &key,
            },
        );
        Self {
            kv,
            clock,
            key,
            entries,
            last_write_ok: true,
            _practice: PhantomData,
        }
    }

    pub fn domain(&self) -> Domain {
        P::DOMAIN
    }

    pub fn today(&self) -> DateKey {
        self.clock.today()
    }

    pub fn entries(&self) -> &[LedgerEntry<P::Payload>] {
        &self.entries
    }

    pub fn get(&self, date: DateKey) -> Option<&LedgerEntry<P::Payload>> {
        self.entries.iter().find(|e| e.date == date)
    }

    pub fn get_today(&self) -> Option<&LedgerEntry<P::Payload>> {
        self.get(self.today())
    }

    pub fn is_completed_today(&self) -> bool {
        self.get_today().is_some_and(|e| e.completed)
    }

    pub fn completed_total(&self) -> usize {
        self.entries.iter().filter(|e| e.completed).count()
    }

    /// False when the most recent write to the backing store failed.
    pub fn last_write_ok(&self) -> bool {
        self.last_write_ok
    }

    /// Overwrites today's payload; the day stays (or becomes) in progress.
    /// For item-list domains an empty result removes today's entry.
    pub fn replace_today(&mut self, payload: P::Payload) -> Option<&LedgerEntry<P::Payload>> {
        let today = self.today();
        let payload = P::normalize(payload);
        if P::is_blank(&payload) {
            let before = self.entries.len();
            self.entries.retain(|e| e.date != today);
            if self.entries.len() != before {
                self.flush();
            }
            return None;
        }
        let entry = self.stamped(today, payload, false);
        let idx = self.put(entry);
        self.flush();
        self.entries.get(idx)
    }

    /// Writes today's entry as completed. Calling it again replaces the same
    /// entry; there is never more than one record for today.
    pub fn complete(&mut self, payload: P::Payload) -> &LedgerEntry<P::Payload> {
        let today = self.today();
        let entry = self.stamped(today, P::normalize(payload), true);
        let idx = self.put(entry);
        self.flush();
        &self.entries[idx]
    }

    /// Reopens today's practice for editing, keeping its payload.
    pub fn uncomplete(&mut self) -> Option<&LedgerEntry<P::Payload>> {
        let today = self.today();
        let now = self.clock.now_epoch_millis();
        let idx = self.entries.iter().position(|e| e.date == today)?;
        let entry = &mut self.entries[idx];
        if entry.completed {
            entry.completed = false;
            entry.timestamp = now;
            self.flush();
        }
        self.entries.get(idx)
    }

    fn stamped(&self, date: DateKey, payload: P::Payload, completed: bool) -> LedgerEntry<P::Payload> {
        LedgerEntry {
            date,
            payload,
            completed,
            timestamp: self.clock.now_epoch_millis(),
        }
    }

    /// Inserts or replaces the entry for `entry.date` in memory and returns
    /// its index. Does not write.
    pub(crate) fn put(&mut self, entry: LedgerEntry<P::Payload>) -> usize {
        match self.entries.iter().position(|e| e.date == entry.date) {
            Some(idx) => {
                self.entries[idx] = entry;
                idx
            }
            None => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        }
    }

    pub(crate) fn now_epoch_millis(&self) -> i64 {
        self.clock.now_epoch_millis()
    }

    /// Collapses duplicate date keys, keeping the most recently stamped
    /// record (later position wins a tie). Returns how many were dropped.
    pub(crate) fn dedupe(&mut self) -> usize {
        let mut best: BTreeMap<DateKey, usize> = BTreeMap::new();
        for (idx, entry) in self.entries.iter().enumerate() {
            match best.get(&entry.date) {
                Some(&prev) if self.entries[prev].timestamp > entry.timestamp => {}
                _ => {
                    best.insert(entry.date, idx);
                }
            }
        }
        let before = self.entries.len();
        if best.len() == before {
            return 0;
        }
        let mut idx = 0usize;
        self.entries.retain(|entry| {
            let keep = best.get(&entry.date) == Some(&idx);
            idx += 1;
            keep
        });
        before - self.entries.len()
    }

    pub(crate) fn flush(&mut self) -> bool {
        self.last_write_ok = save_json(
            self.kv.as_ref(),
            Origin {
                stage: "ledger",
                domain: P::DOMAIN.label(),
                key: &self.key,
            },
            &self.entries,
        );
        self.last_write_ok
    }
}

impl<P> CompletionLedger<P>
where
    P: Practice,
    P::Payload: ItemList,
{
    /// Appends non-blank items to today's list, creating the entry if needed.
    /// The day is left in progress.
    pub fn append_to_today<S: AsRef<str>>(&mut self, items: &[S]) -> &LedgerEntry<P::Payload> {
        let today = self.today();
        let mut payload = self
            .get(today)
            .map(|e| e.payload.clone())
            .unwrap_or_default();
        payload.items_mut().extend(
            items
                .iter()
                .map(|s| s.as_ref())
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string),
        );
        let entry = self.stamped(today, P::normalize(payload), false);
        let idx = self.put(entry);
        self.flush();
        &self.entries[idx]
    }

    /// Removes one item from today's list. Leaves `completed` untouched.
    pub fn delete_item(&mut self, index: usize) -> Option<String> {
        let today = self.today();
        let now = self.clock.now_epoch_millis();
        let entry = self.entries.iter_mut().find(|e| e.date == today)?;
        if index >= entry.payload.items().len() {
            return None;
        }
        let removed = entry.payload.items_mut().remove(index);
        entry.timestamp = now;
        self.flush();
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::date_key::FixedClock;
    use crate::journal::kv::{FailingStore, MemoryStore};
    use crate::journal::practice::{EveningReview, Gratitude, GratitudePayload, ReviewAnswers};
    use chrono::Duration;

    fn gratitude(kv: Arc<dyn KeyValueStore>, clock: Arc<FixedClock>) -> CompletionLedger<Gratitude> {
        CompletionLedger::load(kv, clock)
    }

    fn items(list: &[&str]) -> GratitudePayload {
        GratitudePayload {
            items: list.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn complete_twice_yields_one_completed_entry() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::on("2024-03-05"));
        let mut ledger = gratitude(kv.clone(), clock);

        ledger.complete(items(&["sunrise", "coffee"]));
        ledger.complete(items(&["sunrise", "coffee"]));

        assert_eq!(ledger.entries().len(), 1);
        let today = ledger.get_today().expect("today");
        assert!(today.completed);
        assert_eq!(today.payload.items, vec!["sunrise", "coffee"]);

        let stored: Vec<LedgerEntry<GratitudePayload>> =
            serde_json::from_str(&kv.raw("gratitude_entries").expect("stored")).expect("json");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].date.as_key(), "2024-03-05");
    }

    #[test]
    fn append_merges_and_leaves_day_in_progress() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::on("2024-03-05"));
        let mut ledger = gratitude(kv, clock);

        ledger.append_to_today(&["family"]);
        let entry = ledger.append_to_today(&["", "health", "  "]);
        assert_eq!(entry.payload.items, vec!["family", "health"]);
        assert!(!entry.completed);
        assert!(!ledger.is_completed_today());
    }

    #[test]
    fn append_after_complete_reopens_the_day() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::on("2024-03-05"));
        let mut ledger = gratitude(kv, clock);

        ledger.complete(items(&["a"]));
        let entry = ledger.append_to_today(&["b"]);
        assert_eq!(entry.payload.items, vec!["a", "b"]);
        assert!(!entry.completed);
    }

    #[test]
    fn replace_with_empty_list_deletes_today() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::on("2024-03-05"));
        let mut ledger = gratitude(kv, clock);

        ledger.append_to_today(&["one", "two"]);
        let replaced = ledger.replace_today(items(&["three"])).expect("entry");
        assert_eq!(replaced.payload.items, vec!["three"]);

        assert!(ledger.replace_today(items(&[" "])).is_none());
        assert!(ledger.get_today().is_none());
        assert!(ledger.entries().is_empty());
    }

    #[test]
    fn uncomplete_keeps_payload() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::on("2024-03-05"));
        let mut ledger = gratitude(kv, clock);

        assert!(ledger.uncomplete().is_none());
        ledger.complete(items(&["a", "b"]));
        let reopened = ledger.uncomplete().expect("entry");
        assert!(!reopened.completed);
        assert_eq!(reopened.payload.items, vec!["a", "b"]);
    }

    #[test]
    fn delete_item_preserves_completion() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::on("2024-03-05"));
        let mut ledger = gratitude(kv, clock);

        ledger.complete(items(&["a", "b", "c"]));
        assert_eq!(ledger.delete_item(1).as_deref(), Some("b"));
        assert_eq!(ledger.delete_item(9), None);
        let today = ledger.get_today().expect("today");
        assert!(today.completed);
        assert_eq!(today.payload.items, vec!["a", "c"]);
    }

    #[test]
    fn new_day_starts_without_entry() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::on("2024-03-05"));
        let mut ledger = gratitude(kv, clock.clone());

        ledger.complete(items(&["a"]));
        clock.advance(Duration::days(1));
        assert!(ledger.get_today().is_none());
        assert!(!ledger.is_completed_today());
        assert_eq!(ledger.completed_total(), 1);
    }

    #[test]
    fn reload_reads_what_was_written() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::on("2024-03-05"));
        {
            let mut ledger: CompletionLedger<EveningReview> =
                CompletionLedger::load(kv.clone(), clock.clone());
            ledger.complete(ReviewAnswers {
                kindness: true,
                ..ReviewAnswers::default()
            });
        }
        let ledger: CompletionLedger<EveningReview> = CompletionLedger::load(kv, clock);
        let today = ledger.get_today().expect("today");
        assert!(today.completed);
        assert!(today.payload.kindness);
    }

    #[test]
    fn malformed_storage_loads_as_empty() {
        let kv = Arc::new(MemoryStore::with("gratitude_entries", "{\"oops\":true}"));
        let clock = Arc::new(FixedClock::on("2024-03-05"));
        let ledger = gratitude(kv, clock);
        assert!(ledger.entries().is_empty());
    }

    #[test]
    fn failed_write_keeps_memory_state() {
        let kv = Arc::new(FailingStore::new());
        let clock = Arc::new(FixedClock::on("2024-03-05"));
        let mut ledger = gratitude(kv.clone(), clock);

        ledger.complete(items(&["a"]));
        assert!(!ledger.last_write_ok());
        assert!(ledger.is_completed_today());
        assert!(kv.inner.raw("gratitude_entries").is_none());

        kv.set_failing(false);
        ledger.append_to_today(&["b"]);
        assert!(ledger.last_write_ok());
        assert!(kv.inner.raw("gratitude_entries").is_some());
    }

    #[test]
    fn dedupe_prefers_latest_timestamp() {
        let raw = r#"[
            {"date":"2024-03-01","payload":{"items":["old"]},"completed":false,"timestamp":10},
            {"date":"2024-03-01","payload":{"items":["new"]},"completed":true,"timestamp":20},
            {"date":"2024-03-02","payload":{"items":["x"]},"completed":true,"timestamp":5}
        ]"#;
        let kv = Arc::new(MemoryStore::with("gratitude_entries", raw));
        let clock = Arc::new(FixedClock::on("2024-03-05"));
        let mut ledger = gratitude(kv, clock);

        assert_eq!(ledger.dedupe(), 1);
        assert_eq!(ledger.entries().len(), 2);
        let kept = ledger.get(DateKey::parse("2024-03-01").expect("date")).expect("kept");
        assert_eq!(kept.payload.items, vec!["new"]);
        assert_eq!(ledger.dedupe(), 0);
    }
}

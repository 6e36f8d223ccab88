use crate::journal::archive::DetailedArchive;
use crate::journal::date_key::DateKey;
use crate::journal::ledger::{CompletionLedger, LedgerEntry};
use crate::journal::practice::Practice;

/// What an archive write did to the ledger entry for the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Created,
    Completed,
    Refreshed,
    Unchanged,
    /// Today is in progress (or not started); it is never completed from
    /// under the user.
    SkippedToday,
}

impl SyncAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Completed => "completed",
            Self::Refreshed => "refreshed",
            Self::Unchanged => "unchanged",
            Self::SkippedToday => "skipped-today",
        }
    }
}

/// Applies the archive-to-ledger rule for one archive write: the ledger
/// entry for `date` becomes completed with a payload derived from the saved
/// content, unless `date` is today and today is not already completed.
pub fn sync_archive_write<P: Practice>(
    ledger: &mut CompletionLedger<P>,
    date: DateKey,
    content: &P::Content,
) -> SyncAction {
    let today = ledger.today();
    let existing = ledger.get(date).map(|e| (e.completed, e.payload.clone()));
    if date == today && !existing.as_ref().is_some_and(|(completed, _)| *completed) {
        return SyncAction::SkippedToday;
    }

    let derived = P::normalize(P::derive_payload(content));
    let action = match &existing {
        None => SyncAction::Created,
        Some((false, _)) => SyncAction::Completed,
        Some((true, payload)) if *payload == derived => return SyncAction::Unchanged,
        Some((true, _)) => SyncAction::Refreshed,
    };

    let timestamp = ledger.now_epoch_millis();
    ledger.put(LedgerEntry {
        date,
        payload: derived,
        completed: true,
        timestamp,
    });
    ledger.flush();
    action
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub scanned: usize,
    pub created: usize,
    pub repaired: usize,
    pub skipped_today: usize,
    pub ledger_duplicates: usize,
    pub archive_duplicates: usize,
    pub ledger_updated: bool,
    pub archive_updated: bool,
}

impl ReconcileOutcome {
    pub fn changed(&self) -> bool {
        self.ledger_updated || self.archive_updated
    }
}

/// Start-up repair pass. Collapses duplicate dates in both stores, then
/// makes sure every archived non-today date has a completed ledger entry.
/// Safe to run any number of times.
pub fn reconcile<P: Practice>(
    ledger: &mut CompletionLedger<P>,
    archive: &mut DetailedArchive<P>,
) -> ReconcileOutcome {
    let mut out = ReconcileOutcome {
        ledger_duplicates: ledger.dedupe(),
        archive_duplicates: archive.dedupe(),
        ..ReconcileOutcome::default()
    };
    let mut ledger_changed = out.ledger_duplicates > 0;
    let today = ledger.today();

    for saved in archive.list() {
        out.scanned += 1;
        let existing = ledger.get(saved.date).map(|e| (e.completed, e.payload.clone()));

        if saved.date == today {
            if !existing.as_ref().is_some_and(|(completed, _)| *completed) {
                out.skipped_today += 1;
            }
            continue;
        }

        match existing {
            Some((true, _)) => {}
            None => {
                ledger.put(LedgerEntry {
                    date: saved.date,
                    payload: P::normalize(P::derive_payload(&saved.content)),
                    completed: true,
                    timestamp: saved.timestamp,
                });
                out.created += 1;
                ledger_changed = true;
            }
            Some((false, payload)) => {
                let payload = if P::count(&payload) == 0 {
                    P::normalize(P::derive_payload(&saved.content))
                } else {
                    payload
                };
                let timestamp = ledger.now_epoch_millis();
                ledger.put(LedgerEntry {
                    date: saved.date,
                    payload,
                    completed: true,
                    timestamp,
                });
                out.repaired += 1;
                ledger_changed = true;
            }
        }
    }

    if ledger_changed {
        ledger.flush();
        out.ledger_updated = true;
    }
    if out.archive_duplicates > 0 {
        archive.flush();
        out.archive_updated = true;
    }
    out
}

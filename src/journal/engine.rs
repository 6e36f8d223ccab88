use crate::journal::archive::{DetailedArchive, SaveOutcome};
use crate::journal::date_key::{Clock, DateKey};
use crate::journal::kv::KeyValueStore;
use crate::journal::ledger::CompletionLedger;
use crate::journal::milestone::MilestoneDetector;
use crate::journal::practice::{Domain, EveningReview, Gratitude, Practice};
use crate::journal::reconcile::{ReconcileOutcome, SyncAction, reconcile, sync_archive_write};
use crate::journal::sobriety::SobrietyProfile;
use std::sync::Arc;

/// Ledger and archive for one practice domain. Neither owns the other; the
/// archive-to-ledger rule is applied here on every archive write.
pub struct PracticeJournal<P: Practice> {
    pub ledger: CompletionLedger<P>,
    pub archive: DetailedArchive<P>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySaved {
    pub outcome: SaveOutcome,
    pub sync: SyncAction,
}

impl<P: Practice> PracticeJournal<P> {
    pub fn load(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, max_saved_entries: usize) -> Self {
        Self {
            ledger: CompletionLedger::load(kv.clone(), clock.clone()),
            archive: DetailedArchive::load(kv, clock, max_saved_entries),
        }
    }

    pub fn domain(&self) -> Domain {
        P::DOMAIN
    }

    pub fn save_entry(&mut self, date: DateKey, content: P::Content) -> EntrySaved {
        let sync = sync_archive_write(&mut self.ledger, date, &content);
        let outcome = self.archive.save(date, content);
        EntrySaved { outcome, sync }
    }

    pub fn reconcile(&mut self) -> ReconcileOutcome {
        reconcile(&mut self.ledger, &mut self.archive)
    }

    pub fn share_text(&self, date: DateKey) -> Option<String> {
        self.archive
            .get(date)
            .map(|entry| P::share_text(entry.date, &entry.content))
    }

    pub fn last_write_ok(&self) -> bool {
        self.ledger.last_write_ok() && self.archive.last_write_ok()
    }
}

/// Every store instance the process uses, built once at start-up.
pub struct Journal {
    clock: Arc<dyn Clock>,
    pub gratitude: PracticeJournal<Gratitude>,
    pub review: PracticeJournal<EveningReview>,
    pub milestones: MilestoneDetector,
    pub sobriety: SobrietyProfile,
}

impl Journal {
    pub fn open(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, max_saved_entries: usize) -> Self {
        Self {
            gratitude: PracticeJournal::load(kv.clone(), clock.clone(), max_saved_entries),
            review: PracticeJournal::load(kv.clone(), clock.clone(), max_saved_entries),
            milestones: MilestoneDetector::load(kv.clone(), clock.clone()),
            sobriety: SobrietyProfile::load(kv, clock.clone()),
            clock,
        }
    }

    pub fn today(&self) -> DateKey {
        self.clock.today()
    }

    pub fn reconcile_all(&mut self) -> Vec<(Domain, ReconcileOutcome)> {
        vec![
            (Domain::Gratitude, self.gratitude.reconcile()),
            (Domain::EveningReview, self.review.reconcile()),
        ]
    }
}

pub mod gratitude;
pub mod insights;
pub mod milestone;
pub mod progress;
pub mod reconcile;
pub mod review;
pub mod saved;
pub mod sobriety;
pub mod status;

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;

use crate::error::JournalErrorCode;
use crate::journal::audit;
use crate::journal::config::{JournalConfig, load_config};
use crate::journal::date_key::SystemClock;
use crate::journal::engine::Journal;
use crate::journal::kv::FileStore;
use crate::journal::lock::WriterLock;
use crate::journal::paths::{JournalPaths, resolve_paths};
use crate::journal::practice::Domain;
use crate::journal::reconcile::ReconcileOutcome;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }

    pub fn merge(&mut self, mut other: CommandReport) {
        self.ok &= other.ok;
        self.details.append(&mut other.details);
        self.issues.append(&mut other.issues);
    }

    /// Flags a write that only reached memory.
    pub fn persisted(&mut self, what: &str, ok: bool) {
        if !ok {
            self.issue(format!(
                "{}: {what} was not written to disk; it is kept in memory and retried on the next write",
                JournalErrorCode::E004WriteFailed.as_str()
            ));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Everything a command needs, opened in start-up order. Dropping it
/// releases the writer lock.
pub struct Session {
    pub paths: JournalPaths,
    pub config: JournalConfig,
    pub journal: Journal,
    _lock: Option<WriterLock>,
}

pub fn open_session(access: Access, report: &mut CommandReport) -> Result<Session> {
    open_session_with(access, true, report)
}

/// Reconciliation on start only runs for writers: a read-only command never
/// touches the store.
pub fn open_session_with(
    access: Access,
    allow_startup_reconcile: bool,
    report: &mut CommandReport,
) -> Result<Session> {
    let paths = resolve_paths()?;
    let config = load_config(&paths)?;
    let kv = Arc::new(FileStore::open(&paths.store_dir)?);
    let lock = match access {
        Access::Write => Some(WriterLock::acquire(&paths.store_dir)?),
        Access::Read => None,
    };
    let clock = Arc::new(SystemClock::new(config.timezone()));
    let journal = Journal::open(kv, clock, config.archive.max_saved_entries);

    let mut session = Session {
        paths,
        config,
        journal,
        _lock: lock,
    };
    if access == Access::Write && allow_startup_reconcile && session.config.startup.reconcile_on_start
    {
        let outcomes = session.journal.reconcile_all();
        for (domain, outcome) in &outcomes {
            if outcome.changed() {
                report.detail(format!("startup_reconcile.{}", describe_reconcile(*domain, outcome)));
                audit::record(
                    &session.paths,
                    "reconcile",
                    "repaired",
                    &describe_reconcile(*domain, outcome),
                );
            }
        }
    }
    Ok(session)
}

pub fn describe_reconcile(domain: Domain, outcome: &ReconcileOutcome) -> String {
    format!(
        "{domain} scanned={} created={} repaired={} skipped_today={} ledger_duplicates={} archive_duplicates={}",
        outcome.scanned,
        outcome.created,
        outcome.repaired,
        outcome.skipped_today,
        outcome.ledger_duplicates,
        outcome.archive_duplicates,
    )
}

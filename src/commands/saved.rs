use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use crate::commands::{Access, CommandReport, open_session};
use crate::error::JournalError;
use crate::journal::audit;
use crate::journal::date_key::DateKey;
use crate::journal::engine::PracticeJournal;
use crate::journal::paths::JournalPaths;
use crate::journal::practice::{DetailedReview, Domain, GratitudeContent, Practice};
use crate::journal::util::truncate_with_ellipsis;

#[derive(Debug, Clone)]
pub enum SavedAction {
    List,
    Show { date: DateKey },
    Delete { date: DateKey },
    Share { date: DateKey },
    Save {
        date: Option<DateKey>,
        items: Vec<String>,
        file: Option<PathBuf>,
    },
}

#[derive(Debug, Clone)]
pub struct SavedOptions {
    pub domain: Domain,
    pub action: SavedAction,
}

fn read_content<C: DeserializeOwned>(path: &Path) -> Result<C> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read entry file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse entry file {}", path.display()))
}

fn list<P: Practice>(journal: &PracticeJournal<P>, report: &mut CommandReport) {
    let archive = &journal.archive;
    report.detail(format!("saved={} max={}", archive.len(), archive.max_entries()));
    for entry in archive.list() {
        let preview = P::share_text(entry.date, &entry.content).replace('\n', " ");
        report.detail(format!(
            "{} count={} {}",
            entry.date,
            P::count(&P::derive_payload(&entry.content)),
            truncate_with_ellipsis(&preview, 60)
        ));
    }
}

fn show<P: Practice>(
    journal: &PracticeJournal<P>,
    date: DateKey,
    report: &mut CommandReport,
) -> Result<()> {
    let Some(entry) = journal.archive.get(date) else {
        report.issue(format!("no saved {} entry for {date}", P::DOMAIN));
        return Ok(());
    };
    report.detail(format!("date={}", entry.date));
    report.detail(format!("timestamp={}", entry.timestamp));
    report.detail(format!("content={}", serde_json::to_string(&entry.content)?));
    let completed = journal.ledger.get(date).is_some_and(|e| e.completed);
    report.detail(format!("ledger_completed={completed}"));
    Ok(())
}

fn share<P: Practice>(journal: &PracticeJournal<P>, date: DateKey, report: &mut CommandReport) {
    match journal.share_text(date) {
        Some(text) => {
            for line in text.lines() {
                report.detail(line.to_string());
            }
        }
        None => report.issue(format!("no saved {} entry for {date}", P::DOMAIN)),
    }
}

fn delete<P: Practice>(
    paths: &JournalPaths,
    journal: &mut PracticeJournal<P>,
    date: DateKey,
    report: &mut CommandReport,
) {
    if journal.archive.delete(date) {
        report.detail(format!("deleted={date}"));
        report.persisted("saved entries", journal.archive.last_write_ok());
        audit::record(paths, "archive-delete", "ok", &format!("{} {date}", P::DOMAIN));
    } else {
        report.issue(format!("no saved {} entry for {date}", P::DOMAIN));
    }
}

fn save<P: Practice>(
    paths: &JournalPaths,
    journal: &mut PracticeJournal<P>,
    date: DateKey,
    content: P::Content,
    report: &mut CommandReport,
) {
    let saved = journal.save_entry(date, content);
    report.detail(format!("saved={date}"));
    report.detail(format!("replaced={}", saved.outcome.replaced));
    report.detail(format!("ledger={}", saved.sync.as_str()));
    for evicted in &saved.outcome.evicted {
        report.detail(format!("evicted={evicted}"));
    }
    report.persisted("saved entry", journal.last_write_ok());
    audit::record(
        paths,
        "archive-save",
        "ok",
        &format!("{} {date} ledger={}", P::DOMAIN, saved.sync.as_str()),
    );
}

fn run_for<P: Practice>(
    paths: &JournalPaths,
    today: DateKey,
    journal: &mut PracticeJournal<P>,
    action: &SavedAction,
    content: Option<P::Content>,
    report: &mut CommandReport,
) -> Result<()> {
    match action {
        SavedAction::List => list(journal, report),
        SavedAction::Show { date } => show(journal, *date, report)?,
        SavedAction::Share { date } => share(journal, *date, report),
        SavedAction::Delete { date } => delete(paths, journal, *date, report),
        SavedAction::Save { date, .. } => {
            let date = date.unwrap_or(today);
            if date > today {
                let err = JournalError::DateOutOfRange(format!("{date} is after today ({today})"));
                report.issue(format!("{}: {err}", err.code().as_str()));
                return Ok(());
            }
            match content {
                Some(content) => save(paths, journal, date, content, report),
                None => report.issue("nothing to save: pass --item or --file"),
            }
        }
    }
    Ok(())
}

pub fn run(opts: &SavedOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new(format!("saved {}", opts.domain));
    let access = match opts.action {
        SavedAction::List | SavedAction::Show { .. } | SavedAction::Share { .. } => Access::Read,
        SavedAction::Delete { .. } | SavedAction::Save { .. } => Access::Write,
    };

    let (items, file) = match &opts.action {
        SavedAction::Save { items, file, .. } => (items.as_slice(), file.as_deref()),
        _ => (&[][..], None),
    };

    let mut session = open_session(access, &mut report)?;
    let today = session.journal.today();
    match opts.domain {
        Domain::Gratitude => {
            let content = match file {
                Some(path) => Some(read_content::<GratitudeContent>(path)?),
                None if items.iter().any(|i| !i.trim().is_empty()) => Some(GratitudeContent {
                    items: items
                        .iter()
                        .filter(|i| !i.trim().is_empty())
                        .cloned()
                        .collect(),
                }),
                None => None,
            };
            run_for(
                &session.paths,
                today,
                &mut session.journal.gratitude,
                &opts.action,
                content,
                &mut report,
            )?;
        }
        Domain::EveningReview => {
            if !items.is_empty() {
                report.issue("evening-review entries are saved from a JSON file: use --file");
                return Ok(report);
            }
            let content = file.map(read_content::<DetailedReview>).transpose()?;
            run_for(
                &session.paths,
                today,
                &mut session.journal.review,
                &opts.action,
                content,
                &mut report,
            )?;
        }
    }
    Ok(report)
}

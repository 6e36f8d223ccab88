use anyhow::Result;

use crate::commands::{Access, CommandReport, open_session};
use crate::journal::audit;
use crate::journal::engine::PracticeJournal;
use crate::journal::practice::{Gratitude, GratitudeContent, GratitudePayload};

#[derive(Debug, Clone)]
pub enum GratitudeAction {
    Today,
    Add { items: Vec<String> },
    Set { items: Vec<String> },
    /// 1-based, as shown by `today`.
    DeleteItem { index: usize },
    Complete { items: Vec<String> },
    Reopen,
}

impl GratitudeAction {
    fn access(&self) -> Access {
        match self {
            Self::Today => Access::Read,
            _ => Access::Write,
        }
    }
}

fn describe_today(journal: &PracticeJournal<Gratitude>, report: &mut CommandReport) {
    let ledger = &journal.ledger;
    report.detail(format!("date={}", ledger.today()));
    match ledger.get_today() {
        Some(entry) => {
            report.detail(format!("completed={}", entry.completed));
            report.detail(format!("items={}", entry.payload.items.len()));
            for (idx, item) in entry.payload.items.iter().enumerate() {
                report.detail(format!("{}. {item}", idx + 1));
            }
        }
        None => {
            report.detail("completed=false".to_string());
            report.detail("items=0".to_string());
        }
    }
}

pub fn run(action: &GratitudeAction) -> Result<CommandReport> {
    let mut report = CommandReport::new("gratitude");
    let mut session = open_session(action.access(), &mut report)?;
    let today = session.journal.today();
    let journal = &mut session.journal.gratitude;

    match action {
        GratitudeAction::Today => {}
        GratitudeAction::Add { items } => {
            let before = journal.ledger.get_today().map_or(0, |e| e.payload.items.len());
            let after = journal.ledger.append_to_today(items.as_slice()).payload.items.len();
            report.detail(format!("added={}", after - before));
            report.persisted("gratitude ledger", journal.ledger.last_write_ok());
        }
        GratitudeAction::Set { items } => {
            let replaced = journal.ledger.replace_today(GratitudePayload {
                items: items.clone(),
            });
            if replaced.is_none() {
                report.detail("today's list is empty; entry removed".to_string());
            }
            report.persisted("gratitude ledger", journal.ledger.last_write_ok());
        }
        GratitudeAction::DeleteItem { index } => {
            let removed = index
                .checked_sub(1)
                .and_then(|idx| journal.ledger.delete_item(idx));
            match removed {
                Some(item) => {
                    report.detail(format!("removed={item}"));
                    report.persisted("gratitude ledger", journal.ledger.last_write_ok());
                }
                None => report.issue(format!("no item #{index} in today's list")),
            }
        }
        GratitudeAction::Complete { items } => {
            let mut payload = journal
                .ledger
                .get_today()
                .map(|e| e.payload.clone())
                .unwrap_or_default();
            payload.items.extend(items.iter().cloned());
            if payload.items.iter().all(|item| item.trim().is_empty()) {
                report.issue("nothing to complete: add at least one item first");
            } else {
                let entry = journal.ledger.complete(payload);
                let content = GratitudeContent {
                    items: entry.payload.items.clone(),
                };
                let count = content.items.len();
                let saved = journal.save_entry(today, content);
                report.detail(format!("archive={}", saved.sync.as_str()));
                report.persisted("gratitude entry", journal.last_write_ok());
                audit::record(
                    &session.paths,
                    "complete",
                    "ok",
                    &format!("gratitude {today} items={count}"),
                );
            }
        }
        GratitudeAction::Reopen => {
            if journal.ledger.uncomplete().is_some() {
                report.persisted("gratitude ledger", journal.ledger.last_write_ok());
                audit::record(&session.paths, "reopen", "ok", &format!("gratitude {today}"));
            } else {
                report.issue("no gratitude entry for today to reopen");
            }
        }
    }

    describe_today(&session.journal.gratitude, &mut report);
    Ok(report)
}

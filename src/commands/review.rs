use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::commands::{Access, CommandReport, open_session};
use crate::journal::audit;
use crate::journal::date_key::DateKey;
use crate::journal::engine::PracticeJournal;
use crate::journal::practice::{DetailedReview, EveningReview, Practice, ReviewAnswers};
use crate::journal::reconcile::SyncAction;

#[derive(Debug, Clone)]
pub enum ReviewAction {
    Today,
    Complete {
        yes: Vec<String>,
        file: Option<PathBuf>,
    },
    Reopen,
}

pub fn read_detailed(path: &Path) -> Result<DetailedReview> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read review file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse review file {}", path.display()))
}

fn merge(a: ReviewAnswers, b: ReviewAnswers) -> ReviewAnswers {
    ReviewAnswers {
        resentful: a.resentful || b.resentful,
        selfish: a.selfish || b.selfish,
        fearful: a.fearful || b.fearful,
        apology: a.apology || b.apology,
        kindness: a.kindness || b.kindness,
        spiritual: a.spiritual || b.spiritual,
        aa_talk: a.aa_talk || b.aa_talk,
        prayer_meditation: a.prayer_meditation || b.prayer_meditation,
    }
}

/// Completes today with the `--yes` answers OR-ed with those derived from
/// `detailed`. The archive write goes first so its ledger sync cannot
/// overwrite the merged answers.
fn complete_today(
    journal: &mut PracticeJournal<EveningReview>,
    today: DateKey,
    yes: ReviewAnswers,
    detailed: Option<DetailedReview>,
) -> (ReviewAnswers, Option<SyncAction>) {
    let answers = match &detailed {
        Some(detailed) => merge(yes, EveningReview::derive_payload(detailed)),
        None => yes,
    };
    let sync = detailed.map(|detailed| journal.save_entry(today, detailed).sync);
    journal.ledger.complete(answers);
    (answers, sync)
}

fn describe_today(journal: &PracticeJournal<EveningReview>, report: &mut CommandReport) {
    let ledger = &journal.ledger;
    report.detail(format!("date={}", ledger.today()));
    let Some(entry) = ledger.get_today() else {
        report.detail("completed=false".to_string());
        return;
    };
    report.detail(format!("completed={}", entry.completed));
    report.detail(format!("yes_answers={}", entry.payload.yes_count()));
    for (name, yes) in entry.payload.pairs() {
        report.detail(format!("{name}={yes}"));
    }
}

pub fn run(action: &ReviewAction) -> Result<CommandReport> {
    let mut report = CommandReport::new("review");
    let access = match action {
        ReviewAction::Today => Access::Read,
        _ => Access::Write,
    };
    let mut session = open_session(access, &mut report)?;
    let today = session.journal.today();
    let journal = &mut session.journal.review;

    match action {
        ReviewAction::Today => {}
        ReviewAction::Complete { yes, file } => {
            let detailed = file.as_deref().map(read_detailed).transpose()?;
            let yes = ReviewAnswers::from_yes_names(yes.as_slice())?;
            let (answers, sync) = complete_today(journal, today, yes, detailed);
            if let Some(sync) = sync {
                report.detail(format!("archive={}", sync.as_str()));
            }
            report.persisted("evening review", journal.last_write_ok());
            audit::record(
                &session.paths,
                "complete",
                "ok",
                &format!("evening-review {today} yes={}", answers.yes_count()),
            );
        }
        ReviewAction::Reopen => {
            if journal.ledger.uncomplete().is_some() {
                report.persisted("evening review ledger", journal.ledger.last_write_ok());
                audit::record(
                    &session.paths,
                    "reopen",
                    "ok",
                    &format!("evening-review {today}"),
                );
            } else {
                report.issue("no evening review for today to reopen");
            }
        }
    }

    describe_today(&session.journal.review, &mut report);
    Ok(report)
}

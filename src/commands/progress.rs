use anyhow::Result;

use crate::commands::{Access, CommandReport, open_session};
use crate::journal::ledger::CompletionLedger;
use crate::journal::practice::{Domain, Practice};
use crate::journal::progress::{consecutive_streak, streak, weekly_progress};

fn describe<P: Practice>(ledger: &CompletionLedger<P>, report: &mut CommandReport) {
    let week = weekly_progress(ledger);
    if let Some(first) = week.first() {
        report.detail(format!("week_start={}", first.date));
    }
    for day in &week {
        let mark = if day.is_future {
            "·"
        } else if day.completed {
            "✓"
        } else {
            "-"
        };
        let today = if day.is_today { " (today)" } else { "" };
        report.detail(format!(
            "{} {} {mark} count={}{today}",
            day.day_name, day.date, day.count
        ));
    }
    report.detail(format!("streak={}", streak(&week)));
    report.detail(format!("consecutive_streak={}", consecutive_streak(ledger)));
    report.detail(format!("completed_total={}", ledger.completed_total()));
}

pub fn run(domain: Domain) -> Result<CommandReport> {
    let mut report = CommandReport::new(format!("progress {domain}"));
    let session = open_session(Access::Read, &mut report)?;
    match domain {
        Domain::Gratitude => describe(&session.journal.gratitude.ledger, &mut report),
        Domain::EveningReview => describe(&session.journal.review.ledger, &mut report),
    }
    Ok(report)
}

use anyhow::Result;

use crate::commands::{Access, CommandReport, open_session};
use crate::journal::ledger::CompletionLedger;
use crate::journal::practice::{Domain, Practice};
use crate::journal::progress::insights;

pub const DEFAULT_WINDOW_DAYS: u32 = 30;

fn describe<P: Practice>(ledger: &CompletionLedger<P>, days: u32, report: &mut CommandReport) {
    let summary = insights(ledger, days);
    report.detail(format!("window={}..{} days={}", summary.start, summary.end, summary.days));
    report.detail(format!("completed_days={}", summary.completed_days));
    report.detail(format!("total_count={}", summary.total_count));
    for (facet, count) in &summary.facets {
        report.detail(format!("{facet}={count}"));
    }
    report.detail(format!("completed_total={}", summary.completed_total));
}

pub fn run(domain: Domain, days: u32) -> Result<CommandReport> {
    let mut report = CommandReport::new(format!("insights {domain}"));
    if days == 0 {
        report.issue("--days must be at least 1");
        return Ok(report);
    }
    let session = open_session(Access::Read, &mut report)?;
    match domain {
        Domain::Gratitude => describe(&session.journal.gratitude.ledger, days, &mut report),
        Domain::EveningReview => describe(&session.journal.review.ledger, days, &mut report),
    }
    Ok(report)
}

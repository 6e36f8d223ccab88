use anyhow::Result;

use crate::commands::{Access, CommandReport, describe_reconcile, open_session_with};
use crate::journal::audit;

pub fn run() -> Result<CommandReport> {
    let mut report = CommandReport::new("reconcile");
    let mut session = open_session_with(Access::Write, false, &mut report)?;

    let outcomes = session.journal.reconcile_all();
    let mut changed = false;
    for (domain, outcome) in &outcomes {
        let line = describe_reconcile(*domain, outcome);
        report.detail(line.clone());
        changed |= outcome.changed();
        audit::record(
            &session.paths,
            "reconcile",
            if outcome.changed() { "repaired" } else { "clean" },
            &line,
        );
    }
    report.persisted(
        "gratitude stores",
        session.journal.gratitude.last_write_ok(),
    );
    report.persisted("evening review stores", session.journal.review.last_write_ok());
    report.detail(format!("changed={changed}"));
    Ok(report)
}

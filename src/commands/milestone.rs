use anyhow::Result;

use crate::commands::{Access, CommandReport, open_session};
use crate::journal::audit;
use crate::journal::date_key::DateKey;

#[derive(Debug, Clone)]
pub enum MilestoneAction {
    Check { start: Option<DateKey> },
    Ack { start: Option<DateKey> },
}

pub fn run(action: &MilestoneAction) -> Result<CommandReport> {
    let mut report = CommandReport::new("milestone");
    let (start, access) = match action {
        MilestoneAction::Check { start } => (*start, Access::Read),
        MilestoneAction::Ack { start } => (*start, Access::Write),
    };
    let mut session = open_session(access, &mut report)?;

    let start = match start {
        Some(date) => date.as_key(),
        None => match session.journal.sobriety.raw_date() {
            Some(raw) => raw.to_string(),
            None => {
                report.issue("no sobriety date set: run `journal sobriety set <DATE>` or pass --start");
                return Ok(report);
            }
        },
    };

    let detector = &mut session.journal.milestones;
    let check = detector.check(&start);
    report.detail(format!("today={}", check.today));
    report.detail(format!(
        "last_acknowledged={}",
        detector.last_acknowledged().unwrap_or("none")
    ));
    let Some(milestone) = check.milestone else {
        report.detail("milestone=none".to_string());
        if matches!(action, MilestoneAction::Ack { .. }) {
            report.issue("no milestone falls on today");
        }
        return Ok(report);
    };
    report.detail(format!("milestone={milestone}"));
    report.detail(format!("title={}", milestone.title()));
    report.detail(format!("should_notify={}", check.should_notify));

    if let MilestoneAction::Ack { .. } = action {
        if detector.acknowledge(milestone) {
            report.detail(format!("acknowledged={milestone}"));
            report.persisted("milestone marker", detector.last_write_ok());
            audit::record(&session.paths, "milestone-ack", "ok", &milestone.tag());
        } else {
            report.detail(format!("already_acknowledged={milestone}"));
        }
    }
    Ok(report)
}

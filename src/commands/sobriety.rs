use anyhow::Result;

use crate::commands::{Access, CommandReport, open_session};
use crate::error::JournalError;
use crate::journal::audit;
use crate::journal::date_key::DateKey;

#[derive(Debug, Clone)]
pub enum SobrietyAction {
    Show,
    Set { date: DateKey },
    /// Dismiss the "set your date" prompt without setting one.
    Skip,
}

pub fn run(action: &SobrietyAction) -> Result<CommandReport> {
    let mut report = CommandReport::new("sobriety");
    let access = match action {
        SobrietyAction::Show => Access::Read,
        _ => Access::Write,
    };
    let mut session = open_session(access, &mut report)?;
    let today = session.journal.today();
    let profile = &mut session.journal.sobriety;

    match action {
        SobrietyAction::Show => {}
        SobrietyAction::Set { date } => {
            if *date > today {
                let err = JournalError::DateOutOfRange(format!("{date} is after today ({today})"));
                report.issue(format!("{}: {err}", err.code().as_str()));
                return Ok(report);
            }
            let ok = profile.set_date(*date);
            report.persisted("sobriety date", ok);
            audit::record(&session.paths, "sobriety-set", "ok", "date updated");
        }
        SobrietyAction::Skip => {
            let ok = profile.mark_prompt_seen();
            report.persisted("sobriety prompt", ok);
        }
    }

    let record = profile.record();
    report.detail(format!(
        "sobriety_date={}",
        record.sobriety_date.as_deref().unwrap_or("not set")
    ));
    report.detail(format!("has_seen_prompt={}", record.has_seen_prompt));
    report.detail(format!("days_sober={}", profile.days_sober()));
    let range = profile.range();
    report.detail(format!("range={} ({})", range.as_str(), range.display_name()));
    Ok(report)
}

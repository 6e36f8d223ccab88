use anyhow::Result;
use std::collections::BTreeSet;
use std::env;

use crate::commands::{Access, CommandReport, open_session};
use crate::journal::config::resolve_config_path;
use crate::journal::date_key::SystemClock;
use crate::journal::engine::PracticeJournal;
use crate::journal::lock::{is_held, lock_path, read_holder};
use crate::journal::practice::Practice;

include!(concat!(env!("OUT_DIR"), "/journal_env_allowlist.rs"));

/// `JOURNAL_*` variables the binary never reads; usually a typo.
pub fn unknown_journal_env_vars<I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let known: BTreeSet<&str> = GENERATED_JOURNAL_ENV_ALLOWLIST.iter().copied().collect();
    let mut unknown: Vec<String> = names
        .into_iter()
        .filter(|name| name.starts_with("JOURNAL_") && !known.contains(name.as_str()))
        .collect();
    unknown.sort();
    unknown
}

fn describe_domain<P: Practice>(journal: &PracticeJournal<P>, report: &mut CommandReport) {
    let domain = P::DOMAIN;
    report.detail(format!("{domain}.ledger_entries={}", journal.ledger.entries().len()));
    report.detail(format!("{domain}.completed_total={}", journal.ledger.completed_total()));
    report.detail(format!(
        "{domain}.completed_today={}",
        journal.ledger.is_completed_today()
    ));
    report.detail(format!(
        "{domain}.saved_entries={}/{}",
        journal.archive.len(),
        journal.archive.max_entries()
    ));
}

pub fn run() -> Result<CommandReport> {
    let mut report = CommandReport::new("status");
    let session = open_session(Access::Read, &mut report)?;
    let paths = &session.paths;
    let config = &session.config;

    report.detail(format!("journal_home={}", paths.journal_home.display()));
    report.detail(format!("store_dir={}", paths.store_dir.display()));
    report.detail(format!("logs_dir={}", paths.logs_dir.display()));
    report.detail(format!(
        "config_path={}",
        resolve_config_path(paths, &|var: &str| env::var(var).ok()).display()
    ));
    report.detail(format!(
        "timezone={}",
        SystemClock::new(config.timezone()).timezone_label()
    ));
    report.detail(format!("today={}", session.journal.today()));
    report.detail(format!(
        "reconcile_on_start={}",
        config.startup.reconcile_on_start
    ));
    report.detail(format!("build_uuid={}", env!("BUILD_UUID")));

    let lock_file = lock_path(&paths.store_dir);
    if is_held(&paths.store_dir) {
        let holder = read_holder(&lock_file)
            .map(|h| h.summary())
            .unwrap_or_else(|| "unknown".to_string());
        report.detail(format!("writer_lock=held {holder}"));
    } else {
        report.detail("writer_lock=free".to_string());
    }

    describe_domain(&session.journal.gratitude, &mut report);
    describe_domain(&session.journal.review, &mut report);
    report.detail(format!(
        "sobriety_date_set={}",
        session.journal.sobriety.start_date().is_some()
    ));
    report.detail(format!(
        "last_acknowledged_milestone={}",
        session.journal.milestones.last_acknowledged().unwrap_or("none")
    ));

    for name in unknown_journal_env_vars(env::vars().map(|(k, _)| k)) {
        report.issue(format!("unknown environment variable {name}; it has no effect"));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlist_covers_read_variables() {
        for var in [
            "JOURNAL_HOME",
            "JOURNAL_STORE_DIR",
            "JOURNAL_LOGS_DIR",
            "JOURNAL_CONFIG_PATH",
            "JOURNAL_TIMEZONE",
            "JOURNAL_MAX_SAVED_ENTRIES",
            "JOURNAL_RECONCILE_ON_START",
        ] {
            assert!(GENERATED_JOURNAL_ENV_ALLOWLIST.contains(&var), "{var}");
        }
    }

    #[test]
    fn unknown_vars_are_reported_sorted() {
        // Built at runtime so the build script does not allowlist them.
        let typo = format!("{}TIMEZOEN", "JOURNAL_");
        let other = format!("{}AAA", "JOURNAL_");
        let names = vec![
            "PATH".to_string(),
            "JOURNAL_TIMEZONE".to_string(),
            typo.clone(),
            other.clone(),
        ];
        assert_eq!(unknown_journal_env_vars(names), vec![other, typo]);
    }
}

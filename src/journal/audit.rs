use crate::error::JournalErrorCode;
use crate::journal::paths::JournalPaths;
use crate::journal::util::now_epoch_secs;
use crate::journal::warn::{self, WarnEvent};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub at_epoch_secs: u64,
    pub phase: String,
    pub status: String,
    pub message: String,
}

pub fn append_event(paths: &JournalPaths, phase: &str, status: &str, message: &str) -> Result<()> {
    fs::create_dir_all(&paths.logs_dir)
        .with_context(|| format!("failed to create {}", paths.logs_dir.display()))?;
    let event = AuditEvent {
        at_epoch_secs: now_epoch_secs()?,
        phase: phase.to_string(),
        status: status.to_string(),
        message: message.to_string(),
    };

    let line = format!("{}\n", serde_json::to_string(&event)?);
    let path = paths.audit_log();
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

/// Audit failures never fail the command; they surface as a warning line.
pub fn record(paths: &JournalPaths, phase: &str, status: &str, message: &str) {
    if let Err(err) = append_event(paths, phase, status, message) {
        warn::emit(WarnEvent {
            code: JournalErrorCode::E004WriteFailed.as_str(),
            stage: "audit",
            action: phase,
            domain: "na",
            key: "audit.log",
            retry: "none",
            reason: "audit-append-failed",
            err: &format!("{err:#}"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn events_append_as_json_lines() {
        let dir = tempdir().expect("tempdir");
        let paths = JournalPaths {
            journal_home: dir.path().to_path_buf(),
            store_dir: dir.path().join("store"),
            logs_dir: dir.path().join("logs"),
        };
        append_event(&paths, "complete", "ok", "gratitude 2024-03-01").expect("first");
        record(&paths, "reopen", "ok", "gratitude 2024-03-01");

        let raw = fs::read_to_string(paths.audit_log()).expect("log");
        let events: Vec<AuditEvent> = raw
            .lines()
            .map(|line| serde_json::from_str(line).expect("jsonl"))
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].phase, "complete");
        assert_eq!(events[1].phase, "reopen");
    }
}

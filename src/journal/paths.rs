use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};

/// Journal home under `$HOME` when `JOURNAL_HOME` is unset.
pub const JOURNAL_HOME_DIR_NAME: &str = ".recovery-journal";

#[derive(Debug, Clone)]
pub struct JournalPaths {
    pub journal_home: PathBuf,
    pub store_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl JournalPaths {
    pub fn audit_log(&self) -> PathBuf {
        self.logs_dir.join("audit.log")
    }
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path<F>(lookup: &F, var: &str, fallback: PathBuf) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn default_journal_home(home: &Path) -> PathBuf {
    home.join(JOURNAL_HOME_DIR_NAME)
}

pub fn resolve_paths() -> Result<JournalPaths> {
    let home = required_home_dir()?;
    Ok(resolve_paths_with(&home, |var| env::var(var).ok()))
}

pub fn resolve_paths_with<F>(home: &Path, lookup: F) -> JournalPaths
where
    F: Fn(&str) -> Option<String>,
{
    let journal_home = env_or_default_path(&lookup, "JOURNAL_HOME", default_journal_home(home));
    let store_dir = env_or_default_path(&lookup, "JOURNAL_STORE_DIR", journal_home.join("store"));
    let logs_dir = env_or_default_path(&lookup, "JOURNAL_LOGS_DIR", journal_home.join("logs"));

    JournalPaths {
        journal_home,
        store_dir,
        logs_dir,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn defaults_hang_off_journal_home() {
        let paths = resolve_paths_with(Path::new("/home/ann"), |_| None);
        assert_eq!(paths.journal_home, PathBuf::from("/home/ann/.recovery-journal"));
        assert_eq!(paths.store_dir, PathBuf::from("/home/ann/.recovery-journal/store"));
        assert_eq!(paths.audit_log(), PathBuf::from("/home/ann/.recovery-journal/logs/audit.log"));
    }

    #[test]
    fn env_overrides_win_and_blank_is_ignored() {
        let vars: BTreeMap<&str, &str> = [
            ("JOURNAL_HOME", "/srv/journal"),
            ("JOURNAL_LOGS_DIR", "  "),
            ("JOURNAL_STORE_DIR", "/data/kv"),
        ]
        .into_iter()
        .collect();
        let paths = resolve_paths_with(Path::new("/home/ann"), |var| {
            vars.get(var).map(|v| v.to_string())
        });
        assert_eq!(paths.store_dir, PathBuf::from("/data/kv"));
        assert_eq!(paths.logs_dir, PathBuf::from("/srv/journal/logs"));
    }
}

use crate::error::JournalError;
use crate::journal::archive::MAX_SAVED_ENTRIES;
use crate::journal::paths::JournalPaths;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "journal.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CalendarConfig {
    /// IANA zone name. Empty follows the device-local zone.
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub max_saved_entries: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            max_saved_entries: MAX_SAVED_ENTRIES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    pub reconcile_on_start: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            reconcile_on_start: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JournalConfig {
    pub calendar: CalendarConfig,
    pub archive: ArchiveConfig,
    pub startup: StartupConfig,
}

impl JournalConfig {
    /// Configured zone, or `None` for device-local time. Only meaningful on a
    /// validated config.
    pub fn timezone(&self) -> Option<Tz> {
        let name = self.calendar.timezone.trim();
        if name.is_empty() {
            return None;
        }
        name.parse::<Tz>().ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialJournalConfig {
    calendar: Option<CalendarConfig>,
    archive: Option<ArchiveConfig>,
    startup: Option<StartupConfig>,
}

fn env_or_usize<F>(lookup: &F, var: &str, fallback: usize) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(v) => v.trim().parse::<usize>().ok().unwrap_or(fallback),
        None => fallback,
    }
}

fn env_or_bool<F>(lookup: &F, var: &str, fallback: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(v) => match v.trim() {
            "1" | "true" | "TRUE" | "yes" | "on" => true,
            "0" | "false" | "FALSE" | "no" | "off" => false,
            _ => fallback,
        },
        None => fallback,
    }
}

fn env_or_string<F>(lookup: &F, var: &str, fallback: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn validate(cfg: &JournalConfig) -> Result<(), JournalError> {
    let tz = cfg.calendar.timezone.trim();
    if !tz.is_empty() && tz.parse::<Tz>().is_err() {
        return Err(JournalError::InvalidConfig(format!(
            "unknown calendar timezone `{tz}`: use an IANA name such as America/Chicago"
        )));
    }
    if cfg.archive.max_saved_entries == 0 {
        return Err(JournalError::InvalidConfig(
            "archive max_saved_entries must be >= 1".to_string(),
        ));
    }
    Ok(())
}

pub fn resolve_config_path<F>(paths: &JournalPaths, lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("JOURNAL_CONFIG_PATH") {
        Some(custom) if !custom.trim().is_empty() => PathBuf::from(custom.trim()),
        _ => paths.journal_home.join(CONFIG_FILE),
    }
}

fn merge_file_config<F>(base: &mut JournalConfig, paths: &JournalPaths, lookup: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let path = resolve_config_path(paths, lookup);
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read journal config {}", path.display()))?;
    let parsed: PartialJournalConfig = toml::from_str(&raw).map_err(|err| {
        JournalError::InvalidConfig(format!("failed to parse {}: {err}", path.display()))
    })?;
    if let Some(calendar) = parsed.calendar {
        base.calendar = calendar;
    }
    if let Some(archive) = parsed.archive {
        base.archive = archive;
    }
    if let Some(startup) = parsed.startup {
        base.startup = startup;
    }
    Ok(())
}

pub fn load_config(paths: &JournalPaths) -> Result<JournalConfig> {
    load_config_with(paths, |var| env::var(var).ok())
}

/// Defaults, then the TOML file, then `JOURNAL_*` overrides, then validation.
pub fn load_config_with<F>(paths: &JournalPaths, lookup: F) -> Result<JournalConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = JournalConfig::default();
    merge_file_config(&mut cfg, paths, &lookup)?;

    cfg.calendar.timezone = env_or_string(&lookup, "JOURNAL_TIMEZONE", &cfg.calendar.timezone);
    cfg.archive.max_saved_entries = env_or_usize(
        &lookup,
        "JOURNAL_MAX_SAVED_ENTRIES",
        cfg.archive.max_saved_entries,
    );
    cfg.startup.reconcile_on_start = env_or_bool(
        &lookup,
        "JOURNAL_RECONCILE_ON_START",
        cfg.startup.reconcile_on_start,
    );

    validate(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn paths_in(dir: &std::path::Path) -> JournalPaths {
        JournalPaths {
            journal_home: dir.to_path_buf(),
            store_dir: dir.join("store"),
            logs_dir: dir.join("logs"),
        }
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_without_file_or_env() {
        let dir = tempdir().expect("tempdir");
        let cfg = load_config_with(&paths_in(dir.path()), env_of(&[])).expect("config");
        assert_eq!(cfg.archive.max_saved_entries, 200);
        assert!(cfg.startup.reconcile_on_start);
        assert!(cfg.timezone().is_none());
    }

    #[test]
    fn file_then_env_layering() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[calendar]\ntimezone = \"Australia/Sydney\"\n\n[archive]\nmax_saved_entries = 50\n",
        )
        .expect("write config");

        let cfg = load_config_with(
            &paths_in(dir.path()),
            env_of(&[("JOURNAL_MAX_SAVED_ENTRIES", "75"), ("JOURNAL_RECONCILE_ON_START", "off")]),
        )
        .expect("config");
        assert_eq!(cfg.timezone(), Some(chrono_tz::Australia::Sydney));
        assert_eq!(cfg.archive.max_saved_entries, 75);
        assert!(!cfg.startup.reconcile_on_start);
    }

    #[test]
    fn explicit_config_path_is_honored() {
        let dir = tempdir().expect("tempdir");
        let custom = dir.path().join("elsewhere.toml");
        fs::write(&custom, "[startup]\nreconcile_on_start = false\n").expect("write");
        let cfg = load_config_with(
            &paths_in(dir.path()),
            env_of(&[("JOURNAL_CONFIG_PATH", custom.to_str().expect("utf8"))]),
        )
        .expect("config");
        assert!(!cfg.startup.reconcile_on_start);
    }

    #[test]
    fn rejects_unknown_timezone_and_zero_cap() {
        let dir = tempdir().expect("tempdir");
        let err = load_config_with(&paths_in(dir.path()), env_of(&[("JOURNAL_TIMEZONE", "Mars/Olympus")]))
            .expect_err("bad zone");
        let typed = err.downcast_ref::<JournalError>().expect("typed");
        assert_eq!(typed.code().as_str(), "E002_CONFIG_INVALID");

        fs::write(
            dir.path().join(CONFIG_FILE),
            "[archive]\nmax_saved_entries = 0\n",
        )
        .expect("write");
        assert!(load_config_with(&paths_in(dir.path()), env_of(&[])).is_err());
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join(CONFIG_FILE), "[archive\n").expect("write");
        let err = load_config_with(&paths_in(dir.path()), env_of(&[])).expect_err("parse");
        assert!(err.downcast_ref::<JournalError>().is_some());
    }
}

use crate::error::JournalError;
use crate::journal::util::now_epoch_secs;
use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub const LOCK_FILE: &str = "journal.lock";

/// Written into the lock file so a blocked writer can say who holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHolder {
    pub pid: u32,
    pub build_uuid: String,
    pub started_at: u64,
}

impl LockHolder {
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            build_uuid: env!("BUILD_UUID").to_string(),
            started_at: now_epoch_secs().unwrap_or(0),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "pid={} build={} started_at={}",
            self.pid, self.build_uuid, self.started_at
        )
    }
}

/// Exclusive single-writer lock on the store directory. Released on drop.
#[derive(Debug)]
pub struct WriterLock {
    file: File,
    path: PathBuf,
    holder: LockHolder,
}

pub fn lock_path(store_dir: &Path) -> PathBuf {
    store_dir.join(LOCK_FILE)
}

impl WriterLock {
    pub fn acquire(store_dir: &Path) -> Result<Self> {
        fs::create_dir_all(store_dir)
            .with_context(|| format!("failed to create {}", store_dir.display()))?;
        let path = lock_path(store_dir);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;

        if file.try_lock_exclusive().is_err() {
            let holder = read_holder(&path)
                .map(|h| h.summary())
                .unwrap_or_else(|| "unknown holder".to_string());
            return Err(JournalError::Locked(holder).into());
        }

        let holder = LockHolder::current();
        let json = serde_json::to_string(&holder)?;
        rewrite(&mut file, json.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;

        Ok(Self { file, path, holder })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn holder(&self) -> &LockHolder {
        &self.holder
    }
}

fn rewrite(file: &mut File, data: &[u8]) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(data)?;
    file.sync_all()
}

impl Drop for WriterLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Last recorded holder. The file outlives the lock, so this may describe a
/// writer that has already exited.
pub fn read_holder(path: &Path) -> Option<LockHolder> {
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str(raw.trim()).ok()
}

/// True when some process currently holds the lock.
pub fn is_held(store_dir: &Path) -> bool {
    let path = lock_path(store_dir);
    let Ok(file) = OpenOptions::new().read(true).write(true).open(&path) else {
        return false;
    };
    match file.try_lock_exclusive() {
        Ok(()) => {
            let _ = FileExt::unlock(&file);
            false
        }
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn second_writer_is_refused_until_first_drops() {
        let dir = tempdir().expect("tempdir");
        let first = WriterLock::acquire(dir.path()).expect("first lock");
        assert_eq!(first.holder().pid, std::process::id());
        assert!(is_held(dir.path()));

        let err = WriterLock::acquire(dir.path()).expect_err("second lock must fail");
        let typed = err.downcast_ref::<JournalError>().expect("typed error");
        assert_eq!(typed.code().as_str(), "E001_LOCKED");
        assert!(err.to_string().contains(&format!("pid={}", std::process::id())));

        drop(first);
        assert!(!is_held(dir.path()));
        let again = WriterLock::acquire(dir.path()).expect("relock");
        assert_eq!(read_holder(again.path()), Some(again.holder().clone()));
    }

    #[test]
    fn missing_lock_file_is_not_held() {
        let dir = tempdir().expect("tempdir");
        assert!(!is_held(dir.path()));
        assert_eq!(read_holder(&lock_path(dir.path())), None);
    }
}

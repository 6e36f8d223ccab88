use std::env;
use std::path::PathBuf;

use crate::journal::paths::JOURNAL_HOME_DIR_NAME;

/// `.env` next to the journal store: `$JOURNAL_HOME/.env`, else
/// `~/.recovery-journal/.env`.
fn fallback_dotenv_path(journal_home: Option<PathBuf>, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    let base = match journal_home {
        Some(dir) => dir,
        None => home_dir?.join(JOURNAL_HOME_DIR_NAME),
    };
    Some(base.join(".env"))
}

pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let fallback = fallback_dotenv_path(
        env::var_os("JOURNAL_HOME").map(PathBuf::from),
        dirs::home_dir(),
    );

    let Some(path) = fallback else {
        return;
    };
    if path.is_file() {
        let _ = dotenvy::from_path(&path);
    }
}

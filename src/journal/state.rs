use crate::error::JournalErrorCode;
use crate::journal::kv::KeyValueStore;
use crate::journal::warn::{self, WarnEvent};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Where a load or save originated, for warning lines.
#[derive(Debug, Clone, Copy)]
pub struct Origin<'a> {
    pub stage: &'a str,
    pub domain: &'a str,
    pub key: &'a str,
}

/// Loads a JSON array stored under `origin.key`.
///
/// A missing key, an unreadable store, a value that is not an array, or an
/// array with any malformed element all yield an empty collection. Partial
/// parses are never kept.
pub fn load_collection<T: DeserializeOwned>(kv: &dyn KeyValueStore, origin: Origin<'_>) -> Vec<T> {
    let raw = match kv.get(origin.key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn::emit(WarnEvent {
                code: JournalErrorCode::E003StateCorrupt.as_str(),
                stage: origin.stage,
                action: "load",
                domain: origin.domain,
                key: origin.key,
                retry: "none",
                reason: "store-read-failed",
                err: &format!("{err:#}"),
            });
            return Vec::new();
        }
    };

    if raw.trim().is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(items) => items,
        Err(err) => {
            warn::emit(WarnEvent {
                code: JournalErrorCode::E003StateCorrupt.as_str(),
                stage: origin.stage,
                action: "load",
                domain: origin.domain,
                key: origin.key,
                retry: "none",
                reason: "malformed-collection-reset-to-empty",
                err: &err.to_string(),
            });
            Vec::new()
        }
    }
}

/// Loads a single JSON value, falling back to `T::default()` on any failure.
pub fn load_record<T: DeserializeOwned + Default>(kv: &dyn KeyValueStore, origin: Origin<'_>) -> T {
    let raw = match kv.get(origin.key) {
        Ok(Some(raw)) if !raw.trim().is_empty() => raw,
        Ok(_) => return T::default(),
        Err(err) => {
            warn::emit(WarnEvent {
                code: JournalErrorCode::E003StateCorrupt.as_str(),
                stage: origin.stage,
                action: "load",
                domain: origin.domain,
                key: origin.key,
                retry: "none",
                reason: "store-read-failed",
                err: &format!("{err:#}"),
            });
            return T::default();
        }
    };

    match serde_json::from_str::<T>(&raw) {
        Ok(value) => value,
        Err(err) => {
            warn::emit(WarnEvent {
                code: JournalErrorCode::E003StateCorrupt.as_str(),
                stage: origin.stage,
                action: "load",
                domain: origin.domain,
                key: origin.key,
                retry: "none",
                reason: "malformed-record-reset-to-default",
                err: &err.to_string(),
            });
            T::default()
        }
    }
}

/// Writes `value` as JSON. Failures are logged and reported as `false`; the
/// caller keeps its in-memory copy as the source of truth.
pub fn save_json<T: Serialize + ?Sized>(kv: &dyn KeyValueStore, origin: Origin<'_>, value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(data) => save_raw(kv, origin, &data),
        Err(err) => {
            warn_write_failed(origin, &anyhow::Error::from(err));
            false
        }
    }
}

/// Writes `value` verbatim, for keys whose stored form is a bare string.
pub fn save_raw(kv: &dyn KeyValueStore, origin: Origin<'_>, value: &str) -> bool {
    match kv.set(origin.key, value) {
        Ok(()) => true,
        Err(err) => {
            warn_write_failed(origin, &err);
            false
        }
    }
}

fn warn_write_failed(origin: Origin<'_>, err: &anyhow::Error) {
    warn::emit(WarnEvent {
        code: JournalErrorCode::E004WriteFailed.as_str(),
        stage: origin.stage,
        action: "persist",
        domain: origin.domain,
        key: origin.key,
        retry: "next-write",
        reason: "store-write-failed",
        err: &format!("{err:#}"),
    });
}

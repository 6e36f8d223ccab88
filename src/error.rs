use thiserror::Error;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("invalid calendar-day key `{0}`: expected YYYY-MM-DD")]
    InvalidDateKey(String),
    #[error("config file invalid or unreadable: {0}")]
    InvalidConfig(String),
    #[error("journal store is locked by another writer: {0}")]
    Locked(String),
    #[error("unknown milestone tag `{0}`")]
    UnknownMilestone(String),
    #[error("date out of range: {0}")]
    DateOutOfRange(String),
    #[error("unknown practice domain `{0}`: use gratitude or evening-review")]
    UnknownDomain(String),
}

impl JournalError {
    pub fn code(&self) -> JournalErrorCode {
        match self {
            Self::InvalidDateKey(_) | Self::DateOutOfRange(_) => JournalErrorCode::E005DateInvalid,
            Self::InvalidConfig(_) => JournalErrorCode::E002ConfigInvalid,
            Self::Locked(_) => JournalErrorCode::E001Locked,
            Self::UnknownMilestone(_) | Self::UnknownDomain(_) => JournalErrorCode::E003StateCorrupt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalErrorCode {
    E001Locked,
    E002ConfigInvalid,
    E003StateCorrupt,
    E004WriteFailed,
    E005DateInvalid,
}

impl JournalErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::E001Locked => "E001_LOCKED",
            Self::E002ConfigInvalid => "E002_CONFIG_INVALID",
            Self::E003StateCorrupt => "E003_STATE_CORRUPT",
            Self::E004WriteFailed => "E004_WRITE_FAILED",
            Self::E005DateInvalid => "E005_DATE_INVALID",
        }
    }
}

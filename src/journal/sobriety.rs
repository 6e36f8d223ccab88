use crate::journal::date_key::{Clock, DateKey};
use crate::journal::kv::KeyValueStore;
use crate::journal::state::{Origin, load_record, save_json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SOBRIETY_KEY: &str = "sobriety_data";

const ORIGIN: Origin<'static> = Origin {
    stage: "profile",
    domain: "sobriety",
    key: SOBRIETY_KEY,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SobrietyRecord {
    pub sobriety_date: Option<String>,
    pub has_seen_prompt: bool,
}

/// Coarse time-sober bucket. Never exposes the date itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SobrietyRange {
    NotSet,
    FutureDate,
    UpTo30Days,
    Days31To90,
    Months3To6,
    Months6To12,
    Years1To2,
    Years2To5,
    Years5To10,
    Years10To15,
    Years15To20,
    Years20To30,
    Years30Plus,
}

impl SobrietyRange {
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d < 0 => Self::FutureDate,
            d if d < 30 => Self::UpTo30Days,
            d if d < 90 => Self::Days31To90,
            d if d < 180 => Self::Months3To6,
            d if d < 365 => Self::Months6To12,
            d if d < 730 => Self::Years1To2,
            d if d < 1825 => Self::Years2To5,
            d if d < 3650 => Self::Years5To10,
            d if d < 5475 => Self::Years10To15,
            d if d < 7300 => Self::Years15To20,
            d if d < 10950 => Self::Years20To30,
            _ => Self::Years30Plus,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotSet => "not_set",
            Self::FutureDate => "future_date",
            Self::UpTo30Days => "0-30_days",
            Self::Days31To90 => "31-90_days",
            Self::Months3To6 => "3-6_months",
            Self::Months6To12 => "6-12_months",
            Self::Years1To2 => "1-2_years",
            Self::Years2To5 => "2-5_years",
            Self::Years5To10 => "5-10_years",
            Self::Years10To15 => "10-15_years",
            Self::Years15To20 => "15-20_years",
            Self::Years20To30 => "20-30_years",
            Self::Years30Plus => "30+_years",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::NotSet => "Not Set",
            Self::FutureDate => "Invalid Date",
            Self::UpTo30Days => "0-30 Days",
            Self::Days31To90 => "31-90 Days",
            Self::Months3To6 => "3-6 Months",
            Self::Months6To12 => "6-12 Months",
            Self::Years1To2 => "1-2 Years",
            Self::Years2To5 => "2-5 Years",
            Self::Years5To10 => "5-10 Years",
            Self::Years10To15 => "10-15 Years",
            Self::Years15To20 => "15-20 Years",
            Self::Years20To30 => "20-30 Years",
            Self::Years30Plus => "30+ Years",
        }
    }
}

/// Persisted sobriety start date plus whether the user has been asked for it.
pub struct SobrietyProfile {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    record: SobrietyRecord,
    last_write_ok: bool,
}

impl SobrietyProfile {
    pub fn load(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let record = load_record(kv.as_ref(), ORIGIN);
        Self {
            kv,
            clock,
            record,
            last_write_ok: true,
        }
    }

    pub fn record(&self) -> &SobrietyRecord {
        &self.record
    }

    pub fn last_write_ok(&self) -> bool {
        self.last_write_ok
    }

    /// The stored start date exactly as persisted, for the milestone check.
    pub fn raw_date(&self) -> Option<&str> {
        self.record.sobriety_date.as_deref().filter(|d| !d.trim().is_empty())
    }

    pub fn start_date(&self) -> Option<DateKey> {
        self.raw_date().and_then(|raw| DateKey::parse(raw).ok())
    }

    pub fn set_date(&mut self, date: DateKey) -> bool {
        self.record = SobrietyRecord {
            sobriety_date: Some(date.as_key()),
            has_seen_prompt: true,
        };
        self.flush()
    }

    pub fn mark_prompt_seen(&mut self) -> bool {
        if self.record.has_seen_prompt {
            return true;
        }
        self.record.has_seen_prompt = true;
        self.flush()
    }

    /// Whole calendar days from the start date to today. Zero when unset or
    /// when the start date is in the future.
    pub fn days_sober(&self) -> i64 {
        self.start_date()
            .map(|start| self.clock.today().days_since(start).max(0))
            .unwrap_or(0)
    }

    pub fn range(&self) -> SobrietyRange {
        match self.start_date() {
            Some(start) => SobrietyRange::from_days(self.clock.today().days_since(start)),
            None => SobrietyRange::NotSet,
        }
    }

    fn flush(&mut self) -> bool {
        self.last_write_ok = save_json(self.kv.as_ref(), ORIGIN, &self.record);
        self.last_write_ok
    }
}

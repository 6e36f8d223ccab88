use crate::error::{JournalError, JournalErrorCode};
use crate::journal::date_key::{Clock, DateKey};
use crate::journal::kv::KeyValueStore;
use crate::journal::state::{Origin, save_raw};
use crate::journal::warn::{self, WarnEvent};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const MILESTONE_KEY: &str = "last_shown_birthday_milestone";

const ORIGIN: Origin<'static> = Origin {
    stage: "milestone",
    domain: "sobriety",
    key: MILESTONE_KEY,
};

/// A sobriety anniversary eligible for a one-time notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    Months(u32),
    Years(u32),
}

impl Milestone {
    pub fn tag(self) -> String {
        match self {
            Self::Months(n) => format!("{n}-month"),
            Self::Years(n) => format!("{n}-year"),
        }
    }

    pub fn title(self) -> String {
        match self {
            Self::Months(1) => "1 Month".to_string(),
            Self::Months(n) => format!("{n} Months"),
            Self::Years(1) => "1 Year".to_string(),
            Self::Years(n) => format!("{n} Years"),
        }
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

impl FromStr for Milestone {
    type Err = JournalError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let unknown = || JournalError::UnknownMilestone(raw.to_string());
        let (count, unit) = raw.trim().split_once('-').ok_or_else(unknown)?;
        let n: u32 = count.parse().map_err(|_| unknown())?;
        match unit {
            "month" if (1..=11).contains(&n) || n == 18 => Ok(Self::Months(n)),
            "year" if (1..=100).contains(&n) => Ok(Self::Years(n)),
            _ => Err(unknown()),
        }
    }
}

impl Serialize for Milestone {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.tag())
    }
}

/// Finds the anniversary that falls exactly on `today`, if any.
///
/// Scans each candidate offset instead of solving for it: clamped month
/// arithmetic (Jan 31 + 1 month = Feb 28/29) has no closed form.
pub fn elapsed_milestone(start: DateKey, today: DateKey) -> Option<Milestone> {
    if today <= start {
        return None;
    }
    for months in 1..=11 {
        if start.add_months(months) == Some(today) {
            return Some(Milestone::Months(months as u32));
        }
    }
    if start.add_months(18) == Some(today) {
        return Some(Milestone::Months(18));
    }
    (1..=100)
        .find(|years| start.add_years(*years) == Some(today))
        .map(|years| Milestone::Years(years as u32))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MilestoneCheck {
    pub today: DateKey,
    pub milestone: Option<Milestone>,
    pub should_notify: bool,
}

/// Tracks which milestone was last acknowledged so each one is shown once.
pub struct MilestoneDetector {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    last_acknowledged: Option<String>,
    last_write_ok: bool,
}

impl MilestoneDetector {
    pub fn load(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let last_acknowledged = match kv.get(MILESTONE_KEY) {
            Ok(Some(raw)) => parse_stored_tag(&raw),
            Ok(None) => None,
            Err(err) => {
                warn::emit(WarnEvent {
                    code: JournalErrorCode::E003StateCorrupt.as_str(),
                    stage: ORIGIN.stage,
                    action: "load",
                    domain: ORIGIN.domain,
                    key: MILESTONE_KEY,
                    retry: "none",
                    reason: "store-read-failed",
                    err: &format!("{err:#}"),
                });
                None
            }
        };
        Self {
            kv,
            clock,
            last_acknowledged,
            last_write_ok: true,
        }
    }

    pub fn last_acknowledged(&self) -> Option<&str> {
        self.last_acknowledged.as_deref()
    }

    pub fn last_write_ok(&self) -> bool {
        self.last_write_ok
    }

    /// Checks today against an opaque `YYYY-MM-DD` start date. A start date
    /// that does not parse never produces a milestone.
    pub fn check(&self, start: &str) -> MilestoneCheck {
        let today = self.clock.today();
        let milestone = match DateKey::parse(start) {
            Ok(start) => elapsed_milestone(start, today),
            Err(err) => {
                warn::emit(WarnEvent {
                    code: err.code().as_str(),
                    stage: ORIGIN.stage,
                    action: "check",
                    domain: ORIGIN.domain,
                    key: "sobrietyDate",
                    retry: "none",
                    reason: "start-date-unparseable",
                    err: &err.to_string(),
                });
                None
            }
        };
        let should_notify = milestone
            .is_some_and(|m| self.last_acknowledged.as_deref() != Some(m.tag().as_str()));
        MilestoneCheck {
            today,
            milestone,
            should_notify,
        }
    }

    /// Records `milestone` as shown. Returns false when it already was.
    pub fn acknowledge(&mut self, milestone: Milestone) -> bool {
        let tag = milestone.tag();
        if self.last_acknowledged.as_deref() == Some(tag.as_str()) {
            return false;
        }
        self.last_write_ok = save_raw(self.kv.as_ref(), ORIGIN, &tag);
        self.last_acknowledged = Some(tag);
        true
    }
}

/// The marker is written as a bare tag. A JSON-quoted string is accepted
/// too.
fn parse_stored_tag(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let tag = serde_json::from_str::<String>(trimmed).unwrap_or_else(|_| trimmed.to_string());
    if tag.is_empty() { None } else { Some(tag) }
}

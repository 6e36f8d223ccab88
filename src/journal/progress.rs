use crate::journal::date_key::DateKey;
use crate::journal::ledger::CompletionLedger;
use crate::journal::practice::Practice;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// One day of the current Sunday-to-Saturday week. Derived on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyProgressDay {
    pub date: DateKey,
    pub completed: bool,
    pub count: usize,
    pub day_name: &'static str,
    pub is_today: bool,
    pub is_future: bool,
}

pub fn weekly_progress<P: Practice>(ledger: &CompletionLedger<P>) -> Vec<WeeklyProgressDay> {
    let today = ledger.today();
    let start = today.week_start();
    (0..7)
        .filter_map(|offset| start.add_days(offset))
        .map(|date| {
            let entry = ledger.get(date);
            WeeklyProgressDay {
                date,
                completed: entry.is_some_and(|e| e.completed),
                count: entry.map(|e| P::count(&e.payload)).unwrap_or(0),
                day_name: date.day_name(),
                is_today: date == today,
                is_future: date > today,
            }
        })
        .collect()
}

/// Completed days in the current calendar week, ignoring any dated after
/// today. Resets every Sunday; gaps inside the week do not reset it.
pub fn streak(week: &[WeeklyProgressDay]) -> usize {
    week.iter().filter(|d| d.completed && !d.is_future).count()
}

/// Consecutive completed days ending today. An unfinished today does not
/// break the run; counting then starts from yesterday.
pub fn consecutive_streak<P: Practice>(ledger: &CompletionLedger<P>) -> usize {
    let completed = |date: DateKey| ledger.get(date).is_some_and(|e| e.completed);
    let today = ledger.today();
    let mut cursor = if completed(today) {
        Some(today)
    } else {
        today.add_days(-1)
    };
    let mut run = 0usize;
    while let Some(day) = cursor {
        if !completed(day) {
            break;
        }
        run += 1;
        cursor = day.add_days(-1);
    }
    run
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowSummary {
    pub days: u32,
    pub start: DateKey,
    pub end: DateKey,
    pub completed_days: usize,
    pub total_count: usize,
    pub facets: BTreeMap<&'static str, usize>,
    pub completed_total: usize,
}

/// Tallies the `days` calendar days ending today, inclusive. A window
/// reaching past the earliest representable date starts there, and `days`
/// reports the span actually covered.
pub fn insights<P: Practice>(ledger: &CompletionLedger<P>, days: u32) -> WindowSummary {
    let requested = days.max(1);
    let end = ledger.today();
    let (start, days) = match end.add_days(1 - i64::from(requested)) {
        Some(start) => (start, requested),
        None => {
            let start = DateKey::from_date(NaiveDate::MIN);
            let span = u32::try_from(end.days_since(start) + 1).unwrap_or(requested);
            (start, span)
        }
    };

    let mut summary = WindowSummary {
        days,
        start,
        end,
        completed_days: 0,
        total_count: 0,
        facets: BTreeMap::new(),
        completed_total: ledger.completed_total(),
    };
    for entry in ledger.entries() {
        if !entry.completed || entry.date < start || entry.date > end {
            continue;
        }
        summary.completed_days += 1;
        summary.total_count += P::count(&entry.payload);
        for (name, yes) in P::facets(&entry.payload) {
            let tally = summary.facets.entry(name).or_insert(0);
            if yes {
                *tally += 1;
            }
        }
    }
    summary
}

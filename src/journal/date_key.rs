use crate::error::JournalError;
use chrono::{Datelike, Days, Local, Months, NaiveDate, NaiveDateTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A local calendar day, rendered as `YYYY-MM-DD`.
///
/// Ordering is calendar order, which for four-digit years is the same as
/// lexicographic order of the rendered key. Nothing here carries a time of
/// day, so "is this day in the future" can never be skewed by the clock's
/// hour or UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, JournalError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| JournalError::InvalidDateKey(format!("{year:04}-{month:02}-{day:02}")))
    }

    pub fn parse(raw: &str) -> Result<Self, JournalError> {
        let trimmed = raw.trim();
        let bytes = trimmed.as_bytes();
        let shaped = bytes.len() == 10
            && bytes[4] == b'-'
            && bytes[7] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
        if !shaped {
            return Err(JournalError::InvalidDateKey(trimmed.to_string()));
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| JournalError::InvalidDateKey(trimmed.to_string()))
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    pub fn as_key(self) -> String {
        format!(
            "{:04}-{:02}-{:02}",
            self.0.year(),
            self.0.month(),
            self.0.day()
        )
    }

    pub fn weekday(self) -> Weekday {
        self.0.weekday()
    }

    pub fn day_name(self) -> &'static str {
        match self.0.weekday() {
            Weekday::Sun => "Sun",
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
        }
    }

    /// Long form used in shared text, e.g. `Friday, March 1, 2024`.
    pub fn long_display(self) -> String {
        self.0.format("%A, %B %-d, %Y").to_string()
    }

    pub fn add_days(self, days: i64) -> Option<Self> {
        let shifted = if days >= 0 {
            self.0.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            self.0.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        shifted.map(Self)
    }

    /// Calendar month offset. Overflowing day numbers clamp to the last day
    /// of the target month (Jan 31 + 1 month = Feb 28/29).
    pub fn add_months(self, months: i32) -> Option<Self> {
        let span = Months::new(months.unsigned_abs());
        let shifted = if months >= 0 {
            self.0.checked_add_months(span)
        } else {
            self.0.checked_sub_months(span)
        };
        shifted.map(Self)
    }

    /// Calendar year offset with the same clamping (Feb 29 + 1 year = Feb 28).
    pub fn add_years(self, years: i32) -> Option<Self> {
        self.add_months(years.checked_mul(12)?)
    }

    /// The most recent Sunday on or before this day.
    pub fn week_start(self) -> Self {
        let back = i64::from(self.0.weekday().num_days_from_sunday());
        self.add_days(-back).unwrap_or(self)
    }

    pub fn days_since(self, earlier: DateKey) -> i64 {
        self.0.signed_duration_since(earlier.0).num_days()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

impl FromStr for DateKey {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_key())
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Wall-clock source. Implementations must expose local calendar components,
/// not just an epoch instant.
pub trait Clock: Send + Sync {
    fn now_local(&self) -> NaiveDateTime;

    fn now_epoch_millis(&self) -> i64;

    fn today(&self) -> DateKey {
        DateKey::from_date(self.now_local().date())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    tz: Option<Tz>,
}

impl SystemClock {
    /// `None` follows the device-local zone.
    pub fn new(tz: Option<Tz>) -> Self {
        Self { tz }
    }

    pub fn timezone_label(&self) -> String {
        match self.tz {
            Some(tz) => tz.name().to_string(),
            None => "local".to_string(),
        }
    }
}

impl Clock for SystemClock {
    fn now_local(&self) -> NaiveDateTime {
        match self.tz {
            Some(tz) => Utc::now().with_timezone(&tz).naive_local(),
            None => Local::now().naive_local(),
        }
    }

    fn now_epoch_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
pub use self::fixed::FixedClock;


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveTime, TimeZone};

    fn key(raw: &str) -> DateKey {
        DateKey::parse(raw).expect("date")
    }

    #[test]
    fn add_months_clamps_to_last_day_of_target_month() {
        assert_eq!(key("2024-01-31").add_months(1), Some(key("2024-02-29")));
        assert_eq!(key("2023-01-31").add_months(1), Some(key("2023-02-28")));
        assert_eq!(key("2024-08-31").add_months(1), Some(key("2024-09-30")));
        assert_eq!(key("2024-03-31").add_months(-1), Some(key("2024-02-29")));
    }

    #[test]
    fn add_months_rolls_over_year_boundary() {
        assert_eq!(key("2023-11-15").add_months(3), Some(key("2024-02-15")));
        assert_eq!(key("2023-05-15").add_months(18), Some(key("2024-11-15")));
    }

    #[test]
    fn add_years_clamps_leap_day() {
        assert_eq!(key("2024-02-29").add_years(1), Some(key("2025-02-28")));
        assert_eq!(key("2024-02-29").add_years(4), Some(key("2028-02-29")));
        assert_eq!(key("2023-05-15").add_years(1), Some(key("2024-05-15")));
    }

    #[test]
    fn parse_rejects_malformed_keys() {
        assert!(DateKey::parse("2024-1-05").is_err());
        assert!(DateKey::parse("2024-02-30").is_err());
        assert!(DateKey::parse("2024/02/01").is_err());
        assert!(DateKey::parse("").is_err());
        assert_eq!(key(" 2024-02-01 ").as_key(), "2024-02-01");
    }

    #[test]
    fn today_is_stable_across_time_of_day() {
        let clock = FixedClock::at(
            key("2024-03-10")
                .date()
                .and_time(NaiveTime::from_hms_opt(0, 0, 1).expect("time")),
        );
        let morning = clock.today();
        clock.advance(Duration::hours(23) + Duration::minutes(59));
        assert_eq!(clock.today(), morning);
        assert_eq!(morning.as_key(), "2024-03-10");
    }

    #[test]
    fn system_clock_uses_zone_calendar_components() {
        // UTC+14 and UTC-11 disagree on the calendar day for most of the day;
        // each key must match its own zone's wall clock, never a UTC slice.
        for name in ["Pacific/Kiritimati", "Pacific/Pago_Pago"] {
            let tz: Tz = name.parse().expect("tz");
            let clock = SystemClock::new(Some(tz));
            let first = clock.today();
            let expected = DateKey::from_date(tz.from_utc_datetime(&Utc::now().naive_utc()).date_naive());
            let second = clock.today();
            assert!(first == expected || second == expected);
        }
    }

    #[test]
    fn week_start_is_most_recent_sunday() {
        assert_eq!(key("2024-03-06").week_start(), key("2024-03-03"));
        assert_eq!(key("2024-03-03").week_start(), key("2024-03-03"));
        assert_eq!(key("2024-03-09").week_start(), key("2024-03-03"));
        assert_eq!(key("2024-03-01").week_start(), key("2024-02-25"));
    }

    #[test]
    fn serde_uses_plain_key_string() {
        let raw = serde_json::to_string(&key("2024-03-01")).expect("serialize");
        assert_eq!(raw, "\"2024-03-01\"");
        let back: DateKey = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(back, key("2024-03-01"));
        assert!(serde_json::from_str::<DateKey>("\"yesterday\"").is_err());
    }

    #[test]
    fn long_display_matches_share_format() {
        assert_eq!(key("2024-03-01").long_display(), "Friday, March 1, 2024");
    }
}

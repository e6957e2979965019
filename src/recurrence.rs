//! Date recurrence engine: next-occurrence arithmetic and urgency buckets.
//!
//! Everything here is pure. "Today" is always passed in by the caller so the
//! same inputs give the same answer; [`today`] exists for the call sites that
//! want the local calendar date.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, Local, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RecurrenceError;

/// How often a bill or income repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    OneTime,
    Weekly,
    Biweekly,
    Monthly,
    Bimonthly,
    Quarterly,
    Semiannual,
    Annual,
}

/// The offset one recurrence step applies.
enum Step {
    None,
    Days(u64),
    Months(u32),
}

impl Frequency {
    pub const ALL: [Frequency; 8] = [
        Frequency::OneTime,
        Frequency::Weekly,
        Frequency::Biweekly,
        Frequency::Monthly,
        Frequency::Bimonthly,
        Frequency::Quarterly,
        Frequency::Semiannual,
        Frequency::Annual,
    ];

    fn step(self) -> Step {
        match self {
            Frequency::OneTime => Step::None,
            Frequency::Weekly => Step::Days(7),
            Frequency::Biweekly => Step::Days(14),
            Frequency::Monthly => Step::Months(1),
            Frequency::Bimonthly => Step::Months(2),
            Frequency::Quarterly => Step::Months(3),
            Frequency::Semiannual => Step::Months(6),
            Frequency::Annual => Step::Months(12),
        }
    }

    pub fn is_recurring(self) -> bool {
        self != Frequency::OneTime
    }

    /// Wire tag, as stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::OneTime => "one_time",
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
            Frequency::Bimonthly => "bimonthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Semiannual => "semiannual",
            Frequency::Annual => "annual",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Frequency::OneTime => "One-time",
            Frequency::Weekly => "Weekly",
            Frequency::Biweekly => "Bi-weekly",
            Frequency::Monthly => "Monthly",
            Frequency::Bimonthly => "Bi-monthly",
            Frequency::Quarterly => "Quarterly",
            Frequency::Semiannual => "Semi-annual",
            Frequency::Annual => "Annual",
        }
    }

    /// Factor converting one payment into an average monthly amount.
    /// One-time payments contribute nothing to recurring totals.
    pub fn monthly_multiplier(self) -> Decimal {
        match self {
            Frequency::OneTime => Decimal::ZERO,
            Frequency::Weekly => dec!(4.33),
            Frequency::Biweekly => dec!(2.17),
            Frequency::Monthly => Decimal::ONE,
            Frequency::Bimonthly => dec!(0.5),
            Frequency::Quarterly => dec!(0.33),
            Frequency::Semiannual => dec!(0.167),
            Frequency::Annual => dec!(0.083),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = RecurrenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Frequency::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| RecurrenceError::UnknownFrequency(s.to_string()))
    }
}

/// Advance `date` by exactly one period.
///
/// Month steps clamp to the last day of the target month, so Jan 31 lands on
/// Feb 28 (or 29) and the following step continues from that clamped day.
pub fn advance_once(date: NaiveDate, frequency: Frequency) -> Result<NaiveDate, RecurrenceError> {
    let next = match frequency.step() {
        Step::None => Some(date),
        Step::Days(n) => date.checked_add_days(Days::new(n)),
        Step::Months(n) => date.checked_add_months(Months::new(n)),
    };
    next.ok_or_else(|| out_of_range(date, frequency))
}

/// Advance `date` until it is no longer strictly before `today`.
///
/// One-time dates are returned unchanged even when they are in the past.
pub fn advance_until_future(
    date: NaiveDate,
    frequency: Frequency,
    today: NaiveDate,
) -> Result<NaiveDate, RecurrenceError> {
    if date >= today {
        return Ok(date);
    }
    match frequency.step() {
        Step::None => Ok(date),
        Step::Days(n) => {
            // Fixed-length periods: jump straight to the first period on or after today.
            let behind = date.signed_duration_since(today).num_days().unsigned_abs();
            let periods = behind.div_ceil(n);
            date.checked_add_days(Days::new(periods * n))
                .ok_or_else(|| out_of_range(date, frequency))
        }
        Step::Months(_) => {
            let mut next = date;
            while next < today {
                next = advance_once(next, frequency)?;
            }
            Ok(next)
        }
    }
}

/// Signed calendar days from `today` to `date`; negative means overdue.
pub fn days_until_due(date: NaiveDate, today: NaiveDate) -> i64 {
    date.signed_duration_since(today).num_days()
}

/// Urgency bucket of a dated item relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Overdue,
    Soon,
    Normal,
}

impl Urgency {
    pub fn label(self) -> &'static str {
        match self {
            Urgency::Overdue => "Overdue",
            Urgency::Soon => "Due soon",
            Urgency::Normal => "Normal",
        }
    }
}

/// How many days ahead still count as "soon".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrgencyWindow(pub u32);

impl UrgencyWindow {
    pub const BILLS: UrgencyWindow = UrgencyWindow(3);
    pub const TODOS: UrgencyWindow = UrgencyWindow(7);

    pub fn days(self) -> u32 {
        self.0
    }
}

pub fn classify_urgency(days_until: i64, window: UrgencyWindow) -> Urgency {
    if days_until < 0 {
        Urgency::Overdue
    } else if days_until <= i64::from(window.days()) {
        Urgency::Soon
    } else {
        Urgency::Normal
    }
}

/// Parse a `YYYY-MM-DD` date or an RFC 3339 timestamp (date taken in UTC).
pub fn parse_date(s: &str) -> Result<NaiveDate, RecurrenceError> {
    let trimmed = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }
    Err(RecurrenceError::InvalidDate(s.to_string()))
}

/// The local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Something with a stored date that repeats on a cadence.
pub trait Recurring {
    /// The stored due / next date.
    fn anchor(&self) -> NaiveDate;

    fn cadence(&self) -> Frequency;

    /// The date to display: the stored date advanced past any lapsed periods.
    fn effective_date(&self, today: NaiveDate) -> Result<NaiveDate, RecurrenceError> {
        advance_until_future(self.anchor(), self.cadence(), today)
    }

    /// Whether the stored date needs rolling forward.
    fn is_lapsed(&self, today: NaiveDate) -> bool {
        self.cadence().is_recurring() && self.anchor() < today
    }
}

fn out_of_range(date: NaiveDate, frequency: Frequency) -> RecurrenceError {
    RecurrenceError::OutOfRange {
        date: date.to_string(),
        frequency: frequency.to_string(),
    }
}

//! Calendar period resolution for list reset cadences and goal periods.
//!
//! A reset period plus a reference date resolves to a concrete inclusive
//! [start, end] date range. `Static` lists never reset, so they resolve to
//! no range at all and callers aggregate completions all-time.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetPeriod {
    Daily,
    Weekly,
    Fortnightly,
    Monthly,
    Quarterly,
    Annually,
    Static,
}

impl ResetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Fortnightly => "fortnightly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annually => "annually",
            Self::Static => "static",
        }
    }

    pub fn parse(value: &str) -> Option<ResetPeriod> {
        match value {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "fortnightly" => Some(Self::Fortnightly),
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            "annually" => Some(Self::Annually),
            "static" => Some(Self::Static),
            _ => None,
        }
    }
}

/// Inclusive calendar range. Completion timestamps are compared against
/// `start 00:00:00` .. `end 23:59:59`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn start_timestamp(&self) -> String {
        format!("{} 00:00:00", self.start.format("%Y-%m-%d"))
    }

    pub fn end_timestamp(&self) -> String {
        format!("{} 23:59:59", self.end.format("%Y-%m-%d"))
    }
}

// Fortnights are 14-day blocks on a fixed Monday-anchored grid; this epoch
// is a Monday, so every block start is `epoch + 14k` days.
const FORTNIGHT_EPOCH: (i32, u32, u32) = (2024, 1, 1);

/// Maps a reset period and a reference date to the calendar range containing
/// that date. Returns `None` for `Static` (no boundary exists).
pub fn resolve_period(period: ResetPeriod, reference: NaiveDate) -> Option<DateRange> {
    match period {
        ResetPeriod::Static => None,
        ResetPeriod::Daily => Some(DateRange {
            start: reference,
            end: reference,
        }),
        ResetPeriod::Weekly => {
            let start = monday_of(reference);
            Some(DateRange {
                start,
                end: start + Duration::days(6),
            })
        }
        ResetPeriod::Fortnightly => {
            let monday = monday_of(reference);
            let (y, m, d) = FORTNIGHT_EPOCH;
            let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
            let offset = (monday - epoch).num_days().rem_euclid(14);
            let start = monday - Duration::days(offset);
            Some(DateRange {
                start,
                end: start + Duration::days(13),
            })
        }
        ResetPeriod::Monthly => {
            let start = reference.with_day(1)?;
            Some(DateRange {
                start,
                end: month_end(reference.year(), reference.month())?,
            })
        }
        ResetPeriod::Quarterly => {
            let quarter_month = (reference.month() - 1) / 3 * 3 + 1;
            Some(DateRange {
                start: NaiveDate::from_ymd_opt(reference.year(), quarter_month, 1)?,
                end: month_end(reference.year(), quarter_month + 2)?,
            })
        }
        ResetPeriod::Annually => Some(DateRange {
            start: NaiveDate::from_ymd_opt(reference.year(), 1, 1)?,
            end: NaiveDate::from_ymd_opt(reference.year(), 12, 31)?,
        }),
    }
}

/// Like [`resolve_period`], but a period starting in the future falls back to
/// the period containing `today`. Period navigation can never move past the
/// current real-world period.
pub fn resolve_period_clamped(
    period: ResetPeriod,
    reference: NaiveDate,
    today: NaiveDate,
) -> Option<DateRange> {
    match resolve_period(period, reference) {
        Some(range) if range.start > today => resolve_period(period, today),
        other => other,
    }
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }?;
    next.pred_opt()
}

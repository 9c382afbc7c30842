//! Weekly and biweekly occurrence expansion.
//!
//! A weekly allocation names a weekday, a daily time window, a biweekly
//! flag and a bounding date range. [`occurrence_dates`] turns that into the
//! concrete dates of the series with plain modular weekday arithmetic: the
//! first occurrence is the next-or-current matching weekday at or after the
//! series start, the last is the previous-or-current matching weekday at or
//! before the series end, and the step between them is 7 or 14 days. No
//! general recurrence-rule engine is involved; this is the only pattern the
//! system ever produces.
//!
//! The iterator is a pure function of its inputs — no hidden cursor, so two
//! expansions of the same schedule always agree.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::timespan::local_instant;
use chrono_tz::Tz;

/// One weekly (or biweekly) allocation slot bounded by a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub weekday: Weekday,
    pub daily_begin: NaiveTime,
    pub daily_end: NaiveTime,
    pub biweekly: bool,
    pub series_start: NaiveDate,
    pub series_end: NaiveDate,
}

impl WeeklySchedule {
    pub fn step_days(&self) -> i64 {
        if self.biweekly {
            14
        } else {
            7
        }
    }
}

/// The concrete dates of a schedule's occurrences, in order.
///
/// An empty range (`series_start > series_end`) or a range containing no
/// matching weekday yields an empty sequence — not an error.
///
/// ```
/// use booking_engine::{occurrence_dates, WeeklySchedule};
/// use chrono::{NaiveDate, NaiveTime, Weekday};
///
/// let schedule = WeeklySchedule {
///     weekday: Weekday::Mon,
///     daily_begin: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
///     daily_end: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
///     biweekly: false,
///     series_start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), // a Wednesday
///     series_end: NaiveDate::from_ymd_opt(2020, 1, 31).unwrap(),
/// };
/// let dates: Vec<_> = occurrence_dates(&schedule).collect();
/// assert_eq!(dates.len(), 4);
/// assert_eq!(dates[0], NaiveDate::from_ymd_opt(2020, 1, 6).unwrap());
/// assert_eq!(dates[3], NaiveDate::from_ymd_opt(2020, 1, 27).unwrap());
/// ```
pub fn occurrence_dates(schedule: &WeeklySchedule) -> OccurrenceDates {
    let target = schedule.weekday.num_days_from_monday() as i64;

    // Next-or-current matching weekday at or after the series start.
    let start_weekday = schedule.series_start.weekday().num_days_from_monday() as i64;
    let first = schedule.series_start + Duration::days((target - start_weekday).rem_euclid(7));

    // Previous-or-current matching weekday at or before the series end.
    let end_weekday = schedule.series_end.weekday().num_days_from_monday() as i64;
    let last = schedule.series_end - Duration::days((end_weekday - target).rem_euclid(7));

    let in_range = schedule.series_start <= schedule.series_end && first <= last;
    OccurrenceDates {
        upcoming: in_range.then_some(first),
        last,
        step_days: schedule.step_days(),
    }
}

/// Iterator over a schedule's occurrence dates. `Clone` restarts it from the
/// beginning of whatever remained.
#[derive(Debug, Clone)]
pub struct OccurrenceDates {
    upcoming: Option<NaiveDate>,
    last: NaiveDate,
    step_days: i64,
}

impl Iterator for OccurrenceDates {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.upcoming?;
        let stepped = current + Duration::days(self.step_days);
        self.upcoming = (stepped <= self.last).then_some(stepped);
        Some(current)
    }
}

/// A schedule's occurrences with the daily begin reattached as concrete
/// start instants in the resource's wall clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub weekday: Weekday,
    pub daily_begin: NaiveTime,
    pub daily_end: NaiveTime,
    pub start_timestamps: Vec<chrono::DateTime<chrono::Utc>>,
}

/// Expand a schedule into an [`Occurrence`].
///
/// # Errors
///
/// [`EngineError::PreconditionViolated`] when `daily_begin >= daily_end` or
/// a start instant falls into a DST gap in `tz`.
pub fn expand(schedule: &WeeklySchedule, tz: Tz) -> Result<Occurrence> {
    if schedule.daily_begin >= schedule.daily_end {
        return Err(EngineError::PreconditionViolated(format!(
            "daily begin must precede daily end (got {} / {})",
            schedule.daily_begin, schedule.daily_end
        )));
    }
    let start_timestamps = occurrence_dates(schedule)
        .map(|date| local_instant(tz, date, schedule.daily_begin))
        .collect::<Result<Vec<_>>>()?;
    Ok(Occurrence {
        weekday: schedule.weekday,
        daily_begin: schedule.daily_begin,
        daily_end: schedule.daily_end,
        start_timestamps,
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::UTC;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn schedule(start: NaiveDate, end: NaiveDate, weekday: Weekday, biweekly: bool) -> WeeklySchedule {
        WeeklySchedule {
            weekday,
            daily_begin: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            daily_end: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            biweekly,
            series_start: start,
            series_end: end,
        }
    }

    #[test]
    fn test_january_2020_mondays() {
        // 2020-01-01 is a Wednesday, so the first Monday is the 6th
        let s = schedule(date(2020, 1, 1), date(2020, 1, 31), Weekday::Mon, false);
        let dates: Vec<_> = occurrence_dates(&s).collect();
        assert_eq!(
            dates,
            vec![
                date(2020, 1, 6),
                date(2020, 1, 13),
                date(2020, 1, 20),
                date(2020, 1, 27),
            ]
        );
    }

    #[test]
    fn test_start_on_matching_weekday_is_included() {
        let s = schedule(date(2020, 1, 6), date(2020, 1, 20), Weekday::Mon, false);
        let dates: Vec<_> = occurrence_dates(&s).collect();
        assert_eq!(dates.first(), Some(&date(2020, 1, 6)));
        assert_eq!(dates.last(), Some(&date(2020, 1, 20)));
    }

    #[test]
    fn test_biweekly_steps_fourteen_days() {
        let s = schedule(date(2020, 1, 1), date(2020, 2, 29), Weekday::Mon, true);
        let dates: Vec<_> = occurrence_dates(&s).collect();
        assert_eq!(
            dates,
            vec![
                date(2020, 1, 6),
                date(2020, 1, 20),
                date(2020, 2, 3),
                date(2020, 2, 17),
            ]
        );
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let s = schedule(date(2020, 2, 1), date(2020, 1, 1), Weekday::Mon, false);
        assert_eq!(occurrence_dates(&s).count(), 0);
    }

    #[test]
    fn test_range_without_matching_weekday_is_empty() {
        // Wed 2020-01-01 through Fri 2020-01-03 holds no Monday
        let s = schedule(date(2020, 1, 1), date(2020, 1, 3), Weekday::Mon, false);
        assert_eq!(occurrence_dates(&s).count(), 0);
    }

    #[test]
    fn test_single_matching_day_range() {
        let s = schedule(date(2020, 1, 6), date(2020, 1, 6), Weekday::Mon, false);
        let dates: Vec<_> = occurrence_dates(&s).collect();
        assert_eq!(dates, vec![date(2020, 1, 6)]);
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let s = schedule(date(2020, 1, 1), date(2020, 6, 30), Weekday::Thu, false);
        let a: Vec<_> = occurrence_dates(&s).collect();
        let b: Vec<_> = occurrence_dates(&s).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_expand_attaches_start_instants() {
        let s = schedule(date(2020, 1, 1), date(2020, 1, 31), Weekday::Mon, false);
        let occurrence = expand(&s, UTC).unwrap();
        assert_eq!(occurrence.start_timestamps.len(), 4);
        assert_eq!(
            occurrence.start_timestamps[0].to_rfc3339(),
            "2020-01-06T17:00:00+00:00"
        );
    }

    #[test]
    fn test_expand_rejects_inverted_daily_window() {
        let mut s = schedule(date(2020, 1, 1), date(2020, 1, 31), Weekday::Mon, false);
        s.daily_begin = NaiveTime::from_hms_opt(19, 0, 0).unwrap();
        s.daily_end = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        let err = expand(&s, UTC).unwrap_err();
        assert!(!err.is_denial());
    }
}

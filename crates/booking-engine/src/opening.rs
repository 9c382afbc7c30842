//! Opening-hours data, the provider seam, and span clamping.
//!
//! The engine never owns opening-hours data; it consumes an ordered set of
//! open intervals per date through [`OpeningHoursProvider`] and reduces a
//! requested [`TimeRange`] to the portion that actually falls within open
//! hours ([`clamp`]).
//!
//! # Midnight sentinel
//!
//! A day that stays open through midnight encodes its interval end as
//! `00:00` — a continuation marker into the next calendar date, not an empty
//! interval. [`OpeningInterval::end_bound`] normalizes this.
//!
//! # Overnight-close policy
//!
//! For a multi-day request the scan stops at the *first* subsequent day that
//! does not stay open until midnight and clamps the end at that day's close,
//! even when later days would be open again. When the unit closes overnight
//! on the start date itself, the request collapses to a single-day span
//! ending at that close. Recurring-reservation materialization depends on
//! both behaviors; they are kept as-is deliberately.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constraints::{BlackoutRange, RoundStatus};
use crate::error::{EngineError, Result};
use crate::timespan::{local_instant, DateSpan, TimeRange};

// ── Opening intervals ───────────────────────────────────────────────────────

/// One open interval of a resource on one date, in the resource's wall
/// clock. `end == 00:00` means the unit stays open through midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningInterval {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl OpeningInterval {
    /// The closing time, or `None` when the interval runs through midnight.
    pub fn end_bound(&self) -> Option<NaiveTime> {
        (self.end != NaiveTime::MIN).then_some(self.end)
    }

    pub fn opens_through_midnight(&self) -> bool {
        self.end_bound().is_none()
    }
}

/// Synchronous capability over a resource's opening-hours source.
///
/// Implementations must return intervals ordered by date, then by start
/// time. The engine performs no I/O, retries, or timeouts on the provider's
/// behalf.
pub trait OpeningHoursProvider {
    fn open_intervals(&self, resource: &str, dates: DateSpan) -> Vec<OpeningInterval>;
}

/// In-memory provider over fixed interval data, for tests and callers whose
/// schedules are static.
#[derive(Debug, Clone, Default)]
pub struct StaticOpeningHours {
    by_resource: BTreeMap<String, BTreeMap<NaiveDate, Vec<OpeningInterval>>>,
}

impl StaticOpeningHours {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, resource: &str, interval: OpeningInterval) {
        let day = self
            .by_resource
            .entry(resource.to_string())
            .or_default()
            .entry(interval.date)
            .or_default();
        day.push(interval);
        day.sort_by_key(|iv| iv.start);
    }
}

impl OpeningHoursProvider for StaticOpeningHours {
    fn open_intervals(&self, resource: &str, dates: DateSpan) -> Vec<OpeningInterval> {
        let Some(by_date) = self.by_resource.get(resource) else {
            return Vec::new();
        };
        dates
            .days()
            .flat_map(|d| by_date.get(&d).into_iter().flatten().cloned())
            .collect()
    }
}

// ── Blackout lookup ─────────────────────────────────────────────────────────

/// The first *open* application round whose dates intersect `dates`, if any.
/// Closed rounds no longer bar direct bookings.
pub fn conflicting_blackout<'a>(
    rounds: &'a [BlackoutRange],
    dates: DateSpan,
) -> Option<&'a BlackoutRange> {
    rounds
        .iter()
        .find(|r| r.status == RoundStatus::Open && r.dates.intersects(&dates))
}

// ── Clamp ───────────────────────────────────────────────────────────────────

/// Reduce `requested` to the sub-span lying within the unit's open hours,
/// or `None` when the unit has no open interval intersecting the request on
/// its start date.
///
/// Single-day requests are clipped on whichever side overshoots the first
/// intersecting interval. Multi-day requests follow the overnight-close
/// policy documented at module level.
pub fn clamp<P>(
    requested: &TimeRange,
    resource: &str,
    tz: Tz,
    provider: &P,
) -> Result<Option<TimeRange>>
where
    P: OpeningHoursProvider + ?Sized,
{
    let begin_local = requested.begin().with_timezone(&tz);
    let end_local = requested.end().with_timezone(&tz);
    let start_date = begin_local.date_naive();
    let end_date = end_local.date_naive();

    let first_day = provider.open_intervals(resource, DateSpan::single(start_date));

    if start_date == end_date {
        return clamp_single_day(&first_day, start_date, begin_local.time(), end_local.time(), tz);
    }

    // Multi-day: the start day is tested against a window running to
    // midnight, since the stay continues past it.
    let Some(first) = first_day
        .iter()
        .find(|iv| intersects_window(iv, begin_local.time(), None))
    else {
        return Ok(None);
    };
    let clipped_begin = begin_local.time().max(first.start);
    let begin = local_instant(tz, start_date, clipped_begin)?;

    if let Some(close) = first.end_bound() {
        // Unit closes overnight: a single-day reservation is manufactured
        // from the multi-day request.
        let end = local_instant(tz, start_date, close)?;
        return TimeRange::new(begin, end).map(Some);
    }

    // Open through midnight on the start date: scan forward for the first
    // day that does not stay open until midnight and end there.
    let mut day = next_day(start_date)?;
    while day <= end_date {
        let intervals = provider.open_intervals(resource, DateSpan::single(day));
        let through_midnight = intervals.iter().any(|iv| iv.opens_through_midnight());
        if !through_midnight {
            let end = match intervals.iter().filter_map(|iv| iv.end_bound()).max() {
                Some(close) => local_instant(tz, day, close)?,
                // Closed the whole day: the stay ends where the previous
                // day did, at midnight.
                None => local_instant(tz, day, NaiveTime::MIN)?,
            };
            return TimeRange::new(begin, end).map(Some);
        }
        day = next_day(day)?;
    }

    // Open until midnight on every day through the requested end.
    Ok(Some(*requested))
}

fn clamp_single_day(
    intervals: &[OpeningInterval],
    date: NaiveDate,
    begin_t: NaiveTime,
    end_t: NaiveTime,
    tz: Tz,
) -> Result<Option<TimeRange>> {
    for iv in intervals {
        if !intersects_window(iv, begin_t, Some(end_t)) {
            continue;
        }
        let new_begin = begin_t.max(iv.start);
        let new_end = match iv.end_bound() {
            Some(close) if end_t > close => close,
            _ => end_t,
        };
        let begin = local_instant(tz, date, new_begin)?;
        let end = local_instant(tz, date, new_end)?;
        return TimeRange::new(begin, end).map(Some);
    }
    Ok(None)
}

/// Half-open intersection between an opening interval and a same-day window.
/// `until == None` means the window runs to the end of the day.
fn intersects_window(iv: &OpeningInterval, from: NaiveTime, until: Option<NaiveTime>) -> bool {
    let before_close = match iv.end_bound() {
        Some(close) => from < close,
        None => true,
    };
    let after_open = match until {
        Some(u) => iv.start < u,
        None => true,
    };
    before_close && after_open
}

fn next_day(date: NaiveDate) -> Result<NaiveDate> {
    date.succ_opt()
        .ok_or_else(|| EngineError::PreconditionViolated(format!("date overflow past {date}")))
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use chrono_tz::UTC;

    const R: &str = "court-1";

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn request(bd: u32, bh: u32, bm: u32, ed: u32, eh: u32, em: u32) -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2026, 3, bd, bh, bm, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, ed, eh, em, 0).unwrap(),
        )
        .unwrap()
    }

    fn provider(intervals: &[(u32, (u32, u32), (u32, u32))]) -> StaticOpeningHours {
        let mut hours = StaticOpeningHours::new();
        for &(d, (sh, sm), (eh, em)) in intervals {
            hours.add(
                R,
                OpeningInterval {
                    date: date(d),
                    start: t(sh, sm),
                    end: t(eh, em),
                },
            );
        }
        hours
    }

    // ── Single-day clamping ─────────────────────────────────────────────

    #[test]
    fn test_fully_inside_is_unchanged() {
        let hours = provider(&[(16, (8, 0), (20, 0))]);
        let req = request(16, 10, 0, 16, 12, 0);
        let got = clamp(&req, R, UTC, &hours).unwrap().unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn test_begin_clipped_to_opening() {
        let hours = provider(&[(16, (8, 0), (20, 0))]);
        let req = request(16, 6, 0, 16, 12, 0);
        let got = clamp(&req, R, UTC, &hours).unwrap().unwrap();
        assert_eq!(got, request(16, 8, 0, 16, 12, 0));
    }

    #[test]
    fn test_end_clipped_to_close() {
        let hours = provider(&[(16, (8, 0), (20, 0))]);
        let req = request(16, 18, 0, 16, 22, 0);
        let got = clamp(&req, R, UTC, &hours).unwrap().unwrap();
        assert_eq!(got, request(16, 18, 0, 16, 20, 0));
    }

    #[test]
    fn test_both_sides_clipped() {
        let hours = provider(&[(16, (8, 0), (20, 0))]);
        let req = request(16, 6, 0, 16, 22, 0);
        let got = clamp(&req, R, UTC, &hours).unwrap().unwrap();
        assert_eq!(got, request(16, 8, 0, 16, 20, 0));
    }

    #[test]
    fn test_closed_day_returns_none() {
        let hours = provider(&[(17, (8, 0), (20, 0))]);
        let req = request(16, 10, 0, 16, 12, 0);
        assert_eq!(clamp(&req, R, UTC, &hours).unwrap(), None);
    }

    #[test]
    fn test_request_outside_open_window_returns_none() {
        let hours = provider(&[(16, (8, 0), (12, 0))]);
        let req = request(16, 12, 0, 16, 14, 0);
        assert_eq!(clamp(&req, R, UTC, &hours).unwrap(), None);
    }

    #[test]
    fn test_second_interval_of_split_day_matches() {
        let hours = provider(&[(16, (8, 0), (11, 0)), (16, (13, 0), (20, 0))]);
        let req = request(16, 12, 0, 16, 15, 0);
        let got = clamp(&req, R, UTC, &hours).unwrap().unwrap();
        assert_eq!(got, request(16, 13, 0, 16, 15, 0));
    }

    // ── Multi-day clamping ──────────────────────────────────────────────

    #[test]
    fn test_overnight_close_manufactures_single_day() {
        let hours = provider(&[(16, (8, 0), (20, 0)), (17, (8, 0), (20, 0))]);
        let req = request(16, 18, 0, 17, 10, 0);
        let got = clamp(&req, R, UTC, &hours).unwrap().unwrap();
        assert_eq!(got, request(16, 18, 0, 16, 20, 0));
    }

    #[test]
    fn test_scan_stops_at_first_non_midnight_close() {
        // Day 16 open through midnight, day 17 open through midnight,
        // day 18 closes at 18:00. Requested end 02:00 on day 18; the clamp
        // ends at day 18's close, per the documented overnight policy.
        let hours = provider(&[
            (16, (8, 0), (0, 0)),
            (17, (0, 0), (0, 0)),
            (18, (0, 0), (18, 0)),
        ]);
        let req = request(16, 22, 0, 18, 2, 0);
        let got = clamp(&req, R, UTC, &hours).unwrap().unwrap();
        assert_eq!(got, request(16, 22, 0, 18, 18, 0));
    }

    #[test]
    fn test_fully_open_throughout_is_unchanged() {
        let hours = provider(&[
            (16, (8, 0), (0, 0)),
            (17, (0, 0), (0, 0)),
            (18, (0, 0), (0, 0)),
        ]);
        let req = request(16, 22, 0, 18, 2, 0);
        let got = clamp(&req, R, UTC, &hours).unwrap().unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn test_closed_intermediate_day_ends_at_its_midnight() {
        let hours = provider(&[(16, (8, 0), (0, 0)), (18, (8, 0), (20, 0))]);
        let req = request(16, 22, 0, 18, 10, 0);
        let got = clamp(&req, R, UTC, &hours).unwrap().unwrap();
        assert_eq!(got, request(16, 22, 0, 17, 0, 0));
    }

    #[test]
    fn test_closed_start_date_returns_none_for_multi_day() {
        let hours = provider(&[(17, (0, 0), (0, 0)), (18, (0, 0), (18, 0))]);
        let req = request(16, 22, 0, 18, 2, 0);
        assert_eq!(clamp(&req, R, UTC, &hours).unwrap(), None);
    }

    // ── Blackout lookup ─────────────────────────────────────────────────

    #[test]
    fn test_conflicting_blackout_ignores_closed_rounds() {
        let rounds = vec![
            BlackoutRange {
                dates: DateSpan::new(date(10), date(20)).unwrap(),
                status: RoundStatus::Closed,
            },
            BlackoutRange {
                dates: DateSpan::new(date(18), date(25)).unwrap(),
                status: RoundStatus::Open,
            },
        ];
        let hit = conflicting_blackout(&rounds, DateSpan::single(date(19))).unwrap();
        assert_eq!(hit.status, RoundStatus::Open);
        assert!(conflicting_blackout(&rounds, DateSpan::single(date(11))).is_none());
    }
}

//! Half-open time spans and inclusive date spans.
//!
//! [`TimeRange`] is the engine's unit of reserved time: a half-open span
//! `[begin, end)` of absolute instants. Two back-to-back reservations where
//! one ends exactly when the next begins do **not** overlap. [`DateSpan`] is
//! an inclusive pair of calendar dates, used for opening-hours lookups and
//! blackout intersection.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::{EngineError, Result};

// ── TimeRange ───────────────────────────────────────────────────────────────

/// A half-open span of absolute time: `[begin, end)`.
///
/// Construction enforces `begin < end`; a violated bound is a
/// [`EngineError::PreconditionViolated`], never a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    begin: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a span, rejecting empty and inverted bounds.
    pub fn new(begin: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if begin >= end {
            return Err(EngineError::PreconditionViolated(format!(
                "time range begin must precede end (got {begin} / {end})"
            )));
        }
        Ok(Self { begin, end })
    }

    pub fn begin(&self) -> DateTime<Utc> {
        self.begin
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.begin
    }

    /// Half-open intersection test: `a.begin < b.end && b.begin < a.end`.
    ///
    /// Symmetric in its arguments; a span ending exactly at another's begin
    /// does not intersect it.
    pub fn intersects(&self, other: &TimeRange) -> bool {
        self.begin < other.end && other.begin < self.end
    }

    /// Whether `other` lies fully inside this span.
    pub fn contains(&self, other: &TimeRange) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }

    /// The calendar dates this span touches, in the given wall-clock zone.
    ///
    /// The exclusive end instant itself is not counted: a span ending at
    /// midnight does not touch the following date.
    pub fn date_span(&self, tz: Tz) -> DateSpan {
        let start = self.begin.with_timezone(&tz).date_naive();
        let last_instant = (self.end - Duration::microseconds(1)).max(self.begin);
        let end = last_instant.with_timezone(&tz).date_naive();
        DateSpan { start, end }
    }
}

// ── DateSpan ────────────────────────────────────────────────────────────────

/// An inclusive span of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(EngineError::PreconditionViolated(format!(
                "date span start must not follow end (got {start} / {end})"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Every date in the span, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Inclusive intersection test.
    pub fn intersects(&self, other: &DateSpan) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

// ── Wall-clock helpers ──────────────────────────────────────────────────────

/// Resolve a wall-clock date and time in `tz` to an absolute instant.
///
/// A DST gap or fold makes the local time nonexistent or ambiguous; that is
/// reported as a precondition violation rather than resolved by guessing.
pub(crate) fn local_instant(tz: Tz, date: NaiveDate, time: NaiveTime) -> Result<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            EngineError::PreconditionViolated(format!(
                "ambiguous or nonexistent local time {date} {time} in {tz}"
            ))
        })
}

/// The instant the current wall-clock day began in `tz`.
pub(crate) fn start_of_day(now: DateTime<Utc>, tz: Tz) -> Result<DateTime<Utc>> {
    local_instant(tz, now.with_timezone(&tz).date_naive(), NaiveTime::MIN)
}

// ── Tests ───────────────────────────────────────────────────────────────────

//! Reservation legality checks for a single proposed time span.
//!
//! [`TimeWindowValidator`] runs the full battery of checks against one
//! resource, in a fixed order with first-failure short-circuit:
//!
//! 1. Reservability window (`reservable_after` / `reservable_until`)
//! 2. Raw overlap with existing reservations
//! 3. Duration bounds (max, then min)
//! 4. Buffer overlap against the nearest neighbours
//! 5. Lead-time bounds (too far in advance / too soon)
//! 6. Blackout: open application rounds
//! 7. Start-time quantization against the day's opening hours
//!
//! Which checks apply is chosen by the caller through a
//! [`CheckSet`](crate::CheckSet) — booking, staff override and adjustment
//! contexts share this one validator instead of a class hierarchy. The
//! validator mutates nothing; on success it hands back the effective buffer
//! durations so the caller can persist them alongside the reservation.
//!
//! `now` is an explicit parameter everywhere. The validator never reads the
//! process clock, so every decision is reproducible in tests.

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::constraints::{CheckSet, ExistingReservation, ReservationLookup, ResourceConstraints};
use crate::error::{EngineError, Result};
use crate::opening::{conflicting_blackout, OpeningHoursProvider, OpeningInterval};
use crate::timespan::{start_of_day, DateSpan, TimeRange};

/// Effective buffer durations computed during validation, for the caller to
/// persist alongside the accepted reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjustments {
    pub effective_buffer_before: Duration,
    pub effective_buffer_after: Duration,
}

/// The legality checks for one proposed reservation, configured by a
/// [`CheckSet`].
#[derive(Debug, Clone, Copy)]
pub struct TimeWindowValidator {
    checks: CheckSet,
}

impl TimeWindowValidator {
    pub fn new(checks: CheckSet) -> Self {
        Self { checks }
    }

    /// A validator running every check — direct user bookings.
    pub fn full() -> Self {
        Self::new(CheckSet::full())
    }

    /// Validate `proposed` against one resource.
    ///
    /// `existing` is a consistent snapshot of the resource's materialized
    /// reservations; `provider` supplies opening hours for the start-time
    /// quantization check. The first failing check decides the error.
    ///
    /// # Errors
    ///
    /// Any of the validation outcomes in [`EngineError`]; these are answers,
    /// not defects. [`EngineError::PreconditionViolated`] only occurs for
    /// contract breaches such as a DST-impossible wall-clock conversion.
    pub fn validate<L, P>(
        &self,
        proposed: &TimeRange,
        resource: &str,
        constraints: &ResourceConstraints,
        existing: &L,
        provider: &P,
        now: DateTime<Utc>,
    ) -> Result<Adjustments>
    where
        L: ReservationLookup + ?Sized,
        P: OpeningHoursProvider + ?Sized,
    {
        let checks = self.checks;
        let tz = constraints.timezone;

        if checks.reservability {
            if let Some(open_from) = constraints.reservable_after {
                if proposed.begin() < open_from {
                    return Err(EngineError::UnitNotReservable);
                }
            }
            if let Some(open_until) = constraints.reservable_until {
                if proposed.end() > open_until {
                    return Err(EngineError::UnitNotReservable);
                }
            }
        }

        if checks.overlap && existing.overlaps_any(proposed) {
            return Err(EngineError::Overlapping);
        }

        if checks.duration {
            let duration = proposed.duration();
            if let Some(max) = constraints.max_duration {
                if duration > max {
                    return Err(EngineError::MaxDurationExceeded);
                }
            }
            if duration < constraints.min_duration {
                return Err(EngineError::MinDurationNotMet);
            }
        }

        let preceding = existing.nearest_before(proposed.begin());
        let following = existing.nearest_after(proposed.end());
        let adjustments = Adjustments {
            effective_buffer_before: effective_buffer(constraints.buffer_before, preceding, |r| {
                r.buffer_after
            }),
            effective_buffer_after: effective_buffer(constraints.buffer_after, following, |r| {
                r.buffer_before
            }),
        };

        if checks.buffers {
            if let Some(prev) = preceding {
                if prev.span.end() + adjustments.effective_buffer_before > proposed.begin() {
                    return Err(EngineError::BufferOverlap);
                }
            }
            if let Some(next) = following {
                if next.span.begin() - adjustments.effective_buffer_after < proposed.end() {
                    return Err(EngineError::BufferOverlap);
                }
            }
        }

        if checks.lead_time {
            if let Some(max_days) = constraints.max_days_before {
                if now < proposed.begin() - Duration::days(max_days) {
                    return Err(EngineError::TooFarInAdvance);
                }
            }
            if let Some(min_days) = constraints.min_days_before {
                if start_of_day(now, tz)? > proposed.begin() - Duration::days(min_days) {
                    return Err(EngineError::TooSoon);
                }
            }
        }

        if checks.blackout
            && conflicting_blackout(&constraints.blocked_rounds, proposed.date_span(tz)).is_some()
        {
            return Err(EngineError::InBlackoutPeriod);
        }

        if checks.start_interval && !constraints.allows_without_opening_hours {
            let begin_local = proposed.begin().with_timezone(&tz);
            let intervals =
                provider.open_intervals(resource, DateSpan::single(begin_local.date_naive()));
            let Some(open_start) = opening_start_for(&intervals, begin_local.time()) else {
                return Err(EngineError::Closed);
            };
            let offset = (begin_local.time() - open_start).num_minutes();
            if offset.rem_euclid(constraints.start_interval.minutes()) != 0 {
                return Err(EngineError::InvalidStartInterval);
            }
        }

        Ok(adjustments)
    }
}

/// `max(resource buffer, neighbour's facing buffer)`, absent values as zero.
fn effective_buffer(
    own: Option<Duration>,
    neighbour: Option<&ExistingReservation>,
    facing: impl Fn(&ExistingReservation) -> Option<Duration>,
) -> Duration {
    let own = own.unwrap_or_else(Duration::zero);
    let theirs = neighbour.and_then(facing).unwrap_or_else(Duration::zero);
    own.max(theirs)
}

/// The opening-hour start the begin time is measured from: the interval
/// containing it, or the day's first interval when none does.
fn opening_start_for(intervals: &[OpeningInterval], t: NaiveTime) -> Option<NaiveTime> {
    intervals
        .iter()
        .find(|iv| t >= iv.start && iv.end_bound().is_none_or(|close| t < close))
        .or_else(|| intervals.first())
        .map(|iv| iv.start)
}

// ── Tests ───────────────────────────────────────────────────────────────────

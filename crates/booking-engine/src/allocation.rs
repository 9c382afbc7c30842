//! Materializing a weekly allocation into a series of reservations.
//!
//! One allocation result becomes one outcome per occurrence date: either a
//! reservation span ready to persist, or a recorded rejection. Rejections
//! never abort the series — a venue closed on one Tuesday must not cancel
//! the remaining weeks — and are returned in order so the caller can persist
//! them for audit.

use chrono_tz::Tz;
use serde::Serialize;

use crate::constraints::{ExistingReservation, ReservationLookup};
use crate::error::{EngineError, Result};
use crate::opening::{clamp, OpeningHoursProvider};
use crate::recurrence::{occurrence_dates, WeeklySchedule};
use crate::timespan::{local_instant, TimeRange};

/// Why one occurrence of a series could not be materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectionReason {
    /// The occurrence collides with an already-materialized reservation.
    Overlap,
    /// The unit has no open hours intersecting the occurrence.
    Closed,
}

/// The fate of one occurrence date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// The occurrence fits; the span is already clamped to open hours.
    Created(TimeRange),
    /// The occurrence was refused; the requested span is kept for audit.
    Rejected {
        reason: RejectionReason,
        requested: TimeRange,
    },
}

/// Materialize every occurrence of `schedule` against one resource.
///
/// Each occurrence is checked for overlap against the snapshot in
/// `existing` plus the spans created earlier in this same series, then
/// clamped to the unit's opening hours. Other legality checks are assumed
/// already satisfied by the allocation process that produced the schedule.
///
/// The result holds exactly one [`Outcome`] per occurrence date, in series
/// order. Callers parallelizing across resources must keep each resource's
/// snapshot consistent; this function does not guarantee atomicity of
/// check-then-create.
///
/// # Errors
///
/// [`EngineError::PreconditionViolated`] when the schedule's daily window
/// is inverted or a wall-clock conversion is impossible in `tz`.
pub fn materialize<P>(
    schedule: &WeeklySchedule,
    resource: &str,
    tz: Tz,
    existing: &[ExistingReservation],
    provider: &P,
) -> Result<Vec<Outcome>>
where
    P: OpeningHoursProvider + ?Sized,
{
    if schedule.daily_begin >= schedule.daily_end {
        return Err(EngineError::PreconditionViolated(format!(
            "daily begin must precede daily end (got {} / {})",
            schedule.daily_begin, schedule.daily_end
        )));
    }

    let mut booked = existing.to_vec();
    let mut outcomes = Vec::new();

    for date in occurrence_dates(schedule) {
        let requested = TimeRange::new(
            local_instant(tz, date, schedule.daily_begin)?,
            local_instant(tz, date, schedule.daily_end)?,
        )?;

        if booked.as_slice().overlaps_any(&requested) {
            outcomes.push(Outcome::Rejected {
                reason: RejectionReason::Overlap,
                requested,
            });
            continue;
        }

        match clamp(&requested, resource, tz, provider)? {
            Some(span) => {
                booked.push(ExistingReservation::bare(span));
                outcomes.push(Outcome::Created(span));
            }
            None => outcomes.push(Outcome::Rejected {
                reason: RejectionReason::Closed,
                requested,
            }),
        }
    }

    Ok(outcomes)
}

// ── Tests ───────────────────────────────────────────────────────────────────

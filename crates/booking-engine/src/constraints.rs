//! Resource-side reservation constraints and the existing-reservation seam.
//!
//! [`ResourceConstraints`] is read-only data owned by the bookable unit; the
//! engine consumes it and never mutates it. [`ReservationLookup`] is the
//! capability the engine needs over already-persisted reservations — nearest
//! neighbours for buffer arithmetic and a plain overlap test. An in-memory
//! snapshot (`[ExistingReservation]`) implements it directly; a caller backed
//! by a database implements the same three queries against its store.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::timespan::{DateSpan, TimeRange};

// ── Constraint data ─────────────────────────────────────────────────────────

/// Granularity at which a reservation is allowed to begin, measured from the
/// unit's opening-hour start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartInterval {
    Quarter,
    Half,
    Hour,
    HourAndHalf,
}

impl StartInterval {
    pub fn minutes(self) -> i64 {
        match self {
            StartInterval::Quarter => 15,
            StartInterval::Half => 30,
            StartInterval::Hour => 60,
            StartInterval::HourAndHalf => 90,
        }
    }
}

/// Lifecycle status of an application round. Only open rounds bar direct
/// bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    Open,
    Closed,
}

/// A date range during which direct bookings are barred because the unit is
/// reserved for a competing allocation process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlackoutRange {
    pub dates: DateSpan,
    pub status: RoundStatus,
}

/// Read-only booking rules owned by one bookable unit.
#[derive(Debug, Clone)]
pub struct ResourceConstraints {
    /// Wall-clock zone the unit's opening hours and day boundaries live in.
    pub timezone: Tz,
    pub min_duration: Duration,
    pub max_duration: Option<Duration>,
    /// Mandatory gap the unit requires before any reservation.
    pub buffer_before: Option<Duration>,
    /// Mandatory gap the unit requires after any reservation.
    pub buffer_after: Option<Duration>,
    pub start_interval: StartInterval,
    /// Earliest instant reservations may begin, if the unit is gated.
    pub reservable_after: Option<DateTime<Utc>>,
    /// Latest instant reservations may end, if the unit is gated.
    pub reservable_until: Option<DateTime<Utc>>,
    pub max_days_before: Option<i64>,
    pub min_days_before: Option<i64>,
    /// Carried for callers; enforcement needs a per-user count the engine
    /// does not see.
    pub max_reservations_per_user: Option<u32>,
    /// Units without managed opening hours skip start-time quantization.
    pub allows_without_opening_hours: bool,
    pub blocked_rounds: Vec<BlackoutRange>,
}

impl ResourceConstraints {
    /// Constraints that accept anything: zero minimum duration, no bounds,
    /// no rounds, quantization disabled. Tests and staging callers override
    /// the fields they care about.
    pub fn unrestricted(timezone: Tz) -> Self {
        Self {
            timezone,
            min_duration: Duration::zero(),
            max_duration: None,
            buffer_before: None,
            buffer_after: None,
            start_interval: StartInterval::Quarter,
            reservable_after: None,
            reservable_until: None,
            max_days_before: None,
            min_days_before: None,
            max_reservations_per_user: None,
            allows_without_opening_hours: true,
            blocked_rounds: Vec::new(),
        }
    }
}

// ── Existing reservations ───────────────────────────────────────────────────

/// The slice of a persisted reservation the engine needs for overlap and
/// buffer math. A view, never owned or mutated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingReservation {
    pub span: TimeRange,
    pub buffer_before: Option<Duration>,
    pub buffer_after: Option<Duration>,
}

impl ExistingReservation {
    /// A reservation carrying no buffers of its own.
    pub fn bare(span: TimeRange) -> Self {
        Self {
            span,
            buffer_before: None,
            buffer_after: None,
        }
    }
}

/// Lookup capability over the already-materialized reservations of one
/// resource. The engine only reads through this seam; consistency of the
/// snapshot across a check-then-create sequence is the caller's concern.
pub trait ReservationLookup {
    /// The reservation ending nearest at or before `instant`, by end.
    fn nearest_before(&self, instant: DateTime<Utc>) -> Option<&ExistingReservation>;

    /// The reservation beginning nearest at or after `instant`, by begin.
    fn nearest_after(&self, instant: DateTime<Utc>) -> Option<&ExistingReservation>;

    /// Whether any reservation's span intersects `span` (half-open).
    fn overlaps_any(&self, span: &TimeRange) -> bool;
}

impl ReservationLookup for [ExistingReservation] {
    fn nearest_before(&self, instant: DateTime<Utc>) -> Option<&ExistingReservation> {
        self.iter()
            .filter(|r| r.span.end() <= instant)
            .max_by_key(|r| r.span.end())
    }

    fn nearest_after(&self, instant: DateTime<Utc>) -> Option<&ExistingReservation> {
        self.iter()
            .filter(|r| r.span.begin() >= instant)
            .min_by_key(|r| r.span.begin())
    }

    fn overlaps_any(&self, span: &TimeRange) -> bool {
        self.iter().any(|r| r.span.intersects(span))
    }
}

// ── Check selection ─────────────────────────────────────────────────────────

/// Which of the validator's checks apply, selected by caller context.
///
/// Replaces the create/update/staff validator hierarchies of typical booking
/// backends with plain composition: one validator, one flag per check.
/// Fields are public so callers can assemble bespoke sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSet {
    pub reservability: bool,
    pub overlap: bool,
    pub duration: bool,
    pub buffers: bool,
    pub lead_time: bool,
    pub blackout: bool,
    pub start_interval: bool,
}

impl CheckSet {
    /// Every check — a direct booking by an end user.
    pub fn full() -> Self {
        Self {
            reservability: true,
            overlap: true,
            duration: true,
            buffers: true,
            lead_time: true,
            blackout: true,
            start_interval: true,
        }
    }

    /// Staff creating a reservation on a user's behalf: physical conflicts
    /// still apply, policy limits do not.
    pub fn staff_override() -> Self {
        Self {
            duration: false,
            lead_time: false,
            blackout: false,
            start_interval: false,
            ..Self::full()
        }
    }

    /// Adjusting an existing reservation: everything except lead-time
    /// bounds, which would otherwise forbid editing an imminent booking.
    pub fn adjustment() -> Self {
        Self {
            lead_time: false,
            ..Self::full()
        }
    }

    /// Only the raw overlap test, as used by allocation materialization.
    pub fn overlap_only() -> Self {
        Self {
            reservability: false,
            overlap: true,
            duration: false,
            buffers: false,
            lead_time: false,
            blackout: false,
            start_interval: false,
        }
    }
}

impl Default for CheckSet {
    fn default() -> Self {
        Self::full()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

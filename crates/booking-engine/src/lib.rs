//! # booking-engine
//!
//! Reservation time validity and recurrence resolution for facility-booking
//! backends.
//!
//! The engine decides whether a proposed time range for a bookable unit is
//! legal, clamps spans to the unit's real opening hours, expands weekly and
//! biweekly allocation patterns into concrete dated occurrences, and computes
//! prices from duration — as pure functions over immutable inputs. It owns no
//! state, performs no I/O and never reads the process clock: the caller
//! supplies the `now` anchor, the opening-hours data and the reservation
//! snapshot, and persists whatever the engine decides.
//!
//! ## Modules
//!
//! - [`validator`] — the legality checks for one proposed reservation
//! - [`opening`] — opening-hours data, provider seam, and span clamping
//! - [`recurrence`] — weekly/biweekly occurrence expansion
//! - [`allocation`] — materializing an allocation into a reservation series
//! - [`pricing`] — deterministic price computation from duration
//! - [`constraints`] — resource booking rules and the reservation-lookup seam
//! - [`timespan`] — half-open time spans and inclusive date spans
//! - [`error`] — error types

pub mod allocation;
pub mod constraints;
pub mod error;
pub mod opening;
pub mod pricing;
pub mod recurrence;
pub mod timespan;
pub mod validator;

pub use allocation::{materialize, Outcome, RejectionReason};
pub use constraints::{
    BlackoutRange, CheckSet, ExistingReservation, ReservationLookup, ResourceConstraints,
    RoundStatus, StartInterval,
};
pub use error::{EngineError, Result};
pub use opening::{
    clamp, conflicting_blackout, OpeningHoursProvider, OpeningInterval, StaticOpeningHours,
};
pub use pricing::{active_rule, price, price_total, PriceQuote, PriceUnit, PricingRule, PricingType};
pub use recurrence::{expand, occurrence_dates, Occurrence, OccurrenceDates, WeeklySchedule};
pub use timespan::{DateSpan, TimeRange};
pub use validator::{Adjustments, TimeWindowValidator};

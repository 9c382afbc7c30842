//! Error types for booking-engine decisions.

use thiserror::Error;

/// Why a proposed reservation was refused, or why a call could not be
/// evaluated at all.
///
/// Every variant except [`EngineError::PreconditionViolated`] is a
/// *validation outcome*: a legitimate answer the caller can present to an
/// end user. `PreconditionViolated` signals a programming-contract breach
/// (e.g. `begin >= end` passed in) and is fatal to the single call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("unit is not reservable in the requested window")]
    UnitNotReservable,

    #[error("time span overlaps an existing reservation")]
    Overlapping,

    #[error("reservation is longer than the maximum allowed duration")]
    MaxDurationExceeded,

    #[error("reservation is shorter than the minimum required duration")]
    MinDurationNotMet,

    #[error("required buffer time around an existing reservation is violated")]
    BufferOverlap,

    #[error("reservation begins too far in advance")]
    TooFarInAdvance,

    #[error("reservation begins too soon")]
    TooSoon,

    #[error("requested dates fall within an open application round")]
    InBlackoutPeriod,

    #[error("begin time is not aligned to the unit's start interval")]
    InvalidStartInterval,

    #[error("unit is closed for the requested span")]
    Closed,

    #[error("precondition violated: {0}")]
    PreconditionViolated(String),
}

impl EngineError {
    /// Whether this error is a validation outcome rather than a
    /// programming-contract violation.
    pub fn is_denial(&self) -> bool {
        !matches!(self, Self::PreconditionViolated(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

//! Booking domain errors.

use common::{ReservationId, SpotId, UserId};
use reservation_store::{ReservationStatus, StoreError};
use thiserror::Error;

/// Errors that can occur during booking operations.
///
/// Every rejected operation surfaces as its specific variant; the core
/// never coerces an invalid request into a different outcome, and never
/// retries. [`Store`](BookingError::Store) carries only infrastructure
/// failures (store unreachable, corrupt row) — domain-meaningful store
/// errors are translated by each operation into the matching variant
/// before wrapping.
#[derive(Debug, Error)]
pub enum BookingError {
    /// The referenced spot does not exist.
    #[error("spot not found: {0}")]
    SpotNotFound(SpotId),

    /// The referenced reservation does not exist.
    #[error("reservation not found: {0}")]
    ReservationNotFound(ReservationId),

    /// The spot exists but is not accepting bookings.
    #[error("spot {0} is not accepting bookings")]
    SpotUnavailable(SpotId),

    /// The requested window violates ordering or future-time constraints.
    #[error("invalid booking window: {reason}")]
    InvalidWindow { reason: &'static str },

    /// A confirmed reservation already holds an overlapping window on the
    /// spot. The caller must pick a different window or abandon.
    #[error("a confirmed reservation already overlaps the requested window on spot {spot_id}")]
    Conflict { spot_id: SpotId },

    /// The acting user lacks the rights for this transition.
    #[error("user {user_id} may not {action} this reservation")]
    Forbidden {
        user_id: UserId,
        action: &'static str,
    },

    /// The reservation's current status does not permit the transition.
    #[error("cannot {action} a reservation that is {status}")]
    InvalidTransition {
        status: ReservationStatus,
        action: &'static str,
    },

    /// An infrastructure failure in the reservation store. Not a domain
    /// rejection; callers apply their own retry/backoff policy.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl BookingError {
    /// Translates a status-update failure into the domain variant for the
    /// transition named by `action`.
    pub(crate) fn from_transition(err: StoreError, action: &'static str) -> Self {
        match err {
            StoreError::NotFound(id) => BookingError::ReservationNotFound(id),
            StoreError::UnexpectedStatus { actual, .. } => BookingError::InvalidTransition {
                status: actual,
                action,
            },
            StoreError::ConfirmedOverlap { spot_id } => BookingError::Conflict { spot_id },
            other => BookingError::Store(other),
        }
    }
}

/// Result type for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;

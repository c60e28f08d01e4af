//! Reservation records and the status state machine.

use chrono::{DateTime, Utc};
use common::{Money, ReservationId, SpotId, TimeWindow, UserId};
use serde::{Deserialize, Serialize};

/// The lifecycle status of a reservation.
///
/// Transitions:
/// ```text
/// Pending ──► Confirmed ──► Completed
///    │            │
///    └────────────┴──► Cancelled
/// ```
///
/// Confirmed is the only status that blocks competing bookings; Cancelled
/// and Completed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Created by a renter, awaiting the host's decision.
    #[default]
    Pending,

    /// Approved by the host; holds the spot for its window.
    Confirmed,

    /// Withdrawn by the renter or the host (terminal state).
    Cancelled,

    /// The stay took place and the window has passed (terminal state).
    Completed,
}

impl ReservationStatus {
    /// Statuses from which Confirm may proceed.
    ///
    /// These sets are the expected-status arguments the lifecycle hands
    /// to [`update_status`](crate::ReservationStore::update_status); a
    /// status in no set is terminal.
    pub const CONFIRMABLE: &'static [ReservationStatus] = &[ReservationStatus::Pending];

    /// Statuses from which Cancel may proceed.
    pub const CANCELLABLE: &'static [ReservationStatus] =
        &[ReservationStatus::Pending, ReservationStatus::Confirmed];

    /// Statuses from which Complete may proceed.
    pub const COMPLETABLE: &'static [ReservationStatus] = &[ReservationStatus::Confirmed];

    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
        }
    }

    /// Parses a stored status name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReservationStatus::Pending),
            "confirmed" => Some(ReservationStatus::Confirmed),
            "cancelled" => Some(ReservationStatus::Cancelled),
            "completed" => Some(ReservationStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A renter's booking of a spot for a time window.
///
/// The record is created Pending by the store and thereafter mutated only
/// through status transitions; it is never deleted (cancellation is a
/// status, not a removal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Store-assigned identifier.
    pub id: ReservationId,

    /// The booked spot.
    pub spot_id: SpotId,

    /// The renter who created the reservation.
    pub renter_id: UserId,

    /// The booked half-open window `[start, end)`.
    pub window: TimeWindow,

    /// Total price, fixed at creation from the spot's rates and the
    /// window's duration.
    pub total_price: Money,

    /// Current lifecycle status.
    pub status: ReservationStatus,

    /// Store-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// The insert payload for a new reservation.
///
/// `id`, `created_at`, and the initial Pending status are assigned by the
/// store inside the atomic insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReservation {
    /// The spot being booked.
    pub spot_id: SpotId,

    /// The renter booking it.
    pub renter_id: UserId,

    /// The requested window; the caller has already validated ordering.
    pub window: TimeWindow,

    /// The quoted total price.
    pub total_price: Money,
}

impl NewReservation {
    /// Creates an insert payload.
    pub fn new(spot_id: SpotId, renter_id: UserId, window: TimeWindow, total_price: Money) -> Self {
        Self {
            spot_id,
            renter_id,
            window,
            total_price,
        }
    }
}

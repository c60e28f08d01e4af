use common::{ReservationId, SpotId};
use thiserror::Error;

use crate::reservation::ReservationStatus;

/// Errors that can occur when interacting with the reservation store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No reservation exists with the given id.
    #[error("reservation not found: {0}")]
    NotFound(ReservationId),

    /// A confirmed reservation on the same spot overlaps the window being
    /// inserted or confirmed.
    #[error("a confirmed reservation already overlaps the requested window on spot {spot_id}")]
    ConfirmedOverlap { spot_id: SpotId },

    /// A conditional status update found the reservation in a status
    /// outside the caller's expected set. The racing update that got
    /// there first wins; the caller observes this error.
    #[error("reservation {id} is {actual}, which does not permit this update")]
    UnexpectedStatus {
        id: ReservationId,
        actual: ReservationStatus,
    },

    /// A stored row could not be decoded into a record.
    #[error("corrupt reservation row: {0}")]
    Decode(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

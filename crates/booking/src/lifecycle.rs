//! The reservation lifecycle manager: confirm, cancel, complete.

use chrono::{DateTime, Utc};
use common::{ReservationId, UserId};
use reservation_store::{
    Reservation, ReservationStatus, ReservationStore, Spot, SpotDirectory, StoreError,
};

use crate::error::{BookingError, Result};

/// Service that advances reservations through their state machine.
///
/// ```text
/// Pending ──► Confirmed ──► Completed
///    │            │
///    └────────────┴──► Cancelled
/// ```
///
/// Confirm and Cancel check who is acting; both ride the store's
/// compare-and-swap, so when two transitions race on one reservation the
/// first committed update wins and the loser observes
/// [`InvalidTransition`](BookingError::InvalidTransition). Confirmation
/// additionally re-checks for overlapping Confirmed reservations (the
/// reservation's own id excluded) in the same atomic step, so two
/// independently created Pending bookings can never both become Confirmed
/// over a shared instant.
pub struct LifecycleManager<S, D> {
    store: S,
    directory: D,
}

impl<S: ReservationStore, D: SpotDirectory> LifecycleManager<S, D> {
    /// Creates a lifecycle manager over the given store and spot directory.
    pub fn new(store: S, directory: D) -> Self {
        Self { store, directory }
    }

    /// Confirms a Pending reservation. Only the host of the reservation's
    /// spot may confirm.
    #[tracing::instrument(skip(self))]
    pub async fn confirm(
        &self,
        reservation_id: ReservationId,
        acting_host_id: UserId,
    ) -> Result<Reservation> {
        let (reservation, spot) = self.load_with_spot(reservation_id).await?;

        if spot.host_id != acting_host_id {
            return Err(BookingError::Forbidden {
                user_id: acting_host_id,
                action: "confirm",
            });
        }

        let confirmed = self
            .store
            .update_status(
                reservation.id,
                ReservationStatus::CONFIRMABLE,
                ReservationStatus::Confirmed,
            )
            .await
            .map_err(|e| {
                if matches!(e, StoreError::ConfirmedOverlap { .. }) {
                    metrics::counter!("booking_conflicts_total").increment(1);
                }
                BookingError::from_transition(e, "confirm")
            })?;

        metrics::counter!("reservations_confirmed_total").increment(1);
        tracing::info!(reservation_id = %confirmed.id, "reservation confirmed");
        Ok(confirmed)
    }

    /// Cancels a Pending or Confirmed reservation. Only the renter who
    /// created it or the host of its spot may cancel. No refund logic.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(
        &self,
        reservation_id: ReservationId,
        acting_user_id: UserId,
    ) -> Result<Reservation> {
        let (reservation, spot) = self.load_with_spot(reservation_id).await?;

        if reservation.renter_id != acting_user_id && spot.host_id != acting_user_id {
            return Err(BookingError::Forbidden {
                user_id: acting_user_id,
                action: "cancel",
            });
        }

        let cancelled = self
            .store
            .update_status(
                reservation.id,
                ReservationStatus::CANCELLABLE,
                ReservationStatus::Cancelled,
            )
            .await
            .map_err(|e| BookingError::from_transition(e, "cancel"))?;

        metrics::counter!("reservations_cancelled_total").increment(1);
        tracing::info!(reservation_id = %cancelled.id, "reservation cancelled");
        Ok(cancelled)
    }

    /// Completes a Confirmed reservation.
    ///
    /// Administrative transition: no actor check and no overlap
    /// re-validation, since a Confirmed reservation already holds its
    /// window.
    #[tracing::instrument(skip(self))]
    pub async fn complete(&self, reservation_id: ReservationId) -> Result<Reservation> {
        let completed = self
            .store
            .update_status(
                reservation_id,
                ReservationStatus::COMPLETABLE,
                ReservationStatus::Completed,
            )
            .await
            .map_err(|e| BookingError::from_transition(e, "complete"))?;

        metrics::counter!("reservations_completed_total").increment(1);
        Ok(completed)
    }

    /// Completes every Confirmed reservation whose window has ended by
    /// `cutoff`, returning the reservations that were completed.
    ///
    /// Intended to be scheduled by the host process (e.g. hourly with
    /// `cutoff = Utc::now()`). A reservation whose status changed between
    /// the scan and the update lost a race with a concurrent cancel; it is
    /// skipped, not an error.
    #[tracing::instrument(skip(self))]
    pub async fn complete_elapsed(&self, cutoff: DateTime<Utc>) -> Result<Vec<Reservation>> {
        let due = self.store.confirmed_ending_before(cutoff).await?;

        let mut completed = Vec::with_capacity(due.len());
        for reservation in due {
            match self
                .store
                .update_status(
                    reservation.id,
                    ReservationStatus::COMPLETABLE,
                    ReservationStatus::Completed,
                )
                .await
            {
                Ok(done) => {
                    metrics::counter!("reservations_completed_total").increment(1);
                    completed.push(done);
                }
                Err(StoreError::UnexpectedStatus { id, actual }) => {
                    tracing::debug!(reservation_id = %id, status = %actual, "sweep skipped reservation");
                }
                Err(other) => return Err(other.into()),
            }
        }

        tracing::info!(count = completed.len(), "completion sweep finished");
        Ok(completed)
    }

    async fn load_with_spot(&self, reservation_id: ReservationId) -> Result<(Reservation, Spot)> {
        let reservation = self
            .store
            .get(reservation_id)
            .await?
            .ok_or(BookingError::ReservationNotFound(reservation_id))?;

        let spot = self
            .directory
            .get_spot(reservation.spot_id)
            .await?
            .ok_or(BookingError::SpotNotFound(reservation.spot_id))?;

        Ok((reservation, spot))
    }
}

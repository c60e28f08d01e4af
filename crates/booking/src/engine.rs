//! The booking engine: validates requests, quotes prices, creates
//! reservations.

use chrono::Utc;
use common::{SpotId, TimeWindow, UserId};
use serde::{Deserialize, Serialize};
use reservation_store::{
    NewReservation, Reservation, ReservationStore, SpotDirectory, StoreError,
};

use crate::{
    error::{BookingError, Result},
    pricing,
};

/// A renter's request to book a spot for a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    /// The spot to book.
    pub spot_id: SpotId,

    /// The renter making the request.
    pub renter_id: UserId,

    /// The requested half-open window `[start, end)`.
    pub window: TimeWindow,
}

impl BookingRequest {
    /// Creates a booking request.
    pub fn new(spot_id: SpotId, renter_id: UserId, window: TimeWindow) -> Self {
        Self {
            spot_id,
            renter_id,
            window,
        }
    }
}

/// Service that turns booking requests into Pending reservations.
///
/// Preconditions are checked in a fixed order, each failing with its own
/// error: spot exists, spot is available, start is in the future, end is
/// after start, and no Confirmed reservation overlaps the window. The
/// overlap check runs inside the store's atomic insert, so two racing
/// requests cannot both slip past it.
pub struct BookingEngine<S, D> {
    store: S,
    directory: D,
}

impl<S: ReservationStore, D: SpotDirectory> BookingEngine<S, D> {
    /// Creates a booking engine over the given store and spot directory.
    pub fn new(store: S, directory: D) -> Self {
        Self { store, directory }
    }

    /// Books a spot for a window, returning the new Pending reservation.
    ///
    /// The price is quoted from the spot's rates and the window's duration
    /// and fixed on the record at creation. A successful booking does not
    /// flip the spot's availability; overlapping Pending reservations may
    /// coexist, and only a Confirmed reservation blocks.
    #[tracing::instrument(skip(self))]
    pub async fn create_reservation(&self, request: BookingRequest) -> Result<Reservation> {
        let spot = self
            .directory
            .get_spot(request.spot_id)
            .await?
            .ok_or(BookingError::SpotNotFound(request.spot_id))?;

        if !spot.is_available {
            return Err(BookingError::SpotUnavailable(spot.id));
        }
        if request.window.start <= Utc::now() {
            return Err(BookingError::InvalidWindow {
                reason: "start must be in the future",
            });
        }
        if !request.window.is_ordered() {
            return Err(BookingError::InvalidWindow {
                reason: "end must be after start",
            });
        }

        let total_price =
            pricing::quote(spot.hourly_rate, spot.daily_rate, request.window.duration());

        let created = self
            .store
            .create(NewReservation::new(
                request.spot_id,
                request.renter_id,
                request.window,
                total_price,
            ))
            .await
            .map_err(|e| match e {
                StoreError::ConfirmedOverlap { spot_id } => {
                    metrics::counter!("booking_conflicts_total").increment(1);
                    BookingError::Conflict { spot_id }
                }
                other => BookingError::Store(other),
            })?;

        metrics::counter!("reservations_created_total").increment(1);
        tracing::info!(
            reservation_id = %created.id,
            spot_id = %created.spot_id,
            price = %created.total_price,
            "reservation created"
        );
        Ok(created)
    }

    /// Lists all reservations the renter has created, ordered by window
    /// start.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_renter(&self, renter_id: UserId) -> Result<Vec<Reservation>> {
        Ok(self.store.list_by_renter(renter_id).await?)
    }

    /// Lists all reservations across the host's spots, ordered by window
    /// start.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_host(&self, host_id: UserId) -> Result<Vec<Reservation>> {
        Ok(self.store.list_by_host(host_id).await?)
    }
}

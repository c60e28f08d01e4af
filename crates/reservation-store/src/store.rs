use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ReservationId, SpotId, TimeWindow, UserId};

use crate::{
    error::Result,
    reservation::{NewReservation, Reservation, ReservationStatus},
};

/// Core trait for reservation store backends.
///
/// The store is the shared resource every booking decision races over, so
/// the two mutating operations are atomic units:
///
/// - [`create`](ReservationStore::create) runs the confirmed-overlap check
///   and the insert in one step;
/// - [`update_status`](ReservationStore::update_status) is a
///   compare-and-swap on the status, and when the target status is
///   Confirmed it enforces the no-overlapping-Confirmed constraint in the
///   same step.
///
/// Split read-then-write sequences against these invariants are exactly
/// what the trait exists to prevent: a lost race surfaces as
/// [`ConfirmedOverlap`](crate::StoreError::ConfirmedOverlap) or
/// [`UnexpectedStatus`](crate::StoreError::UnexpectedStatus), never as a
/// silently double-booked spot.
///
/// All implementations must be thread-safe (Send + Sync). Callers resolve
/// the spot through [`SpotDirectory`](crate::SpotDirectory) before
/// inserting; the store does not re-validate spot existence or window
/// ordering.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Inserts a new Pending reservation unless a Confirmed reservation on
    /// the same spot overlaps its window.
    ///
    /// The store assigns the id and creation timestamp. Overlapping
    /// Pending reservations are permitted; only Confirmed rows block.
    async fn create(&self, new: NewReservation) -> Result<Reservation>;

    /// Retrieves a reservation by id. Returns `None` if absent.
    async fn get(&self, id: ReservationId) -> Result<Option<Reservation>>;

    /// Conditionally moves a reservation to `target` status.
    ///
    /// Fails with `UnexpectedStatus` if the current status is not in
    /// `expected`, and with `ConfirmedOverlap` if `target` is Confirmed
    /// and another Confirmed reservation overlaps the window (the updated
    /// reservation's own id is excluded from that check). Returns the
    /// updated record.
    async fn update_status(
        &self,
        id: ReservationId,
        expected: &[ReservationStatus],
        target: ReservationStatus,
    ) -> Result<Reservation>;

    /// Returns the Confirmed reservations on `spot_id` whose windows
    /// overlap `window`, ordered by window start.
    ///
    /// `exclude` removes that reservation id from the candidate set before
    /// any overlap is evaluated, so a reservation never conflicts with
    /// itself.
    async fn find_confirmed_overlapping(
        &self,
        spot_id: SpotId,
        window: TimeWindow,
        exclude: Option<ReservationId>,
    ) -> Result<Vec<Reservation>>;

    /// Returns all reservations created by `renter_id`, ordered by window
    /// start.
    async fn list_by_renter(&self, renter_id: UserId) -> Result<Vec<Reservation>>;

    /// Returns all reservations across the spots hosted by `host_id`
    /// (spot-ownership join), ordered by window start.
    async fn list_by_host(&self, host_id: UserId) -> Result<Vec<Reservation>>;

    /// Returns true if a reservation exists for the spot/renter pair with
    /// the given status.
    async fn exists_for_spot_and_renter(
        &self,
        spot_id: SpotId,
        renter_id: UserId,
        status: ReservationStatus,
    ) -> Result<bool>;

    /// Returns the Confirmed reservations whose window end is at or before
    /// `cutoff`, ordered by window end. Feeds the completion sweep.
    async fn confirmed_ending_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Reservation>>;
}

//! The review gate: decides review eligibility from completed stays.

use common::{SpotId, UserId};
use reservation_store::{ReservationStatus, ReservationStore};

use crate::error::Result;

/// Predicate consumed by the review-authoring layer outside the core.
///
/// Thin query over the reservation store; writing and storing the review
/// itself lives elsewhere.
pub struct ReviewGate<S> {
    store: S,
}

impl<S: ReservationStore> ReviewGate<S> {
    /// Creates a review gate over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns true iff the renter has a Completed reservation on the spot.
    #[tracing::instrument(skip(self))]
    pub async fn has_completed_stay(&self, spot_id: SpotId, renter_id: UserId) -> Result<bool> {
        Ok(self
            .store
            .exists_for_spot_and_renter(spot_id, renter_id, ReservationStatus::Completed)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use common::{Money, TimeWindow};
    use reservation_store::{InMemoryStore, NewReservation, Spot};

    #[tokio::test]
    async fn only_completed_stays_unlock_reviews() {
        let store = InMemoryStore::new();
        let spot = Spot::new(
            SpotId::new(),
            UserId::new(),
            Money::from_dollars(10),
            Money::from_dollars(80),
        );
        store.insert_spot(spot.clone()).await;
        let renter = UserId::new();
        let gate = ReviewGate::new(store.clone());

        assert!(!gate.has_completed_stay(spot.id, renter).await.unwrap());

        let base = Utc::now() + Duration::days(7);
        let reservation = store
            .create(NewReservation::new(
                spot.id,
                renter,
                TimeWindow::new(base, base + Duration::hours(3)),
                Money::from_dollars(30),
            ))
            .await
            .unwrap();

        // Pending and Confirmed stays do not qualify.
        assert!(!gate.has_completed_stay(spot.id, renter).await.unwrap());
        store
            .update_status(
                reservation.id,
                &[ReservationStatus::Pending],
                ReservationStatus::Confirmed,
            )
            .await
            .unwrap();
        assert!(!gate.has_completed_stay(spot.id, renter).await.unwrap());

        store
            .update_status(
                reservation.id,
                &[ReservationStatus::Confirmed],
                ReservationStatus::Completed,
            )
            .await
            .unwrap();
        assert!(gate.has_completed_stay(spot.id, renter).await.unwrap());

        // Eligibility is scoped to the exact spot/renter pair.
        assert!(!gate.has_completed_stay(spot.id, UserId::new()).await.unwrap());
        assert!(!gate.has_completed_stay(SpotId::new(), renter).await.unwrap());
    }
}

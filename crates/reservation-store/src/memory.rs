use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ReservationId, SpotId, TimeWindow, UserId};
use tokio::sync::RwLock;

use crate::{
    error::{Result, StoreError},
    reservation::{NewReservation, Reservation, ReservationStatus},
    spot::{Spot, SpotDirectory},
    store::ReservationStore,
};

#[derive(Debug, Default)]
struct State {
    spots: HashMap<SpotId, Spot>,
    reservations: HashMap<ReservationId, Reservation>,
}

impl State {
    /// Confirmed reservations on `spot_id` overlapping `window`, with
    /// `exclude` removed from the candidate set before evaluation.
    fn confirmed_overlapping(
        &self,
        spot_id: SpotId,
        window: TimeWindow,
        exclude: Option<ReservationId>,
    ) -> Vec<Reservation> {
        let mut hits: Vec<Reservation> = self
            .reservations
            .values()
            .filter(|r| Some(r.id) != exclude)
            .filter(|r| {
                r.spot_id == spot_id
                    && r.status == ReservationStatus::Confirmed
                    && r.window.overlaps(&window)
            })
            .cloned()
            .collect();
        sort_by_window(&mut hits);
        hits
    }
}

fn sort_by_window(reservations: &mut [Reservation]) {
    reservations.sort_by_key(|r| (r.window.start, r.created_at, r.id.as_uuid()));
}

/// In-memory store implementation.
///
/// Holds the spot directory and the reservation table behind a single
/// `RwLock`, so each mutating operation is one critical section and
/// provides the same atomicity as the PostgreSQL backend. Doubles as the
/// test backend.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a spot record.
    pub async fn insert_spot(&self, spot: Spot) {
        self.state.write().await.spots.insert(spot.id, spot);
    }

    /// Flips a spot's availability flag. Returns false if the spot does
    /// not exist.
    pub async fn set_spot_available(&self, id: SpotId, available: bool) -> bool {
        match self.state.write().await.spots.get_mut(&id) {
            Some(spot) => {
                spot.is_available = available;
                true
            }
            None => false,
        }
    }

    /// Returns the total number of reservations stored.
    pub async fn reservation_count(&self) -> usize {
        self.state.read().await.reservations.len()
    }

    /// Clears all spots and reservations.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.spots.clear();
        state.reservations.clear();
    }
}

#[async_trait]
impl SpotDirectory for InMemoryStore {
    async fn get_spot(&self, id: SpotId) -> Result<Option<Spot>> {
        Ok(self.state.read().await.spots.get(&id).cloned())
    }
}

#[async_trait]
impl ReservationStore for InMemoryStore {
    async fn create(&self, new: NewReservation) -> Result<Reservation> {
        let mut state = self.state.write().await;

        // Check and insert inside one write-lock critical section.
        if let Some(conflict) = state
            .confirmed_overlapping(new.spot_id, new.window, None)
            .into_iter()
            .next()
        {
            return Err(StoreError::ConfirmedOverlap {
                spot_id: conflict.spot_id,
            });
        }

        let reservation = Reservation {
            id: ReservationId::new(),
            spot_id: new.spot_id,
            renter_id: new.renter_id,
            window: new.window,
            total_price: new.total_price,
            status: ReservationStatus::Pending,
            created_at: Utc::now(),
        };
        state.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn get(&self, id: ReservationId) -> Result<Option<Reservation>> {
        Ok(self.state.read().await.reservations.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: ReservationId,
        expected: &[ReservationStatus],
        target: ReservationStatus,
    ) -> Result<Reservation> {
        let mut state = self.state.write().await;

        let current = state
            .reservations
            .get(&id)
            .ok_or(StoreError::NotFound(id))?
            .clone();

        if !expected.contains(&current.status) {
            return Err(StoreError::UnexpectedStatus {
                id,
                actual: current.status,
            });
        }

        // Confirming must not create a second Confirmed holder of any
        // overlapping window; the row being updated is excluded by id.
        if target == ReservationStatus::Confirmed
            && !state
                .confirmed_overlapping(current.spot_id, current.window, Some(id))
                .is_empty()
        {
            return Err(StoreError::ConfirmedOverlap {
                spot_id: current.spot_id,
            });
        }

        let reservation = state
            .reservations
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        reservation.status = target;
        Ok(reservation.clone())
    }

    async fn find_confirmed_overlapping(
        &self,
        spot_id: SpotId,
        window: TimeWindow,
        exclude: Option<ReservationId>,
    ) -> Result<Vec<Reservation>> {
        Ok(self
            .state
            .read()
            .await
            .confirmed_overlapping(spot_id, window, exclude))
    }

    async fn list_by_renter(&self, renter_id: UserId) -> Result<Vec<Reservation>> {
        let state = self.state.read().await;
        let mut found: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|r| r.renter_id == renter_id)
            .cloned()
            .collect();
        sort_by_window(&mut found);
        Ok(found)
    }

    async fn list_by_host(&self, host_id: UserId) -> Result<Vec<Reservation>> {
        let state = self.state.read().await;
        let mut found: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|r| {
                state
                    .spots
                    .get(&r.spot_id)
                    .is_some_and(|spot| spot.host_id == host_id)
            })
            .cloned()
            .collect();
        sort_by_window(&mut found);
        Ok(found)
    }

    async fn exists_for_spot_and_renter(
        &self,
        spot_id: SpotId,
        renter_id: UserId,
        status: ReservationStatus,
    ) -> Result<bool> {
        Ok(self.state.read().await.reservations.values().any(|r| {
            r.spot_id == spot_id && r.renter_id == renter_id && r.status == status
        }))
    }

    async fn confirmed_ending_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Reservation>> {
        let state = self.state.read().await;
        let mut due: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|r| {
                r.status == ReservationStatus::Confirmed && r.window.has_ended_by(cutoff)
            })
            .cloned()
            .collect();
        due.sort_by_key(|r| (r.window.end, r.id.as_uuid()));
        Ok(due)
    }
}

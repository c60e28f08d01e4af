//! Spot records and the directory lookup capability.

use async_trait::async_trait;
use common::{Money, SpotId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A bookable parking spot as the core sees it.
///
/// Spot records are owned by the directory; the core only ever reads the
/// fields that drive booking decisions. Rates are positive by directory
/// invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spot {
    /// Spot identifier.
    pub id: SpotId,

    /// The user hosting the spot; the only actor who may confirm its
    /// reservations.
    pub host_id: UserId,

    /// Rate billed per whole hour for stays under 24 hours.
    pub hourly_rate: Money,

    /// Rate billed per whole day for stays of 24 hours or more.
    pub daily_rate: Money,

    /// Whether the host currently accepts bookings at all. A confirmed
    /// reservation does not flip this; it only blocks its own window.
    pub is_available: bool,
}

impl Spot {
    /// Creates an available spot.
    pub fn new(id: SpotId, host_id: UserId, hourly_rate: Money, daily_rate: Money) -> Self {
        Self {
            id,
            host_id,
            hourly_rate,
            daily_rate,
            is_available: true,
        }
    }
}

/// Read-only lookup of spot data.
///
/// The booking core resolves every spot reference through this trait and
/// never mutates spot records; listing management lives outside the core.
/// Backends expose inherent seeding helpers for wiring and tests.
#[async_trait]
pub trait SpotDirectory: Send + Sync {
    /// Looks up a spot by id. Returns `None` if no such spot exists.
    async fn get_spot(&self, id: SpotId) -> Result<Option<Spot>>;
}

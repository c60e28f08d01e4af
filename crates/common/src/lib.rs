//! Shared value types for the parking marketplace core.
//!
//! This crate provides the vocabulary both the reservation store and the
//! booking services speak:
//! - typed UUID identifiers ([`SpotId`], [`UserId`], [`ReservationId`])
//! - [`Money`] in exact integer cents
//! - [`TimeWindow`], a half-open `[start, end)` interval with the overlap
//!   predicate shared by conflict detection

pub mod ids;
pub mod money;
pub mod window;

pub use ids::{ReservationId, SpotId, UserId};
pub use money::Money;
pub use window::TimeWindow;

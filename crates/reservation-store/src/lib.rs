//! Reservation and spot storage for the parking marketplace core.
//!
//! This crate owns the shared store both booking services race over:
//! - record types ([`Reservation`], [`ReservationStatus`], [`NewReservation`],
//!   [`Spot`])
//! - the [`ReservationStore`] and [`SpotDirectory`] traits
//! - an in-memory backend ([`InMemoryStore`]) that doubles as the test
//!   backend, and a PostgreSQL backend ([`PostgresStore`])
//!
//! Both backends make the conflict check and the write one atomic unit, so
//! a lost race surfaces as a typed error instead of a double-booking.

pub mod config;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod reservation;
pub mod spot;
pub mod store;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use reservation::{NewReservation, Reservation, ReservationStatus};
pub use spot::{Spot, SpotDirectory};
pub use store::ReservationStore;

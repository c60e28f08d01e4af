//! Booking services for the parking marketplace core.
//!
//! This crate provides the decision logic over the reservation store:
//! - [`BookingEngine`] validates booking requests, quotes prices, and
//!   creates Pending reservations
//! - [`LifecycleManager`] advances reservations through
//!   Pending → Confirmed → Completed (or Cancelled), enforcing who may
//!   make each transition
//! - [`ReviewGate`] answers review eligibility from completed stays
//! - [`pricing`] holds the hour/day rate quote shared by the engine
//!
//! The store's atomic operations carry the concurrency weight: the engine
//! and manager never split a conflict check from its write.

pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod pricing;
pub mod review;

pub use engine::{BookingEngine, BookingRequest};
pub use error::{BookingError, Result};
pub use lifecycle::LifecycleManager;
pub use review::ReviewGate;

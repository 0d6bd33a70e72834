//! gpuslot-scheduler: reservation scheduling for a fixed GPU pool
//!
//! This crate owns every reservation and guarantees that active reservations
//! on the same resource never overlap:
//! - Resource registry loaded once at boot
//! - Per-resource schedules with an interval index for conflict detection
//! - Reservation store with per-resource write serialization
//! - Availability queries across the pool
//! - The validating `Scheduler` facade used by the API layer

pub mod availability;
pub mod clock;
pub mod registry;
pub mod schedule;
pub mod scheduler;
pub mod store;

pub use availability::AvailabilityService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use registry::ResourceRegistry;
pub use schedule::ResourceSchedule;
pub use scheduler::Scheduler;
pub use store::ReservationStore;

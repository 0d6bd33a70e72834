//! gpuslot-core: Core types for the gpuslot reservation service
//!
//! This crate provides the fundamental types used throughout gpuslot:
//! - GPU resource definitions
//! - Reservations, filters and availability reports
//! - Half-open time windows and timestamp parsing
//! - Configuration types
//! - Error handling

pub mod config;
pub mod error;
pub mod gpu;
pub mod model;
pub mod window;

pub use config::*;
pub use error::*;
pub use gpu::*;
pub use model::*;
pub use window::*;

//! # fitquest-core
//!
//! Core types, scoring rules, and abstractions for fitquest.
//!
//! This crate provides the domain model (profiles, places, missions), the
//! pure arithmetic behind scoring and distances, the explicit user-mission
//! state machine, and the trait seams other fitquest crates plug into.

pub mod defaults;
pub mod error;
pub mod fitness;
pub mod geo;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod scoring;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use fitness::{bmi, classify_bmi, FitnessBand};
pub use geo::{haversine_km, round_to, Coordinates};
pub use lifecycle::{MissionAction, TransitionError};
pub use models::*;
pub use scoring::{calculate_points, difficulty_for_distance, PointBreakdown};
pub use traits::{Geocoder, Geolocated};

/// Generate a new time-ordered UUIDv7 identifier.
pub fn new_v7() -> uuid::Uuid {
    uuid::Uuid::now_v7()
}

//! Core traits for fitquest abstractions.
//!
//! These traits define the seams that concrete implementations plug into,
//! keeping geocoding injectable and testable.

use async_trait::async_trait;

use crate::error::Result;
use crate::geo::Coordinates;
use crate::models::{BikeRack, Corporation, OutdoorEquipment, Place, SportsFacility};

// =============================================================================
// GEOCODING
// =============================================================================

/// Resolves free-text addresses to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Look up `address`.
    ///
    /// Returns `Ok(None)` when the provider has no match, and an error when the
    /// provider could not be reached or answered with a non-success status.
    async fn lookup(&self, address: &str) -> Result<Option<Coordinates>>;

    /// Provider name for logging.
    fn provider(&self) -> &str;
}

// =============================================================================
// GEOLOCATED RECORDS
// =============================================================================

/// A record that carries an address and optional coordinates.
pub trait Geolocated {
    /// Name used in logs and import reports.
    fn display_name(&self) -> &str;

    /// Address to geocode, if the record has one.
    fn geocode_address(&self) -> Option<&str>;

    fn latitude(&self) -> Option<f64>;

    fn longitude(&self) -> Option<f64>;

    fn set_coordinates(&mut self, coords: Coordinates);

    fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_columns(self.latitude(), self.longitude())
    }

    /// True when both coordinates are unset and there is an address to resolve.
    fn needs_geocoding(&self) -> bool {
        self.latitude().is_none()
            && self.longitude().is_none()
            && self
                .geocode_address()
                .is_some_and(|address| !address.trim().is_empty())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

macro_rules! impl_coordinates {
    () => {
        fn latitude(&self) -> Option<f64> {
            self.latitude
        }

        fn longitude(&self) -> Option<f64> {
            self.longitude
        }

        fn set_coordinates(&mut self, coords: Coordinates) {
            self.latitude = Some(coords.latitude);
            self.longitude = Some(coords.longitude);
        }
    };
}

impl Geolocated for Place {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn geocode_address(&self) -> Option<&str> {
        non_empty(Some(self.address.as_str()))
    }

    impl_coordinates!();
}

impl Geolocated for BikeRack {
    fn display_name(&self) -> &str {
        &self.name
    }

    /// Road-name address first, lot-number address as a fallback.
    fn geocode_address(&self) -> Option<&str> {
        non_empty(self.road_address.as_deref()).or_else(|| non_empty(self.lot_address.as_deref()))
    }

    impl_coordinates!();
}

impl Geolocated for Corporation {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn geocode_address(&self) -> Option<&str> {
        non_empty(self.address.as_deref())
    }

    impl_coordinates!();
}

impl Geolocated for OutdoorEquipment {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn geocode_address(&self) -> Option<&str> {
        non_empty(Some(self.address.as_str()))
    }

    impl_coordinates!();
}

impl Geolocated for SportsFacility {
    fn display_name(&self) -> &str {
        &self.place
    }

    fn geocode_address(&self) -> Option<&str> {
        non_empty(Some(self.address.as_str()))
    }

    impl_coordinates!();
}

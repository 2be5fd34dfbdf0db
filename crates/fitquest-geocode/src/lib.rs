//! # fitquest-geocode
//!
//! Address-to-coordinate gateway.
//!
//! [`KakaoGeocoder`] implements [`Geocoder`] against the Kakao Local API.
//! [`geocode_or_none`] and [`fill_coordinates`] are the lenient helpers used
//! by importers and back-fill jobs: a provider failure is logged and treated
//! as "no coordinates", never as an abort.

pub mod kakao;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

pub use fitquest_core::{Coordinates, Error, Geocoder, Geolocated, Result};
pub use kakao::{parse_address_search, KakaoConfig, KakaoGeocoder};

/// Geocoder used when no provider key is configured. Every lookup fails.
pub struct DisabledGeocoder;

#[async_trait]
impl Geocoder for DisabledGeocoder {
    async fn lookup(&self, _address: &str) -> Result<Option<Coordinates>> {
        Err(Error::Config("geocoding is not configured".to_string()))
    }

    fn provider(&self) -> &str {
        "disabled"
    }
}

/// Build the geocoder described by the environment.
///
/// Falls back to [`DisabledGeocoder`] when `KAKAO_API_KEY` is unset.
pub fn geocoder_from_env() -> Result<Arc<dyn Geocoder>> {
    match KakaoConfig::from_env() {
        Some(config) => Ok(Arc::new(KakaoGeocoder::new(config)?)),
        None => {
            warn!(
                subsystem = "geocode",
                "KAKAO_API_KEY not set; geocoding disabled"
            );
            Ok(Arc::new(DisabledGeocoder))
        }
    }
}

/// Look up `address`, mapping provider failures to `None`.
pub async fn geocode_or_none(geocoder: &dyn Geocoder, address: &str) -> Option<Coordinates> {
    let address = address.trim();
    if address.is_empty() {
        return None;
    }
    match geocoder.lookup(address).await {
        Ok(Some(coords)) => Some(coords),
        Ok(None) => {
            debug!(
                subsystem = "geocode",
                component = geocoder.provider(),
                op = "lookup",
                address,
                "No match for address"
            );
            None
        }
        Err(e) => {
            warn!(
                subsystem = "geocode",
                component = geocoder.provider(),
                op = "lookup",
                address,
                error = %e,
                "Geocoding failed"
            );
            None
        }
    }
}

/// Geocode `record` if it has an address and no coordinates yet.
///
/// Returns true when coordinates were written onto the record. Records that
/// already carry coordinates are never looked up again.
pub async fn fill_coordinates<R>(geocoder: &dyn Geocoder, record: &mut R) -> bool
where
    R: Geolocated + ?Sized,
{
    if !record.needs_geocoding() {
        return false;
    }
    let Some(address) = record.geocode_address().map(str::to_string) else {
        return false;
    };
    match geocode_or_none(geocoder, &address).await {
        Some(coords) => {
            info!(
                subsystem = "geocode",
                op = "fill",
                name = record.display_name(),
                latitude = coords.latitude,
                longitude = coords.longitude,
                "Coordinates filled"
            );
            record.set_coordinates(coords);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use fitquest_core::{Place, SportsFacility};
    use uuid::Uuid;

    /// Answers from a fixed table; unknown addresses fail.
    struct TableGeocoder {
        known: HashMap<String, Option<Coordinates>>,
        calls: AtomicUsize,
    }

    impl TableGeocoder {
        fn new(entries: &[(&str, Option<Coordinates>)]) -> Self {
            Self {
                known: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), *v))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Geocoder for TableGeocoder {
        async fn lookup(&self, address: &str) -> Result<Option<Coordinates>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.known
                .get(address)
                .copied()
                .ok_or_else(|| Error::Geocoding(format!("upstream 500 for {}", address)))
        }

        fn provider(&self) -> &str {
            "table"
        }
    }

    fn place(address: &str) -> Place {
        Place {
            id: Uuid::nil(),
            name: "Park".to_string(),
            address: address.to_string(),
            facilities_raw: String::new(),
            contact: String::new(),
            latitude: None,
            longitude: None,
        }
    }

    #[tokio::test]
    async fn test_geocode_or_none_maps_failure_to_none() {
        let geocoder = TableGeocoder::new(&[]);
        assert!(geocode_or_none(&geocoder, "nowhere").await.is_none());
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_geocode_or_none_skips_blank_address() {
        let geocoder = TableGeocoder::new(&[]);
        assert!(geocode_or_none(&geocoder, "   ").await.is_none());
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fill_coordinates_sets_match() {
        let coords = Coordinates::new(36.81, 127.11);
        let geocoder = TableGeocoder::new(&[("천안시 서북구", Some(coords))]);
        let mut record = place("천안시 서북구");

        assert!(fill_coordinates(&geocoder, &mut record).await);
        assert_eq!(record.latitude, Some(36.81));
        assert_eq!(record.longitude, Some(127.11));
    }

    #[tokio::test]
    async fn test_fill_coordinates_never_regeocodes() {
        let geocoder = TableGeocoder::new(&[("천안시", Some(Coordinates::new(1.0, 2.0)))]);
        let mut record = place("천안시");
        record.latitude = Some(36.0);

        assert!(!fill_coordinates(&geocoder, &mut record).await);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(record.longitude, None);
    }

    #[tokio::test]
    async fn test_fill_coordinates_leaves_record_on_miss_or_failure() {
        let geocoder = TableGeocoder::new(&[("miss", None)]);
        let mut missed = SportsFacility {
            place: "Gym".to_string(),
            address: "miss".to_string(),
            ..Default::default()
        };
        let mut failed = SportsFacility {
            place: "Gym".to_string(),
            address: "boom".to_string(),
            ..Default::default()
        };

        assert!(!fill_coordinates(&geocoder, &mut missed).await);
        assert!(!fill_coordinates(&geocoder, &mut failed).await);
        assert_eq!(missed.coordinates(), None);
        assert_eq!(failed.coordinates(), None);
    }

    #[tokio::test]
    async fn test_disabled_geocoder_errors() {
        let result = DisabledGeocoder.lookup("anything").await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

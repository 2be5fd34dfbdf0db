//! Geocoding of freshly parsed records before they are stored.

use std::sync::Arc;
use std::time::Duration;

use fitquest_core::{Geocoder, Geolocated};
use fitquest_geocode::fill_coordinates;
use tracing::debug;

/// The geocoder an import should use.
///
/// Imports geocode whenever a provider is configured; `opt_out` (the
/// `--no-geocode` flag) or a disabled provider turns it off.
pub fn import_geocoder(
    opt_out: bool,
    configured: Arc<dyn Geocoder>,
) -> Option<Arc<dyn Geocoder>> {
    if opt_out {
        return None;
    }
    if configured.provider() == "disabled" {
        debug!(
            subsystem = "import",
            component = "geocode",
            "No geocoding provider; records keep empty coordinates"
        );
        return None;
    }
    Some(configured)
}

/// Geocode each record that needs it, pausing `delay` seconds between lookups.
///
/// Returns the number of records that received coordinates.
pub async fn geocode_records<R: Geolocated>(
    geocoder: Option<&dyn Geocoder>,
    records: &mut [R],
    delay: f64,
) -> usize {
    let Some(geocoder) = geocoder else {
        return 0;
    };
    let mut filled = 0;
    for record in records.iter_mut() {
        if !record.needs_geocoding() {
            continue;
        }
        if fill_coordinates(geocoder, record).await {
            filled += 1;
        }
        pause(delay).await;
    }
    filled
}

/// Sleep between provider requests.
pub async fn pause(delay: f64) {
    if delay > 0.0 {
        tokio::time::sleep(Duration::from_secs_f64(delay)).await;
    }
}

//! # fitquest-import
//!
//! Loaders that populate the geocoded datasets: CSV exports (UTF-8 or CP949)
//! for places, bike racks, corporations and sports facilities, and the
//! open-data API for outdoor exercise equipment.
//!
//! Parsing is pure; the `fitquest-import` binary wires parsed records to the
//! database and, when a provider is configured, to a geocoder.

pub mod encoding;
pub mod equipment;
pub mod geocoding;
pub mod records;

pub use encoding::{decode, SourceEncoding};
pub use equipment::{equipment_from_item, EquipmentSource, EquipmentSourceConfig};
pub use geocoding::{geocode_records, import_geocoder, pause};
pub use records::{
    parse_bike_racks, parse_corporations, parse_places, parse_sports_facilities, Parsed,
};

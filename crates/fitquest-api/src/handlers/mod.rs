//! HTTP handlers for fitquest-api.

pub mod accounts;
pub mod geocode;
pub mod missions;
pub mod places;

use serde::Deserialize;

use fitquest_core::Coordinates;

use crate::ApiError;

/// Optional caller position sent in mission request bodies.
#[derive(Debug, Default, Deserialize)]
pub struct LocationBody {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl LocationBody {
    /// The position, or `None` when either component is missing or zero.
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_request(self.lat, self.lon)
    }
}

/// Parse an optional query parameter, rejecting malformed values.
pub(crate) fn parse_param<T: std::str::FromStr>(
    value: Option<&str>,
    name: &str,
) -> Result<Option<T>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("잘못된 파라미터 형식입니다: {}", name))),
    }
}

/// Required caller position from `lat`/`lon` query parameters.
pub(crate) fn query_origin(lat: Option<&str>, lon: Option<&str>) -> Result<Coordinates, ApiError> {
    let lat = parse_param::<f64>(lat, "lat")?;
    let lon = parse_param::<f64>(lon, "lon")?;
    Coordinates::from_request(lat, lon).ok_or_else(|| {
        ApiError::BadRequest("위도(lat)와 경도(lon)를 제공해주세요.".to_string())
    })
}

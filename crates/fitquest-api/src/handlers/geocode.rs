//! Address lookup endpoint.

use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use tracing::warn;

use crate::{ApiError, ApiJson, AppState};

#[derive(Debug, Deserialize)]
pub struct GeocodeRequest {
    #[serde(default)]
    pub address: Option<String>,
}

/// POST /api/v1/geocode
///
/// Unlike the import helpers, provider failures surface as errors here.
pub async fn geocode_address(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<GeocodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let address = req
        .address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ApiError::BadRequest("address 필드가 필요합니다.".to_string()))?;

    let coords = match state.geocoder.lookup(address).await {
        Ok(coords) => coords,
        Err(e) => {
            warn!(
                subsystem = "api",
                component = "geocode",
                provider = state.geocoder.provider(),
                error = %e,
                "Geocoding request failed"
            );
            return Err(ApiError::Internal(e));
        }
    };

    let coords =
        coords.ok_or_else(|| ApiError::NotFound("해당 주소를 찾을 수 없습니다.".to_string()))?;

    Ok(Json(serde_json::json!({
        "address": address,
        "latitude": coords.latitude,
        "longitude": coords.longitude,
    })))
}

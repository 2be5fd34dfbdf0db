//! Nearby places and outdoor exercise equipment.

use std::collections::HashSet;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use fitquest_core::defaults::{
    EQUIPMENT_DISTANCE_DECIMALS, EQUIPMENT_RADIUS_KM, NEARBY_PLACES_LIMIT, PLACE_DISTANCE_DECIMALS,
};
use fitquest_core::{round_to, Coordinates, OutdoorEquipment, Place};

use super::{parse_param, query_origin};
use crate::{ApiError, AppState};

/// Raw query parameters; parsed by hand so malformed values get a JSON 400.
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub limit: Option<String>,
    pub radius: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyPlace {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lon: f64,
    pub distance: f64,
    pub contact: String,
    pub facilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyEquipment {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lon: f64,
    pub distance: f64,
    pub equipment_info: serde_json::Value,
}

/// Closest places to `origin`, one per distinct coordinate pair.
///
/// `places` must be ordered by id so the first place at a shared location wins.
pub fn rank_nearby_places(
    origin: Coordinates,
    places: &[Place],
    limit: usize,
) -> Vec<NearbyPlace> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<NearbyPlace> = places
        .iter()
        .filter_map(|place| {
            let coords = Coordinates::from_columns(place.latitude, place.longitude)?;
            if !seen.insert((coords.latitude.to_bits(), coords.longitude.to_bits())) {
                return None;
            }
            Some(NearbyPlace {
                id: place.id,
                name: place.name.clone(),
                address: place.address.clone(),
                lat: coords.latitude,
                lon: coords.longitude,
                distance: round_to(origin.distance_km(&coords), PLACE_DISTANCE_DECIMALS),
                contact: place.contact.clone(),
                facilities: place.facilities(),
            })
        })
        .collect();

    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    ranked.truncate(limit);
    ranked
}

/// Equipment within `radius_km` of `origin`, closest first.
pub fn rank_nearby_equipment(
    origin: Coordinates,
    equipment: &[OutdoorEquipment],
    radius_km: f64,
    limit: Option<usize>,
) -> Vec<NearbyEquipment> {
    let mut ranked: Vec<NearbyEquipment> = equipment
        .iter()
        .filter_map(|eq| {
            let coords = Coordinates::from_columns(eq.latitude, eq.longitude)?;
            let distance = origin.distance_km(&coords);
            (distance <= radius_km).then(|| NearbyEquipment {
                id: eq.id,
                name: eq.name.clone(),
                address: eq.address.clone(),
                lat: coords.latitude,
                lon: coords.longitude,
                distance: round_to(distance, EQUIPMENT_DISTANCE_DECIMALS),
                equipment_info: eq.equipment_info.clone(),
            })
        })
        .collect();

    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    ranked
}

/// GET /api/v1/places/nearby?lat&lon&limit
pub async fn nearby_places(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let origin = query_origin(query.lat.as_deref(), query.lon.as_deref())?;
    let limit =
        parse_param::<usize>(query.limit.as_deref(), "limit")?.unwrap_or(NEARBY_PLACES_LIMIT);

    let places = state.db.places.list_geocoded(None).await?;
    let ranked = rank_nearby_places(origin, &places, limit);

    debug!(
        subsystem = "api",
        component = "places",
        op = "nearby",
        candidates = places.len(),
        result_count = ranked.len(),
        "Nearby places ranked"
    );
    Ok(Json(ranked))
}

/// GET /api/v1/equipment/nearby?lat&lon&radius&limit
pub async fn nearby_equipment(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let origin = query_origin(query.lat.as_deref(), query.lon.as_deref())?;
    let radius =
        parse_param::<f64>(query.radius.as_deref(), "radius")?.unwrap_or(EQUIPMENT_RADIUS_KM);
    if !radius.is_finite() || radius < 0.0 {
        return Err(ApiError::BadRequest(
            "radius must be a non-negative number".to_string(),
        ));
    }
    let limit = parse_param::<usize>(query.limit.as_deref(), "limit")?;

    let equipment = state.db.facilities.list_geocoded_equipment().await?;
    let ranked = rank_nearby_equipment(origin, &equipment, radius, limit);

    debug!(
        subsystem = "api",
        component = "equipment",
        op = "nearby",
        radius_km = radius,
        result_count = ranked.len(),
        "Nearby equipment ranked"
    );
    Ok(Json(ranked))
}

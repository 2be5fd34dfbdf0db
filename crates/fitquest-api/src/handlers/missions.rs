//! Mission generation, listing and the user mission lifecycle.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use fitquest_core::defaults::{
    COMPLETION_RADIUS_KM, GENERATION_PLACE_LIMIT, PLACE_DISTANCE_DECIMALS,
};
use fitquest_core::{
    round_to, Coordinates, Mission, MissionStatus, PlaceInfo, UserMission, UserMissionDetail,
};

use super::LocationBody;
use crate::{ApiError, AppState, RequireAuth};

// =============================================================================
// VIEWS
// =============================================================================

#[derive(Debug, Serialize)]
pub struct PlaceInfoView {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct MissionView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub difficulty: &'static str,
    pub difficulty_display: &'static str,
    pub base_points: i32,
    pub distance_bonus: i32,
    pub difficulty_bonus: i32,
    pub total_points: i32,
    pub place_info: PlaceInfoView,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct UserMissionView {
    pub id: Uuid,
    pub mission: MissionView,
    pub status: &'static str,
    pub status_display: &'static str,
    pub distance_from_user: Option<f64>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub points_earned: i32,
}

impl MissionView {
    fn new(mission: &Mission, place: &PlaceInfo) -> Self {
        Self {
            id: mission.id,
            title: mission.title.clone(),
            description: mission.description.clone(),
            difficulty: mission.difficulty.as_str(),
            difficulty_display: mission.difficulty.label(),
            base_points: mission.base_points,
            distance_bonus: mission.distance_bonus,
            difficulty_bonus: mission.difficulty_bonus,
            total_points: mission.total_points(),
            place_info: PlaceInfoView {
                id: place.id,
                name: place.name.clone(),
                address: place.address.clone(),
                latitude: place.latitude,
                longitude: place.longitude,
            },
            is_active: mission.is_active,
        }
    }
}

impl UserMissionView {
    /// Render `user_mission` against the mission and place in `detail`.
    ///
    /// Completion returns a fresher user mission than the pre-fetched detail.
    fn with_state(detail: &UserMissionDetail, user_mission: &UserMission) -> Self {
        Self {
            id: user_mission.id,
            mission: MissionView::new(&detail.mission, &detail.place),
            status: user_mission.status.as_str(),
            status_display: user_mission.status.label(),
            distance_from_user: user_mission.distance_from_user,
            started_at: user_mission.started_at,
            completed_at: user_mission.completed_at,
            points_earned: user_mission.points_earned,
        }
    }
}

impl From<&UserMissionDetail> for UserMissionView {
    fn from(detail: &UserMissionDetail) -> Self {
        Self::with_state(detail, &detail.user_mission)
    }
}

/// Distance from `origin` to the mission's place, rounded like other place distances.
fn distance_to_place(origin: Coordinates, place: &PlaceInfo) -> Option<f64> {
    let target = Coordinates::from_columns(place.latitude, place.longitude)?;
    Some(round_to(origin.distance_km(&target), PLACE_DISTANCE_DECIMALS))
}

/// Whether `distance_km` is close enough to complete; false for non-finite distances.
fn within_completion_radius(distance_km: f64) -> bool {
    distance_km <= COMPLETION_RADIUS_KM
}

fn location(body: Option<Json<LocationBody>>) -> Option<Coordinates> {
    body.and_then(|Json(b)| b.coordinates())
}

// =============================================================================
// HANDLERS
// =============================================================================

/// POST /api/v1/missions/generate
pub async fn generate(
    State(state): State<AppState>,
    auth: RequireAuth,
    body: Option<Json<LocationBody>>,
) -> Result<impl IntoResponse, ApiError> {
    let origin = location(body)
        .ok_or_else(|| ApiError::BadRequest("위치 정보가 필요합니다.".to_string()))?;

    let places = state
        .db
        .places
        .list_geocoded(Some(GENERATION_PLACE_LIMIT))
        .await?;
    let outcome = state
        .db
        .missions
        .generate(auth.user.id, origin, &places)
        .await?;

    info!(
        subsystem = "api",
        component = "missions",
        op = "generate",
        user_id = %auth.user.id,
        created = outcome.created_missions,
        assigned = outcome.assigned_missions,
        "Missions generated"
    );

    Ok(Json(serde_json::json!({
        "message": format!("{}개의 새로운 미션이 생성되었습니다.", outcome.created_missions),
        "created_missions": outcome.created_missions,
        "assigned_missions": outcome.assigned_missions,
        "total_missions": outcome.total_missions,
    })))
}

async fn list(
    state: &AppState,
    auth: &RequireAuth,
    status: MissionStatus,
) -> Result<Json<Vec<UserMissionView>>, ApiError> {
    let details = state.db.missions.list_for_user(auth.user.id, status).await?;
    Ok(Json(details.iter().map(UserMissionView::from).collect()))
}

/// GET /api/v1/missions/available
pub async fn list_available(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    list(&state, &auth, MissionStatus::Available).await
}

/// GET /api/v1/missions/ongoing
pub async fn list_ongoing(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    list(&state, &auth, MissionStatus::Ongoing).await
}

/// GET /api/v1/missions/completed
pub async fn list_completed(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    list(&state, &auth, MissionStatus::Completed).await
}

/// POST /api/v1/missions/:mission_id/start
///
/// Records the caller's distance to the place when a position is sent, 0 otherwise.
pub async fn start(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(mission_id): Path<Uuid>,
    body: Option<Json<LocationBody>>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .db
        .missions
        .get_for_user(auth.user.id, mission_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("미션을 찾을 수 없습니다.".to_string()))?;

    let distance = location(body)
        .and_then(|origin| distance_to_place(origin, &detail.place))
        .unwrap_or(0.0);

    let started = state
        .db
        .missions
        .start(auth.user.id, mission_id, distance)
        .await?;
    Ok(Json(UserMissionView::from(&started)))
}

/// POST /api/v1/missions/:mission_id/complete
///
/// With a position, the caller must be within 100 m of the place.
pub async fn complete(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(mission_id): Path<Uuid>,
    body: Option<Json<LocationBody>>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .db
        .missions
        .get_for_user(auth.user.id, mission_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("진행중인 미션을 찾을 수 없습니다.".to_string()))?;

    if let Some(origin) = location(body) {
        if let Some(distance_km) = distance_to_place(origin, &detail.place) {
            if !within_completion_radius(distance_km) {
                return Err(ApiError::TooFar { distance_km });
            }
        }
    }

    let outcome = state.db.missions.complete(auth.user.id, mission_id).await?;

    info!(
        subsystem = "api",
        component = "missions",
        op = "complete",
        user_id = %auth.user.id,
        mission_id = %mission_id,
        points = outcome.user_mission.points_earned,
        level = outcome.profile.level,
        "Mission completed"
    );

    Ok(Json(serde_json::json!({
        "message": "미션 완료!",
        "points_earned": outcome.user_mission.points_earned,
        "mission": UserMissionView::with_state(&detail, &outcome.user_mission),
        "profile": {
            "level": outcome.profile.level,
            "experience": outcome.profile.experience,
            "total_points": outcome.profile.total_points,
        },
    })))
}

/// POST /api/v1/missions/:mission_id/cancel
pub async fn cancel(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(mission_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let cancelled = state.db.missions.cancel(auth.user.id, mission_id).await?;
    Ok(Json(UserMissionView::from(&cancelled)))
}

/// GET /api/v1/missions/stats
pub async fn stats(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.db.missions.stats(auth.user.id, Utc::now()).await?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitquest_core::Difficulty;

    fn detail() -> UserMissionDetail {
        let now = Utc::now();
        let place = PlaceInfo {
            id: Uuid::nil(),
            name: "천안삼거리공원".to_string(),
            address: "충남 천안시 동남구 삼룡동 303".to_string(),
            latitude: Some(36.7845),
            longitude: Some(127.1629),
        };
        let mission = Mission {
            id: Uuid::now_v7(),
            place_id: place.id,
            title: "천안삼거리공원 방문하기".to_string(),
            description: String::new(),
            difficulty: Difficulty::Hard,
            base_points: 100,
            distance_bonus: 60,
            difficulty_bonus: 300,
            is_active: true,
            created_at: now,
        };
        UserMissionDetail {
            user_mission: UserMission::assign(Uuid::now_v7(), mission.id, Some(3.0), now),
            mission,
            place,
        }
    }

    #[test]
    fn test_user_mission_view_shape() {
        let view = UserMissionView::from(&detail());
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["status"], "available");
        assert_eq!(json["status_display"], "도전 가능");
        assert_eq!(json["mission"]["difficulty"], "hard");
        assert_eq!(json["mission"]["difficulty_display"], "어려움");
        assert_eq!(json["mission"]["total_points"], 460);
        assert_eq!(json["mission"]["place_info"]["latitude"], 36.7845);
        assert_eq!(json["distance_from_user"], 3.0);
    }

    #[test]
    fn test_view_uses_supplied_user_mission() {
        let detail = detail();
        let mut finished = detail.user_mission.clone();
        finished.status = MissionStatus::Completed;
        finished.points_earned = 460;

        let view = UserMissionView::with_state(&detail, &finished);
        assert_eq!(view.status, "completed");
        assert_eq!(view.points_earned, 460);
        assert_eq!(view.mission.title, "천안삼거리공원 방문하기");
    }

    #[test]
    fn test_distance_to_place() {
        let detail = detail();
        let at_place = Coordinates::new(36.7845, 127.1629);
        assert_eq!(distance_to_place(at_place, &detail.place), Some(0.0));

        let far = Coordinates::new(36.8151, 127.1139);
        assert!(distance_to_place(far, &detail.place).unwrap() > COMPLETION_RADIUS_KM);

        let mut unlocated = detail.place.clone();
        unlocated.latitude = None;
        assert_eq!(distance_to_place(at_place, &unlocated), None);
    }

    #[test]
    fn test_completion_radius_rejects_far_and_non_finite() {
        assert!(within_completion_radius(0.0));
        assert!(within_completion_radius(COMPLETION_RADIUS_KM));
        assert!(!within_completion_radius(0.11));
        assert!(!within_completion_radius(f64::NAN));
        assert!(!within_completion_radius(f64::INFINITY));
    }

    #[test]
    fn test_distance_to_antipodal_place_is_rejected() {
        let mut detail = detail();
        detail.place.latitude = Some(36.8151);
        detail.place.longitude = Some(127.1139);
        let antipode = Coordinates::new(-36.8151, -52.8861);

        let distance = distance_to_place(antipode, &detail.place).unwrap();
        assert!(distance.is_finite());
        assert!(!within_completion_radius(distance));
    }
}

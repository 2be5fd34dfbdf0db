//! Registration, bearer tokens and the player profile.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use fitquest_core::{bmi, classify_bmi, Profile, RegisterRequest, UpdateProfileRequest};

use crate::{ApiError, ApiJson, AppState, RequireAuth};

const LEDGER_DEFAULT_LIMIT: i64 = 50;
const LEDGER_MAX_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    pub limit: Option<i64>,
}

/// Profile as returned to clients, with the derived BMI band.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub level: i32,
    pub experience: i32,
    pub total_points: i64,
    pub name: String,
    pub phone: String,
    pub age: Option<i32>,
    pub gender: String,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub bmi: Option<f64>,
    pub fitness_band: Option<&'static str>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileView {
    pub fn new(username: &str, profile: Profile) -> Self {
        let bmi = match (profile.height_cm, profile.weight_kg) {
            (Some(height), Some(weight)) => bmi(height, weight),
            _ => None,
        };
        Self {
            username: username.to_string(),
            level: profile.level,
            experience: profile.experience,
            total_points: profile.total_points,
            name: profile.name,
            phone: profile.phone,
            age: profile.age,
            gender: profile.gender,
            weight_kg: profile.weight_kg,
            height_cm: profile.height_cm,
            bmi,
            fitness_band: bmi.map(|value| classify_bmi(value).label()),
            updated_at: profile.updated_at,
        }
    }
}

/// POST /api/v1/accounts/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.db.users.register(&req).await?;
    let tokens = state
        .db
        .users
        .issue_tokens(user.id, state.tokens.access_ttl, state.tokens.refresh_ttl)
        .await?;

    info!(
        subsystem = "api",
        component = "accounts",
        op = "register",
        user_id = %user.id,
        "User registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "user": user.username,
            "tokens": tokens,
        })),
    ))
}

/// POST /api/v1/accounts/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .users
        .authenticate(&req.username, &req.password)
        .await?
        .ok_or_else(|| {
            ApiError::Unauthorized("No active account found with the given credentials".to_string())
        })?;

    let tokens = state
        .db
        .users
        .issue_tokens(user.id, state.tokens.access_ttl, state.tokens.refresh_ttl)
        .await?;
    Ok(Json(tokens))
}

/// POST /api/v1/accounts/token/refresh
pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (access, access_expires_at) = state
        .db
        .users
        .refresh_access_token(&req.refresh, state.tokens.access_ttl)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Token is invalid or expired".to_string()))?;

    Ok(Json(serde_json::json!({
        "access": access,
        "access_expires_at": access_expires_at,
    })))
}

/// GET /api/v1/accounts/me
pub async fn me(auth: RequireAuth) -> impl IntoResponse {
    Json(serde_json::json!({
        "id": auth.user.id,
        "username": auth.user.username,
        "email": auth.user.email,
    }))
}

/// POST /api/v1/accounts/logout
///
/// Revokes the presented access token, and the refresh token when one is sent.
pub async fn logout(
    State(state): State<AppState>,
    auth: RequireAuth,
    body: Option<Json<LogoutRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.users.revoke_token(&auth.token).await?;
    if let Some(refresh) = body.and_then(|Json(b)| b.refresh) {
        state.db.users.revoke_token(&refresh).await?;
    }
    Ok(Json(serde_json::json!({ "message": "Logged out" })))
}

/// GET /api/v1/accounts/profile
pub async fn get_profile(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state
        .db
        .profiles
        .get(auth.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;
    Ok(Json(ProfileView::new(&auth.user.username, profile)))
}

/// PATCH /api/v1/accounts/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.db.profiles.update_details(auth.user.id, &req).await?;
    Ok(Json(ProfileView::new(&auth.user.username, profile)))
}

/// GET /api/v1/accounts/points
///
/// Most recent point credits first.
pub async fn point_history(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<LedgerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query
        .limit
        .unwrap_or(LEDGER_DEFAULT_LIMIT)
        .clamp(1, LEDGER_MAX_LIMIT);
    let entries = state.db.profiles.ledger(auth.user.id, limit).await?;
    Ok(Json(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_profile_view_derives_band() {
        let mut profile = Profile::new(Uuid::nil(), Utc::now());
        profile.height_cm = Some(170.0);
        profile.weight_kg = Some(65.0);

        let view = ProfileView::new("runner", profile);
        assert_eq!(view.bmi, Some(22.49));
        assert_eq!(view.fitness_band, Some("상"));
        assert_eq!(view.level, 1);
    }

    #[test]
    fn test_profile_view_without_measurements() {
        let mut profile = Profile::new(Uuid::nil(), Utc::now());
        profile.weight_kg = Some(80.0);

        let view = ProfileView::new("runner", profile);
        assert_eq!(view.bmi, None);
        assert_eq!(view.fitness_band, None);
    }
}

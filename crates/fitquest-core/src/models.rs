//! Core data models for fitquest.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;

// =============================================================================
// ENUMS
// =============================================================================

/// Status of a user's attempt at a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionStatus {
    /// Assigned to the user, not yet started.
    Available,
    /// Started and not yet completed or cancelled.
    Ongoing,
    /// Finished; points have been credited.
    Completed,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionStatus::Available => "available",
            MissionStatus::Ongoing => "ongoing",
            MissionStatus::Completed => "completed",
        }
    }

    /// Human-facing label shown by clients.
    pub fn label(&self) -> &'static str {
        match self {
            MissionStatus::Available => "도전 가능",
            MissionStatus::Ongoing => "진행중",
            MissionStatus::Completed => "완료",
        }
    }
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(MissionStatus::Available),
            "ongoing" => Ok(MissionStatus::Ongoing),
            "completed" => Ok(MissionStatus::Completed),
            other => Err(format!("unknown mission status '{}'", other)),
        }
    }
}

/// Mission difficulty, derived from distance at generation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "쉬움",
            Difficulty::Normal => "보통",
            Difficulty::Hard => "어려움",
        }
    }

    /// Bonus points awarded on top of the base and distance components.
    pub fn bonus(&self) -> i32 {
        match self {
            Difficulty::Easy => defaults::EASY_BONUS,
            Difficulty::Normal => defaults::NORMAL_BONUS,
            Difficulty::Hard => defaults::HARD_BONUS,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

// =============================================================================
// ACCOUNTS
// =============================================================================

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Per-user leveling and points accumulator plus personal details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub level: i32,
    /// Always in `[0, EXPERIENCE_PER_LEVEL)`.
    pub experience: i32,
    /// Never decreases.
    pub total_points: i64,
    pub name: String,
    pub phone: String,
    pub age: Option<i32>,
    pub gender: String,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// A fresh level-1 profile with no points.
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            level: defaults::STARTING_LEVEL,
            experience: 0,
            total_points: 0,
            name: String::new(),
            phone: String::new(),
            age: None,
            gender: String::new(),
            weight_kg: None,
            height_cm: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Registration payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
}

impl RegisterRequest {
    /// Check field-level constraints before touching the database.
    pub fn validate(&self) -> Result<(), String> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err("username is required".to_string());
        }
        if username.chars().count() > defaults::USERNAME_MAX_LEN {
            return Err(format!(
                "username must be at most {} characters",
                defaults::USERNAME_MAX_LEN
            ));
        }
        if self.password.chars().count() < defaults::PASSWORD_MIN_LEN {
            return Err(format!(
                "password must be at least {} characters",
                defaults::PASSWORD_MIN_LEN
            ));
        }
        if !self.email.is_empty() && !self.email.contains('@') {
            return Err("email is not valid".to_string());
        }
        self.personal_details().validate()
    }

    /// The optional profile fields supplied at sign-up.
    pub fn personal_details(&self) -> UpdateProfileRequest {
        UpdateProfileRequest {
            name: self.name.clone(),
            phone: self.phone.clone(),
            age: self.age,
            gender: self.gender.clone(),
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
        }
    }
}

/// Partial update of a profile's personal details. `None` leaves a field as-is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), String> {
        if matches!(self.age, Some(age) if !(0..=150).contains(&age)) {
            return Err("age must be between 0 and 150".to_string());
        }
        if matches!(self.weight_kg, Some(w) if !(w > 0.0 && w.is_finite())) {
            return Err("weight_kg must be positive".to_string());
        }
        if matches!(self.height_cm, Some(h) if !(h > 0.0 && h.is_finite())) {
            return Err("height_cm must be positive".to_string());
        }
        if let Some(gender) = &self.gender {
            if !gender.is_empty() && !matches!(gender.as_str(), "male" | "female" | "other") {
                return Err("gender must be one of male, female, other".to_string());
            }
        }
        Ok(())
    }
}

/// Issued bearer tokens. Raw values are only ever returned here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

// =============================================================================
// GEOCODED RECORDS
// =============================================================================

static FACILITY_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[+,]").expect("facility separator pattern is valid"));

/// A visitable place that missions are generated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    /// Delimited facility list as it appears in the source data.
    pub facilities_raw: String,
    pub contact: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Place {
    /// Facilities split on `+` or `,`, trimmed, empty entries dropped.
    pub fn facilities(&self) -> Vec<String> {
        FACILITY_SEPARATOR
            .split(&self.facilities_raw)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// A public bicycle rack.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BikeRack {
    pub id: Uuid,
    pub name: String,
    pub road_address: Option<String>,
    pub lot_address: Option<String>,
    pub rack_count: Option<String>,
    pub has_air_pump: Option<String>,
    pub has_repair_stand: Option<String>,
    pub manager_phone: Option<String>,
    pub manager_name: Option<String>,
    pub data_date: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A registered non-profit corporation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Corporation {
    pub id: Uuid,
    pub department: Option<String>,
    pub kind: Option<String>,
    pub permit_number: Option<String>,
    pub name: String,
    pub representative: Option<String>,
    pub address: Option<String>,
    pub permit_year: Option<String>,
    pub officers: Option<String>,
    pub purpose: Option<String>,
    pub jurisdiction: Option<String>,
    pub note: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// An outdoor exercise equipment site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutdoorEquipment {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    /// Equipment names and counts keyed as in the open-data feed.
    pub equipment_info: serde_json::Value,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A bookable public sports facility.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SportsFacility {
    pub id: Uuid,
    pub location: String,
    pub place: String,
    pub reservation: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

// =============================================================================
// MISSIONS
// =============================================================================

/// A generated challenge: visit a place for a point reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: Uuid,
    pub place_id: Uuid,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub base_points: i32,
    pub distance_bonus: i32,
    pub difficulty_bonus: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Mission {
    /// Sum of the point components.
    pub fn total_points(&self) -> i32 {
        self.base_points + self.distance_bonus + self.difficulty_bonus
    }
}

/// The subset of a place embedded in mission responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceInfo {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One user's attempt record against a mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mission_id: Uuid,
    pub status: MissionStatus,
    pub distance_from_user: Option<f64>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub points_earned: i32,
    pub created_at: DateTime<Utc>,
}

impl UserMission {
    /// A newly assigned, available attempt.
    pub fn assign(
        user_id: Uuid,
        mission_id: Uuid,
        distance_from_user: Option<f64>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: crate::new_v7(),
            user_id,
            mission_id,
            status: MissionStatus::Available,
            distance_from_user,
            started_at: None,
            completed_at: None,
            points_earned: 0,
            created_at: now,
        }
    }
}

/// A user mission joined with its mission and target place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMissionDetail {
    pub user_mission: UserMission,
    pub mission: Mission,
    pub place: PlaceInfo,
}

/// Append-only record of a point-earning event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointLedgerEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_mission_id: Option<Uuid>,
    pub points: i64,
    pub experience: i32,
    pub level_after: i32,
    pub created_at: DateTime<Utc>,
}

/// Per-user mission counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MissionStats {
    pub ongoing: i64,
    pub weekly_completed: i64,
    pub total_completed: i64,
}

/// Result of a mission generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationOutcome {
    /// Missions created by this request (places that had none).
    pub created_missions: i64,
    /// User missions newly assigned to the requesting user.
    pub assigned_missions: i64,
    /// Active missions across all places after the request.
    pub total_missions: i64,
}

/// Result of a completion: the finished attempt and the updated profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub user_mission: UserMission,
    pub profile: Profile,
    pub ledger_entry: PointLedgerEntry,
}

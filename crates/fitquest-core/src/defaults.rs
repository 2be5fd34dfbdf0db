//! Centralized default constants for fitquest.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// PROFILE SCORING
// =============================================================================

/// Experience needed to gain one level.
pub const EXPERIENCE_PER_LEVEL: i32 = 100;

/// Points are converted to experience at `points / POINTS_PER_EXPERIENCE`.
pub const POINTS_PER_EXPERIENCE: i64 = 10;

/// Level assigned to a freshly created profile.
pub const STARTING_LEVEL: i32 = 1;

// =============================================================================
// MISSION SCORING
// =============================================================================

/// Base points every mission awards.
pub const BASE_POINTS: i32 = 100;

/// Distance bonus per kilometre.
pub const DISTANCE_POINTS_PER_KM: f64 = 20.0;

/// Upper bound on the distance bonus.
pub const DISTANCE_BONUS_CAP: i32 = 500;

/// Difficulty bonus for easy missions.
pub const EASY_BONUS: i32 = 0;

/// Difficulty bonus for normal missions.
pub const NORMAL_BONUS: i32 = 100;

/// Difficulty bonus for hard missions.
pub const HARD_BONUS: i32 = 300;

/// Places closer than this are easy missions (km).
pub const EASY_MAX_KM: f64 = 2.0;

/// Places closer than this (and not easy) are normal missions (km).
pub const NORMAL_MAX_KM: f64 = 5.0;

// =============================================================================
// MISSION GENERATION / COMPLETION
// =============================================================================

/// Maximum number of places considered per generation request.
pub const GENERATION_PLACE_LIMIT: i64 = 20;

/// Maximum distance from the target place allowed when completing (km).
pub const COMPLETION_RADIUS_KM: f64 = 0.1;

// =============================================================================
// GEOGRAPHY
// =============================================================================

/// Mean Earth radius used by the haversine formula (km).
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Decimal places kept for place/mission distances.
pub const PLACE_DISTANCE_DECIMALS: u32 = 2;

/// Decimal places kept for equipment distances.
pub const EQUIPMENT_DISTANCE_DECIMALS: u32 = 3;

// =============================================================================
// NEARBY LOOKUPS
// =============================================================================

/// Default number of places returned by the nearby-places lookup.
pub const NEARBY_PLACES_LIMIT: usize = 5;

/// Default search radius for nearby outdoor equipment (km).
pub const EQUIPMENT_RADIUS_KM: f64 = 2.0;

// =============================================================================
// FITNESS BANDS (BMI)
// =============================================================================

/// BMI below this is the lower band.
pub const BMI_UNDERWEIGHT: f64 = 18.5;

/// BMI at or above this (and below `BMI_OBESE`) is the middle band.
pub const BMI_OVERWEIGHT: f64 = 23.0;

/// BMI at or above this is the lower band.
pub const BMI_OBESE: f64 = 25.0;

// =============================================================================
// GEOCODING
// =============================================================================

/// Kakao Local API base URL.
pub const KAKAO_BASE_URL: &str = "https://dapi.kakao.com";

/// Timeout for a single geocoding request (seconds).
pub const GEOCODE_TIMEOUT_SECS: u64 = 10;

/// Delay between back-fill geocoding requests (seconds).
pub const GEOCODE_DELAY_SECS: f64 = 0.1;

// =============================================================================
// OPEN DATA IMPORT
// =============================================================================

/// Cheonan outdoor exercise equipment dataset (odcloud).
pub const EQUIPMENT_API_URL: &str =
    "https://api.odcloud.kr/api/15037957/v1/uddi:7994f41a-bd52-4fc1-a684-a2f37b45cd60";

/// Rows requested per open-data page.
pub const EQUIPMENT_PAGE_SIZE: u32 = 1000;

/// Numbered equipment slots carried by each open-data row.
pub const EQUIPMENT_SLOTS: usize = 10;

// =============================================================================
// ACCOUNTS
// =============================================================================

/// Access token lifetime (minutes).
pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 60;

/// Refresh token lifetime (days).
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 14;

/// Minimum password length accepted at registration.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Maximum username length.
pub const USERNAME_MAX_LEN: usize = 150;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP port.
pub const SERVER_PORT: u16 = 8000;

/// Default request body limit (bytes).
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_thresholds_ordered() {
        assert!(EASY_MAX_KM < NORMAL_MAX_KM);
    }

    #[test]
    fn test_bonus_ordering() {
        assert!(EASY_BONUS < NORMAL_BONUS);
        assert!(NORMAL_BONUS < HARD_BONUS);
    }

    #[test]
    fn test_bmi_thresholds_ordered() {
        assert!(BMI_UNDERWEIGHT < BMI_OVERWEIGHT);
        assert!(BMI_OVERWEIGHT < BMI_OBESE);
    }

    #[test]
    fn test_completion_radius_is_100_metres() {
        assert_eq!(COMPLETION_RADIUS_KM, 0.1);
    }
}

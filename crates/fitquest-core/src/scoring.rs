//! Point and level arithmetic.
//!
//! Profiles accumulate points; every `POINTS_PER_EXPERIENCE` points become one
//! experience point, and every `EXPERIENCE_PER_LEVEL` experience becomes a
//! level. Mission rewards are a base amount plus distance and difficulty
//! bonuses.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::models::{Difficulty, Profile};

impl Profile {
    /// Credit experience, carrying every full `EXPERIENCE_PER_LEVEL` into levels.
    ///
    /// Non-positive amounts are ignored. Returns the number of levels gained.
    pub fn add_experience(&mut self, exp: i32) -> i32 {
        if exp <= 0 {
            return 0;
        }
        let total = i64::from(self.experience) + i64::from(exp);
        let per_level = i64::from(defaults::EXPERIENCE_PER_LEVEL);
        let gained = total / per_level;

        self.experience = (total % per_level) as i32;
        let gained = i32::try_from(gained).unwrap_or(i32::MAX);
        self.level = self.level.saturating_add(gained);
        gained
    }

    /// Credit points and the experience they convert to.
    ///
    /// Returns the experience credited (`points / POINTS_PER_EXPERIENCE`,
    /// truncated).
    pub fn add_points(&mut self, points: i64) -> i32 {
        if points <= 0 {
            return 0;
        }
        self.total_points = self.total_points.saturating_add(points);
        let exp = i32::try_from(points / defaults::POINTS_PER_EXPERIENCE).unwrap_or(i32::MAX);
        self.add_experience(exp);
        exp
    }
}

/// Reward components for a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointBreakdown {
    pub base_points: i32,
    pub distance_bonus: i32,
    pub difficulty_bonus: i32,
    pub total_points: i32,
}

/// Compute the reward for a mission `distance_km` away at `difficulty`.
///
/// Unknown difficulty keys earn no difficulty bonus.
pub fn calculate_points(distance_km: f64, difficulty: &str) -> PointBreakdown {
    let base_points = defaults::BASE_POINTS;
    let raw_bonus = (distance_km.max(0.0) * defaults::DISTANCE_POINTS_PER_KM).trunc();
    // NaN casts to 0; huge values saturate before the cap applies.
    let distance_bonus = (raw_bonus as i64).min(i64::from(defaults::DISTANCE_BONUS_CAP)) as i32;
    let difficulty_bonus = Difficulty::from_str(difficulty)
        .map(|d| d.bonus())
        .unwrap_or(0);

    PointBreakdown {
        base_points,
        distance_bonus,
        difficulty_bonus,
        total_points: base_points + distance_bonus + difficulty_bonus,
    }
}

/// Difficulty band for a place `distance_km` from the user.
pub fn difficulty_for_distance(distance_km: f64) -> Difficulty {
    if distance_km < defaults::EASY_MAX_KM {
        Difficulty::Easy
    } else if distance_km < defaults::NORMAL_MAX_KM {
        Difficulty::Normal
    } else {
        Difficulty::Hard
    }
}

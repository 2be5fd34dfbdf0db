//! BMI-based fitness bands.

use serde::{Deserialize, Serialize};

use crate::defaults::{BMI_OBESE, BMI_OVERWEIGHT, BMI_UNDERWEIGHT};
use crate::geo::round_to;

/// Exercise difficulty band derived from BMI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitnessBand {
    /// 18.5 ≤ BMI < 23
    #[serde(rename = "상")]
    Upper,
    /// 23 ≤ BMI < 25
    #[serde(rename = "중")]
    Middle,
    /// BMI < 18.5 or BMI ≥ 25
    #[serde(rename = "하")]
    Lower,
}

impl FitnessBand {
    pub fn label(&self) -> &'static str {
        match self {
            FitnessBand::Upper => "상",
            FitnessBand::Middle => "중",
            FitnessBand::Lower => "하",
        }
    }
}

/// Body mass index rounded to two decimals, or `None` for a non-positive height.
pub fn bmi(height_cm: f64, weight_kg: f64) -> Option<f64> {
    if height_cm.is_nan() || height_cm <= 0.0 || !weight_kg.is_finite() {
        return None;
    }
    let h = height_cm / 100.0;
    Some(round_to(weight_kg / (h * h), 2))
}

pub fn classify_bmi(bmi: f64) -> FitnessBand {
    if bmi < BMI_UNDERWEIGHT || bmi >= BMI_OBESE {
        FitnessBand::Lower
    } else if bmi >= BMI_OVERWEIGHT {
        FitnessBand::Middle
    } else {
        FitnessBand::Upper
    }
}

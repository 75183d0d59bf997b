//! Nutrition label scaling
//!
//! TKPI values are per 100 g edible portion; the label shows them for the
//! requested serving.

use serde::Serialize;
use serde_json::Value;

use crate::models::{Nutrient, NutritionFood};
use crate::utils::constants::{MAX_SERVING_GRAMS, MIN_SERVING_GRAMS, TKPI_REFERENCE_GRAMS};

#[derive(Debug, Clone, Serialize)]
pub struct AdjustedNutrient {
    #[serde(flatten)]
    pub nutrient: Nutrient,
    #[serde(rename = "adjustedValue")]
    pub adjusted_value: f64,
    #[serde(rename = "adjustedDailyValue", skip_serializing_if = "Option::is_none")]
    pub adjusted_daily_value: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NutritionLabel {
    pub food_id: Value,
    pub name: Option<String>,
    pub source: Option<String>,
    /// Grams the label is computed for
    pub serving_size: f64,
    pub nutrients: Vec<AdjustedNutrient>,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Serving sizes outside 1..=1000 g are clamped
pub fn clamp_serving(grams: f64) -> f64 {
    if grams.is_nan() {
        return MIN_SERVING_GRAMS;
    }
    grams.clamp(MIN_SERVING_GRAMS, MAX_SERVING_GRAMS)
}

/// Scale every nutrient to `serving` grams (row default, then 100 g)
pub fn scale_label(food: &NutritionFood, serving: Option<f64>) -> NutritionLabel {
    let serving = clamp_serving(
        serving
            .or(food.serving_size)
            .unwrap_or(TKPI_REFERENCE_GRAMS),
    );
    let factor = serving / TKPI_REFERENCE_GRAMS;

    let nutrients = food
        .nutrients
        .iter()
        .map(|n| AdjustedNutrient {
            nutrient: n.clone(),
            adjusted_value: round_to(n.value * factor, 2),
            adjusted_daily_value: n.daily_value.map(|dv| round_to(dv * factor, 1)),
        })
        .collect();

    NutritionLabel {
        food_id: food.id.clone(),
        name: food.name.clone(),
        source: food.source.clone(),
        serving_size: serving,
        nutrients,
    }
}

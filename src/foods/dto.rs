use serde::Deserialize;

use super::repo::NutrientValues;
use super::resolver::ManualFood;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveFoodRequest {
    pub external_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ManualFoodRequest {
    pub description: String,
    pub brand_name: Option<String>,
    pub serving_size: Option<f64>,
    pub serving_unit: Option<String>,
    #[serde(default)]
    pub nutrients: NutrientValues,
}

impl From<ManualFoodRequest> for ManualFood {
    fn from(req: ManualFoodRequest) -> Self {
        Self {
            description: req.description,
            brand_name: req.brand_name,
            serving_size: req.serving_size,
            serving_unit: req.serving_unit,
            nutrients: req.nutrients,
        }
    }
}

/// Absolute nutrient totals observed for `quantity` consumed units.
#[derive(Debug, Deserialize)]
pub struct DeriveFoodRequest {
    pub description: String,
    pub quantity: f64,
    #[serde(default)]
    pub nutrients: NutrientValues,
    pub external_id: Option<i64>,
    pub brand_name: Option<String>,
    pub serving_size: Option<f64>,
    pub serving_unit: Option<String>,
}

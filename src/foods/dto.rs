use serde::Deserialize;

use crate::store::documents::normalize_density;
use crate::store::FoodType;

/// Body for adding a food. Either the normalized `kcal_per_kg`, or the
/// legacy `unit` + `kcal_per_unit` (+ `grams_per_cup` for cup units) pair
/// that gets normalized at this boundary.
#[derive(Debug, Deserialize)]
pub struct CreateFoodRequest {
    pub name: String,
    #[serde(default)]
    pub food_type: Option<FoodType>,
    #[serde(default)]
    pub kcal_per_kg: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub kcal_per_unit: Option<f64>,
    #[serde(default)]
    pub grams_per_cup: Option<f64>,
}

impl CreateFoodRequest {
    pub fn resolve(&self) -> Result<(FoodType, f64), &'static str> {
        let density = match (self.kcal_per_kg, self.unit.as_deref(), self.kcal_per_unit) {
            (Some(kcal_per_kg), _, _) => kcal_per_kg,
            (None, Some(unit), Some(kcal_per_unit)) => {
                normalize_density(unit, kcal_per_unit, self.grams_per_cup)
            }
            _ => return Err("either kcal_per_kg or unit + kcal_per_unit is required"),
        };
        if density <= 0.0 {
            return Err("food needs a positive calorie density");
        }
        Ok((self.food_type.unwrap_or(FoodType::Dry), density))
    }
}

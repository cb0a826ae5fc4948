use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::feeding::allocation::{FeedingPlan, WarningKind};
use crate::store::documents::date_format;
use crate::store::{DietEntry, FoodType, WeightEntry};

/// All outward numbers are rounded to one decimal here, at the formatting
/// boundary; computations upstream stay unrounded.
pub(crate) fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Blank override strings from forms mean "no override".
pub(crate) fn normalize_override(code: Option<String>) -> Option<String> {
    code.and_then(|s| {
        let s = s.trim().to_string();
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    })
}

#[derive(Debug, Deserialize)]
pub struct CreateCatRequest {
    pub name: String,
    #[serde(with = "date_format")]
    pub birthday: Date,
    #[serde(default = "default_meals_per_day")]
    pub meals_per_day: u32,
    #[serde(default)]
    pub life_stage_override: Option<String>,
}

fn default_meals_per_day() -> u32 {
    3
}

/// Partial update; absent fields keep their value. An empty
/// `life_stage_override` clears the override.
#[derive(Debug, Deserialize)]
pub struct UpdateCatRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "date_format::option")]
    pub birthday: Option<Date>,
    #[serde(default)]
    pub meals_per_day: Option<u32>,
    #[serde(default)]
    pub life_stage_override: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CatSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "date_format")]
    pub birthday: Date,
    pub meals_per_day: u32,
}

#[derive(Debug, Serialize)]
pub struct CatOverview {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "date_format")]
    pub birthday: Date,
    pub meals_per_day: u32,
    pub life_stage_override: Option<String>,
    pub has_photo: bool,
    pub age_weeks: f64,
    pub age_display: String,
    pub life_stage: String,
    pub life_stage_label: String,
    pub weight_kg: f64,
    pub weight_estimated: bool,
    pub daily_kcal: f64,
}

#[derive(Debug, Deserialize)]
pub struct AddWeightRequest {
    #[serde(with = "date_format")]
    pub dt: Date,
    pub weight_kg: f64,
}

#[derive(Debug, Serialize)]
pub struct TrendPoint {
    #[serde(with = "date_format")]
    pub dt: Date,
    pub age_weeks: f64,
    pub weight_kg: f64,
    pub der_kcal: f64,
}

#[derive(Debug, Serialize)]
pub struct DietResponse {
    pub entries: Vec<DietEntry>,
    pub meal_kcal: BTreeMap<u32, u32>,
    pub meal_wet: BTreeMap<u32, u32>,
}

#[derive(Debug, Deserialize)]
pub struct SaveDietRequest {
    pub entries: Vec<DietEntry>,
    #[serde(default)]
    pub meal_kcal: BTreeMap<u32, u32>,
    #[serde(default)]
    pub meal_wet: BTreeMap<u32, u32>,
}

#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    pub photo_key: String,
}

#[derive(Debug, Serialize)]
pub struct PlanFood {
    pub food_id: u32,
    pub name: String,
    pub food_type: FoodType,
    pub pct_daily_kcal: u32,
    pub kcal_day: f64,
}

#[derive(Debug, Serialize)]
pub struct PlanPortion {
    pub food_id: u32,
    pub name: String,
    pub food_type: FoodType,
    pub kcal: f64,
    pub grams: f64,
}

#[derive(Debug, Serialize)]
pub struct PlanMeal {
    pub meal: u32,
    pub target_kcal: f64,
    pub target_wet_kcal: f64,
    pub portions: Vec<PlanPortion>,
}

#[derive(Debug, Serialize)]
pub struct PlanWarning {
    pub meal: u32,
    pub kind: WarningKind,
    pub requested_wet_pct: u32,
    pub feasible_min_pct: f64,
    pub feasible_max_pct: f64,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub total_kcal: f64,
    pub meals_per_day: u32,
    pub weight_kg: f64,
    pub weight_estimated: bool,
    pub foods: Vec<PlanFood>,
    pub meals: Vec<PlanMeal>,
    pub warnings: Vec<PlanWarning>,
}

impl PlanResponse {
    pub fn from_plan(
        total_kcal: f64,
        meals_per_day: u32,
        weight_kg: f64,
        weight_estimated: bool,
        plan: FeedingPlan,
    ) -> Self {
        Self {
            total_kcal: round1(total_kcal),
            meals_per_day,
            weight_kg,
            weight_estimated,
            foods: plan
                .foods
                .into_iter()
                .map(|f| PlanFood {
                    food_id: f.food_id,
                    name: f.name,
                    food_type: f.food_type,
                    pct_daily_kcal: f.pct_daily_kcal,
                    kcal_day: round1(f.kcal_day),
                })
                .collect(),
            meals: plan
                .meals
                .into_iter()
                .map(|m| PlanMeal {
                    meal: m.meal,
                    target_kcal: round1(m.target_kcal),
                    target_wet_kcal: round1(m.target_wet_kcal),
                    portions: m
                        .portions
                        .into_iter()
                        .map(|p| PlanPortion {
                            food_id: p.food_id,
                            name: p.name,
                            food_type: p.food_type,
                            kcal: round1(p.kcal),
                            grams: round1(p.grams),
                        })
                        .collect(),
                })
                .collect(),
            warnings: plan
                .warnings
                .into_iter()
                .map(|w| PlanWarning {
                    meal: w.meal,
                    kind: w.kind,
                    requested_wet_pct: w.requested_wet_pct,
                    feasible_min_pct: round1(w.feasible_min_pct),
                    feasible_max_pct: round1(w.feasible_max_pct),
                })
                .collect(),
        }
    }
}

/// Weight entries already carry the wire field names.
pub type WeightList = Vec<WeightEntry>;

//! Splits a daily caloric budget across meals and foods.
//!
//! Two targets are balanced with a proportional heuristic, not a solver:
//! each food's share of the day's calories, and each meal's wet/dry ratio.
//! A food is spread over the meals in proportion to how much wet (or dry)
//! kcal each meal asks for relative to the day's total asked-for amount.
//! Targets that cannot be met are reported as warnings, never errors.

use std::collections::HashMap;

use serde::Serialize;

use crate::store::{DietEntry, FoodItem, FoodType, MealSettings};

#[derive(Debug, Clone, Serialize)]
pub struct DailyFood {
    pub food_id: u32,
    pub name: String,
    pub food_type: FoodType,
    pub pct_daily_kcal: u32,
    pub kcal_day: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Portion {
    pub food_id: u32,
    pub name: String,
    pub food_type: FoodType,
    pub kcal: f64,
    pub grams: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MealAllocation {
    pub meal: u32,
    pub target_kcal: f64,
    pub target_wet_kcal: f64,
    pub portions: Vec<Portion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    NoWetFood,
    NoDryFood,
    WetTooLow,
    WetTooHigh,
}

/// A per-meal wet/dry target the day's foods cannot satisfy.
#[derive(Debug, Clone, Serialize)]
pub struct MealWarning {
    pub meal: u32,
    pub kind: WarningKind,
    pub requested_wet_pct: u32,
    pub feasible_min_pct: f64,
    pub feasible_max_pct: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FeedingPlan {
    pub foods: Vec<DailyFood>,
    pub meals: Vec<MealAllocation>,
    pub warnings: Vec<MealWarning>,
}

struct MealTarget {
    kcal: f64,
    wet_pct: u32,
    wet_kcal: f64,
    dry_kcal: f64,
}

/// Compute the per-meal, per-food allocation for one day.
///
/// Diet entries pointing at deleted foods or foods without a usable energy
/// density are dropped silently. Degenerate inputs produce an empty plan.
/// No rounding happens here; callers round at the formatting boundary.
pub fn allocate_meals(
    total_kcal: f64,
    meals_per_day: u32,
    diet: &[DietEntry],
    foods: &[FoodItem],
    settings: &MealSettings,
) -> FeedingPlan {
    if total_kcal <= 0.0 || meals_per_day == 0 || diet.is_empty() || foods.is_empty() {
        return FeedingPlan::default();
    }

    let catalog: HashMap<u32, &FoodItem> = foods.iter().map(|f| (f.id, f)).collect();

    struct Resolved<'a> {
        food: &'a FoodItem,
        pct: u32,
        kcal_day: f64,
    }
    let resolved: Vec<Resolved> = diet
        .iter()
        .filter_map(|entry| {
            let food = *catalog.get(&entry.food_id)?;
            if food.kcal_per_kg <= 0.0 {
                return None;
            }
            Some(Resolved {
                food,
                pct: entry.pct_daily_kcal,
                kcal_day: total_kcal * entry.pct_daily_kcal as f64 / 100.0,
            })
        })
        .collect();

    let wet_pool: f64 = resolved
        .iter()
        .filter(|r| r.food.food_type == FoodType::Wet)
        .map(|r| r.kcal_day)
        .sum();
    let dry_pool: f64 = resolved
        .iter()
        .filter(|r| r.food.food_type == FoodType::Dry)
        .map(|r| r.kcal_day)
        .sum();

    let equal_share = total_kcal / meals_per_day as f64;
    let targets: Vec<MealTarget> = (1..=meals_per_day)
        .map(|m| {
            let kcal = match settings.meal_kcal.get(&m) {
                Some(pct) => total_kcal * *pct as f64 / 100.0,
                None => equal_share,
            };
            let wet_pct = settings.meal_wet.get(&m).copied().unwrap_or(50);
            let wet_kcal = kcal * wet_pct as f64 / 100.0;
            MealTarget {
                kcal,
                wet_pct,
                wet_kcal,
                dry_kcal: kcal - wet_kcal,
            }
        })
        .collect();

    let requested_wet_total: f64 = targets.iter().map(|t| t.wet_kcal).sum();
    let requested_dry_total: f64 = targets.iter().map(|t| t.dry_kcal).sum();

    let mut meals = Vec::with_capacity(targets.len());
    let mut warnings = Vec::new();
    for (i, target) in targets.iter().enumerate() {
        let meal = i as u32 + 1;

        let portions = resolved
            .iter()
            .map(|r| {
                let (wanted, requested_total) = match r.food.food_type {
                    FoodType::Wet => (target.wet_kcal, requested_wet_total),
                    FoodType::Dry => (target.dry_kcal, requested_dry_total),
                };
                let kcal = if requested_total > 0.0 {
                    r.kcal_day * wanted / requested_total
                } else {
                    0.0
                };
                Portion {
                    food_id: r.food.id,
                    name: r.food.name.clone(),
                    food_type: r.food.food_type,
                    kcal,
                    grams: kcal * 1000.0 / r.food.kcal_per_kg,
                }
            })
            .collect();

        if target.kcal > 0.0 {
            let feasible_min = ((target.kcal - dry_pool) / target.kcal * 100.0).clamp(0.0, 100.0);
            let feasible_max = (wet_pool / target.kcal * 100.0).clamp(0.0, 100.0);
            let requested = target.wet_pct;
            let kind = if wet_pool <= 0.0 && requested > 0 {
                Some(WarningKind::NoWetFood)
            } else if dry_pool <= 0.0 && requested < 100 {
                Some(WarningKind::NoDryFood)
            } else if (requested as f64) < feasible_min - 1.0 {
                Some(WarningKind::WetTooLow)
            } else if (requested as f64) > feasible_max + 1.0 {
                Some(WarningKind::WetTooHigh)
            } else {
                None
            };
            if let Some(kind) = kind {
                warnings.push(MealWarning {
                    meal,
                    kind,
                    requested_wet_pct: requested,
                    feasible_min_pct: feasible_min,
                    feasible_max_pct: feasible_max,
                });
            }
        }

        meals.push(MealAllocation {
            meal,
            target_kcal: target.kcal,
            target_wet_kcal: target.wet_kcal,
            portions,
        });
    }

    let foods_out = resolved
        .iter()
        .map(|r| DailyFood {
            food_id: r.food.id,
            name: r.food.name.clone(),
            food_type: r.food.food_type,
            pct_daily_kcal: r.pct,
            kcal_day: r.kcal_day,
        })
        .collect();

    FeedingPlan {
        foods: foods_out,
        meals,
        warnings,
    }
}

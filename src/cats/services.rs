use time::{Date, OffsetDateTime};

use super::dto::{round1, CatOverview, PlanResponse, TrendPoint};
use crate::feeding::{allocation, display, energy};
use crate::store::{CatRecord, FoodItem};

pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Derived per-cat numbers everything downstream shares: age, effective
/// stage, the weight to feed for and the daily caloric target.
pub struct CatStatus {
    pub age_weeks: f64,
    pub stage_code: String,
    pub weight_kg: f64,
    pub weight_estimated: bool,
    pub daily_kcal: f64,
}

pub fn status_for(cat: &CatRecord, today: Date) -> CatStatus {
    let age_weeks = energy::weeks_between(cat.birthday, today);
    let stage_code = energy::effective_stage_code(cat.life_stage_override.as_deref(), age_weeks);
    // Weight log wins; with no entries the growth curve keeps the caloric
    // target computable from age alone.
    let (weight_kg, weight_estimated) = match cat.weights.last() {
        Some(entry) => (entry.weight_kg, false),
        None => (energy::estimate_weight_by_age(age_weeks), true),
    };
    let daily_kcal = energy::der_kcal(weight_kg, &stage_code);
    CatStatus {
        age_weeks,
        stage_code,
        weight_kg,
        weight_estimated,
        daily_kcal,
    }
}

pub fn overview_for(cat: &CatRecord, today: Date) -> CatOverview {
    let status = status_for(cat, today);
    CatOverview {
        id: cat.id,
        name: cat.name.clone(),
        birthday: cat.birthday,
        meals_per_day: cat.meals_per_day,
        life_stage_override: cat.life_stage_override.clone(),
        has_photo: cat.photo_key.is_some(),
        age_weeks: round1(status.age_weeks),
        age_display: display::format_age(status.age_weeks, Some(cat.birthday), today),
        life_stage_label: display::format_life_stage(&status.stage_code),
        life_stage: status.stage_code,
        weight_kg: status.weight_kg,
        weight_estimated: status.weight_estimated,
        daily_kcal: round1(status.daily_kcal),
    }
}

/// DER history over the weight log, one point per logged date.
pub fn trend_for(cat: &CatRecord) -> Vec<TrendPoint> {
    cat.weights
        .iter()
        .map(|entry| {
            let age_weeks = energy::weeks_between(cat.birthday, entry.dt);
            let stage =
                energy::effective_stage_code(cat.life_stage_override.as_deref(), age_weeks);
            TrendPoint {
                dt: entry.dt,
                age_weeks: round1(age_weeks),
                weight_kg: entry.weight_kg,
                der_kcal: round1(energy::der_kcal(entry.weight_kg, &stage)),
            }
        })
        .collect()
}

pub fn plan_for(cat: &CatRecord, foods: &[FoodItem], today: Date) -> PlanResponse {
    let status = status_for(cat, today);
    let plan = allocation::allocate_meals(
        status.daily_kcal,
        cat.meals_per_day,
        &cat.diet,
        foods,
        &cat.meal_settings,
    );
    PlanResponse::from_plan(
        status.daily_kcal,
        cat.meals_per_day,
        status.weight_kg,
        status.weight_estimated,
        plan,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DietEntry, FoodType, MealSettings, WeightEntry};
    use time::Duration;
    use uuid::Uuid;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn cat(birthday: Date) -> CatRecord {
        CatRecord {
            id: Uuid::new_v4(),
            name: "Babbu".to_string(),
            birthday,
            meals_per_day: 2,
            life_stage_override: None,
            photo_key: None,
            weights: Vec::new(),
            diet: Vec::new(),
            meal_settings: MealSettings::default(),
        }
    }

    #[test]
    fn status_prefers_the_logged_weight() {
        let today = today();
        let mut cat = cat(today - Duration::weeks(104));
        cat.weights.push(WeightEntry {
            dt: today - Duration::days(3),
            weight_kg: 4.5,
        });

        let status = status_for(&cat, today);
        assert!(!status.weight_estimated);
        assert_eq!(status.weight_kg, 4.5);
        assert_eq!(status.stage_code, "adult_neutered");
        assert!(close(status.daily_kcal, energy::der_kcal(4.5, "adult_neutered")));
    }

    #[test]
    fn status_estimates_weight_from_age_when_the_log_is_empty() {
        let today = today();
        let cat = cat(today - Duration::weeks(10));

        let status = status_for(&cat, today);
        assert!(status.weight_estimated);
        assert!(close(status.age_weeks, 10.0));
        assert_eq!(status.stage_code, "kitten_0_4m");
        assert!(close(status.weight_kg, 0.8));
        assert!(close(status.daily_kcal, energy::der_kcal(0.8, "kitten_0_4m")));
    }

    #[test]
    fn override_changes_the_effective_stage() {
        let today = today();
        let mut cat = cat(today - Duration::weeks(10));
        cat.life_stage_override = Some("adult_obese_prone".to_string());

        let status = status_for(&cat, today);
        assert_eq!(status.stage_code, "adult_obese_prone");
    }

    #[test]
    fn trend_tracks_stage_changes_across_the_log() {
        let today = today();
        let mut cat = cat(today - Duration::weeks(60));
        cat.weights.push(WeightEntry {
            dt: cat.birthday + Duration::weeks(10),
            weight_kg: 0.9,
        });
        cat.weights.push(WeightEntry {
            dt: cat.birthday + Duration::weeks(55),
            weight_kg: 4.2,
        });

        let trend = trend_for(&cat);
        assert_eq!(trend.len(), 2);
        assert!(close(trend[0].age_weeks, 10.0));
        assert_eq!(
            trend[0].der_kcal,
            round1(energy::der_kcal(0.9, "kitten_0_4m"))
        );
        assert_eq!(
            trend[1].der_kcal,
            round1(energy::der_kcal(4.2, "adult_neutered"))
        );
    }

    #[test]
    fn plan_for_composes_status_and_allocation() {
        let today = today();
        let mut cat = cat(today - Duration::weeks(104));
        cat.weights.push(WeightEntry {
            dt: today,
            weight_kg: 4.5,
        });
        cat.diet = vec![
            DietEntry {
                food_id: 1,
                pct_daily_kcal: 60,
            },
            DietEntry {
                food_id: 2,
                pct_daily_kcal: 40,
            },
        ];
        let foods = vec![
            FoodItem {
                id: 1,
                name: "FoodA".to_string(),
                food_type: FoodType::Wet,
                kcal_per_kg: 500.0,
            },
            FoodItem {
                id: 2,
                name: "FoodB".to_string(),
                food_type: FoodType::Dry,
                kcal_per_kg: 4000.0,
            },
        ];

        let total = energy::der_kcal(4.5, "adult_neutered");
        let plan = plan_for(&cat, &foods, today);

        assert_eq!(plan.meals_per_day, 2);
        assert!(!plan.weight_estimated);
        assert_eq!(plan.total_kcal, round1(total));
        assert_eq!(plan.meals.len(), 2);
        assert!(plan.warnings.is_empty());

        // Defaults: even meal split, 50% wet, so each meal carries half of
        // each food's daily kcal.
        for meal in &plan.meals {
            assert_eq!(meal.portions[0].kcal, round1(total * 0.6 / 2.0));
            assert_eq!(
                meal.portions[0].grams,
                round1(total * 0.6 / 2.0 * 1000.0 / 500.0)
            );
            assert_eq!(meal.portions[1].kcal, round1(total * 0.4 / 2.0));
        }
    }

    #[test]
    fn plan_for_is_empty_without_a_diet() {
        let today = today();
        let cat = cat(today - Duration::weeks(104));
        let plan = plan_for(&cat, &[], today);
        assert!(plan.meals.is_empty());
        assert!(plan.foods.is_empty());
        assert!(plan.warnings.is_empty());
    }
}

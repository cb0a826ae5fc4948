//! Typed shapes of the persisted JSON documents. Everything outside this
//! module works with these structs; the untyped JSON and the legacy food
//! schema exist only here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

/// Serde codec for `[year]-[month]-[day]` calendar dates.
pub(crate) mod date_format {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{format_description::FormatItem, macros::format_description, Date};

    const FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let out = date.format(FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&out)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Date::parse(&raw, FORMAT).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use time::Date;

        pub fn serialize<S: Serializer>(
            date: &Option<Date>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Date>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            raw.map(|s| Date::parse(&s, super::FORMAT).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodType {
    Wet,
    Dry,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    #[serde(with = "date_format")]
    pub dt: Date,
    pub weight_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietEntry {
    pub food_id: u32,
    pub pct_daily_kcal: u32,
}

/// Per-meal targets, keyed by meal number (1..=meals_per_day). Missing
/// entries mean "use the default": an equal calorie share and 50% wet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealSettings {
    #[serde(default)]
    pub meal_kcal: BTreeMap<u32, u32>,
    #[serde(default)]
    pub meal_wet: BTreeMap<u32, u32>,
}

/// One cat's whole document: profile plus weight log, diet plan and meal
/// settings. Replaced as a unit on every write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "date_format")]
    pub birthday: Date,
    pub meals_per_day: u32,
    #[serde(default)]
    pub life_stage_override: Option<String>,
    #[serde(default)]
    pub photo_key: Option<String>,
    #[serde(default)]
    pub weights: Vec<WeightEntry>,
    #[serde(default)]
    pub diet: Vec<DietEntry>,
    #[serde(default)]
    pub meal_settings: MealSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: u32,
    pub name: String,
    pub food_type: FoodType,
    pub kcal_per_kg: f64,
}

/// Collapse the legacy per-unit density schema to kcal per kilogram.
/// Returns 0.0 when the record carries no usable density, which downstream
/// treats as "skip this food".
pub fn normalize_density(unit: &str, kcal_per_unit: f64, grams_per_cup: Option<f64>) -> f64 {
    match unit {
        "kcal_per_g" => kcal_per_unit * 1000.0,
        "kcal_per_cup" => match grams_per_cup {
            Some(gpc) if gpc > 0.0 => kcal_per_unit * 1000.0 / gpc,
            _ => 0.0,
        },
        _ => 0.0,
    }
}

/// On-disk food entry: either the current normalized shape or a legacy
/// record (`unit` + `kcal_per_unit` + optional `grams_per_cup`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FoodDoc {
    Current(FoodItem),
    Legacy(LegacyFood),
}

/// Legacy records predate the wet/dry split; absent `food_type` defaults
/// to dry.
#[derive(Debug, Deserialize)]
pub struct LegacyFood {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub food_type: Option<FoodType>,
    pub unit: String,
    pub kcal_per_unit: f64,
    #[serde(default)]
    pub grams_per_cup: Option<f64>,
}

impl From<FoodDoc> for FoodItem {
    fn from(doc: FoodDoc) -> Self {
        match doc {
            FoodDoc::Current(item) => item,
            FoodDoc::Legacy(legacy) => FoodItem {
                id: legacy.id,
                name: legacy.name,
                food_type: legacy.food_type.unwrap_or(FoodType::Dry),
                kcal_per_kg: normalize_density(
                    &legacy.unit,
                    legacy.kcal_per_unit,
                    legacy.grams_per_cup,
                ),
            },
        }
    }
}

/// Wire shape of the catalog document as read from storage.
#[derive(Debug, Default, Deserialize)]
pub struct FoodCatalogDoc {
    #[serde(default)]
    pub next_id: u32,
    #[serde(default)]
    pub foods: Vec<FoodDoc>,
}

impl FoodCatalogDoc {
    /// Normalize every entry and repair the id high-water mark; ids are
    /// never reused even across deletes.
    pub fn into_catalog(self) -> FoodCatalog {
        let foods: Vec<FoodItem> = self.foods.into_iter().map(FoodItem::from).collect();
        let max_id = foods.iter().map(|f| f.id).max().unwrap_or(0);
        let next_id = self.next_id.max(max_id + 1);
        FoodCatalog { next_id, foods }
    }
}

/// Normalized catalog; always written back in the current schema.
#[derive(Debug, Serialize)]
pub struct FoodCatalog {
    pub next_id: u32,
    pub foods: Vec<FoodItem>,
}

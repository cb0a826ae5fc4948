//! Whole-document persistence over the blob storage client. Every mutation
//! is read-then-replace of a complete document; concurrent writers to the
//! same record race with last-write-wins and there is no retry here.

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use time::Date;
use uuid::Uuid;

use crate::storage::StorageClient;
use crate::store::documents::{
    CatRecord, DietEntry, FoodCatalog, FoodCatalogDoc, FoodItem, FoodType, MealSettings,
    WeightEntry,
};

const FOODS_KEY: &str = "foods.json";

fn cat_key(id: Uuid) -> String {
    format!("cats/{}.json", id)
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cat {0} not found")]
    CatNotFound(Uuid),
    #[error("diet percentages must sum to 100, got {total}")]
    DietTotalNot100 { total: u32 },
    #[error("malformed document {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage error: {0}")]
    Storage(#[source] anyhow::Error),
}

/// Handle to the persisted cat and food documents. Constructed with an
/// injected storage client so tests run against `MemoryStorage`.
#[derive(Clone)]
pub struct DocumentStore {
    storage: Arc<dyn StorageClient>,
}

impl DocumentStore {
    pub fn new(storage: Arc<dyn StorageClient>) -> Self {
        Self { storage }
    }

    async fn read_doc<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let body = self
            .storage
            .get_object(key)
            .await
            .map_err(StoreError::Storage)?;
        match body {
            None => Ok(None),
            Some(body) => serde_json::from_slice(&body).map(Some).map_err(|e| {
                StoreError::Corrupt {
                    key: key.to_string(),
                    source: e,
                }
            }),
        }
    }

    async fn write_doc<T: Serialize>(&self, key: &str, doc: &T) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(doc).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            source: e,
        })?;
        self.storage
            .put_object(key, Bytes::from(body), "application/json")
            .await
            .map_err(StoreError::Storage)
    }

    pub async fn create_cat(
        &self,
        name: &str,
        birthday: Date,
        meals_per_day: u32,
        life_stage_override: Option<String>,
    ) -> Result<CatRecord, StoreError> {
        let cat = CatRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            birthday,
            meals_per_day,
            life_stage_override,
            photo_key: None,
            weights: Vec::new(),
            diet: Vec::new(),
            meal_settings: MealSettings::default(),
        };
        self.save_cat(&cat).await?;
        Ok(cat)
    }

    pub async fn load_cat(&self, id: Uuid) -> Result<Option<CatRecord>, StoreError> {
        self.read_doc(&cat_key(id)).await
    }

    pub async fn require_cat(&self, id: Uuid) -> Result<CatRecord, StoreError> {
        self.load_cat(id).await?.ok_or(StoreError::CatNotFound(id))
    }

    pub async fn save_cat(&self, cat: &CatRecord) -> Result<(), StoreError> {
        self.write_doc(&cat_key(cat.id), cat).await
    }

    pub async fn list_cats(&self) -> Result<Vec<CatRecord>, StoreError> {
        let keys = self
            .storage
            .list_keys("cats/")
            .await
            .map_err(StoreError::Storage)?;
        let mut cats = Vec::with_capacity(keys.len());
        for key in keys {
            // Photo objects live under the same prefix.
            if !key.ends_with(".json") {
                continue;
            }
            if let Some(cat) = self.read_doc::<CatRecord>(&key).await? {
                cats.push(cat);
            }
        }
        cats.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(cats)
    }

    pub async fn load_weights(&self, id: Uuid) -> Result<Vec<WeightEntry>, StoreError> {
        Ok(self.require_cat(id).await?.weights)
    }

    /// Upsert by date: one entry per calendar date, collection kept sorted
    /// ascending.
    pub async fn save_weight_entry(
        &self,
        id: Uuid,
        dt: Date,
        weight_kg: f64,
    ) -> Result<CatRecord, StoreError> {
        let mut cat = self.require_cat(id).await?;
        cat.weights.retain(|w| w.dt != dt);
        cat.weights.push(WeightEntry { dt, weight_kg });
        cat.weights.sort_by_key(|w| w.dt);
        self.save_cat(&cat).await?;
        Ok(cat)
    }

    pub async fn load_diet_plan(&self, id: Uuid) -> Result<Vec<DietEntry>, StoreError> {
        Ok(self.require_cat(id).await?.diet)
    }

    pub async fn load_meal_settings(&self, id: Uuid) -> Result<MealSettings, StoreError> {
        Ok(self.require_cat(id).await?.meal_settings)
    }

    /// Replace the diet plan and meal settings in one document write. A
    /// plan whose percentages don't sum to exactly 100 is rejected before
    /// anything is touched.
    pub async fn save_diet_plan(
        &self,
        id: Uuid,
        entries: Vec<DietEntry>,
        settings: MealSettings,
    ) -> Result<CatRecord, StoreError> {
        let total: u32 = entries.iter().map(|e| e.pct_daily_kcal).sum();
        if total != 100 {
            return Err(StoreError::DietTotalNot100 { total });
        }
        let mut cat = self.require_cat(id).await?;
        cat.diet = entries;
        cat.meal_settings = settings;
        self.save_cat(&cat).await?;
        Ok(cat)
    }

    async fn load_catalog(&self) -> Result<FoodCatalog, StoreError> {
        Ok(self
            .read_doc::<FoodCatalogDoc>(FOODS_KEY)
            .await?
            .unwrap_or_default()
            .into_catalog())
    }

    pub async fn load_food_catalog(&self) -> Result<Vec<FoodItem>, StoreError> {
        let mut foods = self.load_catalog().await?.foods;
        foods.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(foods)
    }

    pub async fn add_food(
        &self,
        name: &str,
        food_type: FoodType,
        kcal_per_kg: f64,
    ) -> Result<FoodItem, StoreError> {
        let mut catalog = self.load_catalog().await?;
        let item = FoodItem {
            id: catalog.next_id,
            name: name.to_string(),
            food_type,
            kcal_per_kg,
        };
        catalog.next_id += 1;
        catalog.foods.push(item.clone());
        self.write_doc(FOODS_KEY, &catalog).await?;
        Ok(item)
    }

    /// `false` when no food with the id exists. Diet entries referencing a
    /// deleted food are left dangling; the allocation engine skips them.
    pub async fn delete_food(&self, id: u32) -> Result<bool, StoreError> {
        let mut catalog = self.load_catalog().await?;
        let before = catalog.foods.len();
        catalog.foods.retain(|f| f.id != id);
        if catalog.foods.len() == before {
            return Ok(false);
        }
        self.write_doc(FOODS_KEY, &catalog).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use time::macros::date;

    fn store() -> DocumentStore {
        DocumentStore::new(Arc::new(MemoryStorage::default()))
    }

    #[tokio::test]
    async fn create_and_load_round_trip() {
        let store = store();
        let cat = store
            .create_cat("Babbu", date!(2024 - 02 - 01), 3, None)
            .await
            .unwrap();

        let loaded = store.load_cat(cat.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Babbu");
        assert_eq!(loaded.meals_per_day, 3);
        assert!(loaded.weights.is_empty());

        assert!(store.load_cat(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn require_cat_reports_missing_ids() {
        let store = store();
        let id = Uuid::new_v4();
        let err = store.require_cat(id).await.unwrap_err();
        assert!(matches!(err, StoreError::CatNotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn weight_upsert_replaces_same_date_and_stays_sorted() {
        let store = store();
        let cat = store
            .create_cat("Babbu", date!(2024 - 02 - 01), 3, None)
            .await
            .unwrap();

        store
            .save_weight_entry(cat.id, date!(2024 - 04 - 08), 1.30)
            .await
            .unwrap();
        store
            .save_weight_entry(cat.id, date!(2024 - 04 - 01), 1.20)
            .await
            .unwrap();
        let updated = store
            .save_weight_entry(cat.id, date!(2024 - 04 - 08), 1.35)
            .await
            .unwrap();

        assert_eq!(updated.weights.len(), 2);
        assert_eq!(updated.weights[0].dt, date!(2024 - 04 - 01));
        assert_eq!(updated.weights[1].dt, date!(2024 - 04 - 08));
        assert_eq!(updated.weights[1].weight_kg, 1.35);

        let reloaded = store.load_weights(cat.id).await.unwrap();
        assert_eq!(reloaded, updated.weights);
    }

    #[tokio::test]
    async fn diet_save_is_atomic_on_the_percentage_invariant() {
        let store = store();
        let cat = store
            .create_cat("Babbu", date!(2024 - 02 - 01), 2, None)
            .await
            .unwrap();

        let good = vec![
            DietEntry {
                food_id: 1,
                pct_daily_kcal: 60,
            },
            DietEntry {
                food_id: 2,
                pct_daily_kcal: 40,
            },
        ];
        let mut settings = MealSettings::default();
        settings.meal_wet.insert(1, 70);
        store
            .save_diet_plan(cat.id, good.clone(), settings.clone())
            .await
            .unwrap();

        let saved = store.load_diet_plan(cat.id).await.unwrap();
        assert_eq!(saved, good);
        assert_eq!(store.load_meal_settings(cat.id).await.unwrap(), settings);

        for bad_total in [99u32, 101u32] {
            let bad = vec![DietEntry {
                food_id: 1,
                pct_daily_kcal: bad_total,
            }];
            let err = store
                .save_diet_plan(cat.id, bad, MealSettings::default())
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::DietTotalNot100 { total } if total == bad_total));

            // The prior plan is untouched.
            assert_eq!(store.load_diet_plan(cat.id).await.unwrap(), good);
            assert_eq!(store.load_meal_settings(cat.id).await.unwrap(), settings);
        }
    }

    #[tokio::test]
    async fn food_ids_are_monotonic_and_never_reused() {
        let store = store();
        let a = store.add_food("Pate", FoodType::Wet, 900.0).await.unwrap();
        let b = store.add_food("Kibble", FoodType::Dry, 4000.0).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);

        assert!(store.delete_food(a.id).await.unwrap());
        assert!(!store.delete_food(a.id).await.unwrap());

        let c = store.add_food("Treats", FoodType::Dry, 3500.0).await.unwrap();
        assert_eq!(c.id, 3);

        let catalog = store.load_food_catalog().await.unwrap();
        let ids: Vec<u32> = catalog.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn catalog_listing_is_sorted_by_name() {
        let store = store();
        store.add_food("Zebra bites", FoodType::Dry, 3000.0).await.unwrap();
        store.add_food("Anchovy mousse", FoodType::Wet, 700.0).await.unwrap();

        let names: Vec<String> = store
            .load_food_catalog()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["Anchovy mousse", "Zebra bites"]);
    }

    #[tokio::test]
    async fn list_cats_skips_non_document_objects() {
        let storage = MemoryStorage::default();
        let store = DocumentStore::new(Arc::new(storage.clone()));
        store
            .create_cat("Mio", date!(2023 - 11 - 20), 3, None)
            .await
            .unwrap();
        store
            .create_cat("Babbu", date!(2024 - 02 - 01), 2, None)
            .await
            .unwrap();
        storage
            .put_object(
                "cats/7b19a9ae/photo-1.jpg",
                Bytes::from_static(b"\xff\xd8"),
                "image/jpeg",
            )
            .await
            .unwrap();

        let cats = store.list_cats().await.unwrap();
        let names: Vec<&str> = cats.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Babbu", "Mio"]);
    }
}

pub mod documents;
pub mod repo;

pub use documents::{CatRecord, DietEntry, FoodItem, FoodType, MealSettings, WeightEntry};
pub use repo::{DocumentStore, StoreError};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{error, instrument};

use super::dto::CreateFoodRequest;
use crate::state::AppState;
use crate::store::FoodItem;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/foods", get(list_foods).post(create_food))
        .route("/foods/:id", delete(delete_food))
}

#[instrument(skip(state))]
pub async fn list_foods(
    State(state): State<AppState>,
) -> Result<Json<Vec<FoodItem>>, (StatusCode, String)> {
    let foods = state.store.load_food_catalog().await.map_err(internal)?;
    Ok(Json(foods))
}

#[instrument(skip(state))]
pub async fn create_food(
    State(state): State<AppState>,
    Json(body): Json<CreateFoodRequest>,
) -> Result<(StatusCode, Json<FoodItem>), (StatusCode, String)> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "name is required".into()));
    }
    let (food_type, kcal_per_kg) = body
        .resolve()
        .map_err(|msg| (StatusCode::UNPROCESSABLE_ENTITY, msg.to_string()))?;

    let item = state
        .store
        .add_food(name, food_type, kcal_per_kg)
        .await
        .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Diet entries pointing at the deleted food stay in place; the plan
/// computation skips them.
#[instrument(skip(state))]
pub async fn delete_food(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = state.store.delete_food(id).await.map_err(internal)?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "Food not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "food operation failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, post, put},
    Json, Router,
};
use bytes::Bytes;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::photos;
use crate::state::AppState;
use crate::store::{DietEntry, MealSettings, StoreError};

use super::dto::{
    normalize_override, AddWeightRequest, CatOverview, CatSummary, CreateCatRequest, DietResponse,
    PhotoResponse, PlanResponse, SaveDietRequest, TrendPoint, UpdateCatRequest, WeightList,
};
use super::services;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/cats", get(list_cats))
        .route("/cats/:id", get(get_cat))
        .route("/cats/:id/weights", get(list_weights))
        .route("/cats/:id/trend", get(get_trend))
        .route("/cats/:id/diet", get(get_diet))
        .route("/cats/:id/plan", get(get_plan))
        .route("/cats/:id/photo", get(get_photo))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/cats", post(create_cat))
        .route("/cats/:id", put(update_cat))
        .route("/cats/:id/weights", post(add_weight))
        .route("/cats/:id/diet", put(save_diet))
        .route("/cats/:id/photo", post(upload_photo))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
}

#[instrument(skip(state))]
pub async fn create_cat(
    State(state): State<AppState>,
    Json(body): Json<CreateCatRequest>,
) -> Result<(StatusCode, Json<CatOverview>), (StatusCode, String)> {
    if body.meals_per_day == 0 {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "meals_per_day must be positive".into(),
        ));
    }
    let cat = state
        .store
        .create_cat(
            body.name.trim(),
            body.birthday,
            body.meals_per_day,
            normalize_override(body.life_stage_override),
        )
        .await
        .map_err(store_err)?;
    Ok((
        StatusCode::CREATED,
        Json(services::overview_for(&cat, services::today())),
    ))
}

#[instrument(skip(state))]
pub async fn list_cats(
    State(state): State<AppState>,
) -> Result<Json<Vec<CatSummary>>, (StatusCode, String)> {
    let cats = state.store.list_cats().await.map_err(store_err)?;
    let items = cats
        .into_iter()
        .map(|c| CatSummary {
            id: c.id,
            name: c.name,
            birthday: c.birthday,
            meals_per_day: c.meals_per_day,
        })
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn get_cat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CatOverview>, (StatusCode, String)> {
    let cat = state.store.require_cat(id).await.map_err(store_err)?;
    Ok(Json(services::overview_for(&cat, services::today())))
}

#[instrument(skip(state))]
pub async fn update_cat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCatRequest>,
) -> Result<Json<CatOverview>, (StatusCode, String)> {
    let mut cat = state.store.require_cat(id).await.map_err(store_err)?;

    if let Some(name) = body.name {
        cat.name = name.trim().to_string();
    }
    if let Some(birthday) = body.birthday {
        cat.birthday = birthday;
    }
    if let Some(meals_per_day) = body.meals_per_day {
        if meals_per_day == 0 {
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                "meals_per_day must be positive".into(),
            ));
        }
        cat.meals_per_day = meals_per_day;
    }
    if let Some(code) = body.life_stage_override {
        cat.life_stage_override = normalize_override(Some(code));
    }

    state.store.save_cat(&cat).await.map_err(store_err)?;
    Ok(Json(services::overview_for(&cat, services::today())))
}

#[instrument(skip(state))]
pub async fn list_weights(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WeightList>, (StatusCode, String)> {
    let weights = state.store.load_weights(id).await.map_err(store_err)?;
    Ok(Json(weights))
}

#[instrument(skip(state))]
pub async fn add_weight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<AddWeightRequest>,
) -> Result<(StatusCode, Json<WeightList>), (StatusCode, String)> {
    if body.weight_kg <= 0.0 {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "weight_kg must be positive".into(),
        ));
    }
    let cat = state
        .store
        .save_weight_entry(id, body.dt, body.weight_kg)
        .await
        .map_err(store_err)?;
    Ok((StatusCode::CREATED, Json(cat.weights)))
}

#[instrument(skip(state))]
pub async fn get_trend(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TrendPoint>>, (StatusCode, String)> {
    let cat = state.store.require_cat(id).await.map_err(store_err)?;
    Ok(Json(services::trend_for(&cat)))
}

#[instrument(skip(state))]
pub async fn get_diet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DietResponse>, (StatusCode, String)> {
    let entries = state.store.load_diet_plan(id).await.map_err(store_err)?;
    let settings = state
        .store
        .load_meal_settings(id)
        .await
        .map_err(store_err)?;
    Ok(Json(DietResponse {
        entries,
        meal_kcal: settings.meal_kcal,
        meal_wet: settings.meal_wet,
    }))
}

#[instrument(skip(state))]
pub async fn save_diet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SaveDietRequest>,
) -> Result<Json<Vec<DietEntry>>, (StatusCode, String)> {
    let settings = MealSettings {
        meal_kcal: body.meal_kcal,
        meal_wet: body.meal_wet,
    };
    let cat = state
        .store
        .save_diet_plan(id, body.entries, settings)
        .await
        .map_err(store_err)?;
    Ok(Json(cat.diet))
}

#[instrument(skip(state))]
pub async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlanResponse>, (StatusCode, String)> {
    let cat = state.store.require_cat(id).await.map_err(store_err)?;
    let foods = state.store.load_food_catalog().await.map_err(store_err)?;
    Ok(Json(services::plan_for(&cat, &foods, services::today())))
}

/// POST /cats/:id/photo (multipart, field `file`)
#[instrument(skip(state, mp))]
pub async fn upload_photo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<PhotoResponse>), (StatusCode, String)> {
    let mut file: Option<(Bytes, String)> = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() == Some("file") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field.bytes().await.map_err(internal)?;
            file = Some((data, content_type));
            break;
        }
    }
    let Some((data, content_type)) = file else {
        return Err((StatusCode::BAD_REQUEST, "file is required".into()));
    };

    let mut cat = state.store.require_cat(id).await.map_err(store_err)?;
    let photo_key = photos::services::replace_profile_photo(&state, &mut cat, data, &content_type)
        .await
        .map_err(internal)?;

    Ok((StatusCode::CREATED, Json(PhotoResponse { photo_key })))
}

/// 302 to a presigned URL for the profile photo.
#[instrument(skip(state))]
pub async fn get_photo(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let cat = match state.store.require_cat(id).await {
        Ok(cat) => cat,
        Err(e) => return store_err(e).into_response(),
    };
    let Some(key) = cat.photo_key else {
        return (StatusCode::NOT_FOUND, "No profile photo").into_response();
    };
    let Ok(url) = photos::services::presign_profile_photo(&state, &key).await else {
        error!(%id, "presign failed");
        return (StatusCode::INTERNAL_SERVER_ERROR, "presign failed").into_response();
    };
    Redirect::temporary(&url).into_response()
}

fn store_err(e: StoreError) -> (StatusCode, String) {
    let status = match &e {
        StoreError::CatNotFound(_) => StatusCode::NOT_FOUND,
        StoreError::DietTotalNot100 { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        StoreError::Corrupt { .. } | StoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %e, "store operation failed");
    }
    (status, e.to_string())
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

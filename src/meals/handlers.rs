use std::collections::HashMap;

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use time::{Duration, OffsetDateTime};
use tracing::{error, instrument};
use uuid::Uuid;

use super::analytics::{build_analytics, summarize, AnalyticsData, WeeklyStats};
use super::dto::{CreatedMealResponse, MealDetails, MealSummary, Pagination, SaveMealRequest};
use super::repo::{self, FoodItemRow, Meal};
use super::services::save_meal;
use crate::auth::jwt::AuthUser;
use crate::state::AppState;
use crate::storage::PRESIGN_TTL_SECS;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals))
        .route("/stats/weekly", get(weekly_stats))
        .route("/meals/:id", get(get_meal))
        .route("/meals/:id/photo", get(get_meal_photo))
        .route("/analytics", get(analytics))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", post(create_meal))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

fn summary(meal: Meal, foods: Vec<FoodItemRow>) -> MealSummary {
    MealSummary {
        id: meal.id,
        meal_type: meal.meal_type,
        health_tip: meal.health_tip,
        total_calories: meal.total_calories,
        total_protein_g: meal.total_protein_g,
        total_carbs_g: meal.total_carbs_g,
        total_fats_g: meal.total_fats_g,
        created_at: meal.created_at,
        foods,
    }
}

/// POST /meals — persist an analysis the client got from /analyze.
#[instrument(skip(state, body))]
pub async fn create_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<SaveMealRequest>,
) -> Result<(StatusCode, HeaderMap, Json<CreatedMealResponse>), (StatusCode, String)> {
    if body.analysis.foods.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "foods must be non-empty".into()));
    }

    let meal = save_meal(&state, user_id, body).await.map_err(internal)?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/v1/meals/{}", meal.id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }

    Ok((
        StatusCode::CREATED,
        headers,
        Json(CreatedMealResponse {
            id: meal.id,
            created_at: meal.created_at,
        }),
    ))
}

/// GET /meals — newest first, food items included.
#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<MealSummary>>, (StatusCode, String)> {
    let meals = repo::list_by_user(&state.db, user_id, p.limit, p.offset)
        .await
        .map_err(internal)?;

    let ids: Vec<Uuid> = meals.iter().map(|m| m.id).collect();
    let mut foods_by_meal: HashMap<Uuid, Vec<FoodItemRow>> = HashMap::new();
    for food in repo::list_food_items(&state.db, &ids).await.map_err(internal)? {
        foods_by_meal.entry(food.meal_id).or_default().push(food);
    }

    let items = meals
        .into_iter()
        .map(|m| {
            let foods = foods_by_meal.remove(&m.id).unwrap_or_default();
            summary(m, foods)
        })
        .collect();
    Ok(Json(items))
}

/// GET /meals/:id — single meal with items and a presigned photo URL.
#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MealDetails>, (StatusCode, String)> {
    let meal = repo::get_by_id(&state.db, user_id, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Meal not found".to_string()))?;

    let foods = repo::list_food_items(&state.db, &[meal.id])
        .await
        .map_err(internal)?;

    let photo_url = match meal.image_key.clone() {
        Some(key) => Some(
            state
                .storage
                .presign_get(&key, PRESIGN_TTL_SECS)
                .await
                .map_err(internal)?,
        ),
        None => None,
    };

    Ok(Json(MealDetails {
        summary: summary(meal, foods),
        photo_url,
    }))
}

/// GET /meals/:id/photo — 302 to a presigned URL.
#[instrument(skip(state))]
pub async fn get_meal_photo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let meal = match repo::get_by_id(&state.db, user_id, id).await {
        Ok(Some(m)) => m,
        Ok(None) => return (StatusCode::NOT_FOUND, "Meal not found").into_response(),
        Err(e) => {
            error!(error = %e, %user_id, %id, "get_meal_photo failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    let Some(key) = meal.image_key else {
        return (StatusCode::NOT_FOUND, "Photo not found").into_response();
    };

    match state.storage.presign_get(&key, PRESIGN_TTL_SECS).await {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(e) => {
            error!(error = %e, key = %key, "presign failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "presign failed").into_response()
        }
    }
}

/// GET /stats/weekly — totals over the last 7 days.
#[instrument(skip(state))]
pub async fn weekly_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<WeeklyStats>, (StatusCode, String)> {
    let since = OffsetDateTime::now_utc() - Duration::days(7);
    let rows = repo::stat_rows_since(&state.db, user_id, since)
        .await
        .map_err(internal)?;
    Ok(Json(summarize(&rows)))
}

/// GET /analytics — 30-day charts and distributions.
#[instrument(skip(state))]
pub async fn analytics(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<AnalyticsData>, (StatusCode, String)> {
    let since = OffsetDateTime::now_utc() - Duration::days(30);
    let rows = repo::stat_rows_since(&state.db, user_id, since)
        .await
        .map_err(internal)?;
    Ok(Json(build_analytics(&rows)))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

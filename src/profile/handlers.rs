use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::dto::{CalculatorRequest, UpdateProfileRequest};
use super::repo::{self, UserProfile};
use crate::auth::jwt::AuthUser;
use crate::nutrition::{calculate_targets, BodyProfile, NutritionTargets};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/calculator", post(calculator))
}

/// GET /profile — fetch, creating an empty row on first access.
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserProfile>, (StatusCode, String)> {
    if let Some(profile) = repo::find_by_user(&state.db, user_id)
        .await
        .map_err(internal)?
    {
        return Ok(Json(profile));
    }

    let profile = repo::create_empty(&state.db, user_id)
        .await
        .map_err(internal)?;
    info!(%user_id, "created empty profile");
    Ok(Json(profile))
}

/// PUT /profile — partial upsert. When the request carries a complete
/// set of body metrics, single-valued targets are derived as the
/// midpoints of the calculator ranges and stored alongside.
#[instrument(skip(state, body))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, (StatusCode, String)> {
    if body.weight_kg.is_some_and(|w| w <= 0.0)
        || body.height_cm.is_some_and(|h| h <= 0.0)
        || body.age.is_some_and(|a| a <= 0)
    {
        warn!(%user_id, "rejected non-positive body metrics");
        return Err((
            StatusCode::BAD_REQUEST,
            "weight, height and age must be positive".into(),
        ));
    }

    let targets = match (
        body.weight_kg,
        body.height_cm,
        body.age,
        body.gender,
        body.activity_level,
        body.goal,
    ) {
        (Some(weight_kg), Some(height_cm), Some(age), Some(gender), Some(activity), Some(goal)) => {
            let t = calculate_targets(&BodyProfile {
                weight_kg,
                height_cm,
                age_years: f64::from(age),
                gender,
                activity_level: activity,
                goal,
            });
            Some((
                t.calories.midpoint(),
                t.protein_g.midpoint(),
                t.carbs_g.midpoint(),
                t.fats_g.midpoint(),
            ))
        }
        _ => None,
    };

    let profile = repo::upsert(
        &state.db,
        user_id,
        body.name.as_deref(),
        body.weight_kg,
        body.height_cm,
        body.age,
        body.gender.map(|g| g.as_str()),
        body.activity_level.map(|a| a.as_str()),
        body.goal.map(|g| g.as_str()),
        targets,
    )
    .await
    .map_err(internal)?;

    info!(%user_id, targets_derived = targets.is_some(), "profile updated");
    Ok(Json(profile))
}

/// POST /calculator — stateless target computation.
#[instrument(skip(body))]
pub async fn calculator(
    Json(body): Json<CalculatorRequest>,
) -> Result<Json<NutritionTargets>, (StatusCode, String)> {
    if body.weight_kg <= 0.0 || body.height_cm <= 0.0 || body.age <= 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "weight, height and age must be positive".into(),
        ));
    }

    let targets = calculate_targets(&BodyProfile {
        weight_kg: body.weight_kg,
        height_cm: body.height_cm,
        age_years: f64::from(body.age),
        gender: body.gender,
        activity_level: body.activity_level,
        goal: body.goal,
    });
    Ok(Json(targets))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

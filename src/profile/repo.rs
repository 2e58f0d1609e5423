use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Body metrics and derived targets. Everything except identity is
/// optional until the user fills in their profile.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub activity_level: Option<String>,
    pub goal: Option<String>,
    pub target_calories: Option<i32>,
    pub target_protein_g: Option<i32>,
    pub target_carbs_g: Option<i32>,
    pub target_fats_g: Option<i32>,
    pub updated_at: OffsetDateTime,
}

const PROFILE_COLUMNS: &str = r#"
    user_id, name, weight_kg, height_cm, age, gender, activity_level, goal,
    target_calories, target_protein_g, target_carbs_g, target_fats_g, updated_at
"#;

pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<UserProfile>> {
    let profile = sqlx::query_as::<_, UserProfile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(profile)
}

/// Inserts an empty profile row; used on first GET.
pub async fn create_empty(db: &PgPool, user_id: Uuid) -> anyhow::Result<UserProfile> {
    let profile = sqlx::query_as::<_, UserProfile>(&format!(
        "INSERT INTO user_profiles (user_id) VALUES ($1) RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(profile)
}

#[allow(clippy::too_many_arguments)]
pub async fn upsert(
    db: &PgPool,
    user_id: Uuid,
    name: Option<&str>,
    weight_kg: Option<f64>,
    height_cm: Option<f64>,
    age: Option<i32>,
    gender: Option<&str>,
    activity_level: Option<&str>,
    goal: Option<&str>,
    targets: Option<(i32, i32, i32, i32)>,
) -> anyhow::Result<UserProfile> {
    let (target_calories, target_protein_g, target_carbs_g, target_fats_g) = match targets {
        Some((c, p, cb, f)) => (Some(c), Some(p), Some(cb), Some(f)),
        None => (None, None, None, None),
    };

    let profile = sqlx::query_as::<_, UserProfile>(&format!(
        r#"
        INSERT INTO user_profiles
            (user_id, name, weight_kg, height_cm, age, gender, activity_level, goal,
             target_calories, target_protein_g, target_carbs_g, target_fats_g, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, now())
        ON CONFLICT (user_id) DO UPDATE SET
            name = COALESCE(EXCLUDED.name, user_profiles.name),
            weight_kg = COALESCE(EXCLUDED.weight_kg, user_profiles.weight_kg),
            height_cm = COALESCE(EXCLUDED.height_cm, user_profiles.height_cm),
            age = COALESCE(EXCLUDED.age, user_profiles.age),
            gender = COALESCE(EXCLUDED.gender, user_profiles.gender),
            activity_level = COALESCE(EXCLUDED.activity_level, user_profiles.activity_level),
            goal = COALESCE(EXCLUDED.goal, user_profiles.goal),
            target_calories = COALESCE(EXCLUDED.target_calories, user_profiles.target_calories),
            target_protein_g = COALESCE(EXCLUDED.target_protein_g, user_profiles.target_protein_g),
            target_carbs_g = COALESCE(EXCLUDED.target_carbs_g, user_profiles.target_carbs_g),
            target_fats_g = COALESCE(EXCLUDED.target_fats_g, user_profiles.target_fats_g),
            updated_at = now()
        RETURNING {PROFILE_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(name)
    .bind(weight_kg)
    .bind(height_cm)
    .bind(age)
    .bind(gender)
    .bind(activity_level)
    .bind(goal)
    .bind(target_calories)
    .bind(target_protein_g)
    .bind(target_carbs_g)
    .bind(target_fats_g)
    .fetch_one(db)
    .await?;
    Ok(profile)
}

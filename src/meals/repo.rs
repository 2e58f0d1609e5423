use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::analysis::dto::MealAnalysis;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub meal_type: String,
    pub health_tip: String,
    pub total_calories: i32,
    pub total_protein_g: i32,
    pub total_carbs_g: i32,
    pub total_fats_g: i32,
    pub image_key: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodItemRow {
    pub id: Uuid,
    pub meal_id: Uuid,
    pub name: String,
    pub portion_size: String,
    pub calories: i32,
    pub protein_g: i32,
    pub carbs_g: i32,
    pub fats_g: i32,
    pub confidence: String,
}

/// Slim projection used by the stats/analytics queries.
#[derive(Debug, Clone, FromRow)]
pub struct MealStatRow {
    pub total_calories: i32,
    pub total_protein_g: i32,
    pub total_carbs_g: i32,
    pub total_fats_g: i32,
    pub meal_type: String,
    pub created_at: OffsetDateTime,
}

/// Narrows a normalized `u32` into the INT columns. Values past
/// `i32::MAX` saturate instead of wrapping negative into the
/// CHECK (>= 0) constraints.
fn pg_int(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

fn is_request_id_conflict(constraint: Option<&str>) -> bool {
    constraint == Some("meals_user_request_idx")
}

/// Inserts the meal row plus all food item rows in one transaction.
/// When `client_request_id` is supplied and a meal with the same key
/// already exists for this user, the existing meal is returned instead
/// of double-writing.
pub async fn insert_meal(
    db: &PgPool,
    meal_id: Uuid,
    user_id: Uuid,
    analysis: &MealAnalysis,
    image_key: Option<&str>,
    client_request_id: Option<Uuid>,
) -> anyhow::Result<Meal> {
    if let Some(req_id) = client_request_id {
        if let Some(existing) = find_by_request_id(db, user_id, req_id).await? {
            return Ok(existing);
        }
    }

    let mut tx: Transaction<'_, Postgres> = db.begin().await.context("begin tx")?;

    let inserted = sqlx::query_as::<_, Meal>(
        r#"
        INSERT INTO meals
            (id, user_id, meal_type, health_tip,
             total_calories, total_protein_g, total_carbs_g, total_fats_g,
             image_key, client_request_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, user_id, meal_type, health_tip,
                  total_calories, total_protein_g, total_carbs_g, total_fats_g,
                  image_key, created_at
        "#,
    )
    .bind(meal_id)
    .bind(user_id)
    .bind(&analysis.meal_type)
    .bind(&analysis.health_tip)
    .bind(pg_int(analysis.total_calories))
    .bind(pg_int(analysis.total_protein))
    .bind(pg_int(analysis.total_carbs))
    .bind(pg_int(analysis.total_fats))
    .bind(image_key)
    .bind(client_request_id)
    .fetch_one(&mut *tx)
    .await;

    let meal = match inserted {
        Ok(meal) => meal,
        // A concurrent submission with the same client_request_id can
        // land between the lookup above and this insert. The unique
        // index makes the loser re-read the winner's row.
        Err(sqlx::Error::Database(db_err))
            if is_request_id_conflict(db_err.constraint()) =>
        {
            tx.rollback().await.ok();
            let req_id = client_request_id.context("request id conflict without key")?;
            return find_by_request_id(db, user_id, req_id)
                .await?
                .context("meal missing after request id conflict");
        }
        Err(e) => return Err(anyhow::Error::new(e).context("insert meal")),
    };

    for (position, food) in analysis.foods.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO food_items
                (meal_id, position, name, portion_size,
                 calories, protein_g, carbs_g, fats_g, confidence)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(meal.id)
        .bind(position as i32)
        .bind(&food.name)
        .bind(&food.portion_size)
        .bind(pg_int(food.calories))
        .bind(pg_int(food.protein))
        .bind(pg_int(food.carbs))
        .bind(pg_int(food.fats))
        .bind(food.confidence.as_str())
        .execute(&mut *tx)
        .await
        .context("insert food item")?;
    }

    tx.commit().await.context("commit tx")?;
    Ok(meal)
}

async fn find_by_request_id(
    db: &PgPool,
    user_id: Uuid,
    client_request_id: Uuid,
) -> anyhow::Result<Option<Meal>> {
    let meal = sqlx::query_as::<_, Meal>(
        r#"
        SELECT id, user_id, meal_type, health_tip,
               total_calories, total_protein_g, total_carbs_g, total_fats_g,
               image_key, created_at
        FROM meals
        WHERE user_id = $1 AND client_request_id = $2
        "#,
    )
    .bind(user_id)
    .bind(client_request_id)
    .fetch_optional(db)
    .await?;
    Ok(meal)
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Meal>> {
    let rows = sqlx::query_as::<_, Meal>(
        r#"
        SELECT id, user_id, meal_type, health_tip,
               total_calories, total_protein_g, total_carbs_g, total_fats_g,
               image_key, created_at
        FROM meals
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get_by_id(db: &PgPool, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<Option<Meal>> {
    let meal = sqlx::query_as::<_, Meal>(
        r#"
        SELECT id, user_id, meal_type, health_tip,
               total_calories, total_protein_g, total_carbs_g, total_fats_g,
               image_key, created_at
        FROM meals
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(meal_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(meal)
}

pub async fn list_food_items(db: &PgPool, meal_ids: &[Uuid]) -> anyhow::Result<Vec<FoodItemRow>> {
    let rows = sqlx::query_as::<_, FoodItemRow>(
        r#"
        SELECT id, meal_id, name, portion_size, calories, protein_g, carbs_g, fats_g, confidence
        FROM food_items
        WHERE meal_id = ANY($1)
        ORDER BY meal_id, position
        "#,
    )
    .bind(meal_ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Stat rows for everything the user logged after `since`, oldest
/// first.
pub async fn stat_rows_since(
    db: &PgPool,
    user_id: Uuid,
    since: OffsetDateTime,
) -> anyhow::Result<Vec<MealStatRow>> {
    let rows = sqlx::query_as::<_, MealStatRow>(
        r#"
        SELECT total_calories, total_protein_g, total_carbs_g, total_fats_g,
               meal_type, created_at
        FROM meals
        WHERE user_id = $1 AND created_at >= $2
        ORDER BY created_at ASC
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::normalize::normalize;
    use serde_json::json;

    #[test]
    fn int_columns_saturate_instead_of_wrapping() {
        assert_eq!(pg_int(0), 0);
        assert_eq!(pg_int(2500), 2500);
        assert_eq!(pg_int(i32::MAX as u32), i32::MAX);
        assert_eq!(pg_int(i32::MAX as u32 + 1), i32::MAX);
        assert_eq!(pg_int(u32::MAX), i32::MAX);
    }

    // The normalizer accepts the full u32 range, so a reply (or a
    // client-supplied save body) can carry totals past i32::MAX; the
    // bind must still satisfy the non-negative column constraints.
    #[test]
    fn normalized_extremes_stay_non_negative_at_the_bind() {
        let a = normalize(&json!({
            "foods": [{ "name": "x", "calories": 4294967295u32 }],
            "total_calories": 4294967295u32
        }))
        .unwrap();
        assert_eq!(a.total_calories, u32::MAX);
        assert!(pg_int(a.total_calories) >= 0);
        assert!(pg_int(a.foods[0].calories) >= 0);
    }

    #[test]
    fn only_the_request_id_index_counts_as_idempotent_conflict() {
        assert!(is_request_id_conflict(Some("meals_user_request_idx")));
        assert!(!is_request_id_conflict(Some("food_items_meal_id_fkey")));
        assert!(!is_request_id_conflict(None));
    }
}

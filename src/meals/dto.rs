use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::analysis::dto::MealAnalysis;
use crate::meals::repo::FoodItemRow;

#[derive(Debug, Deserialize)]
pub struct SaveMealRequest {
    #[serde(flatten)]
    pub analysis: MealAnalysis,
    /// Base64-encoded photo to attach, if the client kept it around.
    #[serde(default)]
    pub image_b64: Option<String>,
    /// Client-generated idempotency key. Resubmitting with the same
    /// key returns the already-saved meal instead of double-writing.
    #[serde(default)]
    pub client_request_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CreatedMealResponse {
    pub id: Uuid,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct MealSummary {
    pub id: Uuid,
    pub meal_type: String,
    pub health_tip: String,
    pub total_calories: i32,
    pub total_protein_g: i32,
    pub total_carbs_g: i32,
    pub total_fats_g: i32,
    pub created_at: OffsetDateTime,
    pub foods: Vec<FoodItemRow>,
}

#[derive(Debug, Serialize)]
pub struct MealDetails {
    #[serde(flatten)]
    pub summary: MealSummary,
    pub photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

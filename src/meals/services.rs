use anyhow::Context;
use base64::{engine::general_purpose, Engine as _};
use tracing::info;
use uuid::Uuid;

use super::dto::SaveMealRequest;
use super::repo::{self, Meal};
use crate::analysis::image::transcode_to_jpeg;
use crate::state::AppState;
use crate::storage::meal_image_key;

/// Persists a normalized analysis as a meal for `user_id`, uploading
/// the photo first when one is attached. The photo upload happens
/// before the DB transaction; an orphaned object on a failed insert is
/// harmless and cheaper than a meal row pointing at nothing.
pub async fn save_meal(
    st: &AppState,
    user_id: Uuid,
    req: SaveMealRequest,
) -> anyhow::Result<Meal> {
    let meal_id = Uuid::new_v4();

    let image_key = match req.image_b64.as_deref() {
        Some(b64) => {
            let raw = general_purpose::STANDARD
                .decode(b64)
                .context("decode image_b64")?;
            let jpeg = transcode_to_jpeg(&raw).map_err(anyhow::Error::new)?;
            let key = meal_image_key(user_id, meal_id);
            st.storage
                .put_object(&key, jpeg, "image/jpeg")
                .await
                .with_context(|| format!("put_object {}", key))?;
            Some(key)
        }
        None => None,
    };

    let meal = repo::insert_meal(
        &st.db,
        meal_id,
        user_id,
        &req.analysis,
        image_key.as_deref(),
        req.client_request_id,
    )
    .await?;

    info!(user_id = %user_id, meal_id = %meal.id, foods = req.analysis.foods.len(), "meal saved");
    Ok(meal)
}

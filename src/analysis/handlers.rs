use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, instrument, warn};

use super::dto::MealAnalysis;
use super::error::AnalysisError;
use super::services::analyze_photo;
use crate::auth::jwt::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analyze))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

/// POST /analyze (multipart, field `image`)
#[instrument(skip(state, mp))]
pub async fn analyze(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<Json<MealAnalysis>, (StatusCode, String)> {
    let mut image: Option<bytes::Bytes> = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() == Some("image") {
            let data = field
                .bytes()
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
            image = Some(data);
        }
    }
    let Some(image) = image else {
        return Err((StatusCode::BAD_REQUEST, "image field is required".into()));
    };

    match analyze_photo(&state, &image).await {
        Ok(analysis) => Ok(Json(analysis)),
        Err(e) => {
            match &e {
                AnalysisError::NoFoodDetected => {
                    warn!(%user_id, "no food detected in uploaded image")
                }
                AnalysisError::MalformedResponse { excerpt } => {
                    error!(%user_id, excerpt = %excerpt, "model reply failed to decode")
                }
                other => error!(%user_id, error = %other, "analysis pipeline failed"),
            }
            Err(e.as_response())
        }
    }
}

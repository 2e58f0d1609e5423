use axum::http::StatusCode;
use thiserror::Error;

/// Everything that can go wrong between receiving an image and
/// producing a normalized analysis. Field-level anomalies inside a
/// well-formed model reply are repaired by the normalizer and never
/// show up here.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to process image")]
    ImageRejected(#[source] image::ImageError),

    /// The model reply could not be decoded as JSON even after
    /// extraction. Carries at most the first 200 characters of the
    /// offending text, never the full reply.
    #[error("model returned invalid format: {excerpt}")]
    MalformedResponse { excerpt: String },

    #[error("no food detected in the image")]
    NoFoodDetected,

    #[error("upstream call failed: {0}")]
    Upstream(#[from] anyhow::Error),
}

impl AnalysisError {
    /// Status plus the user-facing message. Details stay in the logs.
    pub fn as_response(&self) -> (StatusCode, String) {
        match self {
            AnalysisError::ImageRejected(_) => (
                StatusCode::BAD_REQUEST,
                "Failed to process image. Please try a different photo.".into(),
            ),
            AnalysisError::MalformedResponse { .. } => (
                StatusCode::BAD_GATEWAY,
                "AI returned invalid format. Try uploading a clearer food image.".into(),
            ),
            AnalysisError::NoFoodDetected => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Could not detect any food in the image. Please try again with a clearer photo."
                    .into(),
            ),
            AnalysisError::Upstream(_) => (
                StatusCode::BAD_GATEWAY,
                "Something went wrong. Please try again.".into(),
            ),
        }
    }
}

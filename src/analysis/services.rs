use tracing::debug;

use super::dto::MealAnalysis;
use super::error::AnalysisError;
use super::extract::extract_json_candidate;
use super::image::transcode_to_jpeg;
use super::normalize::{normalize, parse_candidate};
use super::prompt::ANALYSIS_PROMPT;
use crate::state::AppState;

/// Full analysis pipeline for one uploaded photo:
/// transcode -> vision call -> extract -> parse -> normalize.
pub async fn analyze_photo(st: &AppState, raw_image: &[u8]) -> Result<MealAnalysis, AnalysisError> {
    let jpeg = transcode_to_jpeg(raw_image)?;

    let reply = st
        .vision
        .describe_image(ANALYSIS_PROMPT, jpeg)
        .await
        .map_err(AnalysisError::Upstream)?;
    debug!(reply_chars = reply.len(), "raw model reply received");

    let candidate = extract_json_candidate(&reply);
    let tree = parse_candidate(&candidate)?;
    normalize(&tree)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn tiny_png() -> Vec<u8> {
        let mut png = Vec::new();
        image::RgbImage::from_pixel(2, 2, image::Rgb([10, 200, 90]))
            .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .unwrap();
        png
    }

    #[tokio::test]
    async fn pipeline_normalizes_fenced_reply() {
        // The fake vision client wraps its reply in markdown fences.
        let state = AppState::fake();
        let analysis = analyze_photo(&state, &tiny_png()).await.unwrap();
        assert!(!analysis.foods.is_empty());
        assert!(!analysis.meal_type.is_empty());
    }

    #[tokio::test]
    async fn pipeline_rejects_undecodable_image() {
        let state = AppState::fake();
        let err = analyze_photo(&state, b"not an image").await.unwrap_err();
        assert!(matches!(err, AnalysisError::ImageRejected(_)));
    }
}

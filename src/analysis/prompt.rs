/// Heading the prompt uses before the JSON template. The extractor
/// treats any echo of this marker as the model restating instructions
/// instead of answering, and truncates from it onward.
pub const INSTRUCTION_ECHO_MARKER: &str = "JSON STRUCTURE";

/// Instruction text sent with every image. The wording is part of the
/// wire contract with the model: extraction and normalization assume
/// the model mostly (not always) obeys it, so changes here must stay
/// in sync with the keys in `dto.rs`.
pub const ANALYSIS_PROMPT: &str = r#"
You are a nutrition analysis AI. Analyze this food image and return ONLY a JSON object with no additional text, explanations, or markdown formatting.

STRICT RULES:
- Return ONLY the JSON object
- NO markdown code blocks
- NO explanations before or after JSON
- NO text like "Here is the analysis"
- Start directly with {
- End directly with }

JSON STRUCTURE (copy exactly):
{
  "foods": [
    {
      "name": "food item name",
      "portion_size": "estimated portion",
      "calories": 0,
      "protein": 0,
      "carbs": 0,
      "fats": 0,
      "confidence": "High"
    }
  ],
  "total_calories": 0,
  "total_protein": 0,
  "total_carbs": 0,
  "total_fats": 0,
  "meal_type": "lunch",
  "health_tip": "brief tip"
}

If you cannot identify food, return:
{
  "foods": [{"name": "Unknown food", "portion_size": "N/A", "calories": 0, "protein": 0, "carbs": 0, "fats": 0, "confidence": "Low"}],
  "total_calories": 0,
  "total_protein": 0,
  "total_carbs": 0,
  "total_fats": 0,
  "meal_type": "snack",
  "health_tip": "Please upload a clearer image"
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_every_required_key() {
        for key in [
            "foods",
            "name",
            "portion_size",
            "calories",
            "protein",
            "carbs",
            "fats",
            "confidence",
            "total_calories",
            "total_protein",
            "total_carbs",
            "total_fats",
            "meal_type",
            "health_tip",
        ] {
            assert!(ANALYSIS_PROMPT.contains(key), "missing key: {key}");
        }
    }

    #[test]
    fn prompt_forbids_markdown_and_prose() {
        assert!(ANALYSIS_PROMPT.contains("NO markdown code blocks"));
        assert!(ANALYSIS_PROMPT.contains("Return ONLY the JSON object"));
    }

    #[test]
    fn prompt_contains_no_food_fallback() {
        assert!(ANALYSIS_PROMPT.contains("If you cannot identify food"));
        assert!(ANALYSIS_PROMPT.contains("Unknown food"));
    }

    #[test]
    fn echo_marker_appears_in_prompt() {
        assert!(ANALYSIS_PROMPT.contains(INSTRUCTION_ECHO_MARKER));
    }
}

use serde::{Deserialize, Serialize};

/// Three-valued quality indicator the model attaches to each detected
/// food. Unknown or missing values degrade to `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Confidence::High),
            "medium" => Some(Confidence::Medium),
            "low" => Some(Confidence::Low),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
    }
}

/// One detected food. Only the normalizer constructs these; immutable
/// once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub portion_size: String,
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fats: u32,
    pub confidence: Confidence,
}

/// Fully-normalized result of one image analysis. Every numeric field
/// is a present, non-negative integer and `foods` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealAnalysis {
    pub foods: Vec<FoodItem>,
    pub total_calories: u32,
    pub total_protein: u32,
    pub total_carbs: u32,
    pub total_fats: u32,
    pub meal_type: String,
    pub health_tip: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_parses_case_insensitively() {
        assert_eq!(Confidence::parse("HIGH"), Some(Confidence::High));
        assert_eq!(Confidence::parse(" medium "), Some(Confidence::Medium));
        assert_eq!(Confidence::parse("low"), Some(Confidence::Low));
        assert_eq!(Confidence::parse("very sure"), None);
    }

    #[test]
    fn confidence_serializes_capitalized() {
        assert_eq!(serde_json::to_string(&Confidence::High).unwrap(), "\"High\"");
    }
}

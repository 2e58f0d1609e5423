use serde_json::Value;
use tracing::{debug, warn};

use super::dto::{Confidence, FoodItem, MealAnalysis};
use super::error::AnalysisError;

/// Upper bound on the diagnostic excerpt carried by
/// `MalformedResponse`. Characters, not bytes, so slicing is safe.
const EXCERPT_CHARS: usize = 200;

/// Defaulting table for every repairable field. Kept in one place so
/// the policy stays auditable.
pub mod defaults {
    pub const FOOD_NAME: &str = "Unknown food";
    pub const PORTION_SIZE: &str = "N/A";
    pub const MEAL_TYPE: &str = "meal";
    pub const HEALTH_TIP: &str = "Enjoy your meal!";
    pub const CONFIDENCE: super::Confidence = super::Confidence::Low;
}

/// Decodes the extracted candidate into a JSON tree. The only
/// irrecoverable failure point of the text pipeline.
pub fn parse_candidate(text: &str) -> Result<Value, AnalysisError> {
    serde_json::from_str(text).map_err(|e| {
        debug!(error = %e, "model reply failed JSON decode");
        AnalysisError::MalformedResponse {
            excerpt: text.chars().take(EXCERPT_CHARS).collect(),
        }
    })
}

/// A coerced field value plus whether the default had to be applied.
/// Explicit, so the leniency policy is visible at every call site
/// instead of hiding behind truthiness.
struct Coerced<T> {
    value: T,
    defaulted: bool,
}

impl<T> Coerced<T> {
    fn kept(value: T) -> Self {
        Self { value, defaulted: false }
    }
    fn fallback(value: T) -> Self {
        Self { value, defaulted: true }
    }
}

/// Non-negative integer coercion with zero fallback. Accepts JSON
/// numbers (truncated, negatives clamped to 0) and strings with a
/// leading integer ("250 kcal" -> 250). Everything else degrades to 0.
fn coerce_u32(v: Option<&Value>) -> Coerced<u32> {
    match v {
        Some(Value::Number(n)) => {
            if let Some(u) = n.as_u64() {
                Coerced::kept(u.min(u64::from(u32::MAX)) as u32)
            } else if let Some(f) = n.as_f64() {
                if f > 0.0 {
                    Coerced::kept(f.trunc().min(f64::from(u32::MAX)) as u32)
                } else {
                    Coerced::fallback(0)
                }
            } else {
                Coerced::fallback(0)
            }
        }
        Some(Value::String(s)) => match leading_integer(s) {
            Some(u) => Coerced::kept(u),
            None => Coerced::fallback(0),
        },
        _ => Coerced::fallback(0),
    }
}

fn leading_integer(s: &str) -> Option<u32> {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

fn coerce_string(v: Option<&Value>, default: &str) -> Coerced<String> {
    match v {
        Some(Value::String(s)) if !s.trim().is_empty() => Coerced::kept(s.clone()),
        _ => Coerced::fallback(default.to_string()),
    }
}

fn coerce_confidence(v: Option<&Value>) -> Coerced<Confidence> {
    match v {
        Some(Value::String(s)) => match Confidence::parse(s) {
            Some(c) => Coerced::kept(c),
            None => Coerced::fallback(defaults::CONFIDENCE),
        },
        _ => Coerced::fallback(defaults::CONFIDENCE),
    }
}

/// Walks the decoded tree and produces a fully-populated
/// `MealAnalysis`.
///
/// One hard gate: a missing, mistyped or empty food list rejects the
/// whole reply, since an analysis with no food in it is not usable.
/// Every other anomaly is repaired with the documented default.
pub fn normalize(tree: &Value) -> Result<MealAnalysis, AnalysisError> {
    let foods_raw = match tree.get("foods") {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(AnalysisError::NoFoodDetected),
    };

    let mut repaired = 0usize;
    let mut track = |defaulted: bool| {
        if defaulted {
            repaired += 1;
        }
    };

    let mut foods = Vec::with_capacity(foods_raw.len());
    for item in foods_raw {
        let name = coerce_string(item.get("name"), defaults::FOOD_NAME);
        let portion_size = coerce_string(item.get("portion_size"), defaults::PORTION_SIZE);
        let calories = coerce_u32(item.get("calories"));
        let protein = coerce_u32(item.get("protein"));
        let carbs = coerce_u32(item.get("carbs"));
        let fats = coerce_u32(item.get("fats"));
        let confidence = coerce_confidence(item.get("confidence"));
        for flag in [
            name.defaulted,
            portion_size.defaulted,
            calories.defaulted,
            protein.defaulted,
            carbs.defaulted,
            fats.defaulted,
            confidence.defaulted,
        ] {
            track(flag);
        }
        foods.push(FoodItem {
            name: name.value,
            portion_size: portion_size.value,
            calories: calories.value,
            protein: protein.value,
            carbs: carbs.value,
            fats: fats.value,
            confidence: confidence.value,
        });
    }

    let total_calories = coerce_u32(tree.get("total_calories"));
    let total_protein = coerce_u32(tree.get("total_protein"));
    let total_carbs = coerce_u32(tree.get("total_carbs"));
    let total_fats = coerce_u32(tree.get("total_fats"));
    let meal_type = coerce_string(tree.get("meal_type"), defaults::MEAL_TYPE);
    let health_tip = coerce_string(tree.get("health_tip"), defaults::HEALTH_TIP);
    for flag in [
        total_calories.defaulted,
        total_protein.defaulted,
        total_carbs.defaulted,
        total_fats.defaulted,
        meal_type.defaulted,
        health_tip.defaulted,
    ] {
        track(flag);
    }

    if repaired > 0 {
        warn!(repaired, "applied defaults to model reply fields");
    }

    // Totals are the model's own numbers, not recomputed from the
    // items. A mismatch is only logged.
    let item_calories: u32 = foods.iter().map(|f| f.calories).sum();
    if item_calories != total_calories.value {
        debug!(
            item_sum = item_calories,
            reported = total_calories.value,
            "per-item calories disagree with reported total"
        );
    }

    Ok(MealAnalysis {
        foods,
        total_calories: total_calories.value,
        total_protein: total_protein.value,
        total_carbs: total_carbs.value,
        total_fats: total_fats.value,
        meal_type: meal_type.value,
        health_tip: health_tip.value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn well_formed() -> Value {
        json!({
            "foods": [
                {
                    "name": "Grilled chicken",
                    "portion_size": "150g",
                    "calories": 248,
                    "protein": 46,
                    "carbs": 0,
                    "fats": 5,
                    "confidence": "High"
                },
                {
                    "name": "Rice",
                    "portion_size": "1 cup",
                    "calories": 206,
                    "protein": 4,
                    "carbs": 45,
                    "fats": 0,
                    "confidence": "Medium"
                }
            ],
            "total_calories": 454,
            "total_protein": 50,
            "total_carbs": 45,
            "total_fats": 5,
            "meal_type": "lunch",
            "health_tip": "Balanced plate"
        })
    }

    #[test]
    fn well_formed_reply_normalizes_verbatim() {
        let a = normalize(&well_formed()).unwrap();
        assert_eq!(a.foods.len(), 2);
        assert_eq!(a.foods[0].name, "Grilled chicken");
        assert_eq!(a.foods[0].confidence, Confidence::High);
        assert_eq!(a.total_calories, 454);
        assert_eq!(a.meal_type, "lunch");
    }

    #[test]
    fn missing_food_fields_get_defaults() {
        let tree = json!({ "foods": [{}] });
        let a = normalize(&tree).unwrap();
        let f = &a.foods[0];
        assert_eq!(f.name, defaults::FOOD_NAME);
        assert_eq!(f.portion_size, defaults::PORTION_SIZE);
        assert_eq!(f.calories, 0);
        assert_eq!(f.confidence, Confidence::Low);
        assert_eq!(a.meal_type, defaults::MEAL_TYPE);
        assert_eq!(a.health_tip, defaults::HEALTH_TIP);
        assert_eq!(a.total_calories, 0);
    }

    #[test]
    fn non_numeric_values_degrade_to_zero_without_rejection() {
        let tree = json!({
            "foods": [{
                "name": "Soup",
                "calories": "unknown",
                "protein": null,
                "carbs": true,
                "fats": -12
            }],
            "total_calories": "n/a"
        });
        let a = normalize(&tree).unwrap();
        let f = &a.foods[0];
        assert_eq!(f.calories, 0);
        assert_eq!(f.protein, 0);
        assert_eq!(f.carbs, 0);
        assert_eq!(f.fats, 0);
        assert_eq!(a.total_calories, 0);
    }

    #[test]
    fn numeric_strings_and_floats_are_coerced() {
        let tree = json!({
            "foods": [{ "name": "Toast", "calories": "250 kcal", "protein": 7.8 }]
        });
        let a = normalize(&tree).unwrap();
        assert_eq!(a.foods[0].calories, 250);
        assert_eq!(a.foods[0].protein, 7); // truncated, not rounded
    }

    #[test]
    fn empty_food_list_is_rejected() {
        let err = normalize(&json!({ "foods": [] })).unwrap_err();
        assert!(matches!(err, AnalysisError::NoFoodDetected));
    }

    #[test]
    fn missing_or_mistyped_food_list_is_rejected() {
        for tree in [json!({}), json!({ "foods": "chicken" }), json!({ "foods": 3 })] {
            let err = normalize(&tree).unwrap_err();
            assert!(matches!(err, AnalysisError::NoFoodDetected));
        }
    }

    #[test]
    fn malformed_text_yields_bounded_excerpt() {
        let garbage = "x".repeat(5000);
        let err = parse_candidate(&garbage).unwrap_err();
        match err {
            AnalysisError::MalformedResponse { excerpt } => {
                assert_eq!(excerpt.chars().count(), 200);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn excerpt_bound_is_char_safe() {
        let garbage = "é".repeat(300);
        let err = parse_candidate(&garbage).unwrap_err();
        match err {
            AnalysisError::MalformedResponse { excerpt } => {
                assert_eq!(excerpt.chars().count(), 200);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        let first = normalize(&well_formed()).unwrap();
        let reserialized = serde_json::to_value(&first).unwrap();
        let second = normalize(&reserialized).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn totals_are_trusted_even_when_inconsistent() {
        let tree = json!({
            "foods": [{ "name": "Salad", "calories": 100 }],
            "total_calories": 900
        });
        let a = normalize(&tree).unwrap();
        assert_eq!(a.total_calories, 900);
    }
}

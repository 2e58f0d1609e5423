use serde::{Deserialize, Serialize};

/// Biological sex used by the Mifflin-St Jeor equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl ActivityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "veryActive",
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Lose,
    Maintain,
    Gain,
}

impl Goal {
    pub fn as_str(self) -> &'static str {
        match self {
            Goal::Lose => "lose",
            Goal::Maintain => "maintain",
            Goal::Gain => "gain",
        }
    }
}

/// Validated body metrics. Callers (form layer / request validation)
/// are responsible for rejecting non-positive values before calling in.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BodyProfile {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age_years: f64,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroRange {
    pub min: i32,
    pub max: i32,
}

impl MacroRange {
    pub fn midpoint(self) -> i32 {
        (self.min + self.max) / 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionTargets {
    pub bmr: i32,
    pub tdee: i32,
    pub calories: MacroRange,
    pub protein_g: MacroRange,
    pub carbs_g: MacroRange,
    pub fats_g: MacroRange,
}

const PROTEIN_KCAL_PER_G: f64 = 4.0;
const CARBS_KCAL_PER_G: f64 = 4.0;
const FAT_KCAL_PER_G: f64 = 9.0;

/// Hard floor for the carbohydrate target so degenerate inputs
/// (low weight plus aggressive deficit) never produce an unreasonably
/// low range. Applied to both ends to keep min <= max.
const CARBS_FLOOR_G: i32 = 100;

fn round(v: f64) -> i32 {
    v.round() as i32
}

/// Computes BMR, TDEE and macro target ranges from body metrics.
/// Pure, stateless; recomputed on every call.
pub fn calculate_targets(p: &BodyProfile) -> NutritionTargets {
    // Mifflin-St Jeor
    let bmr = match p.gender {
        Gender::Male => 10.0 * p.weight_kg + 6.25 * p.height_cm - 5.0 * p.age_years + 5.0,
        Gender::Female => 10.0 * p.weight_kg + 6.25 * p.height_cm - 5.0 * p.age_years - 161.0,
    };
    let tdee = bmr * p.activity_level.multiplier();

    let calories = match p.goal {
        Goal::Lose => MacroRange {
            min: round(tdee - 500.0),
            max: round(tdee - 250.0),
        },
        Goal::Gain => MacroRange {
            min: round(tdee + 250.0),
            max: round(tdee + 500.0),
        },
        Goal::Maintain => MacroRange {
            min: round(tdee - 100.0),
            max: round(tdee + 100.0),
        },
    };

    // Protein 1.6-2.2 g/kg, fat 0.8-1.0 g/kg
    let protein_g = MacroRange {
        min: round(p.weight_kg * 1.6),
        max: round(p.weight_kg * 2.2),
    };
    let fats_g = MacroRange {
        min: round(p.weight_kg * 0.8),
        max: round(p.weight_kg * 1.0),
    };

    // Carbs fill the calories left after average protein and fat,
    // with a +-15% band around the estimate.
    let avg_calories = f64::from(calories.min + calories.max) / 2.0;
    let avg_protein = f64::from(protein_g.min + protein_g.max) / 2.0;
    let avg_fats = f64::from(fats_g.min + fats_g.max) / 2.0;
    let carbs_kcal = avg_calories - avg_protein * PROTEIN_KCAL_PER_G - avg_fats * FAT_KCAL_PER_G;
    let carbs_avg = f64::from(round(carbs_kcal / CARBS_KCAL_PER_G));
    let carbs_g = MacroRange {
        min: round(carbs_avg * 0.85).max(CARBS_FLOOR_G),
        max: round(carbs_avg * 1.15).max(CARBS_FLOOR_G),
    };

    NutritionTargets {
        bmr: round(bmr),
        tdee: round(tdee),
        calories,
        protein_g,
        carbs_g,
        fats_g,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_profile(goal: Goal) -> BodyProfile {
        BodyProfile {
            weight_kg: 70.0,
            height_cm: 175.0,
            age_years: 25.0,
            gender: Gender::Male,
            activity_level: ActivityLevel::Moderate,
            goal,
        }
    }

    #[test]
    fn maintain_targets_for_reference_male() {
        let t = calculate_targets(&reference_profile(Goal::Maintain));
        assert_eq!(t.bmr, 1674); // 10*70 + 6.25*175 - 5*25 + 5 = 1673.75
        assert_eq!(t.tdee, 2594); // 1673.75 * 1.55 = 2594.3125
        assert_eq!(t.calories, MacroRange { min: 2494, max: 2694 });
        assert_eq!(t.protein_g, MacroRange { min: 112, max: 154 });
        assert_eq!(t.fats_g, MacroRange { min: 56, max: 70 });
        assert!(t.carbs_g.min >= 100);
        assert!(t.carbs_g.max >= t.carbs_g.min);
    }

    #[test]
    fn lose_goal_shifts_calorie_range_down() {
        let t = calculate_targets(&reference_profile(Goal::Lose));
        assert_eq!(t.calories, MacroRange { min: 2094, max: 2344 });
    }

    #[test]
    fn gain_goal_shifts_calorie_range_up() {
        let t = calculate_targets(&reference_profile(Goal::Gain));
        assert_eq!(t.calories, MacroRange { min: 2844, max: 3094 });
    }

    #[test]
    fn carb_floor_holds_for_degenerate_input() {
        let t = calculate_targets(&BodyProfile {
            weight_kg: 45.0,
            height_cm: 150.0,
            age_years: 30.0,
            gender: Gender::Female,
            activity_level: ActivityLevel::Sedentary,
            goal: Goal::Lose,
        });
        assert!(t.carbs_g.min >= 100);
        assert!(t.carbs_g.max >= t.carbs_g.min);
    }

    #[test]
    fn activity_multipliers_are_ordered() {
        let levels = [
            ActivityLevel::Sedentary,
            ActivityLevel::Light,
            ActivityLevel::Moderate,
            ActivityLevel::Active,
            ActivityLevel::VeryActive,
        ];
        for pair in levels.windows(2) {
            assert!(pair[0].multiplier() < pair[1].multiplier());
        }
    }

    #[test]
    fn activity_level_deserializes_camel_case() {
        let v: ActivityLevel = serde_json::from_str("\"veryActive\"").unwrap();
        assert_eq!(v, ActivityLevel::VeryActive);
    }
}

use serde::Deserialize;

use crate::nutrition::{ActivityLevel, Gender, Goal};

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub activity_level: Option<ActivityLevel>,
    pub goal: Option<Goal>,
}

/// Stateless calculator input; all fields required.
#[derive(Debug, Deserialize)]
pub struct CalculatorRequest {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: i32,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
}

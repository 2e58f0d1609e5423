use serde::Serialize;
use time::macros::format_description;

use crate::meals::repo::MealStatRow;

const PROTEIN_KCAL_PER_G: i64 = 4;
const CARBS_KCAL_PER_G: i64 = 4;
const FAT_KCAL_PER_G: i64 = 9;

#[derive(Debug, Serialize)]
pub struct WeeklyStats {
    pub total_meals: usize,
    pub total_calories: i64,
    pub avg_calories: i64,
    pub total_protein_g: i64,
    pub total_carbs_g: i64,
    pub total_fats_g: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DailyPoint {
    pub date: String,
    pub calories: i64,
    pub protein_g: i64,
    pub carbs_g: i64,
    pub fats_g: i64,
    pub meals: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DistributionSlice {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MacroSlice {
    pub name: &'static str,
    pub value: i64,
    pub color: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsData {
    pub chart_data: Vec<DailyPoint>,
    pub meal_distribution: Vec<DistributionSlice>,
    pub macro_distribution: Vec<MacroSlice>,
    pub stats: WeeklyStats,
}

pub fn summarize(rows: &[MealStatRow]) -> WeeklyStats {
    let total_calories: i64 = rows.iter().map(|r| i64::from(r.total_calories)).sum();
    WeeklyStats {
        total_meals: rows.len(),
        total_calories,
        avg_calories: if rows.is_empty() {
            0
        } else {
            (total_calories as f64 / rows.len() as f64).round() as i64
        },
        total_protein_g: rows.iter().map(|r| i64::from(r.total_protein_g)).sum(),
        total_carbs_g: rows.iter().map(|r| i64::from(r.total_carbs_g)).sum(),
        total_fats_g: rows.iter().map(|r| i64::from(r.total_fats_g)).sum(),
    }
}

fn day_label(row: &MealStatRow) -> String {
    let fmt = format_description!("[month repr:short] [day]");
    row.created_at
        .format(&fmt)
        .unwrap_or_else(|_| row.created_at.date().to_string())
}

/// Groups rows (assumed oldest-first) into per-day totals.
pub fn daily_chart(rows: &[MealStatRow]) -> Vec<DailyPoint> {
    let mut points: Vec<DailyPoint> = Vec::new();
    for row in rows {
        let label = day_label(row);
        match points.last_mut().filter(|p| p.date == label) {
            Some(p) => {
                p.calories += i64::from(row.total_calories);
                p.protein_g += i64::from(row.total_protein_g);
                p.carbs_g += i64::from(row.total_carbs_g);
                p.fats_g += i64::from(row.total_fats_g);
                p.meals += 1;
            }
            None => points.push(DailyPoint {
                date: label,
                calories: i64::from(row.total_calories),
                protein_g: i64::from(row.total_protein_g),
                carbs_g: i64::from(row.total_carbs_g),
                fats_g: i64::from(row.total_fats_g),
                meals: 1,
            }),
        }
    }
    points
}

/// Meal counts per type, capitalized for display, ordered by first
/// appearance.
pub fn meal_distribution(rows: &[MealStatRow]) -> Vec<DistributionSlice> {
    let mut slices: Vec<DistributionSlice> = Vec::new();
    for row in rows {
        let name = capitalize(&row.meal_type);
        match slices.iter_mut().find(|s| s.name == name) {
            Some(s) => s.value += 1,
            None => slices.push(DistributionSlice { name, value: 1 }),
        }
    }
    slices
}

/// Energy share of each macro across all rows, in percent.
pub fn macro_distribution(rows: &[MealStatRow]) -> Vec<MacroSlice> {
    let protein: i64 = rows.iter().map(|r| i64::from(r.total_protein_g)).sum();
    let carbs: i64 = rows.iter().map(|r| i64::from(r.total_carbs_g)).sum();
    let fats: i64 = rows.iter().map(|r| i64::from(r.total_fats_g)).sum();

    let protein_kcal = protein * PROTEIN_KCAL_PER_G;
    let carbs_kcal = carbs * CARBS_KCAL_PER_G;
    let fat_kcal = fats * FAT_KCAL_PER_G;
    let total = protein_kcal + carbs_kcal + fat_kcal;
    if total == 0 {
        return Vec::new();
    }

    let pct = |kcal: i64| (kcal as f64 / total as f64 * 100.0).round() as i64;
    vec![
        MacroSlice { name: "Protein", value: pct(protein_kcal), color: "#ef4444" },
        MacroSlice { name: "Carbs", value: pct(carbs_kcal), color: "#f97316" },
        MacroSlice { name: "Fats", value: pct(fat_kcal), color: "#eab308" },
    ]
}

pub fn build_analytics(rows: &[MealStatRow]) -> AnalyticsData {
    AnalyticsData {
        chart_data: daily_chart(rows),
        meal_distribution: meal_distribution(rows),
        macro_distribution: macro_distribution(rows),
        stats: summarize(rows),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn row(cal: i32, protein: i32, carbs: i32, fats: i32, meal_type: &str, day: u8) -> MealStatRow {
        MealStatRow {
            total_calories: cal,
            total_protein_g: protein,
            total_carbs_g: carbs,
            total_fats_g: fats,
            meal_type: meal_type.into(),
            created_at: datetime!(2026-08-01 12:00 UTC) + time::Duration::days(i64::from(day)),
        }
    }

    #[test]
    fn summary_over_empty_rows_is_all_zero() {
        let s = summarize(&[]);
        assert_eq!(s.total_meals, 0);
        assert_eq!(s.avg_calories, 0);
        assert_eq!(s.total_calories, 0);
    }

    #[test]
    fn summary_totals_and_average() {
        let rows = vec![
            row(500, 30, 50, 20, "lunch", 0),
            row(700, 40, 60, 25, "dinner", 0),
        ];
        let s = summarize(&rows);
        assert_eq!(s.total_meals, 2);
        assert_eq!(s.total_calories, 1200);
        assert_eq!(s.avg_calories, 600);
        assert_eq!(s.total_protein_g, 70);
    }

    #[test]
    fn daily_chart_groups_by_calendar_day() {
        let rows = vec![
            row(300, 10, 30, 10, "breakfast", 0),
            row(500, 30, 50, 20, "lunch", 0),
            row(700, 40, 60, 25, "dinner", 1),
        ];
        let chart = daily_chart(&rows);
        assert_eq!(chart.len(), 2);
        assert_eq!(chart[0].date, "Aug 01");
        assert_eq!(chart[0].calories, 800);
        assert_eq!(chart[0].meals, 2);
        assert_eq!(chart[1].date, "Aug 02");
        assert_eq!(chart[1].calories, 700);
    }

    #[test]
    fn meal_distribution_counts_types_capitalized() {
        let rows = vec![
            row(1, 0, 0, 0, "lunch", 0),
            row(1, 0, 0, 0, "lunch", 1),
            row(1, 0, 0, 0, "snack", 1),
        ];
        let dist = meal_distribution(&rows);
        assert_eq!(
            dist,
            vec![
                DistributionSlice { name: "Lunch".into(), value: 2 },
                DistributionSlice { name: "Snack".into(), value: 1 },
            ]
        );
    }

    #[test]
    fn macro_distribution_uses_energy_share() {
        // 100g protein = 400 kcal, 100g carbs = 400 kcal, 100g fat = 900 kcal
        let rows = vec![row(0, 100, 100, 100, "lunch", 0)];
        let dist = macro_distribution(&rows);
        assert_eq!(dist[0].value, 24); // 400/1700
        assert_eq!(dist[1].value, 24);
        assert_eq!(dist[2].value, 53); // 900/1700
    }

    #[test]
    fn macro_distribution_is_empty_without_data() {
        assert!(macro_distribution(&[]).is_empty());
        assert!(macro_distribution(&[row(500, 0, 0, 0, "lunch", 0)]).is_empty());
    }
}

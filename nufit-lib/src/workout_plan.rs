//src/workout_plan.rs
use chrono::NaiveDate;

use crate::date::{date_key, shift};
use crate::models::{
    DailyWorkoutPlan, TargetArea, WeekDistribution, WorkoutPlanExercise, WorkoutPlanPreferences,
    WorkoutType,
};

/// Number of consecutive days produced by one workout plan generation.
pub const WORKOUT_PLAN_DAYS: usize = 30;

const STRENGTH_EXERCISES_PER_DAY: usize = 4;
const STRENGTH_SETS: u32 = 3;
const REST_ACTIVITIES_PER_DAY: usize = 3;
const REST_DAY_NAME: &str = "Rest Day";

const CARDIO_EXERCISES: [&str; 5] = ["Running", "Cycling", "Jump Rope", "Rowing", "Burpees"];

const REST_DAY_ACTIVITIES: [&str; 6] = [
    "Walking",
    "Light Stretching",
    "Swimming (leisure)",
    "Yoga",
    "Meditation",
    "Foam Rolling",
];

const fn strength_exercises(area: TargetArea) -> [&'static str; 4] {
    match area {
        TargetArea::Chest => ["Bench Press", "Push-ups", "Dumbbell Flyes", "Incline Press"],
        TargetArea::Back => ["Pull-ups", "Barbell Rows", "Lat Pulldowns", "Deadlifts"],
        TargetArea::Legs => ["Squats", "Lunges", "Leg Press", "Romanian Deadlifts"],
        TargetArea::Arms => [
            "Bicep Curls",
            "Tricep Dips",
            "Hammer Curls",
            "Overhead Extension",
        ],
        TargetArea::Shoulders => [
            "Overhead Press",
            "Lateral Raises",
            "Front Raises",
            "Face Pulls",
        ],
    }
}

/// Whether the day `day_offset` days into the plan is a rest day.
///
/// Only the position within the week (`day_offset % 7`) matters.
/// `days_per_week` outside 1–7 is not rejected.
pub fn is_rest_day(distribution: WeekDistribution, days_per_week: u32, day_offset: usize) -> bool {
    let week_progress = (day_offset % 7) as i64;
    let workout_days = i64::from(days_per_week);
    match distribution {
        WeekDistribution::Consecutive => week_progress >= workout_days,
        WeekDistribution::Spread => {
            let rest_days = 7 - workout_days;
            if rest_days <= 0 {
                return false;
            }
            if workout_days == 1 {
                return week_progress != 0;
            }
            let interval = 7 / rest_days;
            (1..=rest_days).any(|r| week_progress == r * interval - 1)
        }
        // workout, workout, rest
        WeekDistribution::Custom => week_progress % 3 == 2,
    }
}

/// Area trained on `day_offset`; rotates through the list once per week.
fn target_area_for(preferences: &WorkoutPlanPreferences, day_offset: usize) -> Option<TargetArea> {
    let areas = &preferences.target_areas;
    if areas.is_empty() {
        return None;
    }
    Some(areas[(day_offset / 7) % areas.len()])
}

fn training_day(
    preferences: &WorkoutPlanPreferences,
    date: NaiveDate,
    day_offset: usize,
) -> DailyWorkoutPlan {
    let key = date_key(date);
    let level = preferences.experience_level;
    let wants_strength = preferences.includes(WorkoutType::Strength);
    let wants_cardio = preferences.includes(WorkoutType::Cardio);

    let mut exercises = Vec::new();
    let mut day_name = REST_DAY_NAME.to_string();

    if wants_strength {
        if let Some(area) = target_area_for(preferences, day_offset) {
            day_name = format!("{area} Day");
            exercises = strength_exercises(area)
                .iter()
                .take(STRENGTH_EXERCISES_PER_DAY)
                .enumerate()
                .map(|(idx, name)| WorkoutPlanExercise {
                    id: format!("{key}-{idx}"),
                    name: (*name).to_string(),
                    sets: Some(STRENGTH_SETS),
                    reps: Some(level.strength_reps()),
                    weight: Some(0.0),
                    ..Default::default()
                })
                .collect();
        }
    }

    if wants_cardio && (day_offset % 2 == 0 || !wants_strength) {
        let name = CARDIO_EXERCISES[day_offset % CARDIO_EXERCISES.len()];
        exercises.push(WorkoutPlanExercise {
            id: format!("{key}-cardio"),
            name: name.to_string(),
            duration: Some(level.cardio_minutes()),
            ..Default::default()
        });
        day_name = if wants_strength {
            format!("{day_name} + Cardio")
        } else {
            "Cardio Day".to_string()
        };
    }

    DailyWorkoutPlan {
        date,
        day_name,
        is_rest_day: false,
        exercises,
        rest_day_activities: None,
    }
}

fn rest_day(preferences: &WorkoutPlanPreferences, date: NaiveDate) -> DailyWorkoutPlan {
    let key = date_key(date);
    let minutes = preferences.experience_level.rest_activity_minutes();
    let activities = REST_DAY_ACTIVITIES
        .iter()
        .take(REST_ACTIVITIES_PER_DAY)
        .enumerate()
        .map(|(idx, name)| WorkoutPlanExercise {
            id: format!("{key}-rest-{idx}"),
            name: (*name).to_string(),
            duration: Some(minutes),
            ..Default::default()
        })
        .collect();

    DailyWorkoutPlan {
        date,
        day_name: REST_DAY_NAME.to_string(),
        is_rest_day: true,
        exercises: Vec::new(),
        rest_day_activities: Some(activities),
    }
}

/// Builds a month of daily plans starting at `start_date`.
///
/// The result depends only on the inputs. Every exercise starts uncompleted
/// with no actual-performance data.
pub fn generate_workout_plans(
    preferences: &WorkoutPlanPreferences,
    start_date: NaiveDate,
) -> Vec<DailyWorkoutPlan> {
    (0..WORKOUT_PLAN_DAYS)
        .map_while(|offset| {
            let date = shift(start_date, offset as i64)?;
            let plan = if is_rest_day(
                preferences.week_distribution,
                preferences.days_per_week,
                offset,
            ) {
                rest_day(preferences, date)
            } else {
                training_day(preferences, date, offset)
            };
            Some(plan)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExperienceLevel;
    use rstest::rstest;

    fn prefs(types: &[WorkoutType], areas: &[TargetArea]) -> WorkoutPlanPreferences {
        WorkoutPlanPreferences {
            days_per_week: 4,
            workout_types: types.to_vec(),
            target_areas: areas.to_vec(),
            experience_level: ExperienceLevel::Beginner,
            week_distribution: WeekDistribution::Consecutive,
        }
    }

    fn week_pattern(distribution: WeekDistribution, days_per_week: u32) -> [bool; 7] {
        let mut pattern = [false; 7];
        for (offset, slot) in pattern.iter_mut().enumerate() {
            *slot = is_rest_day(distribution, days_per_week, offset);
        }
        pattern
    }

    const W: bool = false;
    const R: bool = true;

    #[rstest]
    #[case(WeekDistribution::Consecutive, 7, [W, W, W, W, W, W, W])]
    #[case(WeekDistribution::Consecutive, 4, [W, W, W, W, R, R, R])]
    #[case(WeekDistribution::Consecutive, 0, [R, R, R, R, R, R, R])]
    #[case(WeekDistribution::Spread, 7, [W, W, W, W, W, W, W])]
    #[case(WeekDistribution::Spread, 5, [W, W, R, W, W, R, W])]
    #[case(WeekDistribution::Spread, 4, [W, R, W, R, W, R, W])]
    #[case(WeekDistribution::Spread, 3, [R, R, R, R, W, W, W])]
    #[case(WeekDistribution::Spread, 1, [W, R, R, R, R, R, R])]
    #[case(WeekDistribution::Spread, 0, [R, R, R, R, R, R, R])]
    #[case(WeekDistribution::Spread, 9, [W, W, W, W, W, W, W])]
    #[case(WeekDistribution::Custom, 5, [W, W, R, W, W, R, W])]
    #[case(WeekDistribution::Custom, 1, [W, W, R, W, W, R, W])]
    fn rest_day_patterns(
        #[case] distribution: WeekDistribution,
        #[case] days_per_week: u32,
        #[case] expected: [bool; 7],
    ) {
        assert_eq!(week_pattern(distribution, days_per_week), expected);
    }

    #[test]
    fn week_position_resets_every_seven_days() {
        for offset in 0..7 {
            assert_eq!(
                is_rest_day(WeekDistribution::Custom, 3, offset),
                is_rest_day(WeekDistribution::Custom, 3, offset + 7)
            );
        }
    }

    #[test]
    fn target_area_rotates_weekly() {
        let p = prefs(&[WorkoutType::Strength], &[TargetArea::Chest, TargetArea::Legs]);
        assert_eq!(target_area_for(&p, 0), Some(TargetArea::Chest));
        assert_eq!(target_area_for(&p, 6), Some(TargetArea::Chest));
        assert_eq!(target_area_for(&p, 7), Some(TargetArea::Legs));
        assert_eq!(target_area_for(&p, 14), Some(TargetArea::Chest));
        assert_eq!(target_area_for(&prefs(&[], &[]), 3), None);
    }

    #[test]
    fn strength_without_areas_keeps_default_label() {
        let p = prefs(&[WorkoutType::Strength], &[]);
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let plan = training_day(&p, date, 0);
        assert!(plan.exercises.is_empty());
        assert_eq!(plan.day_name, "Rest Day");
        assert!(!plan.is_rest_day);
    }
}

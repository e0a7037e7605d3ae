//src/reducers.rs
//! State transitions over [`AppState`].
//!
//! Each function reads the previous state and returns a complete replacement;
//! the input is never modified. Functions returning `Option` yield `None` when
//! the targeted plan or item does not exist, meaning "keep the previous state".
use chrono::NaiveDate;

use crate::meal_plan::generate_meal_plans;
use crate::models::{
    AppState, DailyData, DailyMealPlan, ExerciseUpdate, FoodEntry, MealPlanItem,
    MealPlanPreferences, UserProfile, WaterLogEntry, WorkoutEntry, WorkoutPlanExercise,
    WorkoutPlanPreferences,
};
use crate::workout_plan::generate_workout_plans;

/// Copies `prev`, materializes `date` if needed and applies `edit` to that day.
fn with_day(prev: &AppState, date: NaiveDate, edit: impl FnOnce(&mut DailyData)) -> AppState {
    let mut next = prev.clone();
    let day = next
        .daily_data
        .entry(date)
        .or_insert_with(|| DailyData::empty(date, prev.protein_goal, prev.water_goal));
    edit(day);
    next
}

/// Appends the workout to the day named by its own `date`.
pub fn add_workout(prev: &AppState, workout: WorkoutEntry) -> AppState {
    with_day(prev, workout.date, |day| day.push_workout(workout))
}

/// Appends the food to `today`, whatever date the entry carries.
pub fn add_food(prev: &AppState, today: NaiveDate, food: FoodEntry) -> AppState {
    with_day(prev, today, |day| day.push_food(food))
}

pub fn add_water_log(prev: &AppState, today: NaiveDate, log: WaterLogEntry) -> AppState {
    with_day(prev, today, |day| day.push_water_log(log))
}

/// Replaces the global goal. Goal snapshots of existing days are kept.
pub fn set_protein_goal(prev: &AppState, goal: f64) -> AppState {
    AppState {
        protein_goal: goal,
        ..prev.clone()
    }
}

pub fn set_water_goal(prev: &AppState, goal: f64) -> AppState {
    AppState {
        water_goal: goal,
        ..prev.clone()
    }
}

pub fn set_start_date(prev: &AppState, date: NaiveDate) -> AppState {
    AppState {
        start_date: Some(date),
        ..prev.clone()
    }
}

/// State side effects of saving a profile: the water goal follows body weight
/// and the plan start date is pinned to `today` the first time.
pub fn apply_profile(prev: &AppState, profile: &UserProfile, today: NaiveDate) -> AppState {
    AppState {
        water_goal: profile.recommended_water_goal().unwrap_or(prev.water_goal),
        start_date: prev.start_date.or(Some(today)),
        ..prev.clone()
    }
}

pub fn set_meal_plan_preferences(prev: &AppState, preferences: MealPlanPreferences) -> AppState {
    AppState {
        meal_plan_preferences: Some(preferences),
        ..prev.clone()
    }
}

pub fn set_workout_plan_preferences(
    prev: &AppState,
    preferences: WorkoutPlanPreferences,
) -> AppState {
    AppState {
        workout_plan_preferences: Some(preferences),
        ..prev.clone()
    }
}

/// Writes a fresh week of meal plans from `start_date`, replacing existing
/// plans (and their completion state) on those days.
pub fn generate_meal_plan(
    prev: &AppState,
    preferences: MealPlanPreferences,
    start_date: NaiveDate,
) -> AppState {
    let mut next = prev.clone();
    for plan in generate_meal_plans(start_date) {
        let date = plan.date;
        next.daily_data
            .entry(date)
            .or_insert_with(|| DailyData::empty(date, prev.protein_goal, prev.water_goal))
            .meal_plan = Some(plan);
    }
    next.meal_plan_preferences = Some(preferences);
    next
}

/// Sets the meal list for `date`, creating the plan when the day has none.
pub fn update_daily_meal_plan(
    prev: &AppState,
    date: NaiveDate,
    meals: Vec<MealPlanItem>,
) -> AppState {
    with_day(prev, date, |day| {
        day.meal_plan = Some(DailyMealPlan { date, meals });
    })
}

pub fn toggle_meal_plan_item(
    prev: &AppState,
    date: NaiveDate,
    meal_id: &str,
) -> Option<AppState> {
    let plan = prev.daily_data.get(&date)?.meal_plan.as_ref()?;
    if !plan.meals.iter().any(|m| m.id == meal_id) {
        return None;
    }
    Some(with_day(prev, date, |day| {
        if let Some(plan) = day.meal_plan.as_mut() {
            for meal in plan.meals.iter_mut().filter(|m| m.id == meal_id) {
                meal.completed = !meal.completed;
            }
        }
    }))
}

/// Writes 30 days of workout plans from `start_date`, replacing existing plans
/// (including completion and actual-performance data) on those days.
pub fn generate_workout_plan(
    prev: &AppState,
    preferences: WorkoutPlanPreferences,
    start_date: NaiveDate,
) -> AppState {
    let mut next = prev.clone();
    for plan in generate_workout_plans(&preferences, start_date) {
        let date = plan.date;
        next.daily_data
            .entry(date)
            .or_insert_with(|| DailyData::empty(date, prev.protein_goal, prev.water_goal))
            .workout_plan = Some(plan);
    }
    next.workout_plan_preferences = Some(preferences);
    next
}

pub fn update_daily_workout_plan(
    prev: &AppState,
    date: NaiveDate,
    exercises: Vec<WorkoutPlanExercise>,
) -> Option<AppState> {
    prev.daily_data.get(&date)?.workout_plan.as_ref()?;
    Some(with_day(prev, date, |day| {
        if let Some(plan) = day.workout_plan.as_mut() {
            plan.exercises = exercises;
        }
    }))
}

/// Merges `update` into the matching entry of the day's `exercises` list.
pub fn update_workout_plan_exercise(
    prev: &AppState,
    date: NaiveDate,
    exercise_id: &str,
    update: &ExerciseUpdate,
) -> Option<AppState> {
    let plan = prev.daily_data.get(&date)?.workout_plan.as_ref()?;
    if !plan.exercises.iter().any(|e| e.id == exercise_id) {
        return None;
    }
    Some(with_day(prev, date, |day| {
        if let Some(plan) = day.workout_plan.as_mut() {
            for exercise in plan.exercises.iter_mut().filter(|e| e.id == exercise_id) {
                update.apply_to(exercise);
            }
        }
    }))
}

/// Flips `completed` on every item with `exercise_id`, in both the exercise
/// list and the rest-day activities.
pub fn toggle_workout_plan_exercise(
    prev: &AppState,
    date: NaiveDate,
    exercise_id: &str,
) -> Option<AppState> {
    let plan = prev.daily_data.get(&date)?.workout_plan.as_ref()?;
    let in_exercises = plan.exercises.iter().any(|e| e.id == exercise_id);
    let in_activities = plan
        .rest_day_activities
        .as_ref()
        .is_some_and(|a| a.iter().any(|e| e.id == exercise_id));
    if !(in_exercises || in_activities) {
        return None;
    }
    Some(with_day(prev, date, |day| {
        if let Some(plan) = day.workout_plan.as_mut() {
            let activities = plan.rest_day_activities.iter_mut().flatten();
            for item in plan
                .exercises
                .iter_mut()
                .chain(activities)
                .filter(|e| e.id == exercise_id)
            {
                item.completed = !item.completed;
            }
        }
    }))
}

/// Drops logged workouts and workout plans from every day, and the workout
/// plan preferences. Food, water and meal plans are kept.
pub fn clear_all_workout_data(prev: &AppState) -> AppState {
    let mut next = prev.clone();
    for day in next.daily_data.values_mut() {
        day.clear_workouts();
    }
    next.workout_plan_preferences = None;
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExperienceLevel, TargetArea, WeekDistribution, WorkoutType};
    use chrono::Utc;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn generated_plans_land_on_their_own_days() {
        let start = ymd(2025, 1, 30);
        let logged = add_workout(
            &AppState::default(),
            WorkoutEntry {
                id: "w1".to_string(),
                date: ymd(2025, 2, 1),
                name: "Swim".to_string(),
                active_calories: 200.0,
                total_calories: 260.0,
                timestamp: Utc::now(),
            },
        );

        let with_meals = generate_meal_plan(&logged, MealPlanPreferences::default(), start);
        assert!(logged.daily_data[&ymd(2025, 2, 1)].meal_plan.is_none());
        for (date, day) in &with_meals.daily_data {
            assert_eq!(day.meal_plan.as_ref().map(|p| p.date), Some(*date));
        }
        assert_eq!(with_meals.daily_data[&ymd(2025, 2, 1)].workouts.len(), 1);

        let prefs = WorkoutPlanPreferences {
            days_per_week: 5,
            workout_types: vec![WorkoutType::Strength],
            target_areas: vec![TargetArea::Legs],
            experience_level: ExperienceLevel::Beginner,
            week_distribution: WeekDistribution::Consecutive,
        };
        let with_workouts = generate_workout_plan(&with_meals, prefs, start);
        assert_eq!(with_workouts.daily_data.len(), 30);
        for (date, day) in &with_workouts.daily_data {
            assert_eq!(day.workout_plan.as_ref().map(|p| p.date), Some(*date));
        }
        let feb_first = &with_workouts.daily_data[&ymd(2025, 2, 1)];
        assert!(feb_first.meal_plan.is_some());
        assert_eq!(feb_first.total_calories, 260.0);
    }
}

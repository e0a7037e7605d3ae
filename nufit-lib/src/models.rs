//src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumIter, EnumString};

pub const DEFAULT_PROTEIN_GOAL: f64 = 150.0;
pub const DEFAULT_WATER_GOAL: f64 = 2500.0;
/// Millilitres of water per kilogram of body weight.
pub const HYDRATION_ML_PER_KG: f64 = 33.0;

const fn default_water_goal() -> f64 {
    DEFAULT_WATER_GOAL
}

const fn default_protein_goal() -> f64 {
    DEFAULT_PROTEIN_GOAL
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutEntry {
    pub id: String,
    pub date: NaiveDate,
    pub name: String,
    pub active_calories: f64,
    pub total_calories: f64,
    /// Epoch milliseconds on the wire.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    pub id: String,
    pub date: NaiveDate,
    pub name: String,
    pub quantity: f64,
    pub protein_per_serving: f64,
    /// `quantity * protein_per_serving`, fixed at creation.
    pub total_protein: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaterLogEntry {
    pub id: String,
    /// Millilitres.
    pub amount: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    /// Lowercase slot name used when building meal item ids.
    pub const fn slot(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanItem {
    pub id: String,
    pub meal_type: MealType,
    pub description: String,
    pub completed: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DailyMealPlan {
    pub date: NaiveDate,
    pub meals: Vec<MealPlanItem>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlanExercise {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Minutes, for cardio and rest-day activities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_sets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_duration: Option<u32>,
}

/// Fields to merge into an existing plan exercise. `None` leaves the field untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExerciseUpdate {
    pub name: Option<String>,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub duration: Option<u32>,
    pub completed: Option<bool>,
    pub actual_sets: Option<u32>,
    pub actual_reps: Option<u32>,
    pub actual_weight: Option<f64>,
    pub actual_duration: Option<u32>,
}

impl ExerciseUpdate {
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.sets.is_none()
            && self.reps.is_none()
            && self.weight.is_none()
            && self.duration.is_none()
            && self.completed.is_none()
            && self.actual_sets.is_none()
            && self.actual_reps.is_none()
            && self.actual_weight.is_none()
            && self.actual_duration.is_none()
    }

    pub(crate) fn apply_to(&self, exercise: &mut WorkoutPlanExercise) {
        if let Some(name) = &self.name {
            exercise.name.clone_from(name);
        }
        exercise.sets = self.sets.or(exercise.sets);
        exercise.reps = self.reps.or(exercise.reps);
        exercise.weight = self.weight.or(exercise.weight);
        exercise.duration = self.duration.or(exercise.duration);
        exercise.completed = self.completed.unwrap_or(exercise.completed);
        exercise.actual_sets = self.actual_sets.or(exercise.actual_sets);
        exercise.actual_reps = self.actual_reps.or(exercise.actual_reps);
        exercise.actual_weight = self.actual_weight.or(exercise.actual_weight);
        exercise.actual_duration = self.actual_duration.or(exercise.actual_duration);
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyWorkoutPlan {
    pub date: NaiveDate,
    pub day_name: String,
    pub is_rest_day: bool,
    /// Empty on rest days.
    pub exercises: Vec<WorkoutPlanExercise>,
    /// Present only on rest days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_day_activities: Option<Vec<WorkoutPlanExercise>>,
}

/// Everything recorded for one calendar day.
///
/// The totals are derived from the entry lists and are only ever changed
/// together with them, so they always equal the sum over their list.
/// `protein_goal`/`water_goal` are snapshots of the global goals taken when
/// the day was first touched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyData {
    pub(crate) date: NaiveDate,
    #[serde(default)]
    pub(crate) workouts: Vec<WorkoutEntry>,
    #[serde(default)]
    pub(crate) foods: Vec<FoodEntry>,
    #[serde(default)]
    pub(crate) water_logs: Vec<WaterLogEntry>,
    #[serde(default)]
    pub(crate) total_active_calories: f64,
    #[serde(default)]
    pub(crate) total_calories: f64,
    #[serde(default)]
    pub(crate) total_protein: f64,
    #[serde(default)]
    pub(crate) total_water: f64,
    #[serde(default = "default_protein_goal")]
    pub(crate) protein_goal: f64,
    #[serde(default = "default_water_goal")]
    pub(crate) water_goal: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) meal_plan: Option<DailyMealPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) workout_plan: Option<DailyWorkoutPlan>,
}

impl DailyData {
    /// An untouched day carrying the given goal snapshot.
    pub const fn empty(date: NaiveDate, protein_goal: f64, water_goal: f64) -> Self {
        Self {
            date,
            workouts: Vec::new(),
            foods: Vec::new(),
            water_logs: Vec::new(),
            total_active_calories: 0.0,
            total_calories: 0.0,
            total_protein: 0.0,
            total_water: 0.0,
            protein_goal,
            water_goal,
            meal_plan: None,
            workout_plan: None,
        }
    }

    pub const fn date(&self) -> NaiveDate {
        self.date
    }
    pub fn workouts(&self) -> &[WorkoutEntry] {
        &self.workouts
    }
    pub fn foods(&self) -> &[FoodEntry] {
        &self.foods
    }
    pub fn water_logs(&self) -> &[WaterLogEntry] {
        &self.water_logs
    }
    pub const fn total_active_calories(&self) -> f64 {
        self.total_active_calories
    }
    pub const fn total_calories(&self) -> f64 {
        self.total_calories
    }
    pub const fn total_protein(&self) -> f64 {
        self.total_protein
    }
    pub const fn total_water(&self) -> f64 {
        self.total_water
    }
    pub const fn protein_goal(&self) -> f64 {
        self.protein_goal
    }
    pub const fn water_goal(&self) -> f64 {
        self.water_goal
    }
    pub const fn meal_plan(&self) -> Option<&DailyMealPlan> {
        self.meal_plan.as_ref()
    }
    pub const fn workout_plan(&self) -> Option<&DailyWorkoutPlan> {
        self.workout_plan.as_ref()
    }

    pub(crate) fn push_workout(&mut self, workout: WorkoutEntry) {
        self.workouts.push(workout);
        self.recompute_workout_totals();
    }

    pub(crate) fn push_food(&mut self, food: FoodEntry) {
        self.foods.push(food);
        self.total_protein = self.foods.iter().map(|f| f.total_protein).sum();
    }

    pub(crate) fn push_water_log(&mut self, log: WaterLogEntry) {
        self.water_logs.push(log);
        self.total_water = self.water_logs.iter().map(|w| w.amount).sum();
    }

    pub(crate) fn clear_workouts(&mut self) {
        self.workouts.clear();
        self.recompute_workout_totals();
        self.workout_plan = None;
    }

    fn recompute_workout_totals(&mut self) {
        self.total_active_calories = self.workouts.iter().map(|w| w.active_calories).sum();
        self.total_calories = self.workouts.iter().map(|w| w.total_calories).sum();
    }

    pub(crate) fn recompute_totals(&mut self) {
        self.recompute_workout_totals();
        self.total_protein = self.foods.iter().map(|f| f.total_protein).sum();
        self.total_water = self.water_logs.iter().map(|w| w.amount).sum();
    }

    /// Share of the protein goal consumed, in percent. 0 when the goal is 0.
    pub fn protein_progress_percent(&self) -> f64 {
        percent_of(self.total_protein, self.protein_goal)
    }

    pub fn water_progress_percent(&self) -> f64 {
        percent_of(self.total_water, self.water_goal)
    }

    pub fn remaining_water(&self) -> f64 {
        (self.water_goal - self.total_water).max(0.0)
    }

    pub fn protein_goal_reached(&self) -> bool {
        self.protein_progress_percent() >= 100.0
    }

    pub fn has_logged_data(&self) -> bool {
        !(self.workouts.is_empty() && self.foods.is_empty() && self.water_logs.is_empty())
    }
}

fn percent_of(value: f64, goal: f64) -> f64 {
    if goal == 0.0 {
        0.0
    } else {
        value / goal * 100.0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    /// Kilograms.
    pub current_weight: f64,
    /// Centimetres.
    pub height: f64,
    /// Kilograms.
    pub goal_weight: f64,
    #[serde(default)]
    pub allergies: Vec<String>,
}

impl UserProfile {
    pub fn bmi(&self) -> Option<f64> {
        if self.height <= 0.0 {
            return None;
        }
        let height_m = self.height / 100.0;
        Some(self.current_weight / (height_m * height_m))
    }

    /// Positive when weight remains to be lost, negative when it is to be gained.
    pub fn weight_to_goal(&self) -> f64 {
        self.current_weight - self.goal_weight
    }

    /// Daily water goal in ml for this body weight, `None` if no weight is recorded.
    #[allow(clippy::float_cmp)]
    pub fn recommended_water_goal(&self) -> Option<f64> {
        if self.current_weight == 0.0 {
            None
        } else {
            Some((self.current_weight * HYDRATION_ML_PER_KG).round())
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MealPlanPreferences {
    pub allergies: Vec<String>,
    pub disliked_foods: Vec<String>,
    pub dietary_restrictions: Vec<String>,
}

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WorkoutType {
    Strength,
    Cardio,
    Flexibility,
}

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum TargetArea {
    Chest,
    Back,
    Legs,
    Arms,
    Shoulders,
}

#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumIter,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExperienceLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    pub const fn strength_reps(self) -> u32 {
        match self {
            Self::Beginner => 10,
            Self::Intermediate => 12,
            Self::Advanced => 15,
        }
    }

    pub const fn cardio_minutes(self) -> u32 {
        match self {
            Self::Beginner => 20,
            Self::Intermediate => 30,
            Self::Advanced => 40,
        }
    }

    pub const fn rest_activity_minutes(self) -> u32 {
        match self {
            Self::Beginner => 15,
            Self::Intermediate => 20,
            Self::Advanced => 30,
        }
    }
}

#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumIter,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WeekDistribution {
    #[default]
    Consecutive,
    Spread,
    Custom,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlanPreferences {
    /// Nominally 1–7; other values are accepted and give degenerate rest patterns.
    pub days_per_week: u32,
    pub workout_types: Vec<WorkoutType>,
    pub target_areas: Vec<TargetArea>,
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub week_distribution: WeekDistribution,
}

impl WorkoutPlanPreferences {
    pub fn includes(&self, workout_type: WorkoutType) -> bool {
        self.workout_types.contains(&workout_type)
    }
}

/// Root of the persisted application state.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub(crate) daily_data: BTreeMap<NaiveDate, DailyData>,
    #[serde(default = "default_protein_goal")]
    pub(crate) protein_goal: f64,
    #[serde(default = "default_water_goal")]
    pub(crate) water_goal: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) meal_plan_preferences: Option<MealPlanPreferences>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) workout_plan_preferences: Option<WorkoutPlanPreferences>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) start_date: Option<NaiveDate>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            daily_data: BTreeMap::new(),
            protein_goal: DEFAULT_PROTEIN_GOAL,
            water_goal: DEFAULT_WATER_GOAL,
            meal_plan_preferences: None,
            workout_plan_preferences: None,
            start_date: None,
        }
    }
}

impl AppState {
    pub const fn daily_data(&self) -> &BTreeMap<NaiveDate, DailyData> {
        &self.daily_data
    }
    pub const fn protein_goal(&self) -> f64 {
        self.protein_goal
    }
    pub const fn water_goal(&self) -> f64 {
        self.water_goal
    }
    pub const fn meal_plan_preferences(&self) -> Option<&MealPlanPreferences> {
        self.meal_plan_preferences.as_ref()
    }
    pub const fn workout_plan_preferences(&self) -> Option<&WorkoutPlanPreferences> {
        self.workout_plan_preferences.as_ref()
    }
    pub const fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    /// The stored day, or an empty one snapshotting the current goals.
    /// The synthesized day is not inserted.
    pub fn day(&self, date: NaiveDate) -> DailyData {
        self.daily_data
            .get(&date)
            .cloned()
            .unwrap_or_else(|| DailyData::empty(date, self.protein_goal, self.water_goal))
    }

    /// Re-derives every day's totals from its lists. Applied to loaded blobs.
    pub(crate) fn normalize_totals(&mut self) {
        for day in self.daily_data.values_mut() {
            day.recompute_totals();
        }
    }

    pub fn has_data_for_date(&self, date: NaiveDate) -> bool {
        self.daily_data
            .get(&date)
            .is_some_and(DailyData::has_logged_data)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn overall_stats(&self) -> OverallStats {
        let mut stats = OverallStats::default();
        for day in self.daily_data.values() {
            stats.total_workouts += day.workouts.len();
            stats.total_active_calories += day.total_active_calories;
            stats.total_calories += day.total_calories;
            stats.total_foods += day.foods.len();
            stats.total_protein += day.total_protein;
            stats.total_water += day.total_water;
            stats.total_days += 1;
        }
        if stats.total_days > 0 {
            let days = stats.total_days as f64;
            stats.avg_active_calories = stats.total_active_calories / days;
            stats.avg_protein = stats.total_protein / days;
            stats.avg_water = stats.total_water / days;
        }
        stats
    }
}

/// Totals and per-day averages over every materialized day.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverallStats {
    pub total_workouts: usize,
    pub total_active_calories: f64,
    pub total_calories: f64,
    pub total_foods: usize,
    pub total_protein: f64,
    pub total_water: f64,
    pub total_days: usize,
    pub avg_active_calories: f64,
    pub avg_protein: f64,
    pub avg_water: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingState {
    NoProfile,
    Active,
}

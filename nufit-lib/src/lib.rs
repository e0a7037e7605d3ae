// src/lib.rs
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

// --- Declare modules ---
mod config;
pub mod date;
pub mod db;
pub mod meal_plan;
mod models;
pub mod persistence;
pub mod reducers;
pub mod workout_plan;

// --- Expose public types ---
pub use config::{
    get_config_path as get_config_path_util, load as load_config_util, parse_color,
    save as save_config_util, Config, ConfigError, HydrationConfig, PersistenceConfig,
    StandardColor, Theme,
};
pub use date::{add_days, date_key, parse_date_key, today, today_key, DateError};
pub use db::{get_db_path as get_db_path_util, DbError, SqliteBlobStore};
pub use models::{
    AppState, DailyData, DailyMealPlan, DailyWorkoutPlan, ExerciseUpdate, ExperienceLevel,
    FoodEntry, MealPlanItem, MealPlanPreferences, MealType, OnboardingState, OverallStats,
    TargetArea, UserProfile, WaterLogEntry, WeekDistribution, WorkoutEntry, WorkoutPlanExercise,
    WorkoutPlanPreferences, WorkoutType, DEFAULT_PROTEIN_GOAL, DEFAULT_WATER_GOAL,
    HYDRATION_ML_PER_KG,
};
pub use persistence::{
    BlobStore, MemoryBlobStore, PersistenceError, RetryPolicy, SaveStatus, PROFILE_KEY, STATE_KEY,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AddWorkoutParams {
    /// Defaults to today.
    pub date: Option<NaiveDate>,
    pub name: String,
    pub active_calories: f64,
    pub total_calories: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddFoodParams {
    /// Recorded on the entry; the entry itself is always filed under today.
    pub date: NaiveDate,
    pub name: String,
    pub quantity: f64,
    pub protein_per_serving: f64,
}

fn new_entry_id() -> String {
    Uuid::new_v4().to_string()
}

/// Entry timestamps are stored with millisecond precision.
fn entry_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Owner of the application state.
///
/// Every change goes through one of the named operations below, each of which
/// swaps in a complete new [`AppState`] and queues it for saving on the
/// background writer. Readers hold `Arc` snapshots that never change under them.
pub struct AppService {
    pub config: Config,
    pub config_path: PathBuf,
    pub db_path: PathBuf,
    state: Arc<AppState>,
    profile: Option<UserProfile>,
    saver: persistence::SaveWorker,
}

impl AppService {
    /// Initializes the application service from the on-disk config and database.
    /// # Errors
    /// Returns `anyhow::Error` if config/db path determination, loading, or the
    /// save worker startup fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;

        let db_path = db::get_db_path().context("Failed to determine database path")?;
        let store = SqliteBlobStore::open(&db_path)
            .with_context(|| format!("Failed to open database at {db_path:?}"))?;

        let service =
            Self::with_store(config, store).context("Failed to start application service")?;
        Ok(Self {
            config_path,
            db_path,
            ..service
        })
    }

    /// Builds a service over any blob store, loading whatever it already holds.
    /// Missing or malformed blobs fall back to the defaults.
    /// # Errors
    /// Returns `PersistenceError::Spawn` if the save worker cannot start.
    pub fn with_store<S>(config: Config, store: S) -> Result<Self, PersistenceError>
    where
        S: BlobStore + Send + 'static,
    {
        let mut state: AppState = persistence::load_blob(&store, STATE_KEY).unwrap_or_default();
        state.normalize_totals();
        let profile: Option<UserProfile> = persistence::load_blob(&store, PROFILE_KEY);
        debug!(
            days = state.daily_data().len(),
            has_profile = profile.is_some(),
            "state loaded"
        );

        let saver = persistence::SaveWorker::spawn(store, config.persistence.retry_policy())?;
        Ok(Self {
            config,
            config_path: PathBuf::new(),
            db_path: PathBuf::new(),
            state: Arc::new(state),
            profile,
            saver,
        })
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save(&self.config_path, &self.config)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    pub const fn user_profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub const fn onboarding_state(&self) -> OnboardingState {
        if self.profile.is_some() {
            OnboardingState::Active
        } else {
            OnboardingState::NoProfile
        }
    }

    fn commit(&mut self, next: AppState, operation: &'static str) {
        self.state = Arc::new(next);
        debug!(operation, "state committed");
        self.saver.submit_state(Arc::clone(&self.state));
    }

    fn commit_if_changed(&mut self, next: Option<AppState>, operation: &'static str) -> bool {
        match next {
            Some(next) => {
                self.commit(next, operation);
                true
            }
            None => {
                debug!(operation, "nothing to update");
                false
            }
        }
    }

    // --- Logging ---

    /// Logs a workout. Values are stored as given; validating them is up to the caller.
    pub fn add_workout(&mut self, params: AddWorkoutParams) -> WorkoutEntry {
        let workout = WorkoutEntry {
            id: new_entry_id(),
            date: params.date.unwrap_or_else(today),
            name: params.name,
            active_calories: params.active_calories,
            total_calories: params.total_calories,
            timestamp: entry_timestamp(),
        };
        let next = reducers::add_workout(&self.state, workout.clone());
        self.commit(next, "add_workout");
        workout
    }

    /// Logs a food under today's date, whatever `params.date` says.
    pub fn add_food(&mut self, params: AddFoodParams) -> FoodEntry {
        let today = today();
        if params.date != today {
            warn!(
                requested = %params.date,
                filed_under = %today,
                "food entries are always filed under today"
            );
        }
        let food = FoodEntry {
            id: new_entry_id(),
            date: params.date,
            name: params.name,
            quantity: params.quantity,
            protein_per_serving: params.protein_per_serving,
            total_protein: params.quantity * params.protein_per_serving,
            timestamp: entry_timestamp(),
        };
        let next = reducers::add_food(&self.state, today, food.clone());
        self.commit(next, "add_food");
        food
    }

    /// Logs `amount` ml of water for today.
    pub fn add_water_log(&mut self, amount: f64) -> WaterLogEntry {
        let log = WaterLogEntry {
            id: new_entry_id(),
            amount,
            timestamp: entry_timestamp(),
        };
        let next = reducers::add_water_log(&self.state, today(), log.clone());
        self.commit(next, "add_water_log");
        log
    }

    // --- Goals, profile and preferences ---

    pub fn set_protein_goal(&mut self, goal: f64) {
        let next = reducers::set_protein_goal(&self.state, goal);
        self.commit(next, "set_protein_goal");
    }

    pub fn set_water_goal(&mut self, goal: f64) {
        let next = reducers::set_water_goal(&self.state, goal);
        self.commit(next, "set_water_goal");
    }

    pub fn set_start_date(&mut self, date: NaiveDate) {
        let next = reducers::set_start_date(&self.state, date);
        self.commit(next, "set_start_date");
    }

    pub fn get_start_date(&self) -> Option<NaiveDate> {
        self.state.start_date()
    }

    /// Replaces the profile, derives the water goal from body weight and pins
    /// the start date on first use. The profile is saved under its own key.
    pub fn set_user_profile(&mut self, profile: UserProfile) {
        if self.profile.is_none() {
            info!(name = %profile.name, "profile created");
        }
        let next = reducers::apply_profile(&self.state, &profile, today());
        self.saver.submit_profile(profile.clone());
        self.profile = Some(profile);
        self.commit(next, "set_user_profile");
    }

    pub fn set_meal_plan_preferences(&mut self, preferences: MealPlanPreferences) {
        let next = reducers::set_meal_plan_preferences(&self.state, preferences);
        self.commit(next, "set_meal_plan_preferences");
    }

    pub fn set_workout_plan_preferences(&mut self, preferences: WorkoutPlanPreferences) {
        let next = reducers::set_workout_plan_preferences(&self.state, preferences);
        self.commit(next, "set_workout_plan_preferences");
    }

    // --- Meal plans ---

    /// Generates a week of meal plans from `start_date`, replacing existing
    /// plans on those days.
    pub fn generate_meal_plan(&mut self, preferences: MealPlanPreferences, start_date: NaiveDate) {
        info!(start = %start_date, days = meal_plan::MEAL_PLAN_DAYS, "generating meal plan");
        let next = reducers::generate_meal_plan(&self.state, preferences, start_date);
        self.commit(next, "generate_meal_plan");
    }

    pub fn update_daily_meal_plan(&mut self, date: NaiveDate, meals: Vec<MealPlanItem>) {
        let next = reducers::update_daily_meal_plan(&self.state, date, meals);
        self.commit(next, "update_daily_meal_plan");
    }

    /// Flips a meal item's `completed` flag.
    /// Returns `false`, leaving the state untouched, if the day has no such item.
    pub fn toggle_meal_plan_item(&mut self, date: NaiveDate, meal_id: &str) -> bool {
        let next = reducers::toggle_meal_plan_item(&self.state, date, meal_id);
        self.commit_if_changed(next, "toggle_meal_plan_item")
    }

    // --- Workout plans ---

    /// Generates 30 days of workout plans from `start_date`, replacing existing
    /// plans on those days.
    pub fn generate_workout_plan(
        &mut self,
        preferences: WorkoutPlanPreferences,
        start_date: NaiveDate,
    ) {
        info!(
            start = %start_date,
            days = workout_plan::WORKOUT_PLAN_DAYS,
            distribution = %preferences.week_distribution,
            "generating workout plan"
        );
        let next = reducers::generate_workout_plan(&self.state, preferences, start_date);
        self.commit(next, "generate_workout_plan");
    }

    /// Returns `false` if the day has no workout plan.
    pub fn update_daily_workout_plan(
        &mut self,
        date: NaiveDate,
        exercises: Vec<WorkoutPlanExercise>,
    ) -> bool {
        let next = reducers::update_daily_workout_plan(&self.state, date, exercises);
        self.commit_if_changed(next, "update_daily_workout_plan")
    }

    /// Returns `false` if the day has no plan or no exercise with that id.
    pub fn update_workout_plan_exercise(
        &mut self,
        date: NaiveDate,
        exercise_id: &str,
        update: &ExerciseUpdate,
    ) -> bool {
        let next = reducers::update_workout_plan_exercise(&self.state, date, exercise_id, update);
        self.commit_if_changed(next, "update_workout_plan_exercise")
    }

    /// Flips `completed` on a planned exercise or rest-day activity.
    pub fn toggle_workout_plan_exercise(&mut self, date: NaiveDate, exercise_id: &str) -> bool {
        let next = reducers::toggle_workout_plan_exercise(&self.state, date, exercise_id);
        self.commit_if_changed(next, "toggle_workout_plan_exercise")
    }

    /// Removes every logged workout and workout plan. Cannot be undone.
    pub fn clear_all_workout_data(&mut self) {
        info!(
            days = self.state.daily_data().len(),
            "clearing all workout data"
        );
        let next = reducers::clear_all_workout_data(&self.state);
        self.commit(next, "clear_all_workout_data");
    }

    // --- Queries ---

    pub fn get_today_data(&self) -> DailyData {
        self.state.day(today())
    }

    /// The day's record, or an empty one with the current goals (not stored).
    pub fn get_data_for_date(&self, date: NaiveDate) -> DailyData {
        self.state.day(date)
    }

    pub fn has_data_for_date(&self, date: NaiveDate) -> bool {
        self.state.has_data_for_date(date)
    }

    pub fn overall_stats(&self) -> OverallStats {
        self.state.overall_stats()
    }

    // --- Persistence lifecycle ---

    pub fn save_status(&self) -> SaveStatus {
        self.saver.status()
    }

    /// Waits until every queued save has been attempted.
    /// # Errors
    /// Returns `PersistenceError::WorkerStopped` if the writer thread is gone.
    pub fn flush(&self) -> Result<(), PersistenceError> {
        self.saver.flush()
    }

    /// Writes out queued saves and stops the writer thread.
    /// # Errors
    /// Returns `PersistenceError` if the final flush fails.
    pub fn close(self) -> Result<SaveStatus, PersistenceError> {
        self.saver.flush()?;
        Ok(self.saver.status())
    }
}

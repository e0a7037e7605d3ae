//src/main.rs
mod cli;

use anyhow::{bail, Context, Result};
use chrono::Local;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use std::io::stdout;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

use cli::{Commands, MealPlanCommands, ProfileCommands, WorkoutPlanCommands};
use nufit_lib::{
    AddFoodParams, AddWorkoutParams, AppService, DailyData, DailyMealPlan, DailyWorkoutPlan,
    ExerciseUpdate, MealPlanPreferences, OnboardingState, OverallStats, PersistenceError,
    SaveStatus, UserProfile, WorkoutPlanExercise, WorkoutPlanPreferences,
};

const DEFAULT_LOG_FILTER: &str = "nufit_lib=warn,nufit=info";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli_args = cli::parse_args();

    if let Commands::Completions { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();

        eprintln!("Generating completion script for {shell}...");
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    // Loads config and the stored state, starts the background writer
    let mut service =
        AppService::initialize().context("Failed to initialize application service")?;

    let outcome = run_command(&mut service, cli_args.command);

    // Queued saves must reach the database before the process exits
    finish(outcome, service.close())
}

/// Combines the command result with the outcome of closing the service.
/// A command error wins; a close failure is then only logged.
fn finish(outcome: Result<()>, closed: Result<SaveStatus, PersistenceError>) -> Result<()> {
    match closed {
        Ok(status) => {
            debug!(completed = status.completed, failed = status.failed, "saves finished");
            for (key, err) in &status.errors {
                warn!("Saving '{key}' failed, recent changes may be lost: {err}");
            }
        }
        Err(e) if outcome.is_err() => error!("Failed to write pending changes: {e}"),
        Err(e) => return Err(e).context("Failed to write pending changes"),
    }
    outcome
}

fn header_color(service: &AppService) -> Color {
    nufit_lib::parse_color(&service.config.theme.header_color)
        .map(Color::from)
        .unwrap_or(Color::Green) // Fallback
}

fn run_command(service: &mut AppService, command: Commands) -> Result<()> {
    match command {
        Commands::Completions { .. } => {
            // Handled before the service is started
            unreachable!("Completion generation should have exited already");
        }
        Commands::AddWorkout {
            name,
            active,
            total,
            date,
        } => {
            let name = name.trim();
            if name.is_empty() {
                bail!("Workout name cannot be empty.");
            }
            let entry = service.add_workout(AddWorkoutParams {
                date: Some(date),
                name: name.to_string(),
                active_calories: active,
                total_calories: total,
            });
            let day = service.get_data_for_date(entry.date);
            println!(
                "Logged '{}' on {}: {} active / {} total kcal. Day total: {} active / {} total kcal.",
                entry.name,
                entry.date,
                entry.active_calories,
                entry.total_calories,
                day.total_active_calories(),
                day.total_calories()
            );
        }
        Commands::AddFood {
            name,
            quantity,
            protein,
        } => {
            let name = name.trim();
            if name.is_empty() {
                bail!("Food name cannot be empty.");
            }
            let entry = service.add_food(AddFoodParams {
                date: nufit_lib::today(),
                name: name.to_string(),
                quantity,
                protein_per_serving: protein,
            });
            let today = service.get_today_data();
            println!(
                "Logged {} x '{}' ({:.1} g protein). Today: {:.1} / {:.0} g ({:.0}%).",
                entry.quantity,
                entry.name,
                entry.total_protein,
                today.total_protein(),
                today.protein_goal(),
                today.protein_progress_percent()
            );
            if today.protein_goal_reached() {
                println!("Protein goal reached!");
            }
        }
        Commands::Water { amount, quick } => {
            let amount = match (amount, quick) {
                (Some(amount), _) => amount,
                (None, Some(n)) => {
                    let presets = &service.config.hydration.quick_add_ml;
                    match n.checked_sub(1).and_then(|idx| presets.get(idx)) {
                        Some(&ml) if ml > 0.0 => ml,
                        Some(_) => bail!("Quick-add amount #{n} in the config is not positive."),
                        None => bail!(
                            "No quick-add amount #{n}. Configured amounts (ml): {:?}",
                            presets
                        ),
                    }
                }
                (None, None) => bail!("Give an amount in ml or --quick N."),
            };
            service.add_water_log(amount);
            let today = service.get_today_data();
            println!(
                "Logged {amount} ml of water. Today: {} / {} ml, {} ml to go.",
                today.total_water(),
                today.water_goal(),
                today.remaining_water()
            );
        }
        Commands::SetProteinGoal { grams } => {
            service.set_protein_goal(grams);
            println!("Protein goal set to {grams} g. Days already tracked keep their goal.");
        }
        Commands::SetWaterGoal { ml } => {
            service.set_water_goal(ml);
            println!("Water goal set to {ml} ml. Days already tracked keep their goal.");
        }
        Commands::SetStartDate { date } => {
            service.set_start_date(date);
            println!("Start date set to {date}.");
        }
        Commands::Profile(ProfileCommands::Set {
            name,
            weight,
            height,
            goal,
            allergies,
        }) => {
            let name = name.trim();
            if name.is_empty() {
                bail!("Profile name cannot be empty.");
            }
            service.set_user_profile(UserProfile {
                name: name.to_string(),
                current_weight: weight,
                height,
                goal_weight: goal,
                allergies: clean_list(allergies),
            });
            println!(
                "Profile saved. Water goal is now {} ml.",
                service.state().water_goal()
            );
        }
        Commands::Profile(ProfileCommands::Show) => match service.user_profile() {
            Some(profile) => print_profile(profile, service.get_start_date()),
            None => println!("No profile yet. Create one with 'nufit profile set'."),
        },
        Commands::Today => {
            let day = service.get_today_data();
            print_day(service, &day);
        }
        Commands::Day { date } => {
            let day = service.get_data_for_date(date);
            if !service.has_data_for_date(date) {
                println!("Nothing logged on {date}.");
            }
            print_day(service, &day);
        }
        Commands::Stats => print_stats(&service.overall_stats()),
        Commands::MealPlan(command) => run_meal_plan_command(service, command)?,
        Commands::WorkoutPlan(command) => run_workout_plan_command(service, command)?,
        Commands::ClearWorkouts { yes } => {
            if !yes {
                bail!(
                    "This deletes every logged workout and workout plan. Re-run with --yes to confirm."
                );
            }
            service.clear_all_workout_data();
            println!("All workout data cleared. Foods, water and meal plans were kept.");
        }
        Commands::DbPath => println!("Database file is located at: {:?}", service.get_db_path()),
        Commands::ConfigPath => {
            println!("Config file is located at: {:?}", service.get_config_path());
        }
    }
    Ok(())
}

fn run_meal_plan_command(service: &mut AppService, command: MealPlanCommands) -> Result<()> {
    match command {
        MealPlanCommands::Generate {
            start,
            allergies,
            disliked,
            restrictions,
        } => {
            let prefs = MealPlanPreferences {
                allergies: clean_list(allergies),
                disliked_foods: clean_list(disliked),
                dietary_restrictions: clean_list(restrictions),
            };
            service.generate_meal_plan(prefs, start);
            println!("Generated a 7-day meal plan starting {start}.");
            if let Some(plan) = service.get_data_for_date(start).meal_plan() {
                print_meal_plan(plan, header_color(service));
            }
        }
        MealPlanCommands::Show { date } => match service.get_data_for_date(date).meal_plan() {
            Some(plan) => print_meal_plan(plan, header_color(service)),
            None => {
                println!("No meal plan for {date}. Create one with 'nufit meal-plan generate'.");
            }
        },
        MealPlanCommands::Toggle { date, id } => {
            if !service.toggle_meal_plan_item(date, &id) {
                bail!("No meal '{id}' in the plan for {date}.");
            }
            if let Some(plan) = service.get_data_for_date(date).meal_plan() {
                print_meal_plan(plan, header_color(service));
            }
        }
        MealPlanCommands::Edit {
            date,
            id,
            description,
        } => {
            let day = service.get_data_for_date(date);
            let Some(plan) = day.meal_plan() else {
                bail!("No meal plan for {date}.");
            };
            let mut meals = plan.meals.clone();
            let Some(meal) = meals.iter_mut().find(|m| m.id == id) else {
                bail!("No meal '{id}' in the plan for {date}.");
            };
            meal.description = description.trim().to_string();
            service.update_daily_meal_plan(date, meals);
            println!("Updated meal '{id}'.");
        }
    }
    Ok(())
}

fn run_workout_plan_command(service: &mut AppService, command: WorkoutPlanCommands) -> Result<()> {
    match command {
        WorkoutPlanCommands::Generate {
            start,
            days,
            types,
            areas,
            level,
            distribution,
        } => {
            let prefs = WorkoutPlanPreferences {
                days_per_week: days,
                workout_types: types.into_iter().map(Into::into).collect(),
                target_areas: areas.into_iter().map(Into::into).collect(),
                experience_level: level.into(),
                week_distribution: distribution.into(),
            };
            service.generate_workout_plan(prefs, start);
            println!("Generated a 30-day workout plan starting {start}.");
            if let Some(plan) = service.get_data_for_date(start).workout_plan() {
                print_workout_plan(plan, header_color(service));
            }
        }
        WorkoutPlanCommands::Show { date } => {
            match service.get_data_for_date(date).workout_plan() {
                Some(plan) => print_workout_plan(plan, header_color(service)),
                None => println!(
                    "No workout plan for {date}. Create one with 'nufit workout-plan generate'."
                ),
            }
        }
        WorkoutPlanCommands::Toggle { date, id } => {
            if !service.toggle_workout_plan_exercise(date, &id) {
                bail!("No exercise '{id}' in the workout plan for {date}.");
            }
            if let Some(plan) = service.get_data_for_date(date).workout_plan() {
                print_workout_plan(plan, header_color(service));
            }
        }
        WorkoutPlanCommands::Log {
            date,
            id,
            sets,
            reps,
            weight,
            duration,
        } => {
            let update = ExerciseUpdate {
                actual_sets: sets,
                actual_reps: reps,
                actual_weight: weight,
                actual_duration: duration,
                ..Default::default()
            };
            if update.is_empty() {
                bail!(
                    "Nothing to log. Give at least one of --sets, --reps, --weight or --duration."
                );
            }
            if !service.update_workout_plan_exercise(date, &id, &update) {
                bail!("No exercise '{id}' in the workout plan for {date}.");
            }
            println!("Logged results for '{id}'.");
        }
        WorkoutPlanCommands::Rename { date, id, name } => {
            let name = name.trim();
            if name.is_empty() {
                bail!("Exercise name cannot be empty.");
            }
            let update = ExerciseUpdate {
                name: Some(name.to_string()),
                ..Default::default()
            };
            if !service.update_workout_plan_exercise(date, &id, &update) {
                bail!("No exercise '{id}' in the workout plan for {date}.");
            }
            println!("Renamed '{id}' to '{name}'.");
        }
    }
    Ok(())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn check_mark(done: bool) -> &'static str {
    if done {
        "[x]"
    } else {
        "[ ]"
    }
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn print_day(service: &AppService, day: &DailyData) {
    let color = header_color(service);
    println!("\n--- {} ---", day.date().format("%A, %Y-%m-%d"));
    if service.onboarding_state() == OnboardingState::NoProfile {
        println!("Tip: create a profile with 'nufit profile set' to get a personal water goal.");
    }

    let mut summary = Table::new();
    summary
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    summary.add_row(vec![
        Cell::new("Active Calories").add_attribute(Attribute::Bold),
        Cell::new(format!("{} kcal", day.total_active_calories())),
    ]);
    summary.add_row(vec![
        Cell::new("Total Calories").add_attribute(Attribute::Bold),
        Cell::new(format!("{} kcal", day.total_calories())),
    ]);
    summary.add_row(vec![
        Cell::new("Protein").add_attribute(Attribute::Bold),
        Cell::new(format!(
            "{:.1} / {} g ({:.0}%)",
            day.total_protein(),
            day.protein_goal(),
            day.protein_progress_percent()
        )),
    ]);
    summary.add_row(vec![
        Cell::new("Water").add_attribute(Attribute::Bold),
        Cell::new(format!(
            "{} / {} ml ({:.0}%)",
            day.total_water(),
            day.water_goal(),
            day.water_progress_percent()
        )),
    ]);
    println!("{summary}");

    if !day.workouts().is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Time").fg(color),
                Cell::new("Workout").fg(color),
                Cell::new("Active (kcal)").fg(color),
                Cell::new("Total (kcal)").fg(color),
            ]);
        for workout in day.workouts() {
            table.add_row(vec![
                Cell::new(workout.timestamp.with_timezone(&Local).format("%H:%M")),
                Cell::new(&workout.name),
                Cell::new(workout.active_calories),
                Cell::new(workout.total_calories),
            ]);
        }
        println!("{table}");
    }

    if !day.foods().is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Time").fg(color),
                Cell::new("Food").fg(color),
                Cell::new("Servings").fg(color),
                Cell::new("Protein/Serving (g)").fg(color),
                Cell::new("Protein (g)").fg(color),
            ]);
        for food in day.foods() {
            table.add_row(vec![
                Cell::new(food.timestamp.with_timezone(&Local).format("%H:%M")),
                Cell::new(&food.name),
                Cell::new(food.quantity),
                Cell::new(food.protein_per_serving),
                Cell::new(format!("{:.1}", food.total_protein)),
            ]);
        }
        println!("{table}");
    }

    if !day.water_logs().is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![Cell::new("Time").fg(color), Cell::new("Water (ml)").fg(color)]);
        for log in day.water_logs() {
            table.add_row(vec![
                Cell::new(log.timestamp.with_timezone(&Local).format("%H:%M")),
                Cell::new(log.amount),
            ]);
        }
        println!("{table}");
    }

    if let Some(plan) = day.meal_plan() {
        print_meal_plan(plan, color);
    }
    if let Some(plan) = day.workout_plan() {
        print_workout_plan(plan, color);
    }
}

fn print_meal_plan(plan: &DailyMealPlan, header_color: Color) {
    println!("\n--- Meal plan for {} ---", plan.date);
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Done").fg(header_color),
            Cell::new("ID").fg(header_color),
            Cell::new("Meal").fg(header_color),
            Cell::new("Description").fg(header_color),
        ]);
    for meal in &plan.meals {
        table.add_row(vec![
            Cell::new(check_mark(meal.completed)),
            Cell::new(&meal.id),
            Cell::new(meal.meal_type),
            Cell::new(&meal.description),
        ]);
    }
    println!("{table}");
}

fn print_workout_plan(plan: &DailyWorkoutPlan, header_color: Color) {
    println!("\n--- {} ({}) ---", plan.day_name, plan.date);
    let rows: &[WorkoutPlanExercise] = if plan.is_rest_day {
        plan.rest_day_activities.as_deref().unwrap_or_default()
    } else {
        &plan.exercises
    };
    if rows.is_empty() {
        println!("Nothing planned.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Done").fg(header_color),
            Cell::new("ID").fg(header_color),
            Cell::new("Exercise").fg(header_color),
            Cell::new("Sets").fg(header_color),
            Cell::new("Reps").fg(header_color),
            Cell::new("Weight (kg)").fg(header_color),
            Cell::new("Duration (min)").fg(header_color),
            Cell::new("Actual").fg(header_color),
        ]);
    for exercise in rows {
        table.add_row(vec![
            Cell::new(check_mark(exercise.completed)),
            Cell::new(&exercise.id),
            Cell::new(&exercise.name),
            Cell::new(or_dash(exercise.sets)),
            Cell::new(or_dash(exercise.reps)),
            Cell::new(or_dash(exercise.weight)),
            Cell::new(or_dash(exercise.duration)),
            Cell::new(format_actuals(exercise)),
        ]);
    }
    println!("{table}");
}

fn format_actuals(exercise: &WorkoutPlanExercise) -> String {
    let mut parts = Vec::new();
    if let Some(sets) = exercise.actual_sets {
        parts.push(format!("{sets} sets"));
    }
    if let Some(reps) = exercise.actual_reps {
        parts.push(format!("{reps} reps"));
    }
    if let Some(weight) = exercise.actual_weight {
        parts.push(format!("{weight} kg"));
    }
    if let Some(minutes) = exercise.actual_duration {
        parts.push(format!("{minutes} min"));
    }
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(", ")
    }
}

fn print_profile(profile: &UserProfile, start_date: Option<chrono::NaiveDate>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Name").add_attribute(Attribute::Bold),
        Cell::new(&profile.name),
    ]);
    table.add_row(vec![
        Cell::new("Weight").add_attribute(Attribute::Bold),
        Cell::new(format!("{} kg", profile.current_weight)),
    ]);
    table.add_row(vec![
        Cell::new("Height").add_attribute(Attribute::Bold),
        Cell::new(format!("{} cm", profile.height)),
    ]);
    table.add_row(vec![
        Cell::new("Goal Weight").add_attribute(Attribute::Bold),
        Cell::new(format!("{} kg", profile.goal_weight)),
    ]);
    table.add_row(vec![
        Cell::new("To Goal").add_attribute(Attribute::Bold),
        Cell::new(format!("{:+.1} kg", -profile.weight_to_goal())),
    ]);
    table.add_row(vec![
        Cell::new("BMI").add_attribute(Attribute::Bold),
        Cell::new(profile.bmi().map_or("N/A".to_string(), |bmi| format!("{bmi:.1}"))),
    ]);
    table.add_row(vec![
        Cell::new("Allergies").add_attribute(Attribute::Bold),
        Cell::new(if profile.allergies.is_empty() {
            "None".to_string()
        } else {
            profile.allergies.join(", ")
        }),
    ]);
    table.add_row(vec![
        Cell::new("Tracking Since").add_attribute(Attribute::Bold),
        Cell::new(start_date.map_or("N/A".to_string(), |d| d.format("%Y-%m-%d").to_string())),
    ]);
    println!("{table}");
}

fn print_stats(stats: &OverallStats) {
    println!("\n--- Overall statistics ---");
    if stats.total_days == 0 {
        println!("Nothing tracked yet.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let rows = [
        ("Tracked Days", stats.total_days.to_string()),
        ("Workouts", stats.total_workouts.to_string()),
        ("Active Calories", format!("{} kcal", stats.total_active_calories)),
        ("Total Calories", format!("{} kcal", stats.total_calories)),
        ("Foods Logged", stats.total_foods.to_string()),
        ("Protein", format!("{:.1} g", stats.total_protein)),
        ("Water", format!("{} ml", stats.total_water)),
        ("Avg Active Calories / Day", format!("{:.0} kcal", stats.avg_active_calories)),
        ("Avg Protein / Day", format!("{:.1} g", stats.avg_protein)),
        ("Avg Water / Day", format!("{:.0} ml", stats.avg_water)),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), Cell::new(value)]);
    }
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_error_is_kept_when_close_fails() {
        let result = finish(
            Err(anyhow::anyhow!("No meal 'x' in the plan")),
            Err(PersistenceError::WorkerStopped),
        );
        let message = result.unwrap_err().to_string();
        assert!(message.contains("No meal 'x'"));
    }

    #[test]
    fn close_failure_is_reported_after_successful_command() {
        let result = finish(Ok(()), Err(PersistenceError::WorkerStopped));
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "Failed to write pending changes");
        assert!(err.downcast_ref::<PersistenceError>().is_some());
    }

    #[test]
    fn failed_saves_do_not_fail_the_command() {
        let mut status = SaveStatus::default();
        status
            .errors
            .insert("profile".to_string(), "disk full".to_string());
        assert!(finish(Ok(()), Ok(status)).is_ok());
    }
}

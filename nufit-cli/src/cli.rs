// src/cli.rs
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use nufit_lib::{ExperienceLevel, TargetArea, WeekDistribution, WorkoutType};

#[derive(Parser, Debug)]
#[command(author, version, about = "Track workouts, protein and water, and follow generated plans", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

// Custom parser for date strings and shorthands
pub fn parse_date_shorthand(s: &str) -> Result<NaiveDate, String> {
    let today = nufit_lib::today();
    match s.to_lowercase().as_str() {
        "today" => Ok(today),
        "yesterday" => today
            .pred_opt()
            .ok_or_else(|| "Date out of range".to_string()),
        "tomorrow" => today
            .succ_opt()
            .ok_or_else(|| "Date out of range".to_string()),
        _ => {
            if let Ok(date) = nufit_lib::parse_date_key(s) {
                Ok(date)
            } else if let Ok(date) = NaiveDate::parse_from_str(s, "%d.%m.%Y") {
                Ok(date)
            } else {
                Err(format!(
                    "Invalid date format: '{s}'. Use 'today', 'yesterday', 'tomorrow', YYYY-MM-DD or DD.MM.YYYY."
                ))
            }
        }
    }
}

/// Rejects zero, negative and non-finite amounts.
pub fn parse_positive(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a number"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("'{s}' must be greater than zero"))
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkoutTypeCli {
    Strength,
    Cardio,
    Flexibility,
}

impl From<WorkoutTypeCli> for WorkoutType {
    fn from(value: WorkoutTypeCli) -> Self {
        match value {
            WorkoutTypeCli::Strength => Self::Strength,
            WorkoutTypeCli::Cardio => Self::Cardio,
            WorkoutTypeCli::Flexibility => Self::Flexibility,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetAreaCli {
    Chest,
    Back,
    Legs,
    Arms,
    Shoulders,
}

impl From<TargetAreaCli> for TargetArea {
    fn from(value: TargetAreaCli) -> Self {
        match value {
            TargetAreaCli::Chest => Self::Chest,
            TargetAreaCli::Back => Self::Back,
            TargetAreaCli::Legs => Self::Legs,
            TargetAreaCli::Arms => Self::Arms,
            TargetAreaCli::Shoulders => Self::Shoulders,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExperienceLevelCli {
    Beginner,
    Intermediate,
    Advanced,
}

impl From<ExperienceLevelCli> for ExperienceLevel {
    fn from(value: ExperienceLevelCli) -> Self {
        match value {
            ExperienceLevelCli::Beginner => Self::Beginner,
            ExperienceLevelCli::Intermediate => Self::Intermediate,
            ExperienceLevelCli::Advanced => Self::Advanced,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeekDistributionCli {
    Consecutive,
    Spread,
    Custom,
}

impl From<WeekDistributionCli> for WeekDistribution {
    fn from(value: WeekDistributionCli) -> Self {
        match value {
            WeekDistributionCli::Consecutive => Self::Consecutive,
            WeekDistributionCli::Spread => Self::Spread,
            WeekDistributionCli::Custom => Self::Custom,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log a workout
    AddWorkout {
        /// Name of the workout (e.g., "Morning Run")
        #[arg(short, long)]
        name: String,
        /// Active calories burned
        #[arg(short, long, value_parser = parse_positive)]
        active: f64,
        /// Total calories burned
        #[arg(short, long, value_parser = parse_positive)]
        total: f64,
        /// Date of the workout ('today', 'yesterday', YYYY-MM-DD, DD.MM.YYYY)
        #[arg(long, value_parser = parse_date_shorthand, default_value = "today")]
        date: NaiveDate,
    },
    /// Log a food. Foods always count towards today.
    AddFood {
        #[arg(short, long)]
        name: String,
        /// Number of servings
        #[arg(short, long, value_parser = parse_positive)]
        quantity: f64,
        /// Protein per serving in grams
        #[arg(short, long, value_parser = parse_positive)]
        protein: f64,
    },
    /// Log water for today, in ml
    Water {
        /// Amount in ml
        #[arg(
            value_parser = parse_positive,
            required_unless_present = "quick",
            conflicts_with = "quick"
        )]
        amount: Option<f64>,
        /// Use the Nth configured quick-add amount (1-based)
        #[arg(short, long, value_name = "N")]
        quick: Option<usize>,
    },
    /// Set the daily protein goal in grams
    SetProteinGoal {
        #[arg(value_parser = parse_positive)]
        grams: f64,
    },
    /// Set the daily water goal in ml
    SetWaterGoal {
        #[arg(value_parser = parse_positive)]
        ml: f64,
    },
    /// Set the date progress is counted from
    SetStartDate {
        #[arg(value_parser = parse_date_shorthand)]
        date: NaiveDate,
    },
    /// Manage the user profile
    #[command(subcommand)]
    Profile(ProfileCommands),
    /// Show today's totals and plans
    Today,
    /// Show totals and plans for a date
    Day {
        #[arg(value_parser = parse_date_shorthand)]
        date: NaiveDate,
    },
    /// Show totals and averages over every tracked day
    Stats,
    /// Generate and follow the weekly meal plan
    #[command(subcommand)]
    MealPlan(MealPlanCommands),
    /// Generate and follow the 30-day workout plan
    #[command(subcommand)]
    WorkoutPlan(WorkoutPlanCommands),
    /// Delete every logged workout and workout plan
    ClearWorkouts {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Show the path to the database file
    DbPath,
    /// Show the path to the config file
    ConfigPath,
    /// Generate shell completion scripts
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Create or replace the profile
    Set {
        #[arg(short, long)]
        name: String,
        /// Current weight in kg
        #[arg(short, long, value_parser = parse_positive)]
        weight: f64,
        /// Height in cm
        #[arg(long, value_parser = parse_positive)]
        height: f64,
        /// Goal weight in kg
        #[arg(short, long, value_parser = parse_positive)]
        goal: f64,
        /// Comma-separated list of allergies
        #[arg(short, long, value_delimiter = ',')]
        allergies: Vec<String>,
    },
    /// Show the profile
    Show,
}

#[derive(Subcommand, Debug)]
pub enum MealPlanCommands {
    /// Generate a week of meals
    Generate {
        /// First day of the plan
        #[arg(long, value_parser = parse_date_shorthand, default_value = "today")]
        start: NaiveDate,
        #[arg(long, value_delimiter = ',')]
        allergies: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        disliked: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        restrictions: Vec<String>,
    },
    /// Show the meal plan for a date
    Show {
        #[arg(value_parser = parse_date_shorthand, default_value = "today")]
        date: NaiveDate,
    },
    /// Mark a meal eaten, or not eaten again
    Toggle {
        #[arg(value_parser = parse_date_shorthand)]
        date: NaiveDate,
        /// Meal id as shown by `meal-plan show`
        id: String,
    },
    /// Replace the description of a planned meal
    Edit {
        #[arg(value_parser = parse_date_shorthand)]
        date: NaiveDate,
        id: String,
        description: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum WorkoutPlanCommands {
    /// Generate 30 days of workouts
    Generate {
        #[arg(long, value_parser = parse_date_shorthand, default_value = "today")]
        start: NaiveDate,
        /// Training days per week (1-7)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=7))]
        days: u32,
        #[arg(short = 't', long = "type", value_enum, value_delimiter = ',', required = true)]
        types: Vec<WorkoutTypeCli>,
        #[arg(short, long, value_enum, value_delimiter = ',')]
        areas: Vec<TargetAreaCli>,
        #[arg(short, long, value_enum, default_value = "intermediate")]
        level: ExperienceLevelCli,
        #[arg(long, value_enum, default_value = "consecutive")]
        distribution: WeekDistributionCli,
    },
    /// Show the workout plan for a date
    Show {
        #[arg(value_parser = parse_date_shorthand, default_value = "today")]
        date: NaiveDate,
    },
    /// Mark an exercise or rest-day activity done, or not done again
    Toggle {
        #[arg(value_parser = parse_date_shorthand)]
        date: NaiveDate,
        /// Exercise id as shown by `workout-plan show`
        id: String,
    },
    /// Record what was actually performed
    Log {
        #[arg(value_parser = parse_date_shorthand)]
        date: NaiveDate,
        id: String,
        #[arg(short, long)]
        sets: Option<u32>,
        #[arg(short, long)]
        reps: Option<u32>,
        /// Weight in kg
        #[arg(short, long)]
        weight: Option<f64>,
        /// Duration in minutes
        #[arg(short, long)]
        duration: Option<u32>,
    },
    /// Rename a planned exercise
    Rename {
        #[arg(value_parser = parse_date_shorthand)]
        date: NaiveDate,
        id: String,
        name: String,
    },
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn date_shorthands() {
        let today = nufit_lib::today();
        assert_eq!(parse_date_shorthand("Today"), Ok(today));
        assert_eq!(parse_date_shorthand("yesterday"), Ok(today.pred_opt().unwrap()));
        assert_eq!(
            parse_date_shorthand("2025-01-31"),
            Ok(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap())
        );
        assert_eq!(
            parse_date_shorthand("31.01.2025"),
            Ok(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap())
        );
        assert!(parse_date_shorthand("31/01/2025").is_err());
    }

    #[test]
    fn positive_amounts_only() {
        assert_eq!(parse_positive("250"), Ok(250.0));
        assert!(parse_positive("0").is_err());
        assert!(parse_positive("-5").is_err());
        assert!(parse_positive("NaN").is_err());
        assert!(parse_positive("lots").is_err());
    }

    #[test]
    fn parses_workout_plan_generate() {
        let cli = Cli::try_parse_from([
            "nufit",
            "workout-plan",
            "generate",
            "--start",
            "2025-01-01",
            "--days",
            "4",
            "--type",
            "strength,cardio,flexibility",
            "--areas",
            "chest,legs",
            "--distribution",
            "spread",
        ])
        .unwrap();
        match cli.command {
            Commands::WorkoutPlan(WorkoutPlanCommands::Generate {
                days, types, areas, level, distribution, ..
            }) => {
                assert_eq!(days, 4);
                assert_eq!(
                    types,
                    vec![
                        WorkoutTypeCli::Strength,
                        WorkoutTypeCli::Cardio,
                        WorkoutTypeCli::Flexibility
                    ]
                );
                let converted: Vec<WorkoutType> = types.into_iter().map(Into::into).collect();
                assert!(converted.contains(&WorkoutType::Flexibility));
                assert_eq!(areas, vec![TargetAreaCli::Chest, TargetAreaCli::Legs]);
                assert_eq!(level, ExperienceLevelCli::Intermediate);
                assert_eq!(distribution, WeekDistributionCli::Spread);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_water() {
        assert!(Cli::try_parse_from(["nufit", "water", "0"]).is_err());
        assert!(Cli::try_parse_from(["nufit", "water", "--quick", "2"]).is_ok());
    }
}

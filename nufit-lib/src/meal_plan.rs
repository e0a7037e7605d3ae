//src/meal_plan.rs
use chrono::NaiveDate;

use crate::date::{date_key, shift};
use crate::models::{DailyMealPlan, MealPlanItem, MealType};

/// Number of consecutive days produced by one meal plan generation.
pub const MEAL_PLAN_DAYS: usize = 7;

struct DayMenu {
    breakfast: &'static str,
    lunch: &'static str,
    dinner: &'static str,
    snack: &'static str,
}

impl DayMenu {
    const fn describe(&self, meal_type: MealType) -> &'static str {
        match meal_type {
            MealType::Breakfast => self.breakfast,
            MealType::Lunch => self.lunch,
            MealType::Dinner => self.dinner,
            MealType::Snack => self.snack,
        }
    }
}

// One menu per day offset, applied in order.
const WEEKLY_MENUS: [DayMenu; MEAL_PLAN_DAYS] = [
    DayMenu {
        breakfast: "Oatmeal with berries and almonds",
        lunch: "Grilled chicken salad with avocado",
        dinner: "Baked salmon with quinoa and vegetables",
        snack: "Greek yogurt with honey",
    },
    DayMenu {
        breakfast: "Scrambled eggs with spinach and toast",
        lunch: "Turkey and hummus wrap",
        dinner: "Stir-fried tofu with brown rice",
        snack: "Apple slices with almond butter",
    },
    DayMenu {
        breakfast: "Smoothie bowl with banana and granola",
        lunch: "Quinoa bowl with chickpeas",
        dinner: "Grilled chicken with sweet potato",
        snack: "Trail mix",
    },
    DayMenu {
        breakfast: "Whole grain toast with avocado",
        lunch: "Lentil soup with whole grain bread",
        dinner: "Baked cod with roasted vegetables",
        snack: "Cottage cheese with berries",
    },
    DayMenu {
        breakfast: "Protein pancakes with fruit",
        lunch: "Greek salad with grilled chicken",
        dinner: "Lean beef stir-fry with vegetables",
        snack: "Protein shake",
    },
    DayMenu {
        breakfast: "Egg white omelet with vegetables",
        lunch: "Tuna salad with whole grain crackers",
        dinner: "Grilled shrimp with zucchini noodles",
        snack: "Hummus with carrots",
    },
    DayMenu {
        breakfast: "Chia pudding with berries",
        lunch: "Chicken and vegetable soup",
        dinner: "Turkey meatballs with marinara",
        snack: "Dark chocolate and nuts",
    },
];

const SLOTS: [MealType; 4] = [
    MealType::Breakfast,
    MealType::Lunch,
    MealType::Dinner,
    MealType::Snack,
];

/// Id of a generated meal item, e.g. `2025-01-01-breakfast`.
pub fn meal_item_id(date: NaiveDate, meal_type: MealType) -> String {
    format!("{}-{}", date_key(date), meal_type.slot())
}

/// Expands the weekly menu table into one plan per day starting at `start_date`.
///
/// Output depends only on `start_date`: ids and descriptions are stable across
/// runs and every item starts uncompleted.
pub fn generate_meal_plans(start_date: NaiveDate) -> Vec<DailyMealPlan> {
    WEEKLY_MENUS
        .iter()
        .zip(0_i64..)
        .map_while(|(menu, offset)| {
            let date = shift(start_date, offset)?;
            let meals = SLOTS
                .iter()
                .map(|&meal_type| MealPlanItem {
                    id: meal_item_id(date, meal_type),
                    meal_type,
                    description: menu.describe(meal_type).to_string(),
                    completed: false,
                })
                .collect();
            Some(DailyMealPlan { date, meals })
        })
        .collect()
}
